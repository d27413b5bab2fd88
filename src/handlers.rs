use crate::{
    AppState,
    access::AuthErrorCode,
    auth::SessionKeys,
    errors::{AppError, AppResult},
    models::{
        ApiResponse, CreateUserRequest, LoginRequest, Pagination, RegisterRequest, Role,
        SessionResponse, SessionUser, SignInResponse, UpdateUserRequest, UserList, UserListQuery, UserPayload,
    },
    password::{hash_password, verify_password},
    repository::NewUser,
    validation::{FieldFault, LOGIN_RULES, REGISTER_RULES, validate},
};
use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

/// Maps a body that could not be read as JSON to a validation fault.
fn body_fault(rejection: JsonRejection) -> AppError {
    tracing::debug!(reason = %rejection.body_text(), "rejected request body");
    AppError::validation("Invalid request body")
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

// --- Users ---

/// list_users
///
/// Lists users, optionally filtered by name, one page at a time.
#[utoipa::path(
    get,
    path = "/api/users",
    params(UserListQuery),
    responses(
        (status = 200, description = "Page of users, wrapped in the success envelope", body = UserList),
        (status = 500, description = "Internal server error")
    ),
    tag = "users"
)]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<UserListQuery>,
) -> AppResult<Json<ApiResponse<UserList>>> {
    let page = query.page();
    let limit = query.limit();

    let users = state.users.list_users(query.search()).await?;
    let total = users.len();
    let start = (page - 1).saturating_mul(limit);

    let users = users.into_iter().skip(start).take(limit).collect();

    Ok(Json(ApiResponse::data(UserList {
        users,
        pagination: Pagination::new(page, limit, total),
    })))
}

/// create_user
///
/// `name`, `email` and `role` are all required and must be non-empty.
/// Accounts created here carry no password and cannot use credentials sign-in.
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserPayload),
        (status = 400, description = "Missing required fields"),
        (status = 409, description = "Email already registered")
    ),
    tag = "users"
)]
pub async fn create_user(
    State(state): State<AppState>,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(payload) = payload.map_err(body_fault)?;

    let (Some(name), Some(email), Some(role)) = (
        present(payload.name),
        present(payload.email),
        present(payload.role),
    ) else {
        return Err(AppError::validation("Missing required fields"));
    };

    let role = Role::parse(&role).ok_or_else(|| {
        AppError::invalid_fields(
            "Invalid role",
            vec![FieldFault {
                field: "role".to_string(),
                message: "Role must be one of: user, admin".to_string(),
            }],
        )
    })?;

    let user = state
        .users
        .create_user(NewUser {
            name,
            email,
            role,
            password_hash: None,
        })
        .await?;
    tracing::info!(user_id = %user.id, "user created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(UserPayload { user }).with_message("User created successfully")),
    ))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserPayload),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<UserPayload>>> {
    let user = state
        .users
        .get_user(&id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(ApiResponse::data(UserPayload { user })))
}

/// update_user
///
/// Partial update; only the fields present in the body change.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = UserPayload),
        (status = 400, description = "Invalid request body"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> AppResult<Json<ApiResponse<UserPayload>>> {
    let Json(changes) = payload.map_err(body_fault)?;

    let user = state
        .users
        .update_user(&id, changes)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    Ok(Json(
        ApiResponse::data(UserPayload { user }).with_message("User updated successfully"),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User deleted"),
        (status = 404, description = "User not found")
    ),
    tag = "users"
)]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<()>>> {
    if !state.users.delete_user(&id).await? {
        return Err(AppError::not_found("User not found"));
    }

    tracing::info!(user_id = %id, "user deleted");
    Ok(Json(ApiResponse::message("User deleted successfully")))
}

// --- Auth ---

/// sign_in
///
/// Credentials sign-in. The form is checked against the login rules, the
/// account is resolved by email and its password hash verified, and a
/// session token is issued both in the body and as the session cookie.
/// Unknown emails, wrong passwords and accounts without a password all
/// answer the same `CredentialsSignin`.
#[utoipa::path(
    post,
    path = "/api/auth/signin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = SignInResponse),
        (status = 400, description = "Invalid credentials format"),
        (status = 401, description = "CredentialsSignin")
    ),
    tag = "auth"
)]
pub async fn sign_in(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(credentials) = payload.map_err(body_fault)?;

    let faults = validate(&credentials, LOGIN_RULES);
    if !faults.is_empty() {
        return Err(AppError::invalid_fields("Invalid credentials format", faults));
    }

    let email = credentials.email.unwrap_or_default();
    let password = credentials.password.unwrap_or_default();

    let mut user = None;
    if let Some(account) = state.users.find_credentials(&email).await?
        && let Some(hash) = account.password_hash.as_deref()
        && verify_password(&password, hash)?
    {
        user = Some(account.user);
    }
    let Some(user) = user else {
        tracing::info!("credentials sign-in rejected");
        return Err(AppError::auth(AuthErrorCode::CredentialsSignin.as_str()));
    };

    let (token, expires) = state.sessions.issue(&user)?;
    let cookie = state.sessions.session_cookie(&token)?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "signed in");

    let body = SignInResponse {
        token,
        user: SessionUser {
            id: user.id,
            email: Some(user.email),
            name: Some(user.name),
            role: user.role,
        },
        expires,
    };

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(ApiResponse::data(body)),
    ))
}

/// register
///
/// Creates a `user`-role account from the sign-up form. The password is
/// stored as an argon2 hash; the store rejects a taken email.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserPayload),
        (status = 400, description = "Form validation failed"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(form) = payload.map_err(body_fault)?;

    let faults = validate(&form, REGISTER_RULES);
    if !faults.is_empty() {
        return Err(AppError::invalid_fields("Form validation failed", faults));
    }

    let name = form.name.unwrap_or_default();
    let email = form.email.unwrap_or_default();
    let password_hash = hash_password(&form.password.unwrap_or_default())?;

    let user = state
        .users
        .create_user(NewUser {
            name,
            email,
            role: Role::User,
            password_hash: Some(password_hash),
        })
        .await?;
    tracing::info!(user_id = %user.id, "account registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::data(UserPayload { user }).with_message("Account created successfully")),
    ))
}

/// session
///
/// The session of the caller, resolved through the token verifier.
#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session; user is null when anonymous", body = SessionResponse),
        (status = 401, description = "Session verification failed")
    ),
    tag = "auth"
)]
pub async fn session(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AppResult<Json<SessionResponse>> {
    let identity = state.verifier.verify(&headers).await?;

    Ok(Json(match identity {
        Some(token) => SessionResponse {
            user: Some(token.session_user()),
            expires: token.expires_at,
        },
        None => SessionResponse {
            user: None,
            expires: None,
        },
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/signout",
    responses((status = 200, description = "Session cookie cleared")),
    tag = "auth"
)]
pub async fn sign_out() -> impl IntoResponse {
    (
        [(header::SET_COOKIE, SessionKeys::cleared_cookie())],
        Json(ApiResponse::message("Signed out")),
    )
}
