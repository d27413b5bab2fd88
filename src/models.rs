use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

// --- Identity ---

/// Role
///
/// The RBAC field carried by accounts and session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, TS, Default)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "user" => Some(Role::User),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// True when this role is one of `allowed`.
    pub fn is_any_of(&self, allowed: &[Role]) -> bool {
        allowed.contains(self)
    }
}

/// User
///
/// An account record of the `users` resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

// --- Users API payloads ---

/// CreateUserRequest
///
/// Body of `POST /api/users`. Every field is optional at the wire level so a
/// missing field is reported through the envelope instead of an extractor
/// rejection.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// UpdateUserRequest
///
/// Partial update for `PUT /api/users/{id}`; absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// UserListQuery
///
/// Query parameters of `GET /api/users`. Values are kept as raw strings and
/// parsed leniently: anything that is not a positive integer falls back to
/// the default.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[into_params(parameter_in = Query)]
pub struct UserListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub search: Option<String>,
}

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;

impl UserListQuery {
    pub fn page(&self) -> usize {
        parse_positive(self.page.as_deref()).unwrap_or(DEFAULT_PAGE)
    }

    pub fn limit(&self) -> usize {
        parse_positive(self.limit.as_deref()).unwrap_or(DEFAULT_LIMIT)
    }

    pub fn search(&self) -> Option<&str> {
        self.search.as_deref().filter(|s| !s.is_empty())
    }
}

fn parse_positive(raw: Option<&str>) -> Option<usize> {
    raw.and_then(|v| v.trim().parse::<usize>().ok()).filter(|v| *v > 0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub total_pages: usize,
}

impl Pagination {
    pub fn new(page: usize, limit: usize, total: usize) -> Self {
        Self {
            page,
            limit,
            total,
            total_pages: total.div_ceil(limit.max(1)),
        }
    }
}

/// Data of a user listing.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct UserList {
    pub users: Vec<User>,
    pub pagination: Pagination,
}

/// Data of a single-user response.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct UserPayload {
    pub user: User,
}

/// ApiResponse
///
/// The success side of the JSON envelope: `{ success: true, data?, message? }`.
/// Failures are rendered by `AppError`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: None,
            message: Some(message.into()),
        }
    }
}

// --- Auth payloads ---

/// LoginRequest
///
/// Credentials for `POST /api/auth/signin`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// RegisterRequest
///
/// Sign-up form for `POST /api/auth/register`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub confirm_password: Option<String>,
}

/// SessionUser
///
/// The user record exposed by a session, as seen by the frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct SessionUser {
    pub id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Role,
}

/// SessionResponse
///
/// Body of `GET /api/auth/session`; `user` is null for anonymous callers.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct SessionResponse {
    pub user: Option<SessionUser>,
    #[ts(type = "string | null")]
    pub expires: Option<DateTime<Utc>>,
}

/// SignInResponse
///
/// Issued session token plus the resolved user.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS)]
#[ts(export)]
pub struct SignInResponse {
    pub token: String,
    pub user: SessionUser,
    #[ts(type = "string")]
    pub expires: DateTime<Utc>,
}
