use std::{any::Any, sync::Arc};

use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{self, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod access;
pub mod auth;
pub mod boundary;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod pages;
pub mod password;
pub mod repository;
pub mod session;
pub mod validation;

pub mod routes;
use routes::{admin, api, authenticated, public};

// --- Public Re-exports ---

pub use auth::{JwtVerifier, SessionKeys, TokenVerifier, TokenVerifierState};
pub use config::{AppConfig, Env};
pub use errors::{AppError, AppResult};
pub use repository::{InMemoryUserRepository, UserRepository, UserRepositoryState};

/// ApiDoc
///
/// OpenAPI document of the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_users, handlers::create_user, handlers::get_user,
        handlers::update_user, handlers::delete_user,
        handlers::sign_in, handlers::register, handlers::session, handlers::sign_out
    ),
    components(
        schemas(
            models::Role, models::User, models::CreateUserRequest, models::UpdateUserRequest,
            models::Pagination, models::UserList, models::UserPayload,
            models::LoginRequest, models::RegisterRequest, models::SessionUser,
            models::SessionResponse, models::SignInResponse, validation::FieldFault,
        )
    ),
    tags(
        (name = "users", description = "User administration"),
        (name = "auth", description = "Credentials sign-in and sessions")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared, cloneable container of everything a request may need.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub users: UserRepositoryState,
    /// Issues session tokens at sign-in.
    pub sessions: SessionKeys,
    /// Resolves the identity of incoming requests.
    pub verifier: TokenVerifierState,
}

impl AppState {
    /// State backed by the JWT verifier built from `config`.
    pub fn new(config: AppConfig, users: UserRepositoryState) -> Self {
        let sessions = SessionKeys::from_config(&config);
        let verifier = Arc::new(JwtVerifier::new(sessions.clone())) as TokenVerifierState;

        Self {
            config,
            users,
            sessions,
            verifier,
        }
    }

    /// Swaps the token verifier, e.g. for a stub in tests.
    pub fn with_verifier(mut self, verifier: TokenVerifierState) -> Self {
        self.verifier = verifier;
        self
    }
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for UserRepositoryState {
    fn from_ref(app_state: &AppState) -> UserRepositoryState {
        app_state.users.clone()
    }
}

impl FromRef<AppState> for TokenVerifierState {
    fn from_ref(app_state: &AppState) -> TokenVerifierState {
        app_state.verifier.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// create_router
///
/// Assembles the page and API routers, wraps them in the access middleware
/// and applies the observability layers.
pub fn create_router(state: AppState) -> Router {
    let cors_layer = CorsLayer::new()
        .allow_methods(cors::Any)
        .allow_origin(cors::Any)
        .allow_headers(cors::Any);

    let x_request_id = HeaderName::from_static("x-request-id");
    let show_details = state.config.env == Env::Local;

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(admin::admin_routes())
        .merge(api::api_routes())
        .fallback(pages::not_found)
        // Every request, the fallback included, passes the access decision.
        .layer(middleware::from_fn_with_state(
            state.clone(),
            access::access_control,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id))
                // Global error boundary.
                .layer(CatchPanicLayer::custom(move |payload: Box<dyn Any + Send + 'static>| {
                    boundary::handle_panic(payload, show_details)
                })),
        )
        .layer(cors_layer)
}

/// trace_span_logger
///
/// Span of one request, correlated by the `x-request-id` header.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
