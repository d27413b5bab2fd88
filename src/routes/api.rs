use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// API Router Module
///
/// `/api/users` is outside the route matcher and never passes through the
/// access decision. `/api/auth/*` is matched but public.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // GET /api/users?page=&limit=&search=
        .route("/api/users", get(handlers::list_users).post(handlers::create_user))
        .route(
            "/api/users/{id}",
            get(handlers::get_user)
                .put(handlers::update_user)
                .delete(handlers::delete_user),
        )
        // --- Auth ---
        .route("/api/auth/signin", post(handlers::sign_in))
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/session", get(handlers::session))
        .route("/api/auth/signout", post(handlers::sign_out))
}
