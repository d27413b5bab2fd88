use crate::{
    AppState,
    access::routes::{
        AUTH_ERROR_PATH, HOME_PATH, MAINTENANCE_PATH, NOT_FOUND_PATH, SIGN_IN_PATH, SIGN_UP_PATH,
        UNAUTHORIZED_PATH,
    },
    pages,
};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Every path here is in the public route table, so the access middleware
/// lets it through without resolving an identity (maintenance aside).
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route(HOME_PATH, get(pages::home))
        .route(SIGN_IN_PATH, get(pages::sign_in))
        .route(SIGN_UP_PATH, get(pages::sign_up))
        // GET /auth/error?error=<Code>&callbackUrl=<path>
        .route(AUTH_ERROR_PATH, get(pages::auth_error))
        .route(NOT_FOUND_PATH, get(pages::not_found))
        .route(UNAUTHORIZED_PATH, get(pages::unauthorized))
        .route(MAINTENANCE_PATH, get(pages::maintenance))
        // Liveness check. The dot-free path is gated, so it answers with the
        // maintenance redirect while maintenance mode is on.
        .route("/health", get(|| async { "ok" }))
}
