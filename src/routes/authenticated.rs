use crate::{AppState, pages};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// Member pages. The access middleware redirects anonymous callers to the
/// sign-in page with a `callbackUrl`, and stores the verified
/// `IdentityToken` in the request extensions for the handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(pages::dashboard))
        .route("/profile", get(pages::profile))
        .route("/settings", get(pages::settings))
        .route("/recommendations", get(pages::recommendations))
}
