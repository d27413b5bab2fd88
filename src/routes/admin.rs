use crate::{AppState, pages};
use axum::{Router, routing::get};

/// Admin Router Module
///
/// Only reached by sessions carrying the `admin` role; everyone else,
/// anonymous callers included, is redirected to `/unauthorized` before the
/// handler runs.
pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin", get(pages::admin))
}
