use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use crate::AppState;

use super::{
    decision::{decide_resolved, precheck},
    routes::is_gated,
};

/// access_control
///
/// Gate applied to every page route. Requests outside the route matcher are
/// passed through untouched. Otherwise the maintenance flag and the public
/// table are consulted first, and the token verifier is only called when the
/// decision depends on the caller's identity.
///
/// On `Allow` with a verified identity, the `IdentityToken` is stored in the
/// request extensions for the page handlers.
pub async fn access_control(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();

    if !is_gated(&path) {
        return next.run(request).await;
    }

    let maintenance = state.config.maintenance;

    let (decision, identity) = match precheck(&path, maintenance) {
        Some(decision) => (decision, None),
        None => {
            let headers = request.headers().clone();
            let resolution = state.verifier.verify(&headers).await;
            if let Err(fault) = &resolution {
                tracing::error!(path = %path, error = %fault, "session verification failed");
            }
            let decision = decide_resolved(&path, maintenance, resolution.as_ref().map(Option::as_ref));
            (decision, resolution.ok().flatten())
        }
    };

    tracing::debug!(
        path = %path,
        decision = ?decision,
        subject = identity.as_ref().map(|token| token.subject.as_str()),
        "access decision"
    );

    match decision.location() {
        None => {
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Some(location) => Redirect::temporary(&location).into_response(),
    }
}
