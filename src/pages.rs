//! Status and member pages, rendered as plain HTML.

use axum::{
    Extension,
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
};
use serde::Deserialize;

use crate::{
    AppState,
    access::{decision::auth_error_message, routes::SIGN_IN_PATH},
    auth::IdentityToken,
    boundary::{BoundaryScope, ErrorBoundary, Rendered, html_escape},
    config::Env,
    errors::AppError,
    models::Role,
    session::{SessionMirror, SessionSnapshot},
};

pub const APP_NAME: &str = "Telco Recommendation";

pub struct Page {
    pub title: &'static str,
    pub body: String,
}

pub fn render_page(page: &Page) -> String {
    format!(
        "<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\"><title>{title} | {APP_NAME}</title></head>\
         <body><main><h1>{title}</h1>{body}</main></body></html>",
        title = page.title,
        body = page.body,
    )
}

fn html(title: &'static str, body: impl Into<String>) -> Html<String> {
    Html(render_page(&Page {
        title,
        body: body.into(),
    }))
}

/// Only same-site paths are followed back; anything else falls back to `/`.
fn safe_return_path(candidate: Option<&str>) -> &str {
    match candidate {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path,
        _ => "/",
    }
}

#[derive(Debug, Deserialize)]
pub struct SignInQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuthErrorQuery {
    pub error: Option<String>,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

// --- Public pages ---

pub async fn home() -> Html<String> {
    html(
        APP_NAME,
        "<p>A comprehensive platform for telecommunication service recommendations.</p>\
         <a href=\"/auth/signin\">Sign In</a> <a href=\"/auth/signup\">Sign Up</a> \
         <a href=\"/dashboard\">Dashboard</a>",
    )
}

pub async fn sign_in(Query(query): Query<SignInQuery>) -> Html<String> {
    let callback = safe_return_path(query.callback_url.as_deref());

    html(
        "Sign In",
        format!(
            "<form method=\"post\" action=\"/api/auth/signin\">\
             <input type=\"email\" name=\"email\"><input type=\"password\" name=\"password\">\
             <input type=\"hidden\" name=\"callbackUrl\" value=\"{}\">\
             <button type=\"submit\">Sign In</button></form>\
             <a href=\"/auth/signup\">Create an account</a>",
            html_escape(callback)
        ),
    )
}

pub async fn sign_up() -> Html<String> {
    html(
        "Sign Up",
        "<form method=\"post\" action=\"/api/auth/register\">\
         <input type=\"text\" name=\"name\"><input type=\"email\" name=\"email\">\
         <input type=\"password\" name=\"password\"><input type=\"password\" name=\"confirmPassword\">\
         <button type=\"submit\">Sign Up</button></form>\
         <a href=\"/auth/signin\">Already have an account?</a>",
    )
}

pub async fn auth_error(Query(query): Query<AuthErrorQuery>) -> Html<String> {
    let message = auth_error_message(query.error.as_deref());
    let back = safe_return_path(query.callback_url.as_deref());

    let mut body = format!("<p>{message}</p>");
    if let Some(code) = &query.error {
        body.push_str(&format!("<p>Error Code: {}</p>", html_escape(code)));
    }
    body.push_str(&format!(
        "<a href=\"{SIGN_IN_PATH}\">Try Sign In Again</a> <a href=\"{}\">Go Back</a>",
        html_escape(back)
    ));

    html("Authentication Error", body)
}

/// Also serves as the router fallback.
pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        html(
            "Page Not Found",
            "<p>404</p><p>The page you are looking for does not exist or has been moved.</p>\
             <a href=\"/\">Go to Homepage</a> <a href=\"/dashboard\">Go to Dashboard</a>",
        ),
    )
}

pub async fn unauthorized() -> Html<String> {
    html(
        "Access Denied",
        "<p>You don't have permission to access this page. Please sign in with an authorized account.</p>\
         <a href=\"/auth/signin\">Sign In</a> <a href=\"/\">Go to Homepage</a>",
    )
}

pub async fn maintenance() -> Html<String> {
    html(
        "Under Maintenance",
        "<p>We're currently performing scheduled maintenance to improve your experience. \
         We'll be back shortly!</p><p>Estimated completion: 30 minutes</p>\
         <a href=\"/maintenance\">Check Again</a>",
    )
}

// --- Member pages ---

/// Renders a gated page for the identity stored by the access middleware.
/// Failures are contained by a local boundary.
fn member_page(
    state: &AppState,
    title: &'static str,
    required: &[Role],
    identity: Option<&IdentityToken>,
    content: impl FnOnce(&str) -> String,
) -> Rendered<Html<String>> {
    let mut boundary = ErrorBoundary::new(BoundaryScope::Local, state.config.env == Env::Local);

    boundary.run(|| {
        let mut mirror = SessionMirror::new();
        mirror.reconcile(&SessionSnapshot::from_identity(identity));
        let auth = mirror.state();

        let user = auth
            .user
            .ok_or_else(|| AppError::auth("gated page rendered without a session user"))?;
        if !user.role.is_any_of(required) {
            return Err(AppError::auth("session role does not match the page"));
        }

        let display = user.name.as_deref().or(user.email.as_deref()).unwrap_or(&user.id);
        let greeting = format!(
            "<p>Signed in as {} ({})</p>",
            html_escape(display),
            user.role.as_str()
        );

        Ok(html(title, greeting + &content(display)))
    })
}

const MEMBERS: &[Role] = &[Role::User, Role::Admin];

pub async fn dashboard(
    State(state): State<AppState>,
    identity: Option<Extension<IdentityToken>>,
) -> Rendered<Html<String>> {
    let identity = identity.map(|Extension(token)| token);
    member_page(&state, "Dashboard", MEMBERS, identity.as_ref(), |name| {
        format!(
            "<p>Welcome back, {}!</p><a href=\"/recommendations\">Recommendations</a> \
             <a href=\"/profile\">Profile</a> <a href=\"/settings\">Settings</a>",
            html_escape(name)
        )
    })
}

pub async fn profile(
    State(state): State<AppState>,
    identity: Option<Extension<IdentityToken>>,
) -> Rendered<Html<String>> {
    let identity = identity.map(|Extension(token)| token);
    let email = identity
        .as_ref()
        .and_then(|token| token.email.clone())
        .unwrap_or_default();
    member_page(&state, "Profile", MEMBERS, identity.as_ref(), |_| {
        format!("<p>Email: {}</p>", html_escape(&email))
    })
}

pub async fn settings(
    State(state): State<AppState>,
    identity: Option<Extension<IdentityToken>>,
) -> Rendered<Html<String>> {
    let identity = identity.map(|Extension(token)| token);
    member_page(&state, "Settings", MEMBERS, identity.as_ref(), |_| {
        "<p>Account settings</p>".to_string()
    })
}

pub async fn recommendations(
    State(state): State<AppState>,
    identity: Option<Extension<IdentityToken>>,
) -> Rendered<Html<String>> {
    let identity = identity.map(|Extension(token)| token);
    member_page(&state, "Recommendations", MEMBERS, identity.as_ref(), |_| {
        "<p>Your telecommunication service recommendations.</p>".to_string()
    })
}

pub async fn admin(
    State(state): State<AppState>,
    identity: Option<Extension<IdentityToken>>,
) -> Rendered<Html<String>> {
    let identity = identity.map(|Extension(token)| token);
    member_page(&state, "Admin Panel", &[Role::Admin], identity.as_ref(), |_| {
        "<p>Administration</p><a href=\"/swagger-ui\">API documentation</a>".to_string()
    })
}
