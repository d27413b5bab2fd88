//! Error boundaries.
//!
//! An `ErrorBoundary` is a two-state machine, `Ok` or `Failed(error)`. While
//! `Ok` it renders its content; once a fault is captured it renders a
//! fallback until `reset` is called. The local boundary wraps page
//! rendering and offers "Try again"; the global boundary sits at the top of
//! the HTTP stack (a panic catcher) and offers a full reload.

use std::{any::Any, fmt::Display};

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::pages::{Page, render_page};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryScope {
    /// Wraps a single page.
    Local,
    /// Wraps the whole application, including the local boundaries.
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryAction {
    TryAgain,
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryState<E> {
    Ok,
    Failed(E),
}

/// FallbackView
///
/// What a failed boundary renders instead of its content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackView {
    pub scope: BoundaryScope,
    pub title: &'static str,
    pub message: String,
    /// Error detail, only populated when details are enabled (local runs).
    pub details: Option<String>,
    pub action: RecoveryAction,
}

/// Output of `ErrorBoundary::render`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rendered<T> {
    Content(T),
    Fallback(FallbackView),
}

impl<T: IntoResponse> IntoResponse for Rendered<T> {
    fn into_response(self) -> Response {
        match self {
            Rendered::Content(content) => content.into_response(),
            Rendered::Fallback(view) => view.into_response(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ErrorBoundary<E> {
    scope: BoundaryScope,
    state: BoundaryState<E>,
    show_details: bool,
}

impl<E: Display> ErrorBoundary<E> {
    pub fn new(scope: BoundaryScope, show_details: bool) -> Self {
        Self {
            scope,
            state: BoundaryState::Ok,
            show_details,
        }
    }

    pub fn state(&self) -> &BoundaryState<E> {
        &self.state
    }

    pub fn has_failed(&self) -> bool {
        matches!(self.state, BoundaryState::Failed(_))
    }

    /// Moves the boundary to `Failed(error)`. A later capture replaces the
    /// stored error.
    pub fn capture(&mut self, error: E) {
        tracing::error!(scope = ?self.scope, error = %error, "error caught by boundary");
        self.state = BoundaryState::Failed(error);
    }

    /// Back to `Ok`; the next render shows content again.
    pub fn reset(&mut self) {
        self.state = BoundaryState::Ok;
    }

    /// Renders `content` while `Ok`, the fallback view while `Failed`.
    pub fn render<T>(&self, content: impl FnOnce() -> T) -> Rendered<T> {
        match &self.state {
            BoundaryState::Ok => Rendered::Content(content()),
            BoundaryState::Failed(error) => Rendered::Fallback(self.fallback(error)),
        }
    }

    /// Runs a fallible render: a failure is captured and the fallback
    /// rendered in place of the content.
    pub fn run<T>(&mut self, render: impl FnOnce() -> Result<T, E>) -> Rendered<T> {
        if let BoundaryState::Failed(error) = &self.state {
            return Rendered::Fallback(self.fallback(error));
        }

        match render() {
            Ok(content) => Rendered::Content(content),
            Err(error) => {
                let view = self.fallback(&error);
                self.capture(error);
                Rendered::Fallback(view)
            }
        }
    }

    fn fallback(&self, error: &E) -> FallbackView {
        let details = self.show_details.then(|| error.to_string());

        match self.scope {
            BoundaryScope::Local => FallbackView {
                scope: self.scope,
                title: "Oops! Something went wrong",
                message: "We encountered an unexpected error. Please try again.".to_string(),
                details,
                action: RecoveryAction::TryAgain,
            },
            BoundaryScope::Global => FallbackView {
                scope: self.scope,
                title: "Application Error",
                message: "A critical error occurred and the application needs to be restarted."
                    .to_string(),
                details,
                action: RecoveryAction::Reload,
            },
        }
    }
}

impl IntoResponse for FallbackView {
    fn into_response(self) -> Response {
        let action = match self.action {
            RecoveryAction::TryAgain => r#"<a href="" data-action="try-again">Try Again</a>"#,
            RecoveryAction::Reload => {
                r#"<a href="" data-action="reload" onclick="window.location.reload()">Reload Application</a>"#
            }
        };

        let mut body = format!("<p>{}</p>", html_escape(&self.message));
        if let Some(details) = &self.details {
            body.push_str(&format!(
                "<details><summary>Error Details (Development)</summary><pre>{}</pre></details>",
                html_escape(details)
            ));
        }
        body.push_str(action);
        body.push_str(r#"<a href="/">Go to Homepage</a>"#);

        let page = Page {
            title: self.title,
            body,
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Html(render_page(&page))).into_response()
    }
}

pub(crate) fn html_escape(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Message carried by a panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else {
        "unknown panic".to_string()
    }
}

/// handle_panic
///
/// The global boundary. Installed through `CatchPanicLayer::custom`; a panic
/// in any handler or layer below it becomes the global fallback page.
pub fn handle_panic(payload: Box<dyn Any + Send + 'static>, show_details: bool) -> Response {
    let mut boundary = ErrorBoundary::new(BoundaryScope::Global, show_details);
    boundary.capture(panic_message(payload.as_ref()));
    boundary.render(|| ()).into_response()
}
