use std::any::Any;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::IntoResponse,
    routing::get,
};
use telco_portal::boundary::{
    BoundaryScope, BoundaryState, ErrorBoundary, RecoveryAction, Rendered, handle_panic,
    panic_message,
};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

#[test]
fn renders_content_while_ok() {
    let boundary: ErrorBoundary<String> = ErrorBoundary::new(BoundaryScope::Local, false);

    assert_eq!(boundary.render(|| 7), Rendered::Content(7));
    assert_eq!(boundary.state(), &BoundaryState::Ok);
}

#[test]
fn captured_error_switches_to_fallback_until_reset() {
    let mut boundary = ErrorBoundary::new(BoundaryScope::Local, false);
    boundary.capture("render failed".to_string());

    assert!(boundary.has_failed());
    let Rendered::Fallback(view) = boundary.render(|| 7) else {
        panic!("expected fallback");
    };
    assert_eq!(view.title, "Oops! Something went wrong");
    assert_eq!(view.action, RecoveryAction::TryAgain);
    assert!(view.details.is_none());

    boundary.reset();
    assert_eq!(boundary.render(|| 7), Rendered::Content(7));
}

#[test]
fn run_captures_failures() {
    let mut boundary = ErrorBoundary::new(BoundaryScope::Local, true);
    let rendered = boundary.run(|| Err::<i32, _>("boom".to_string()));

    let Rendered::Fallback(view) = rendered else {
        panic!("expected fallback");
    };
    assert_eq!(view.details.as_deref(), Some("boom"));
    assert_eq!(boundary.state(), &BoundaryState::Failed("boom".to_string()));

    // Stays failed; the closure is not retried.
    let rendered = boundary.run(|| Ok::<i32, String>(1));
    assert!(matches!(rendered, Rendered::Fallback(_)));
}

#[test]
fn global_scope_offers_reload() {
    let mut boundary = ErrorBoundary::new(BoundaryScope::Global, false);
    boundary.capture("fatal".to_string());

    let Rendered::Fallback(view) = boundary.render(|| ()) else {
        panic!("expected fallback");
    };
    assert_eq!(view.title, "Application Error");
    assert_eq!(view.action, RecoveryAction::Reload);
}

#[tokio::test]
async fn fallback_view_is_a_500_page() {
    let mut boundary = ErrorBoundary::new(BoundaryScope::Local, true);
    let response = boundary
        .run(|| Err::<&str, _>("<b>bad</b>".to_string()))
        .into_response();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8_lossy(&bytes);
    assert!(body.contains("Try Again"));
    assert!(body.contains("&lt;b&gt;bad&lt;/b&gt;"));
}

#[test]
fn panic_payloads_are_readable() {
    let owned: Box<dyn Any + Send> = Box::new("owned".to_string());
    let borrowed: Box<dyn Any + Send> = Box::new("borrowed");
    let other: Box<dyn Any + Send> = Box::new(3_u8);

    assert_eq!(panic_message(owned.as_ref()), "owned");
    assert_eq!(panic_message(borrowed.as_ref()), "borrowed");
    assert_eq!(panic_message(other.as_ref()), "unknown panic");
}

async fn explode() -> &'static str {
    panic!("handler exploded")
}

#[tokio::test]
async fn panicking_handler_renders_global_fallback() {
    let app: Router = Router::new()
        .route("/boom", get(explode))
        .layer(CatchPanicLayer::custom(|payload: Box<dyn Any + Send + 'static>| {
            handle_panic(payload, false)
        }));

    let response = app
        .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = String::from_utf8_lossy(&bytes);
    assert!(body.contains("Application Error"));
    assert!(body.contains("Reload Application"));
    assert!(!body.contains("handler exploded"));
}
