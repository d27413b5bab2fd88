use telco_portal::{
    auth::IdentityToken,
    models::{Role, SessionUser},
    session::{SessionMirror, SessionSnapshot, SessionStatus},
};

fn jane() -> SessionUser {
    SessionUser {
        id: "2".to_string(),
        email: Some("jane@example.com".to_string()),
        name: Some("Jane Smith".to_string()),
        role: Role::Admin,
    }
}

#[test]
fn starts_loading_without_user() {
    let state = SessionMirror::new().state();

    assert!(state.is_loading);
    assert!(!state.is_authenticated);
    assert!(state.user.is_none());
    assert!(state.error.is_none());
}

#[test]
fn authenticated_status_with_user_signs_in() {
    let mut mirror = SessionMirror::new();
    mirror.reconcile(&SessionSnapshot::authenticated(jane()));

    let state = mirror.state();
    assert!(state.is_authenticated);
    assert!(!state.is_loading);
    assert_eq!(state.user, Some(jane()));
}

#[test]
fn unauthenticated_status_signs_out() {
    let mut mirror = SessionMirror::new();
    mirror.reconcile(&SessionSnapshot::authenticated(jane()));
    mirror.reconcile(&SessionSnapshot::unauthenticated());

    let state = mirror.state();
    assert!(!state.is_authenticated);
    assert!(!state.is_loading);
    assert!(state.user.is_none());
}

#[test]
fn authenticated_status_without_user_keeps_state() {
    let mut mirror = SessionMirror::new();
    mirror.reconcile(&SessionSnapshot::unauthenticated());
    mirror.reconcile(&SessionSnapshot {
        status: SessionStatus::Authenticated,
        user: None,
    });

    let state = mirror.state();
    assert!(!state.is_authenticated);
    assert!(!state.is_loading);
}

#[test]
fn loading_status_keeps_user_but_reports_loading() {
    let mut mirror = SessionMirror::new();
    mirror.reconcile(&SessionSnapshot::authenticated(jane()));
    mirror.reconcile(&SessionSnapshot::loading());

    let state = mirror.state();
    assert!(state.is_loading);
    assert_eq!(state.user, Some(jane()));
}

#[test]
fn repeated_snapshot_is_idempotent() {
    let mut mirror = SessionMirror::new();
    let snapshot = SessionSnapshot::authenticated(jane());

    mirror.reconcile(&snapshot);
    let first = mirror.state();
    mirror.reconcile(&snapshot);

    assert_eq!(mirror.state(), first);
}

#[test]
fn errors_are_recorded_and_cleared_on_transition() {
    let mut mirror = SessionMirror::new();
    mirror.reconcile(&SessionSnapshot::authenticated(jane()));
    mirror.record_error("session endpoint unreachable");

    let state = mirror.state();
    assert_eq!(state.error.as_deref(), Some("session endpoint unreachable"));
    assert!(state.is_authenticated);

    mirror.reconcile(&SessionSnapshot::unauthenticated());
    assert!(mirror.state().error.is_none());
}

#[test]
fn snapshot_from_identity() {
    let token = IdentityToken::new("9", Role::User);
    let snapshot = SessionSnapshot::from_identity(Some(&token));

    assert_eq!(snapshot.status, SessionStatus::Authenticated);
    assert_eq!(snapshot.user.map(|u| u.id), Some("9".to_string()));

    assert_eq!(
        SessionSnapshot::from_identity(None).status,
        SessionStatus::Unauthenticated
    );
}

#[test]
fn auth_state_serializes_camel_case() {
    let mut mirror = SessionMirror::new();
    mirror.reconcile(&SessionSnapshot::authenticated(jane()));

    let json = serde_json::to_value(mirror.state()).unwrap();
    assert_eq!(json["isAuthenticated"], true);
    assert_eq!(json["isLoading"], false);
    assert_eq!(json["user"]["role"], "admin");
}
