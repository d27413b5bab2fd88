use proptest::prelude::*;
use telco_portal::{
    access::{
        AccessDecision, AuthErrorCode, RouteCategory, classify, decide, decide_resolved, is_gated,
        precheck,
        decision::auth_error_message,
        routes::{MatchKind, ROUTES},
    },
    auth::IdentityToken,
    config::MaintenanceFlag,
    errors::AppError,
    models::Role,
};

const OFF: MaintenanceFlag = MaintenanceFlag(false);
const ON: MaintenanceFlag = MaintenanceFlag(true);

fn user() -> IdentityToken {
    IdentityToken::new("1", Role::User)
}

fn admin() -> IdentityToken {
    IdentityToken::new("2", Role::Admin)
}

// --- Scenarios ---

#[test]
fn anonymous_dashboard_redirects_to_sign_in() {
    let decision = decide("/dashboard", OFF, None);

    assert_eq!(
        decision,
        AccessDecision::RedirectSignIn {
            return_path: "/dashboard".to_string()
        }
    );
    assert_eq!(
        decision.location().as_deref(),
        Some("/auth/signin?callbackUrl=%2Fdashboard")
    );
}

#[test]
fn user_role_on_admin_path_is_unauthorized() {
    let decision = decide("/admin/panel", OFF, Some(&user()));
    assert_eq!(decision, AccessDecision::RedirectUnauthorized);
    assert_eq!(decision.location().as_deref(), Some("/unauthorized"));
}

#[test]
fn maintenance_page_is_reachable_during_maintenance() {
    assert_eq!(decide("/maintenance", ON, None), AccessDecision::Allow);
}

#[test]
fn maintenance_overrides_public_exemption() {
    assert_eq!(decide("/auth/signin", ON, None), AccessDecision::RedirectMaintenance);
    assert_eq!(decide("/", ON, Some(&admin())), AccessDecision::RedirectMaintenance);
}

// --- Classification ---

#[test]
fn classify_flags_each_table() {
    let home = classify("/");
    assert!(home.is_public && !home.is_protected && !home.is_admin);

    let settings = classify("/settings/notifications");
    assert!(!settings.is_public && settings.is_protected && !settings.is_admin);

    let admin = classify("/admin/users");
    assert!(!admin.is_public && !admin.is_protected && admin.is_admin);

    assert!(classify("/_next/data/build.json").is_public);
    assert!(classify("/api/auth/session").is_public);
}

#[test]
fn every_route_pattern_classifies_under_its_category() {
    for route in ROUTES.iter().filter(|route| route.kind != MatchKind::Contains) {
        let classification = classify(route.pattern);
        let flagged = match route.category {
            RouteCategory::Public => classification.is_public,
            RouteCategory::Protected => classification.is_protected,
            RouteCategory::Admin => classification.is_admin,
        };
        assert!(flagged, "{} not classified as {:?}", route.pattern, route.category);
    }
}

#[test]
fn public_exact_paths_do_not_match_as_prefixes() {
    assert!(classify("/auth/signin").is_public);
    assert!(!classify("/auth/signin-later").is_public);
    assert!(!classify("/unauthorized/extra").is_public);
}

#[test]
fn dotted_path_under_protected_prefix_is_public() {
    let classification = classify("/dashboard/report.pdf");
    assert!(classification.is_public);
    assert!(classification.is_protected);

    assert_eq!(decide("/dashboard/report.pdf", OFF, None), AccessDecision::Allow);
}

#[test]
fn unlisted_path_is_allowed_for_anyone() {
    assert_eq!(decide("/about-us", OFF, None), AccessDecision::Allow);
}

#[test]
fn route_matcher_skips_api_and_assets_but_not_auth_endpoints() {
    assert!(!is_gated("/api/users"));
    assert!(!is_gated("/api/users/1"));
    assert!(!is_gated("/_next/static/chunk.js"));
    assert!(!is_gated("/_next/image"));
    assert!(!is_gated("/favicon.ico"));

    assert!(is_gated("/api/auth/session"));
    assert!(is_gated("/_next/data/x"));
    assert!(is_gated("/dashboard"));
    assert!(is_gated("/"));
}

// --- Admin and identity ---

#[test]
fn admin_role_is_allowed_everywhere_gated() {
    let token = admin();
    assert_eq!(decide("/admin", OFF, Some(&token)), AccessDecision::Allow);
    assert_eq!(decide("/dashboard", OFF, Some(&token)), AccessDecision::Allow);
}

#[test]
fn anonymous_admin_path_is_unauthorized() {
    assert_eq!(decide("/admin", OFF, None), AccessDecision::RedirectUnauthorized);
}

#[test]
fn precheck_defers_identity_dependent_paths() {
    assert_eq!(precheck("/dashboard", OFF), None);
    assert_eq!(precheck("/admin", OFF), None);
    assert_eq!(precheck("/auth/signup", OFF), Some(AccessDecision::Allow));
    assert_eq!(precheck("/dashboard", ON), Some(AccessDecision::RedirectMaintenance));
}

// --- Verification faults ---

#[test]
fn verification_fault_redirects_to_auth_error() {
    let fault = AppError::auth("signature backend unavailable");
    let decision = decide_resolved("/dashboard", OFF, Err(&fault));

    assert_eq!(
        decision,
        AccessDecision::RedirectAuthError {
            code: AuthErrorCode::Verification
        }
    );
    assert_eq!(decision.location().as_deref(), Some("/auth/error?error=Verification"));
}

#[test]
fn configuration_fault_carries_configuration_code() {
    let fault = AppError::configuration("no secret");
    assert_eq!(
        decide_resolved("/admin", OFF, Err(&fault)),
        AccessDecision::RedirectAuthError {
            code: AuthErrorCode::Configuration
        }
    );
}

#[test]
fn fault_is_ignored_when_identity_is_not_needed() {
    let fault = AppError::auth("down");
    assert_eq!(decide_resolved("/auth/signin", OFF, Err(&fault)), AccessDecision::Allow);
    assert_eq!(
        decide_resolved("/dashboard", ON, Err(&fault)),
        AccessDecision::RedirectMaintenance
    );
}

#[test]
fn auth_error_codes_resolve_to_messages() {
    assert_eq!(
        auth_error_message(Some("AccessDenied")),
        "Access denied. You do not have permission to sign in."
    );
    assert_eq!(
        auth_error_message(Some("NotACode")),
        "An unexpected authentication error occurred."
    );
    assert_eq!(auth_error_message(None), "An unexpected authentication error occurred.");

    for code in AuthErrorCode::ALL {
        assert_eq!(AuthErrorCode::parse(code.as_str()), Some(code));
    }
}

#[test]
fn return_path_is_url_encoded() {
    let decision = decide("/recommendations/plan a", OFF, None);
    assert_eq!(
        decision.location().as_deref(),
        Some("/auth/signin?callbackUrl=%2Frecommendations%2Fplan%20a")
    );
}

// --- Properties ---

fn any_token() -> impl Strategy<Value = Option<IdentityToken>> {
    prop_oneof![
        Just(None),
        Just(Some(IdentityToken::new("1", Role::User))),
        Just(Some(IdentityToken::new("2", Role::Admin))),
    ]
}

proptest! {
    #[test]
    fn maintenance_redirects_everything_but_its_page(path in "/[a-z_./]{0,24}", token in any_token()) {
        prop_assume!(path != "/maintenance");
        prop_assert_eq!(decide(&path, ON, token.as_ref()), AccessDecision::RedirectMaintenance);
    }

    #[test]
    fn non_admin_never_passes_admin_prefix(suffix in "[a-z/]{0,16}", anonymous in any::<bool>()) {
        let path = format!("/admin{suffix}");
        let token = (!anonymous).then(user);
        prop_assert_eq!(decide(&path, OFF, token.as_ref()), AccessDecision::RedirectUnauthorized);
    }

    #[test]
    fn anonymous_protected_path_returns_to_itself(
        prefix in prop::sample::select(vec!["/dashboard", "/profile", "/settings", "/recommendations"]),
        suffix in "[a-z/]{0,16}",
    ) {
        let path = format!("{prefix}{suffix}");
        prop_assert_eq!(
            decide(&path, OFF, None),
            AccessDecision::RedirectSignIn { return_path: path.clone() }
        );
    }

    #[test]
    fn public_paths_allow_regardless_of_identity(
        path in prop::sample::select(vec![
            "/", "/auth/signin", "/auth/signup", "/auth/error",
            "/not-found", "/unauthorized", "/maintenance",
        ]),
        token in any_token(),
    ) {
        prop_assert_eq!(decide(path, OFF, token.as_ref()), AccessDecision::Allow);
    }

    #[test]
    fn decision_is_deterministic(path in "/[a-z_./]{0,24}", token in any_token(), on in any::<bool>()) {
        let flag = MaintenanceFlag(on);
        prop_assert_eq!(decide(&path, flag, token.as_ref()), decide(&path, flag, token.as_ref()));
    }
}
