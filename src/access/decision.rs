//! The authorization decision.
//!
//! Given a path, the maintenance flag and the verified identity (if any),
//! produce exactly one `AccessDecision`. Evaluation order is fixed:
//!
//! 1. maintenance (everything but the maintenance page),
//! 2. public routes,
//! 3. protected routes without identity,
//! 4. admin routes without an admin identity,
//! 5. allow.
//!
//! Nothing here performs I/O or reads global state.

use crate::{
    auth::IdentityToken,
    config::MaintenanceFlag,
    errors::AppError,
    models::Role,
};

use super::routes::{
    AUTH_ERROR_PATH, MAINTENANCE_PATH, SIGN_IN_PATH, UNAUTHORIZED_PATH, classify,
};

/// AuthErrorCode
///
/// Error codes understood by the auth error page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorCode {
    Configuration,
    AccessDenied,
    Verification,
    Default,
    Signin,
    OAuthSignin,
    OAuthCallback,
    OAuthCreateAccount,
    EmailCreateAccount,
    Callback,
    OAuthAccountNotLinked,
    EmailSignin,
    CredentialsSignin,
    SessionRequired,
}

impl AuthErrorCode {
    pub const ALL: [AuthErrorCode; 14] = [
        AuthErrorCode::Configuration,
        AuthErrorCode::AccessDenied,
        AuthErrorCode::Verification,
        AuthErrorCode::Default,
        AuthErrorCode::Signin,
        AuthErrorCode::OAuthSignin,
        AuthErrorCode::OAuthCallback,
        AuthErrorCode::OAuthCreateAccount,
        AuthErrorCode::EmailCreateAccount,
        AuthErrorCode::Callback,
        AuthErrorCode::OAuthAccountNotLinked,
        AuthErrorCode::EmailSignin,
        AuthErrorCode::CredentialsSignin,
        AuthErrorCode::SessionRequired,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthErrorCode::Configuration => "Configuration",
            AuthErrorCode::AccessDenied => "AccessDenied",
            AuthErrorCode::Verification => "Verification",
            AuthErrorCode::Default => "Default",
            AuthErrorCode::Signin => "Signin",
            AuthErrorCode::OAuthSignin => "OAuthSignin",
            AuthErrorCode::OAuthCallback => "OAuthCallback",
            AuthErrorCode::OAuthCreateAccount => "OAuthCreateAccount",
            AuthErrorCode::EmailCreateAccount => "EmailCreateAccount",
            AuthErrorCode::Callback => "Callback",
            AuthErrorCode::OAuthAccountNotLinked => "OAuthAccountNotLinked",
            AuthErrorCode::EmailSignin => "EmailSignin",
            AuthErrorCode::CredentialsSignin => "CredentialsSignin",
            AuthErrorCode::SessionRequired => "SessionRequired",
        }
    }

    pub fn parse(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|candidate| candidate.as_str() == code)
    }

    pub fn message(&self) -> &'static str {
        match self {
            AuthErrorCode::Configuration => "There is a problem with the server configuration.",
            AuthErrorCode::AccessDenied => "Access denied. You do not have permission to sign in.",
            AuthErrorCode::Verification => {
                "The verification token has expired or has already been used."
            }
            AuthErrorCode::Default => "An error occurred during authentication.",
            AuthErrorCode::Signin => "Error occurred while trying to sign in.",
            AuthErrorCode::OAuthSignin => "Error in constructing an authorization URL.",
            AuthErrorCode::OAuthCallback => "Error in handling the response from an OAuth provider.",
            AuthErrorCode::OAuthCreateAccount => "Could not create OAuth account in the database.",
            AuthErrorCode::EmailCreateAccount => "Could not create email account in the database.",
            AuthErrorCode::Callback => "Error in the OAuth callback handler route.",
            AuthErrorCode::OAuthAccountNotLinked => {
                "Email on the account is already linked, but not with this OAuth account."
            }
            AuthErrorCode::EmailSignin => "Sending the e-mail with the verification token failed.",
            AuthErrorCode::CredentialsSignin => {
                "The authorize callback returned null in the Credentials provider."
            }
            AuthErrorCode::SessionRequired => {
                "The content of this page requires you to be signed in at all times."
            }
        }
    }

    /// Code reported for a fault raised while verifying a session.
    pub fn for_fault(fault: &AppError) -> Self {
        match fault {
            AppError::Configuration(_) => AuthErrorCode::Configuration,
            AppError::Auth(_) => AuthErrorCode::Verification,
            _ => AuthErrorCode::Default,
        }
    }
}

/// Message shown for an arbitrary `?error=` value; unknown codes get a generic text.
pub fn auth_error_message(code: Option<&str>) -> &'static str {
    code.and_then(AuthErrorCode::parse)
        .map(|code| code.message())
        .unwrap_or("An unexpected authentication error occurred.")
}

/// AccessDecision
///
/// The single outcome of evaluating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allow,
    RedirectSignIn { return_path: String },
    RedirectUnauthorized,
    RedirectMaintenance,
    /// Session verification failed; never downgraded to anonymous.
    RedirectAuthError { code: AuthErrorCode },
}

impl AccessDecision {
    /// Redirect target, or `None` for `Allow`.
    pub fn location(&self) -> Option<String> {
        match self {
            AccessDecision::Allow => None,
            AccessDecision::RedirectSignIn { return_path } => Some(format!(
                "{SIGN_IN_PATH}?callbackUrl={}",
                urlencoding::encode(return_path)
            )),
            AccessDecision::RedirectUnauthorized => Some(UNAUTHORIZED_PATH.to_string()),
            AccessDecision::RedirectMaintenance => Some(MAINTENANCE_PATH.to_string()),
            AccessDecision::RedirectAuthError { code } => {
                Some(format!("{AUTH_ERROR_PATH}?error={}", code.as_str()))
            }
        }
    }
}

/// precheck
///
/// Steps 1 and 2: the outcomes that do not depend on identity. `None` means
/// the identity has to be resolved before a decision can be made.
pub fn precheck(path: &str, maintenance: MaintenanceFlag) -> Option<AccessDecision> {
    if maintenance.is_on() && path != MAINTENANCE_PATH {
        return Some(AccessDecision::RedirectMaintenance);
    }

    if classify(path).is_public {
        return Some(AccessDecision::Allow);
    }

    None
}

/// decide
///
/// Full evaluation for an already resolved identity.
pub fn decide(
    path: &str,
    maintenance: MaintenanceFlag,
    token: Option<&IdentityToken>,
) -> AccessDecision {
    if let Some(decision) = precheck(path, maintenance) {
        return decision;
    }

    let classification = classify(path);

    if classification.is_protected && token.is_none() {
        return AccessDecision::RedirectSignIn {
            return_path: path.to_string(),
        };
    }

    let is_admin = token.is_some_and(|token| token.role == Role::Admin);
    if classification.is_admin && !is_admin {
        return AccessDecision::RedirectUnauthorized;
    }

    AccessDecision::Allow
}

/// decide_resolved
///
/// Like `decide`, but takes the raw verifier outcome. A verification fault
/// only matters once the identity is actually needed; it then yields
/// `RedirectAuthError`.
pub fn decide_resolved(
    path: &str,
    maintenance: MaintenanceFlag,
    resolution: Result<Option<&IdentityToken>, &AppError>,
) -> AccessDecision {
    if let Some(decision) = precheck(path, maintenance) {
        return decision;
    }

    match resolution {
        Ok(token) => decide(path, maintenance, token),
        Err(fault) => AccessDecision::RedirectAuthError {
            code: AuthErrorCode::for_fault(fault),
        },
    }
}
