use std::sync::Arc;

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderValue, header};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};

use crate::{
    config::AppConfig,
    errors::AppError,
    models::{Role, SessionUser, User},
};

/// Name of the cookie carrying the session token.
pub const SESSION_COOKIE: &str = "session-token";

/// Claims
///
/// Payload of a session token. `role` is stamped at sign-in from the
/// account record and is what the access middleware authorizes against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the account id.
    pub sub: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub iat: usize,
    pub exp: usize,
}

/// IdentityToken
///
/// The verified identity of one request. Produced by a `TokenVerifier`,
/// consumed by the access decision and by page handlers, never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityToken {
    pub subject: String,
    pub role: Role,
    pub email: Option<String>,
    pub name: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl IdentityToken {
    pub fn new(subject: impl Into<String>, role: Role) -> Self {
        Self {
            subject: subject.into(),
            role,
            email: None,
            name: None,
            expires_at: None,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn session_user(&self) -> SessionUser {
        SessionUser {
            id: self.subject.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role,
        }
    }
}

impl From<Claims> for IdentityToken {
    fn from(claims: Claims) -> Self {
        let expires_at = i64::try_from(claims.exp)
            .ok()
            .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0));

        Self {
            subject: claims.sub,
            role: claims.role,
            email: claims.email,
            name: claims.name,
            expires_at,
        }
    }
}

/// TokenVerifier
///
/// Resolves the identity of a request from its headers.
///
/// * `Ok(None)`: no session, or a session token that is expired, forged or
///   malformed. The caller is anonymous.
/// * `Err(_)`: verification itself could not be performed. Callers must fail
///   closed on this outcome.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, headers: &HeaderMap) -> Result<Option<IdentityToken>, AppError>;
}

pub type TokenVerifierState = Arc<dyn TokenVerifier>;

/// Extracts the raw session token: the `Authorization: Bearer` header wins
/// over the session cookie.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, token)| token)
            .filter(|token| !token.is_empty())
    })
}

/// SessionKeys
///
/// Signs and verifies HS256 session tokens with the configured secret.
#[derive(Clone)]
pub struct SessionKeys {
    secret: Arc<Vec<u8>>,
    max_age: Duration,
}

impl SessionKeys {
    pub fn new(secret: impl Into<Vec<u8>>, max_age_hours: i64) -> Self {
        Self {
            secret: Arc::new(secret.into()),
            max_age: Duration::hours(max_age_hours),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.auth_secret.as_bytes(), config.session_max_age_hours)
    }

    /// Issues a session token for `user`, returning it with its expiry.
    ///
    /// # Errors
    /// `AppError::Configuration` when no secret is configured,
    /// `AppError::Internal` when signing fails.
    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>), AppError> {
        if !self.has_secret() {
            return Err(AppError::configuration("session secret is empty"));
        }

        let now = Utc::now();
        let expires = now + self.max_age;

        let claims = Claims {
            sub: user.id.clone(),
            role: user.role,
            email: Some(user.email.clone()),
            name: Some(user.name.clone()),
            iat: usize::try_from(now.timestamp()).unwrap_or_default(),
            exp: usize::try_from(expires.timestamp()).unwrap_or_default(),
        };

        let token = encode(&Header::default(), &claims, &EncodingKey::from_secret(&self.secret))
            .map_err(|err| AppError::internal(format!("failed to sign session token: {err}")))?;

        Ok((token, expires))
    }

    /// Decodes and validates `token` (signature and expiry).
    pub fn decode(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::default();
        validation.validate_exp = true;

        decode::<Claims>(token, &DecodingKey::from_secret(&self.secret), &validation)
            .map(|data| data.claims)
    }

    pub fn has_secret(&self) -> bool {
        !self.secret.is_empty()
    }

    /// `Set-Cookie` value carrying `token`.
    pub fn session_cookie(&self, token: &str) -> Result<HeaderValue, AppError> {
        let cookie = format!(
            "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            self.max_age.num_seconds()
        );
        HeaderValue::from_str(&cookie)
            .map_err(|err| AppError::internal(format!("invalid session cookie: {err}")))
    }

    /// `Set-Cookie` value that expires the session cookie.
    pub fn cleared_cookie() -> HeaderValue {
        HeaderValue::from_static("session-token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    }
}

/// JwtVerifier
///
/// The production `TokenVerifier`, backed by `SessionKeys`.
#[derive(Clone)]
pub struct JwtVerifier {
    keys: SessionKeys,
}

impl JwtVerifier {
    pub fn new(keys: SessionKeys) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl TokenVerifier for JwtVerifier {
    async fn verify(&self, headers: &HeaderMap) -> Result<Option<IdentityToken>, AppError> {
        let Some(token) = token_from_headers(headers) else {
            return Ok(None);
        };

        if !self.keys.has_secret() {
            return Err(AppError::configuration("session secret is empty"));
        }

        match self.keys.decode(token) {
            Ok(claims) => Ok(Some(IdentityToken::from(claims))),
            Err(err) => match err.kind() {
                // A bad or stale token is an anonymous caller, not a fault.
                ErrorKind::ExpiredSignature
                | ErrorKind::ImmatureSignature
                | ErrorKind::InvalidSignature
                | ErrorKind::InvalidToken
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::MissingRequiredClaim(_)
                | ErrorKind::Base64(_)
                | ErrorKind::Json(_)
                | ErrorKind::Utf8(_) => {
                    tracing::debug!(reason = %err, "session token rejected");
                    Ok(None)
                }
                _ => Err(AppError::auth(format!("token verification failed: {err}"))),
            },
        }
    }
}
