use std::env;

use crate::errors::AppError;

/// Fallback signing secret for local runs. Never accepted in production.
pub const LOCAL_AUTH_SECRET: &str = "super-secure-test-secret-value-local";

pub const DEFAULT_SESSION_MAX_AGE_HOURS: i64 = 24 * 30;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// AppConfig
///
/// Holds the application's entire configuration state. Loaded once at
/// startup and shared, immutable, through `AppState` (handlers pull it via
/// `FromRef`).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Controls the log format and secret fallback.
    pub env: Env,
    // Secret used to sign and verify session tokens.
    pub auth_secret: String,
    // Lifetime of an issued session token.
    pub session_max_age_hours: i64,
    // Process-wide maintenance switch, read on every gated request.
    pub maintenance: MaintenanceFlag,
    // Socket address the HTTP server binds to.
    pub bind_addr: String,
}

/// Env
///
/// Defines the runtime context.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

/// MaintenanceFlag
///
/// Set from `MAINTENANCE_MODE` at process start and never mutated afterwards.
/// It is handed to the access decision as a plain value.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct MaintenanceFlag(pub bool);

impl MaintenanceFlag {
    pub fn is_on(self) -> bool {
        self.0
    }
}

impl Default for AppConfig {
    /// Safe, non-panicking values for test setup.
    fn default() -> Self {
        Self {
            env: Env::Local,
            auth_secret: LOCAL_AUTH_SECRET.to_string(),
            session_max_age_hours: DEFAULT_SESSION_MAX_AGE_HOURS,
            maintenance: MaintenanceFlag(false),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Errors
    /// Fails with `AppError::Configuration` when `AUTH_SECRET` is missing in
    /// production, or when `SESSION_MAX_AGE_HOURS` is not a positive integer.
    pub fn load() -> Result<Self, AppError> {
        let env = match env::var("APP_ENV").as_deref() {
            Ok("production") => Env::Production,
            _ => Env::Local,
        };

        let auth_secret = match (env, env::var("AUTH_SECRET")) {
            (_, Ok(secret)) if !secret.is_empty() => secret,
            (Env::Production, _) => {
                return Err(AppError::configuration(
                    "AUTH_SECRET must be set in production",
                ));
            }
            (Env::Local, _) => LOCAL_AUTH_SECRET.to_string(),
        };

        let session_max_age_hours = match env::var("SESSION_MAX_AGE_HOURS") {
            Ok(raw) => raw
                .parse::<i64>()
                .ok()
                .filter(|hours| *hours > 0)
                .ok_or_else(|| {
                    AppError::configuration("SESSION_MAX_AGE_HOURS must be a positive integer")
                })?,
            Err(_) => DEFAULT_SESSION_MAX_AGE_HOURS,
        };

        let maintenance = MaintenanceFlag(
            env::var("MAINTENANCE_MODE")
                .map(|value| value == "true")
                .unwrap_or(false),
        );

        let bind_addr = env::var("APP_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            env,
            auth_secret,
            session_max_age_hours,
            maintenance,
            bind_addr,
        })
    }
}
