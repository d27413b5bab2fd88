//! Route access control.
//!
//! `routes` classifies paths, `decision` turns a classification plus the
//! request identity into an `AccessDecision`, and `middleware` applies that
//! decision to live requests.

pub mod decision;
pub mod middleware;
pub mod routes;

pub use decision::{AccessDecision, AuthErrorCode, decide, decide_resolved, precheck};
pub use middleware::access_control;
pub use routes::{Classification, RouteCategory, RoutePattern, classify, is_gated};
