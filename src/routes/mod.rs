//! Router Module Index
//!
//! Page routes are split by the access category the middleware assigns to
//! them. The split only mirrors the route tables; enforcement happens in
//! `access::access_control`, which wraps the whole router.

/// Status pages reachable by anyone.
pub mod public;

/// Pages that require a verified session.
pub mod authenticated;

/// Pages that require the `admin` role.
pub mod admin;

/// JSON endpoints under `/api`.
pub mod api;
