//! Route classification.
//!
//! Maps a request path onto the three access categories. The tables are
//! static; classification is a pure function of the path.

pub const HOME_PATH: &str = "/";
pub const SIGN_IN_PATH: &str = "/auth/signin";
pub const SIGN_UP_PATH: &str = "/auth/signup";
pub const AUTH_ERROR_PATH: &str = "/auth/error";
pub const NOT_FOUND_PATH: &str = "/not-found";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const MAINTENANCE_PATH: &str = "/maintenance";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteCategory {
    Public,
    Protected,
    Admin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    Exact,
    Prefix,
    /// Substring match, used for the static-file heuristic.
    Contains,
}

/// RoutePattern
///
/// An immutable path pattern tagged with the category it grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutePattern {
    pub pattern: &'static str,
    pub kind: MatchKind,
    pub category: RouteCategory,
}

impl RoutePattern {
    pub const fn exact(pattern: &'static str, category: RouteCategory) -> Self {
        Self { pattern, kind: MatchKind::Exact, category }
    }

    pub const fn prefix(pattern: &'static str, category: RouteCategory) -> Self {
        Self { pattern, kind: MatchKind::Prefix, category }
    }

    pub const fn contains(pattern: &'static str, category: RouteCategory) -> Self {
        Self { pattern, kind: MatchKind::Contains, category }
    }

    pub fn matches(&self, path: &str) -> bool {
        match self.kind {
            MatchKind::Exact => path == self.pattern,
            MatchKind::Prefix => path.starts_with(self.pattern),
            MatchKind::Contains => path.contains(self.pattern),
        }
    }
}

/// Every classified pattern. A path may match patterns of several categories.
pub const ROUTES: &[RoutePattern] = &[
    RoutePattern::exact(HOME_PATH, RouteCategory::Public),
    RoutePattern::exact(SIGN_IN_PATH, RouteCategory::Public),
    RoutePattern::exact(SIGN_UP_PATH, RouteCategory::Public),
    RoutePattern::exact(AUTH_ERROR_PATH, RouteCategory::Public),
    RoutePattern::exact(NOT_FOUND_PATH, RouteCategory::Public),
    RoutePattern::exact(UNAUTHORIZED_PATH, RouteCategory::Public),
    RoutePattern::exact(MAINTENANCE_PATH, RouteCategory::Public),
    // Internal build assets.
    RoutePattern::prefix("/_next", RouteCategory::Public),
    // Auth callbacks and session endpoints.
    RoutePattern::prefix("/api/auth", RouteCategory::Public),
    // Anything with a dot is treated as a static file, even under a gated prefix.
    RoutePattern::contains(".", RouteCategory::Public),
    RoutePattern::prefix("/dashboard", RouteCategory::Protected),
    RoutePattern::prefix("/profile", RouteCategory::Protected),
    RoutePattern::prefix("/settings", RouteCategory::Protected),
    RoutePattern::prefix("/recommendations", RouteCategory::Protected),
    RoutePattern::prefix("/admin", RouteCategory::Admin),
];

/// Classification
///
/// Category flags of one path. The flags may overlap; precedence between
/// them belongs to the access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_public: bool,
    pub is_protected: bool,
    pub is_admin: bool,
}

fn matches_category(path: &str, category: RouteCategory) -> bool {
    ROUTES
        .iter()
        .filter(|route| route.category == category)
        .any(|route| route.matches(path))
}

/// `path` is a normalized URL path, without query string.
pub fn classify(path: &str) -> Classification {
    Classification {
        is_public: matches_category(path, RouteCategory::Public),
        is_protected: matches_category(path, RouteCategory::Protected),
        is_admin: matches_category(path, RouteCategory::Admin),
    }
}

/// Prefixes (after the leading slash) of paths that never reach the access
/// middleware.
const EXCLUDED_PREFIXES: &[&str] = &["api", "_next/static", "_next/image", "favicon.ico"];

/// is_gated
///
/// The route matcher in front of the classifier. API routes other than the
/// auth endpoints, build assets and the favicon are passed straight through.
pub fn is_gated(path: &str) -> bool {
    let rest = path.strip_prefix('/').unwrap_or(path);

    if rest.starts_with("api/auth") {
        return true;
    }

    !EXCLUDED_PREFIXES.iter().any(|prefix| rest.starts_with(prefix))
}
