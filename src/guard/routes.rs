use once_cell::sync::Lazy;
use tracing::warn;

use crate::auth::{has_role, Identity, Role};
use crate::config::{self, RouteConfig};

/// One row of the route-protection table.
#[derive(Debug, Clone)]
pub struct ProtectedRouteEntry {
    pub prefix: String,
    pub min_role: Role,
}

/// Outcome of a route guard decision. Navigation itself is performed by the
/// caller; this is a pure value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    Redirect(String),
}

/// Immutable route-protection tables, built once from config (or by hand in
/// tests) and passed into the guard explicitly.
#[derive(Debug, Clone)]
pub struct RouteTable {
    protected: Vec<ProtectedRouteEntry>,
    auth_pages: Vec<String>,
    login_path: String,
    default_landing: String,
}

impl RouteTable {
    pub fn new(
        protected: Vec<ProtectedRouteEntry>,
        auth_pages: Vec<String>,
        login_path: impl Into<String>,
        default_landing: impl Into<String>,
    ) -> Self {
        Self {
            protected,
            auth_pages,
            login_path: login_path.into(),
            default_landing: default_landing.into(),
        }
    }

    /// Build the table from raw config strings. Entries with an invalid
    /// minimum role are dropped with a warning rather than silently granted.
    pub fn from_config(routes: &RouteConfig) -> Self {
        let protected = routes
            .protected
            .iter()
            .filter_map(|(prefix, role)| match Role::parse(role) {
                Some(min_role) => Some(ProtectedRouteEntry {
                    prefix: prefix.clone(),
                    min_role,
                }),
                None => {
                    warn!("Dropping protected route {}: unknown role '{}'", prefix, role);
                    None
                }
            })
            .collect();

        Self {
            protected,
            auth_pages: routes.auth_pages.clone(),
            login_path: routes.login_path.clone(),
            default_landing: routes.default_landing.clone(),
        }
    }

    /// Longest-prefix match over the protected table. Length ties resolve to
    /// the first-declared entry, deterministically. No match means the path
    /// is public.
    pub fn match_route(&self, path: &str) -> Option<&ProtectedRouteEntry> {
        let mut best: Option<&ProtectedRouteEntry> = None;
        for entry in &self.protected {
            if path.starts_with(&entry.prefix) {
                let longer = match best {
                    Some(current) => entry.prefix.len() > current.prefix.len(),
                    None => true,
                };
                if longer {
                    best = Some(entry);
                }
            }
        }
        best
    }

    /// Pure allow/redirect decision for a request path and optional identity.
    pub fn decide(&self, identity: Option<&Identity>, path: &str) -> RouteDecision {
        // Pages meant only for unauthenticated visitors bounce signed-in
        // users to the landing page.
        if self.auth_pages.iter().any(|p| p == path) && identity.is_some() {
            return RouteDecision::Redirect(self.default_landing.clone());
        }

        let Some(entry) = self.match_route(path) else {
            return RouteDecision::Allow;
        };

        match identity {
            None => RouteDecision::Redirect(self.login_path.clone()),
            Some(identity) if !has_role(&identity.role, entry.min_role) => {
                RouteDecision::Redirect(self.default_landing.clone())
            }
            Some(_) => RouteDecision::Allow,
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn default_landing(&self) -> &str {
        &self.default_landing
    }
}

// Table built once at startup from the config singleton.
static ROUTES: Lazy<RouteTable> = Lazy::new(|| RouteTable::from_config(&config::config().routes));

pub fn routes() -> &'static RouteTable {
    &ROUTES
}
