//! Page routing under the configured base path.

use serde::Serialize;

use crate::config::normalize_base_path;

/// A page of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Maps, lists and statistics.
    Home,
    /// Sign-in and sign-up.
    Auth,
    /// Anything else.
    NotFound,
}

/// Resolves paths to routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Router {
    base_path: String,
}

impl Router {
    /// A router for an app served under `base_path`.
    #[must_use]
    pub fn new(base_path: &str) -> Self {
        Self {
            base_path: normalize_base_path(base_path),
        }
    }

    /// The route for a request path. Query strings and fragments are
    /// ignored; paths outside the base path are `NotFound`.
    #[must_use]
    pub fn resolve(&self, path: &str) -> Route {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let Some(rest) = path
            .strip_prefix(&self.base_path)
            .or_else(|| (path == self.base_path.trim_end_matches('/')).then_some(""))
        else {
            return Route::NotFound;
        };
        match rest.trim_end_matches('/') {
            "" => Route::Home,
            "auth" => Route::Auth,
            _ => Route::NotFound,
        }
    }

    /// Path of a route.
    #[must_use]
    pub fn href(&self, route: Route) -> String {
        match route {
            Route::Home => self.base_path.clone(),
            Route::Auth => format!("{}auth", self.base_path),
            Route::NotFound => format!("{}404", self.base_path),
        }
    }
}
