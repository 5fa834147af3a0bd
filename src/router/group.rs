//! Route groups: register related routes under a common prefix with shared
//! defaults, hostname, and before-match predicate, then mount them into a
//! router in one step.

use std::sync::Arc;

use http::Method;

use crate::errors::RouterError;

use super::route::{PathSpec, PathTarget, Route};

type BeforeMatch = Arc<dyn Fn(&str, &Route) -> bool>;

/// A group of routes sharing a prefix and common settings.
///
/// Routes added to a group carry a placeholder id; the router assigns real
/// ids when the group is mounted, keeping ids unique per router.
#[derive(Default)]
pub struct RouteGroup {
    prefix: Option<String>,
    paths: Vec<(String, PathTarget)>,
    hostname: Option<String>,
    before_match: Option<BeforeMatch>,
    routes: Vec<Route>,
}

impl RouteGroup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a group whose paths are merged into every route added to it
    /// (route-specific entries win).
    pub fn with_paths(paths: impl Into<PathSpec>) -> Result<Self, RouterError> {
        Ok(Self {
            paths: paths.into().resolve()?,
            ..Self::default()
        })
    }

    /// Prefix prepended to the pattern of every route added afterwards.
    pub fn set_prefix(&mut self, prefix: impl Into<String>) -> &mut Self {
        self.prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    /// Hostname constraint applied to every route at mount time.
    pub fn set_hostname(&mut self, hostname: impl Into<String>) -> &mut Self {
        self.hostname = Some(hostname.into());
        self
    }

    #[must_use]
    pub fn hostname(&self) -> Option<&str> {
        self.hostname.as_deref()
    }

    /// Before-match predicate applied to every route at mount time.
    pub fn before_match<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&str, &Route) -> bool + 'static,
    {
        self.before_match = Some(Arc::new(predicate));
        self
    }

    /// Register a route in the group. The group prefix is applied to the
    /// pattern and the group paths are merged beneath the route's own.
    pub fn add(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
        methods: Option<Vec<Method>>,
    ) -> Result<&mut Route, RouterError> {
        let full_pattern = match &self.prefix {
            Some(prefix) => format!("{prefix}{pattern}"),
            None => pattern.to_string(),
        };

        let mut merged = self.paths.clone();
        for (name, target) in paths.into().resolve()? {
            match merged.iter_mut().find(|(existing, _)| *existing == name) {
                Some(entry) => entry.1 = target,
                None => merged.push((name, target)),
            }
        }

        let route = Route::new(0, &full_pattern, PathSpec::Map(merged), methods)?;
        self.routes.push(route);
        let index = self.routes.len() - 1;
        Ok(&mut self.routes[index])
    }

    pub fn add_get(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
    ) -> Result<&mut Route, RouterError> {
        self.add(pattern, paths, Some(vec![Method::GET]))
    }

    pub fn add_post(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
    ) -> Result<&mut Route, RouterError> {
        self.add(pattern, paths, Some(vec![Method::POST]))
    }

    pub fn add_put(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
    ) -> Result<&mut Route, RouterError> {
        self.add(pattern, paths, Some(vec![Method::PUT]))
    }

    pub fn add_delete(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
    ) -> Result<&mut Route, RouterError> {
        self.add(pattern, paths, Some(vec![Method::DELETE]))
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Drop every route added so far.
    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Consume the group, applying the shared hostname and before-match
    /// predicate to every route. Mounting an empty group is a configuration
    /// error.
    pub(crate) fn into_routes(self) -> Result<Vec<Route>, RouterError> {
        let RouteGroup {
            hostname,
            before_match,
            mut routes,
            ..
        } = self;

        if routes.is_empty() {
            return Err(RouterError::EmptyGroup);
        }

        for route in &mut routes {
            if let Some(hostname) = &hostname {
                route.set_hostname(hostname)?;
            }
            if let Some(predicate) = &before_match {
                route.set_before_match_arc(Arc::clone(predicate));
            }
        }
        Ok(routes)
    }
}
