//! Router core: the matching state machine.
//!
//! `handle` walks the registered routes in reverse registration order (the
//! most recently added route is tried first, so the last registration wins a
//! tie), applies method and hostname constraints through the request
//! collaborator, tests the compiled pattern, and extracts the named parts of
//! the first route that matches. Defaults fill everything a match leaves
//! unresolved.

use std::collections::HashMap;

use http::Method;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::errors::RouterError;
use crate::events::Flow;
use crate::request::Request;

use super::group::RouteGroup;
use super::route::{PathSpec, PathTarget, Route, RouteId};

/// Maximum number of resolved params before heap allocation.
/// Most route tables bind at most a handful of parts per pattern.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Resolved parameter storage: positional entries keyed by their index
/// (`"0"`, `"1"`, …) in match order, followed by custom named parts in path
/// map order.
pub type ParamVec = SmallVec<[(String, String); MAX_INLINE_PARAMS]>;

/// Router lifecycle points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterEvent {
    /// Before the route list is walked. Cancel aborts handling: nothing
    /// matches and defaults apply.
    BeforeCheckRoutes,
    /// Before each route is tested. Cancel skips the route.
    BeforeCheckRoute,
    /// A route's pattern matched (its before-match predicate, if any, has
    /// not run yet). Notification only.
    MatchedRoute,
    /// A route's pattern did not match. Notification only.
    NotMatchedRoute,
    /// Handling finished with a match (or the not-found paths).
    AfterCheckRoutes,
}

/// Where `add_at` places a new route relative to the existing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutePosition {
    /// Tried last under reverse iteration.
    First,
    /// Tried first under reverse iteration (the default for `add`).
    Last,
}

/// Snapshot of the values resolved by the last `handle` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTarget {
    pub namespace: Option<String>,
    pub module: Option<String>,
    pub controller: Option<String>,
    pub action: Option<String>,
    pub params: Vec<(String, String)>,
}

type RouteListener = Box<dyn FnMut(&str, Option<&Route>) -> Flow>;

#[derive(Default)]
struct RouterHooks {
    slots: HashMap<RouterEvent, Vec<RouteListener>>,
}

impl RouterHooks {
    fn attach(&mut self, event: RouterEvent, listener: RouteListener) {
        self.slots.entry(event).or_default().push(listener);
    }

    fn fire(&mut self, event: RouterEvent, uri: &str, route: Option<&Route>) -> Flow {
        if let Some(listeners) = self.slots.get_mut(&event) {
            for listener in listeners.iter_mut() {
                if listener(uri, route).is_cancel() {
                    return Flow::Cancel;
                }
            }
        }
        Flow::Continue
    }
}

/// Ordered pattern router.
///
/// One router instance serves one logical request at a time: `handle`
/// mutates the resolved fields in place and is not designed for concurrent
/// callers.
#[derive(Default)]
pub struct Router {
    routes: Vec<Route>,
    next_route_id: RouteId,

    namespace: Option<String>,
    module: Option<String>,
    controller: Option<String>,
    action: Option<String>,
    params: ParamVec,

    default_namespace: Option<String>,
    default_module: Option<String>,
    default_controller: Option<String>,
    default_action: Option<String>,
    default_params: ParamVec,

    remove_extra_slashes: bool,
    not_found_paths: Option<Vec<(String, PathTarget)>>,

    matched_route: Option<RouteId>,
    was_matched: bool,

    hooks: RouterHooks,
}

impl Router {
    /// Create a router with no routes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a router preloaded with the two conventional routes matching
    /// `/:controller` and `/:controller/:action/:params`.
    pub fn with_default_routes() -> Result<Self, RouterError> {
        let mut router = Self::new();
        router.add(
            r"^/([\w0-9_-]+)/?$",
            PathSpec::map([("controller", PathTarget::Position(1))]),
            None,
        )?;
        router.add(
            r"^/([\w0-9_-]+)/([\w0-9._]+)(/.*)*$",
            PathSpec::map([
                ("controller", PathTarget::Position(1)),
                ("action", PathTarget::Position(2)),
                ("params", PathTarget::Position(3)),
            ]),
            None,
        )?;
        Ok(router)
    }

    /// Register a route. Under reverse-order matching the new route is tried
    /// before all previously registered ones.
    pub fn add(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
        methods: Option<Vec<Method>>,
    ) -> Result<&mut Route, RouterError> {
        self.add_at(pattern, paths, methods, RoutePosition::Last)
    }

    /// Register a route at an explicit position in the list.
    pub fn add_at(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
        methods: Option<Vec<Method>>,
        position: RoutePosition,
    ) -> Result<&mut Route, RouterError> {
        let route = Route::new(self.next_route_id, pattern, paths.into(), methods)?;
        self.next_route_id += 1;
        let index = match position {
            RoutePosition::Last => {
                self.routes.push(route);
                self.routes.len() - 1
            }
            RoutePosition::First => {
                self.routes.insert(0, route);
                0
            }
        };
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

    pub fn add_patch(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
    ) -> Result<&mut Route, RouterError> {
        self.add(pattern, paths, Some(vec![Method::PATCH]))
    }

    pub fn add_delete(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
    ) -> Result<&mut Route, RouterError> {
        self.add(pattern, paths, Some(vec![Method::DELETE]))
    }

    pub fn add_options(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
    ) -> Result<&mut Route, RouterError> {
        self.add(pattern, paths, Some(vec![Method::OPTIONS]))
    }

    pub fn add_head(
        &mut self,
        pattern: &str,
        paths: impl Into<PathSpec>,
    ) -> Result<&mut Route, RouterError> {
        self.add(pattern, paths, Some(vec![Method::HEAD]))
    }

    /// Mount every route of a group, applying the group's shared hostname
    /// and before-match predicate. Route ids are assigned here so they stay
    /// unique within the router.
    pub fn mount(&mut self, group: RouteGroup) -> Result<&mut Self, RouterError> {
        let mut routes = group.into_routes()?;
        for route in &mut routes {
            route.assign_id(self.next_route_id);
            self.next_route_id += 1;
        }
        info!(
            mounted = routes.len(),
            total = self.routes.len() + routes.len(),
            "Route group mounted"
        );
        self.routes.append(&mut routes);
        Ok(self)
    }

    /// Attach a listener to a router lifecycle point.
    pub fn on<F>(&mut self, event: RouterEvent, listener: F) -> &mut Self
    where
        F: FnMut(&str, Option<&Route>) -> Flow + 'static,
    {
        self.hooks.attach(event, Box::new(listener));
        self
    }

    /// Strip trailing slashes from handled URIs (never the root `/`).
    pub fn remove_extra_slashes(&mut self, remove: bool) -> &mut Self {
        self.remove_extra_slashes = remove;
        self
    }

    /// Set defaults for any subset of namespace/module/controller/action.
    pub fn set_defaults(
        &mut self,
        namespace: Option<&str>,
        module: Option<&str>,
        controller: Option<&str>,
        action: Option<&str>,
    ) -> &mut Self {
        if let Some(v) = namespace {
            self.default_namespace = Some(v.to_string());
        }
        if let Some(v) = module {
            self.default_module = Some(v.to_string());
        }
        if let Some(v) = controller {
            self.default_controller = Some(v.to_string());
        }
        if let Some(v) = action {
            self.default_action = Some(v.to_string());
        }
        self
    }

    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    pub fn set_default_module(&mut self, module: impl Into<String>) -> &mut Self {
        self.default_module = Some(module.into());
        self
    }

    pub fn set_default_controller(&mut self, controller: impl Into<String>) -> &mut Self {
        self.default_controller = Some(controller.into());
        self
    }

    pub fn set_default_action(&mut self, action: impl Into<String>) -> &mut Self {
        self.default_action = Some(action.into());
        self
    }

    pub fn set_default_params(&mut self, params: ParamVec) -> &mut Self {
        self.default_params = params;
        self
    }

    /// Paths used as a synthetic match when no route matches. Only literal
    /// entries contribute (there are no captures to draw positions from).
    pub fn not_found(&mut self, paths: impl Into<PathSpec>) -> Result<&mut Self, RouterError> {
        self.not_found_paths = Some(paths.into().resolve()?);
        Ok(self)
    }

    /// Remove all registered routes. The id counter is not reset, so ids
    /// stay unique across the router's lifetime.
    pub fn clear(&mut self) {
        self.routes.clear();
    }

    /// Match a URI against the registered routes.
    ///
    /// No-match is a normal outcome observable via [`Router::was_matched`];
    /// errors are reserved for configuration problems, such as a
    /// method/hostname-constrained route being reached with no `request`
    /// collaborator to consult.
    pub fn handle(
        &mut self,
        uri: &str,
        request: Option<&dyn Request>,
    ) -> Result<(), RouterError> {
        let real_uri = if uri.is_empty() { "/" } else { uri };
        let handled_uri = if self.remove_extra_slashes && real_uri != "/" {
            let trimmed = real_uri.trim_end_matches('/');
            if trimmed.is_empty() {
                "/"
            } else {
                trimmed
            }
        } else {
            real_uri
        };

        self.was_matched = false;
        self.matched_route = None;

        debug!(uri = %handled_uri, routes = self.routes.len(), "Route match attempt");

        let mut checked = true;
        let mut found: Option<(RouteId, Vec<(String, String)>)> = None;

        let hooks = &mut self.hooks;
        if hooks
            .fire(RouterEvent::BeforeCheckRoutes, handled_uri, None)
            .is_cancel()
        {
            checked = false;
        }

        if checked {
            for route in self.routes.iter().rev() {
                if let Some(methods) = route.http_methods() {
                    let req = request.ok_or_else(|| RouterError::RequestUnavailable {
                        pattern: route.pattern().to_string(),
                    })?;
                    if !req.is_method(methods) {
                        continue;
                    }
                }

                if route.host_matcher().is_some() {
                    let req = request.ok_or_else(|| RouterError::RequestUnavailable {
                        pattern: route.pattern().to_string(),
                    })?;
                    // No host available (CLI mode); host-constrained routes
                    // cannot match.
                    let Some(current_host) = req.http_host() else {
                        continue;
                    };
                    let host_ok = route
                        .host_matcher()
                        .is_some_and(|m| m.matches(current_host));
                    if !host_ok {
                        continue;
                    }
                }

                if hooks
                    .fire(RouterEvent::BeforeCheckRoute, handled_uri, Some(route))
                    .is_cancel()
                {
                    continue;
                }

                let Some(captures) = route.try_match(handled_uri) else {
                    hooks.fire(RouterEvent::NotMatchedRoute, handled_uri, Some(route));
                    continue;
                };

                hooks.fire(RouterEvent::MatchedRoute, handled_uri, Some(route));

                if let Some(predicate) = route.before_match_predicate() {
                    if !predicate(handled_uri, route) {
                        continue;
                    }
                }

                let mut parts = Vec::with_capacity(route.paths().len());
                for (name, target) in route.paths() {
                    match target {
                        PathTarget::Position(position) => {
                            if let Some(Some(value)) = captures.get(*position) {
                                parts.push((name.clone(), route.convert_value(name, value)));
                            }
                        }
                        PathTarget::Literal(value) => {
                            parts.push((name.clone(), route.convert_value(name, value)));
                        }
                    }
                }

                info!(
                    route_id = route.route_id(),
                    pattern = %route.pattern(),
                    uri = %handled_uri,
                    "Route matched"
                );
                found = Some((route.route_id(), parts));
                break;
            }
        }

        self.was_matched = found.is_some();

        let mut parts = match found {
            Some((id, parts)) => {
                self.matched_route = Some(id);
                Some(parts)
            }
            None => {
                warn!(uri = %handled_uri, "No route matched");
                None
            }
        };

        if parts.is_none() && checked {
            if let Some(not_found) = &self.not_found_paths {
                parts = Some(
                    not_found
                        .iter()
                        .filter_map(|(name, target)| match target {
                            PathTarget::Literal(value) => Some((name.clone(), value.clone())),
                            PathTarget::Position(_) => None,
                        })
                        .collect(),
                );
            }
        }

        // Defaults first; a match overwrites whatever it resolved.
        self.namespace = self.default_namespace.clone();
        self.module = self.default_module.clone();
        self.controller = self.default_controller.clone();
        self.action = self.default_action.clone();
        self.params = self.default_params.clone();

        if let Some(parts) = parts {
            let mut positional: Vec<String> = Vec::new();
            let mut named: Vec<(String, String)> = Vec::new();

            for (name, value) in parts {
                match name.as_str() {
                    // Numeric captures never clobber the semantic slots.
                    "namespace" => {
                        if !is_numeric(&value) {
                            self.namespace = Some(value);
                        }
                    }
                    "module" => {
                        if !is_numeric(&value) {
                            self.module = Some(value);
                        }
                    }
                    "controller" => {
                        if !is_numeric(&value) {
                            self.controller = Some(value);
                        }
                    }
                    "action" => {
                        if !is_numeric(&value) {
                            self.action = Some(value);
                        }
                    }
                    "params" => {
                        let trimmed = value.trim_matches('/');
                        if !trimmed.is_empty() {
                            positional.extend(trimmed.split('/').map(str::to_string));
                        }
                    }
                    _ => named.push((name, value)),
                }
            }

            let mut params = ParamVec::new();
            for (index, value) in positional.into_iter().enumerate() {
                params.push((index.to_string(), value));
            }
            params.extend(named);
            self.params = params;

            self.hooks
                .fire(RouterEvent::AfterCheckRoutes, handled_uri, None);
        }

        Ok(())
    }

    #[must_use]
    pub fn namespace_name(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    #[must_use]
    pub fn module_name(&self) -> Option<&str> {
        self.module.as_deref()
    }

    #[must_use]
    pub fn controller_name(&self) -> Option<&str> {
        self.controller.as_deref()
    }

    #[must_use]
    pub fn action_name(&self) -> Option<&str> {
        self.action.as_deref()
    }

    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    /// All resolved values of the last `handle` call, as one serializable
    /// descriptor.
    #[must_use]
    pub fn resolved_target(&self) -> ResolvedTarget {
        ResolvedTarget {
            namespace: self.namespace.clone(),
            module: self.module.clone(),
            controller: self.controller.clone(),
            action: self.action.clone(),
            params: self.params.iter().cloned().collect(),
        }
    }

    /// Whether the last `handle` call matched a registered route.
    #[must_use]
    pub fn was_matched(&self) -> bool {
        self.was_matched
    }

    /// The route matched by the last `handle` call.
    #[must_use]
    pub fn matched_route(&self) -> Option<&Route> {
        let id = self.matched_route?;
        self.routes.iter().find(|r| r.route_id() == id)
    }

    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    #[must_use]
    pub fn get_route_by_id(&self, id: RouteId) -> Option<&Route> {
        self.routes.iter().find(|r| r.route_id() == id)
    }

    #[must_use]
    pub fn get_route_by_name(&self, name: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.name() == Some(name))
    }
}

fn is_numeric(value: &str) -> bool {
    !value.is_empty() && value.parse::<f64>().is_ok()
}
