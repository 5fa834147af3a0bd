//! Handler registry: the service locator the dispatcher resolves handlers
//! from.
//!
//! Instead of locating classes reflectively by name, embedders register a
//! factory (or a prebuilt instance) under each handler class name the
//! dispatcher may compute (`IndexController`, `App::BlogPostsController`, …).
//! Resolution is shared: the first lookup runs the factory and caches the
//! instance, later lookups return the cached one. The dispatcher uses the
//! fresh-instance flag to run a handler's `initialize` exactly once.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::dispatcher::DispatchContext;
use crate::events::Flow;

/// A handler instance shared between the registry and the dispatch loop.
pub type SharedHandler = Rc<RefCell<Box<dyn Handler>>>;

type HandlerFactory = Box<dyn Fn() -> Box<dyn Handler>>;

/// A dispatchable handler (a controller, in MVC terms).
///
/// Actions are addressed by their full method name (action name plus the
/// dispatcher's action suffix, e.g. `indexAction`). The lifecycle methods
/// have no-op defaults; a handler overrides the ones it cares about.
pub trait Handler {
    /// Whether this handler exposes the given action method.
    fn has_action(&self, method: &str) -> bool;

    /// Invoke an action method. Only called with a method for which
    /// [`Handler::has_action`] returned true. The handler may call
    /// `ctx.forward(..)` to request a redispatch; the returned value becomes
    /// the dispatch loop's returned value for this iteration.
    fn call_action(&mut self, method: &str, ctx: &mut DispatchContext) -> Option<Value>;

    /// One-time setup, run the first time a freshly constructed instance is
    /// resolved.
    fn initialize(&mut self) {}

    /// Runs before every action execution on this handler. Returning
    /// [`Flow::Cancel`] aborts the current loop iteration without executing
    /// the action.
    fn before_execute_route(&mut self, _ctx: &mut DispatchContext) -> Flow {
        Flow::Continue
    }

    /// Runs after every action execution on this handler.
    fn after_execute_route(&mut self, _ctx: &mut DispatchContext) -> Flow {
        Flow::Continue
    }
}

/// Registry of handler factories and their shared instances.
#[derive(Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, HandlerFactory>,
    shared: HashMap<String, SharedHandler>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler factory under a class name.
    ///
    /// If a factory with the same name already exists it is replaced and any
    /// cached shared instance built from it is dropped.
    pub fn set<F>(&mut self, class: impl Into<String>, factory: F)
    where
        F: Fn() -> Box<dyn Handler> + 'static,
    {
        let class = class.into();
        if self.factories.insert(class.clone(), Box::new(factory)).is_some() {
            warn!(handler_class = %class, "Replaced existing handler factory");
        }
        self.shared.remove(&class);
    }

    /// Register a prebuilt instance as the shared handler for a class name.
    pub fn set_shared(&mut self, class: impl Into<String>, handler: Box<dyn Handler>) {
        let class = class.into();
        if self
            .shared
            .insert(class.clone(), Rc::new(RefCell::new(handler)))
            .is_some()
        {
            warn!(handler_class = %class, "Replaced existing shared handler");
        }
    }

    /// Whether a handler can be resolved under this class name.
    #[must_use]
    pub fn has(&self, class: &str) -> bool {
        self.shared.contains_key(class) || self.factories.contains_key(class)
    }

    /// Resolve the shared handler for a class name.
    ///
    /// Returns the instance together with a flag that is true when this call
    /// constructed it (the dispatcher runs `initialize` only then).
    pub fn get_shared(&mut self, class: &str) -> Option<(SharedHandler, bool)> {
        if let Some(existing) = self.shared.get(class) {
            return Some((Rc::clone(existing), false));
        }
        let factory = self.factories.get(class)?;
        let handler: SharedHandler = Rc::new(RefCell::new(factory()));
        debug!(handler_class = %class, "Constructed fresh handler instance");
        self.shared.insert(class.to_string(), Rc::clone(&handler));
        Some((handler, true))
    }

    /// Remove a handler registration and its cached instance.
    pub fn remove(&mut self, class: &str) {
        self.factories.remove(class);
        self.shared.remove(class);
    }

    /// Drop every registration.
    pub fn clear(&mut self) {
        self.factories.clear();
        self.shared.clear();
    }
}
