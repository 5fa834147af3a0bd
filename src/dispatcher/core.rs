//! Dispatcher core: the bounded forwarding loop.
//!
//! `dispatch` resolves the current target to a handler class, executes the
//! action, and repeats while anything (an action, a listener) forwards to a
//! new target. The loop is bounded by [`MAX_DISPATCHES`] so mutually
//! forwarding actions fail fast instead of spinning forever.

use std::rc::Rc;

use tracing::{debug, warn};

use crate::errors::DispatchError;
use crate::events::{Flow, Hooks};
use crate::naming::camelize;
use crate::registry::{HandlerRegistry, SharedHandler};
use crate::router::ResolvedTarget;

use super::context::{DispatchContext, ForwardSpec};

/// Hard cap on loop iterations per dispatch. Reaching it is treated as
/// cyclic routing.
pub const MAX_DISPATCHES: usize = 256;

/// Dispatcher lifecycle points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatchEvent {
    /// Before the loop starts. Cancel abandons the dispatch entirely.
    BeforeDispatchLoop,
    /// At the top of each iteration, once the target is resolved. Cancel
    /// skips the iteration.
    BeforeDispatch,
    /// The resolved action does not exist on the handler. Cancel suppresses
    /// the not-found error and skips the iteration.
    BeforeNotFoundAction,
    /// A freshly constructed handler finished its one-time `initialize`.
    AfterInitialize,
    /// Immediately before the action executes. Cancel skips it.
    BeforeExecuteRoute,
    /// Immediately after the action executed. Cancel skips the rest of the
    /// iteration.
    AfterExecuteRoute,
    /// End of each iteration. Notification only.
    AfterDispatch,
    /// After the loop ends. Notification only.
    AfterDispatchLoop,
}

/// Collaborator the dispatcher reports unrecovered dispatch failures to,
/// typically a pending HTTP response.
pub trait ResponseStatus {
    fn set_status(&mut self, code: u16, reason: &str);
}

type ExceptionListener = Box<dyn FnMut(&DispatchError, &mut DispatchContext) -> Flow>;

enum Recovery {
    Continue,
    Raise,
}

/// The forwarding dispatch loop.
///
/// Like the router, one dispatcher serves one logical request at a time:
/// `dispatch` mutates the context in place.
#[derive(Default)]
pub struct Dispatcher {
    registry: Option<HandlerRegistry>,
    hooks: Hooks<DispatchEvent, DispatchContext>,
    exception_listeners: Vec<ExceptionListener>,
    response: Option<Box<dyn ResponseStatus>>,
    ctx: DispatchContext,

    default_namespace: Option<String>,
    default_handler: Option<String>,
    default_action: Option<String>,
    handler_suffix: Option<String>,
    action_suffix: Option<String>,

    active_handler: Option<SharedHandler>,
    last_handler: Option<SharedHandler>,
}

impl Dispatcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the handler registry the loop resolves handler classes from.
    pub fn set_registry(&mut self, registry: HandlerRegistry) -> &mut Self {
        self.registry = Some(registry);
        self
    }

    #[must_use]
    pub fn registry(&self) -> Option<&HandlerRegistry> {
        self.registry.as_ref()
    }

    pub fn registry_mut(&mut self) -> Option<&mut HandlerRegistry> {
        self.registry.as_mut()
    }

    /// Install the response collaborator that receives a 404 when a dispatch
    /// failure goes unrecovered.
    pub fn set_response(&mut self, response: Box<dyn ResponseStatus>) -> &mut Self {
        self.response = Some(response);
        self
    }

    /// Attach a listener to a dispatcher lifecycle point.
    pub fn on<F>(&mut self, event: DispatchEvent, listener: F) -> &mut Self
    where
        F: FnMut(&mut DispatchContext) -> Flow + 'static,
    {
        self.hooks.attach(event, listener);
        self
    }

    /// Attach a listener for recoverable dispatch failures. Returning
    /// [`Flow::Cancel`] (or forwarding through the context) keeps the loop
    /// alive; otherwise the failure is raised to the caller.
    pub fn on_exception<F>(&mut self, listener: F) -> &mut Self
    where
        F: FnMut(&DispatchError, &mut DispatchContext) -> Flow + 'static,
    {
        self.exception_listeners.push(Box::new(listener));
        self
    }

    pub fn set_default_namespace(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.default_namespace = Some(namespace.into());
        self
    }

    pub fn set_default_controller(&mut self, controller: impl Into<String>) -> &mut Self {
        self.default_handler = Some(controller.into());
        self
    }

    pub fn set_default_action(&mut self, action: impl Into<String>) -> &mut Self {
        self.default_action = Some(action.into());
        self
    }

    /// Suffix appended to the camelized controller name, `"Controller"` by
    /// default.
    pub fn set_handler_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.handler_suffix = Some(suffix.into());
        self
    }

    /// Suffix appended to the action name, `"Action"` by default.
    pub fn set_action_suffix(&mut self, suffix: impl Into<String>) -> &mut Self {
        self.action_suffix = Some(suffix.into());
        self
    }

    /// Load the target resolved by a router into the context.
    pub fn prepare(&mut self, target: &ResolvedTarget) -> &mut Self {
        if let Some(namespace) = &target.namespace {
            self.ctx.set_namespace_name(namespace.clone());
        }
        if let Some(module) = &target.module {
            self.ctx.set_module_name(module.clone());
        }
        if let Some(controller) = &target.controller {
            self.ctx.set_controller_name(controller.clone());
        }
        if let Some(action) = &target.action {
            self.ctx.set_action_name(action.clone());
        }
        self.ctx.set_params(target.params.iter().cloned().collect());
        self
    }

    pub fn set_namespace_name(&mut self, namespace: impl Into<String>) -> &mut Self {
        self.ctx.set_namespace_name(namespace);
        self
    }

    pub fn set_module_name(&mut self, module: impl Into<String>) -> &mut Self {
        self.ctx.set_module_name(module);
        self
    }

    pub fn set_controller_name(&mut self, controller: impl Into<String>) -> &mut Self {
        self.ctx.set_controller_name(controller);
        self
    }

    pub fn set_action_name(&mut self, action: impl Into<String>) -> &mut Self {
        self.ctx.set_action_name(action);
        self
    }

    /// Re-route without going through a handler; takes effect on the next
    /// `dispatch` (or the next loop iteration, when called mid-dispatch).
    pub fn forward(&mut self, spec: ForwardSpec) -> &mut Self {
        self.ctx.forward(spec);
        self
    }

    #[must_use]
    pub fn context(&self) -> &DispatchContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut DispatchContext {
        &mut self.ctx
    }

    /// Fully qualified handler class for the current target: namespace,
    /// camelized controller name, handler suffix. A controller name that
    /// already contains `::` is taken verbatim.
    #[must_use]
    pub fn handler_class(&self) -> String {
        let name = self
            .ctx
            .controller_name()
            .or(self.default_handler.as_deref())
            .unwrap_or(DEFAULT_HANDLER);
        let suffix = self.handler_suffix.as_deref().unwrap_or(HANDLER_SUFFIX);
        let camelized = if name.contains("::") {
            name.to_string()
        } else {
            camelize(name)
        };
        match self.ctx.namespace_name() {
            Some(namespace) if !namespace.is_empty() => {
                format!("{namespace}::{camelized}{suffix}")
            }
            _ => format!("{camelized}{suffix}"),
        }
    }

    /// Method name for the current target: action name plus action suffix.
    #[must_use]
    pub fn active_method(&self) -> String {
        let action = self
            .ctx
            .action_name()
            .or(self.default_action.as_deref())
            .unwrap_or(DEFAULT_ACTION);
        let suffix = self.action_suffix.as_deref().unwrap_or(ACTION_SUFFIX);
        format!("{action}{suffix}")
    }

    /// Handler of the iteration currently executing.
    #[must_use]
    pub fn active_handler(&self) -> Option<SharedHandler> {
        self.active_handler.clone()
    }

    /// Handler of the last iteration that resolved one.
    #[must_use]
    pub fn last_handler(&self) -> Option<SharedHandler> {
        self.last_handler.clone()
    }

    /// Run the dispatch loop for the prepared target.
    ///
    /// Returns the last resolved handler, or `None` when a listener
    /// cancelled the loop before it started. Failures a listener recovered
    /// from (by forwarding) are not errors; unrecovered ones are, after the
    /// response collaborator is told about them.
    pub fn dispatch(&mut self) -> Result<Option<SharedHandler>, DispatchError> {
        let Some(mut registry) = self.registry.take() else {
            return Err(DispatchError::MissingRegistry);
        };

        self.ctx.set_finished(false);
        self.active_handler = None;
        self.last_handler = None;

        if self
            .hooks
            .fire(DispatchEvent::BeforeDispatchLoop, &mut self.ctx)
            .is_cancel()
        {
            self.registry = Some(registry);
            return Ok(None);
        }

        let result = self.run_loop(&mut registry);
        self.registry = Some(registry);
        result?;

        self.hooks
            .fire(DispatchEvent::AfterDispatchLoop, &mut self.ctx);
        Ok(self.last_handler.clone())
    }

    fn run_loop(&mut self, registry: &mut HandlerRegistry) -> Result<(), DispatchError> {
        let mut dispatches = 0usize;

        while !self.ctx.is_finished() {
            dispatches += 1;
            if dispatches == MAX_DISPATCHES {
                warn!(dispatches, "Cyclic routing detected, aborting dispatch");
                return Err(DispatchError::CyclicRouting);
            }

            // Optimistic: only a forward keeps the loop going.
            self.ctx.set_finished(true);
            self.resolve_empty_properties();

            let handler_class = self.handler_class();
            let active_method = self.active_method();

            if self
                .hooks
                .fire(DispatchEvent::BeforeDispatch, &mut self.ctx)
                .is_cancel()
                || !self.ctx.is_finished()
            {
                continue;
            }

            let Some((handler, was_fresh)) = registry.get_shared(&handler_class) else {
                warn!(handler_class = %handler_class, "Handler class not registered");
                let err = DispatchError::HandlerNotFound {
                    class: handler_class,
                };
                match self.recover(&err) {
                    Recovery::Continue => continue,
                    Recovery::Raise => return Err(err),
                }
            };
            self.active_handler = Some(Rc::clone(&handler));
            self.last_handler = Some(Rc::clone(&handler));

            let has_action = match handler.try_borrow() {
                Ok(h) => h.has_action(&active_method),
                Err(_) => {
                    let err = DispatchError::InvalidHandler {
                        class: handler_class,
                    };
                    match self.recover(&err) {
                        Recovery::Continue => continue,
                        Recovery::Raise => return Err(err),
                    }
                }
            };

            if !has_action {
                if self
                    .hooks
                    .fire(DispatchEvent::BeforeNotFoundAction, &mut self.ctx)
                    .is_cancel()
                    || !self.ctx.is_finished()
                {
                    continue;
                }
                let err = DispatchError::ActionNotFound {
                    action: active_method,
                    handler: handler_class,
                };
                match self.recover(&err) {
                    Recovery::Continue => continue,
                    Recovery::Raise => return Err(err),
                }
            }

            if self
                .hooks
                .fire(DispatchEvent::BeforeExecuteRoute, &mut self.ctx)
                .is_cancel()
                || !self.ctx.is_finished()
            {
                continue;
            }

            let flow = match handler.try_borrow_mut() {
                Ok(mut h) => h.before_execute_route(&mut self.ctx),
                Err(_) => {
                    let err = DispatchError::InvalidHandler {
                        class: handler_class,
                    };
                    match self.recover(&err) {
                        Recovery::Continue => continue,
                        Recovery::Raise => return Err(err),
                    }
                }
            };
            if flow.is_cancel() || !self.ctx.is_finished() {
                continue;
            }

            // A cancelled before-execute skips initialization too, so the
            // one-time setup only happens here.
            if was_fresh {
                match handler.try_borrow_mut() {
                    Ok(mut h) => h.initialize(),
                    Err(_) => {
                        let err = DispatchError::InvalidHandler {
                            class: handler_class,
                        };
                        match self.recover(&err) {
                            Recovery::Continue => continue,
                            Recovery::Raise => return Err(err),
                        }
                    }
                }
                if self
                    .hooks
                    .fire(DispatchEvent::AfterInitialize, &mut self.ctx)
                    .is_cancel()
                    || !self.ctx.is_finished()
                {
                    continue;
                }
            }

            debug!(
                handler_class = %handler_class,
                method = %active_method,
                "Executing action"
            );
            let returned = match handler.try_borrow_mut() {
                Ok(mut h) => h.call_action(&active_method, &mut self.ctx),
                Err(_) => {
                    let err = DispatchError::InvalidHandler {
                        class: handler_class,
                    };
                    match self.recover(&err) {
                        Recovery::Continue => continue,
                        Recovery::Raise => return Err(err),
                    }
                }
            };
            self.ctx.set_returned_value(returned);

            if self
                .hooks
                .fire(DispatchEvent::AfterExecuteRoute, &mut self.ctx)
                .is_cancel()
            {
                continue;
            }

            self.hooks.fire(DispatchEvent::AfterDispatch, &mut self.ctx);

            // Handler-level after-execute runs last, once the bus listeners
            // have seen the iteration.
            let flow = match handler.try_borrow_mut() {
                Ok(mut h) => h.after_execute_route(&mut self.ctx),
                Err(_) => {
                    let err = DispatchError::InvalidHandler {
                        class: handler_class,
                    };
                    match self.recover(&err) {
                        Recovery::Continue => continue,
                        Recovery::Raise => return Err(err),
                    }
                }
            };
            if flow.is_cancel() || !self.ctx.is_finished() {
                continue;
            }
        }

        Ok(())
    }

    /// Fill unset target fields from the configured defaults.
    fn resolve_empty_properties(&mut self) {
        if self.ctx.namespace_name().is_none() {
            if let Some(namespace) = &self.default_namespace {
                self.ctx.set_namespace_name(namespace.clone());
            }
        }
        if self.ctx.controller_name().is_none() {
            let controller = self
                .default_handler
                .clone()
                .unwrap_or_else(|| DEFAULT_HANDLER.to_string());
            self.ctx.set_controller_name(controller);
        }
        if self.ctx.action_name().is_none() {
            let action = self
                .default_action
                .clone()
                .unwrap_or_else(|| DEFAULT_ACTION.to_string());
            self.ctx.set_action_name(action);
        }
    }

    /// Give the exception listeners a chance to keep the loop alive.
    ///
    /// The response collaborator is marked 404 first, matching the listener
    /// view: by the time a listener runs, the failure is already on the
    /// response unless the listener replaces it.
    fn recover(&mut self, err: &DispatchError) -> Recovery {
        warn!(error = %err, "Dispatch failure");
        if let Some(response) = &mut self.response {
            response.set_status(404, "Not Found");
        }
        let mut cancelled = false;
        for listener in &mut self.exception_listeners {
            if listener(err, &mut self.ctx).is_cancel() {
                cancelled = true;
                break;
            }
        }
        if cancelled || !self.ctx.is_finished() {
            Recovery::Continue
        } else {
            Recovery::Raise
        }
    }
}

const DEFAULT_HANDLER: &str = "index";
const DEFAULT_ACTION: &str = "index";
const HANDLER_SUFFIX: &str = "Controller";
const ACTION_SUFFIX: &str = "Action";
