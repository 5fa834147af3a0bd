//! Per-dispatch mutable state.
//!
//! A [`DispatchContext`] carries the target currently being dispatched
//! (namespace, module, handler, action, params) together with the loop
//! control flags. Handlers and listeners receive `&mut DispatchContext` and
//! re-route by calling [`DispatchContext::forward`].

use serde_json::Value;

use crate::router::ParamVec;

/// Re-routing request accepted by [`DispatchContext::forward`].
///
/// Only the fields that are set replace the current target; everything else
/// is carried over, so forwarding to another action of the same controller
/// takes one line.
#[derive(Debug, Clone, Default)]
pub struct ForwardSpec {
    namespace: Option<String>,
    module: Option<String>,
    controller: Option<String>,
    action: Option<String>,
    params: Option<ParamVec>,
}

impl ForwardSpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    #[must_use]
    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    #[must_use]
    pub fn action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    #[must_use]
    pub fn params(mut self, params: ParamVec) -> Self {
        self.params = Some(params);
        self
    }
}

/// State threaded through one dispatch loop.
#[derive(Default)]
pub struct DispatchContext {
    namespace_name: Option<String>,
    module_name: Option<String>,
    handler_name: Option<String>,
    action_name: Option<String>,
    params: ParamVec,

    finished: bool,
    forwarded: bool,

    previous_namespace_name: Option<String>,
    previous_handler_name: Option<String>,
    previous_action_name: Option<String>,

    returned_value: Option<Value>,
}

impl DispatchContext {
    /// Replace the current target and flag the loop for another iteration.
    ///
    /// The previous namespace, controller, and action names are snapshotted
    /// first so error pages can report where a request came from. Forwarding
    /// is sticky: `was_forwarded` stays true from then on.
    pub fn forward(&mut self, spec: ForwardSpec) {
        self.previous_namespace_name = self.namespace_name.clone();
        self.previous_handler_name = self.handler_name.clone();
        self.previous_action_name = self.action_name.clone();

        if let Some(namespace) = spec.namespace {
            self.namespace_name = Some(namespace);
        }
        if let Some(module) = spec.module {
            self.module_name = Some(module);
        }
        if let Some(controller) = spec.controller {
            self.handler_name = Some(controller);
        }
        if let Some(action) = spec.action {
            self.action_name = Some(action);
        }
        if let Some(params) = spec.params {
            self.params = params;
        }

        self.finished = false;
        self.forwarded = true;
    }

    #[must_use]
    pub fn namespace_name(&self) -> Option<&str> {
        self.namespace_name.as_deref()
    }

    pub fn set_namespace_name(&mut self, namespace: impl Into<String>) {
        self.namespace_name = Some(namespace.into());
    }

    #[must_use]
    pub fn module_name(&self) -> Option<&str> {
        self.module_name.as_deref()
    }

    pub fn set_module_name(&mut self, module: impl Into<String>) {
        self.module_name = Some(module.into());
    }

    /// Bare controller name, without namespace or suffix.
    #[must_use]
    pub fn controller_name(&self) -> Option<&str> {
        self.handler_name.as_deref()
    }

    pub fn set_controller_name(&mut self, controller: impl Into<String>) {
        self.handler_name = Some(controller.into());
    }

    #[must_use]
    pub fn action_name(&self) -> Option<&str> {
        self.action_name.as_deref()
    }

    pub fn set_action_name(&mut self, action: impl Into<String>) {
        self.action_name = Some(action.into());
    }

    #[must_use]
    pub fn params(&self) -> &ParamVec {
        &self.params
    }

    pub fn set_params(&mut self, params: ParamVec) {
        self.params = params;
    }

    /// Set one param, replacing an existing entry of the same name.
    pub fn set_param(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value,
            None => self.params.push((name, value)),
        }
    }

    /// Look up a param by name. Last write wins when names repeat.
    #[must_use]
    pub fn get_param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the loop is done with this target. Forwarding clears it.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn set_finished(&mut self, finished: bool) {
        self.finished = finished;
    }

    /// Whether any forward has happened on this context. Sticky: set by the
    /// first forward and never cleared, not even by a later dispatch.
    #[must_use]
    pub fn was_forwarded(&self) -> bool {
        self.forwarded
    }

    #[must_use]
    pub fn previous_namespace_name(&self) -> Option<&str> {
        self.previous_namespace_name.as_deref()
    }

    #[must_use]
    pub fn previous_controller_name(&self) -> Option<&str> {
        self.previous_handler_name.as_deref()
    }

    #[must_use]
    pub fn previous_action_name(&self) -> Option<&str> {
        self.previous_action_name.as_deref()
    }

    /// Value returned by the most recently executed action.
    #[must_use]
    pub fn returned_value(&self) -> Option<&Value> {
        self.returned_value.as_ref()
    }

    pub fn set_returned_value(&mut self, value: Option<Value>) {
        self.returned_value = value;
    }
}
