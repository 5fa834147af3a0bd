//! Error types for route configuration and dispatching.
//!
//! Two tiers exist on purpose. [`RouterError`] covers configuration mistakes
//! (malformed patterns, missing collaborators) and is raised eagerly, at
//! registration time where possible. [`DispatchError`] covers resolution
//! failures inside the dispatch loop; most of its variants are *soft* and can
//! be recovered by an exception listener that forwards to another target.

use thiserror::Error;

/// Errors raised while registering routes or handling a URI.
///
/// A URI that matches no route is not an error; it is reported through
/// `Router::was_matched`.
#[derive(Debug, Error)]
pub enum RouterError {
    /// The route pattern (or one of its placeholder regex fragments) does not
    /// compile.
    #[error("invalid route pattern `{pattern}`: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A `"Controller::action"` shorthand could not be parsed.
    #[error("invalid handler shorthand `{0}`")]
    InvalidShorthand(String),

    /// A hostname constraint containing a group failed to compile as a regex.
    #[error("invalid hostname constraint `{hostname}`: {source}")]
    InvalidHostname {
        hostname: String,
        #[source]
        source: regex::Error,
    },

    /// A route declares an HTTP-method or hostname constraint but no request
    /// collaborator was supplied to `Router::handle`.
    #[error("a request collaborator is required to evaluate the constraints of route `{pattern}`")]
    RequestUnavailable { pattern: String },

    /// `Router::mount` was called with a group that contains no routes.
    #[error("the group of routes does not contain any routes")]
    EmptyGroup,
}

/// Errors raised by the dispatch loop.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler registry was attached to the dispatcher.
    #[error("a handler registry is required to access related dispatching services")]
    MissingRegistry,

    /// The iteration cap was reached; some handler (or cycle of handlers)
    /// forwards without ever finishing.
    #[error("dispatcher has detected a cyclic routing causing stability problems")]
    CyclicRouting,

    /// No factory or shared instance is registered under the computed handler
    /// class name.
    #[error("handler class `{class}` cannot be resolved from the registry")]
    HandlerNotFound { class: String },

    /// The shared handler instance is unavailable, e.g. it is already
    /// exclusively borrowed by a re-entrant dispatch.
    #[error("invalid handler resolved from the registry for `{class}`")]
    InvalidHandler { class: String },

    /// The resolved handler does not expose the computed action method.
    #[error("action `{action}` was not found on handler `{handler}`")]
    ActionNotFound { action: String, handler: String },
}

impl DispatchError {
    /// Whether an exception listener is given the chance to swallow this
    /// error and forward elsewhere. Cyclic routing and a missing registry are
    /// always fatal.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self,
            DispatchError::MissingRegistry | DispatchError::CyclicRouting
        )
    }
}
