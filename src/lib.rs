//! # Peregrine
//!
//! **Peregrine** is a pattern router and forwarding dispatcher pair for Rust:
//! the routing core of an MVC-style request pipeline, without the HTTP server
//! around it.
//!
//! ## Overview
//!
//! Peregrine resolves a request URI into a target (namespace, module,
//! controller, action, params) and then executes that target against a
//! registry of handlers, with lifecycle hooks around every step and explicit
//! forwarding between targets.
//!
//! ## Architecture
//!
//! The library is organized into a handful of modules:
//!
//! - **[`router`]** - Pattern routes, route groups, and the reverse-order
//!   matching state machine
//! - **[`dispatcher`]** - The bounded forwarding loop that executes resolved
//!   targets
//! - **[`registry`]** - Handler factories and shared instances the dispatcher
//!   resolves classes from
//! - **[`events`]** - Lifecycle hooks with explicit cancellation
//! - **[`request`]** - The request collaborator routes consult for method and
//!   hostname constraints
//! - **[`naming`]** - Controller-name case conversions
//! - **[`errors`]** - Router and dispatcher error types
//!
//! ## Request Flow
//!
//! 1. `Router::handle` matches the URI and resolves a target
//! 2. `Dispatcher::prepare` loads the resolved target
//! 3. `Dispatcher::dispatch` resolves the handler class, runs the action,
//!    and loops while anything forwards
//!
//! ## Quick Start
//!
//! ```rust
//! use http::Method;
//! use peregrine::dispatcher::{DispatchContext, Dispatcher};
//! use peregrine::registry::{Handler, HandlerRegistry};
//! use peregrine::request::RequestSnapshot;
//! use peregrine::router::Router;
//! use serde_json::{json, Value};
//!
//! struct UsersController;
//!
//! impl Handler for UsersController {
//!     fn has_action(&self, method: &str) -> bool {
//!         method == "showAction"
//!     }
//!
//!     fn call_action(&mut self, _method: &str, ctx: &mut DispatchContext) -> Option<Value> {
//!         Some(json!({ "id": ctx.get_param("id") }))
//!     }
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut router = Router::new();
//! router.add("/users/{id:[0-9]+}", "Users::show", None)?;
//!
//! let request = RequestSnapshot::new(Method::GET);
//! router.handle("/users/42", Some(&request))?;
//!
//! let mut registry = HandlerRegistry::new();
//! registry.set("UsersController", || Box::new(UsersController));
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.set_registry(registry);
//! dispatcher.prepare(&router.resolved_target());
//! dispatcher.dispatch()?;
//!
//! assert_eq!(
//!     dispatcher.context().returned_value(),
//!     Some(&json!({ "id": "42" }))
//! );
//! # Ok(())
//! # }
//! ```

pub mod dispatcher;
pub mod errors;
pub mod events;
pub mod naming;
pub mod registry;
pub mod request;
pub mod router;

pub use dispatcher::{DispatchContext, Dispatcher, ForwardSpec};
pub use errors::{DispatchError, RouterError};
pub use events::Flow;
pub use registry::{Handler, HandlerRegistry};
pub use router::{Route, RouteGroup, Router};
