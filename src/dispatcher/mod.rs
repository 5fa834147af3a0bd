//! # Dispatcher Module
//!
//! Forwarding dispatch: executing the controller action a router resolved,
//! with lifecycle hooks around every step.
//!
//! ## Overview
//!
//! The dispatcher turns a resolved target (namespace, controller, action,
//! params) into a handler class name, resolves the handler through a
//! [`crate::registry::HandlerRegistry`], and invokes the action method.
//!
//! ## Architecture
//!
//! Dispatch is a loop, not a single call: any action or listener can
//! `forward` to a new target and the loop resolves it in the next iteration.
//! The loop is optimistic (each iteration assumes it is the last) and
//! bounded at [`MAX_DISPATCHES`] iterations, at which point it fails with a
//! cyclic-routing error.
//!
//! ## Error Handling
//!
//! Resolution failures (unknown handler class, missing action) are
//! recoverable: exception listeners observe them and may forward to an error
//! target instead. Unrecovered failures mark the response collaborator 404
//! and surface as [`crate::errors::DispatchError`]. Cyclic routing and a
//! missing registry are never recoverable.
//!
//! ## Example
//!
//! ```rust
//! use peregrine::dispatcher::Dispatcher;
//! use peregrine::registry::{Handler, HandlerRegistry};
//! # use peregrine::dispatcher::DispatchContext;
//! # use serde_json::{json, Value};
//!
//! struct PingController;
//!
//! impl Handler for PingController {
//!     fn has_action(&self, method: &str) -> bool {
//!         method == "indexAction"
//!     }
//!
//!     fn call_action(&mut self, _method: &str, _ctx: &mut DispatchContext) -> Option<Value> {
//!         Some(json!("pong"))
//!     }
//! }
//!
//! # fn main() -> Result<(), peregrine::errors::DispatchError> {
//! let mut registry = HandlerRegistry::new();
//! registry.set("PingController", || Box::new(PingController));
//!
//! let mut dispatcher = Dispatcher::new();
//! dispatcher.set_registry(registry);
//! dispatcher.set_controller_name("ping");
//!
//! dispatcher.dispatch()?;
//! assert_eq!(dispatcher.context().returned_value(), Some(&json!("pong")));
//! # Ok(())
//! # }
//! ```

mod context;
mod core;

pub use context::{DispatchContext, ForwardSpec};
pub use core::{DispatchEvent, Dispatcher, ResponseStatus, MAX_DISPATCHES};
