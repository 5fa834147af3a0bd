//! # Router Module
//!
//! Pattern routing: decomposing a request URI into the namespace, module,
//! controller, action, and params that should receive it.
//!
//! ## Overview
//!
//! The router owns an ordered list of [`Route`]s. Each route compiles a
//! human-authored pattern (`/users/{id:[0-9]+}`) into a matchable form plus a
//! map from part names to capture positions or literal defaults.
//!
//! ## Architecture
//!
//! Routing is a two-phase affair:
//!
//! 1. **Compilation**: at registration time, placeholders are replaced with
//!    capture groups and the part map is canonicalized. Malformed patterns
//!    fail here, not at match time.
//!
//! 2. **Matching**: `Router::handle` walks the list in *reverse* registration
//!    order and stops at the first route whose constraints, pattern, and
//!    before-match predicate all hold. The last registered of several
//!    overlapping routes therefore wins; this tie-break is deliberate,
//!    relied-upon behavior.
//!
//! ## Example
//!
//! ```rust
//! use peregrine::router::Router;
//! use peregrine::request::RequestSnapshot;
//! use http::Method;
//!
//! # fn main() -> Result<(), peregrine::errors::RouterError> {
//! let mut router = Router::new();
//! router.add("/users/{id:[0-9]+}", "Users::show", None)?;
//!
//! let request = RequestSnapshot::new(Method::GET);
//! router.handle("/users/42", Some(&request))?;
//!
//! assert!(router.was_matched());
//! assert_eq!(router.controller_name(), Some("users"));
//! assert_eq!(router.action_name(), Some("show"));
//! # Ok(())
//! # }
//! ```

mod core;
mod group;
mod route;
#[cfg(test)]
mod tests;

pub use core::{
    ParamVec, ResolvedTarget, RoutePosition, Router, RouterEvent, MAX_INLINE_PARAMS,
};
pub use group::RouteGroup;
pub use route::{PathSpec, PathTarget, Route, RouteId};
