//! Request collaborator consumed for route constraint checks.
//!
//! The router never parses HTTP itself; the embedding application hands it
//! the two request facts constraints can depend on: the HTTP method and the
//! `Host` the request was addressed to.

use http::Method;

/// Request-side facts the router needs while matching.
pub trait Request {
    /// HTTP method of the in-flight request.
    fn method(&self) -> &Method;

    /// Host the request was addressed to, if known. CLI-style invocations
    /// have none; host-constrained routes are then skipped.
    fn http_host(&self) -> Option<&str>;

    /// Exact, case-sensitive set membership against a route's method
    /// constraint.
    fn is_method(&self, methods: &[Method]) -> bool {
        methods.iter().any(|m| m == self.method())
    }
}

/// Owned snapshot of the request facts.
///
/// Embedders copy method and host out of their server's request type once per
/// request; tests construct these directly.
#[derive(Debug, Clone)]
pub struct RequestSnapshot {
    method: Method,
    host: Option<String>,
}

impl RequestSnapshot {
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self { method, host: None }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }
}

impl Request for RequestSnapshot {
    fn method(&self) -> &Method {
        &self.method
    }

    fn http_host(&self) -> Option<&str> {
        self.host.as_deref()
    }
}
