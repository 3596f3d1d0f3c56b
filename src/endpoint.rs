//! The path/method/resolver binding served by the dispatcher.

use std::fmt;

use http::Method;

use crate::resolver::Resolver;
use crate::response::MockResponse;

/// A configured endpoint: an exact path, an optional method constraint,
/// and the resolver that produces its responses.
///
/// Endpoints are built once at startup and never mutated; the resolver is
/// exclusively owned by its endpoint.
pub struct Endpoint {
    path: String,
    method: Option<Method>,
    resolver: Box<dyn Resolver>,
}

impl Endpoint {
    /// Bind a resolver to a path. `method: None` matches the path
    /// regardless of the request method.
    pub fn new(
        path: impl Into<String>,
        method: Option<Method>,
        resolver: Box<dyn Resolver>,
    ) -> Self {
        Self {
            path: path.into(),
            method,
            resolver,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> Option<&Method> {
        self.method.as_ref()
    }

    /// Produce the response for one request.
    pub fn resolve(&self) -> MockResponse {
        self.resolver.next()
    }
}

// The resolver is a trait object with no Debug bound; format the binding
// fields only.
impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.path)
            .field("method", &self.method)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{EndBehavior, SequencedResolver, StaticResolver};

    fn response(status: u16) -> MockResponse {
        MockResponse::builder().status(status).build().unwrap()
    }

    #[test]
    fn test_resolve_delegates_to_resolver() {
        let resolver =
            SequencedResolver::new(vec![response(200), response(503)], EndBehavior::RepeatLast)
                .unwrap();
        let endpoint = Endpoint::new("/jobs", Some(Method::POST), Box::new(resolver));

        assert_eq!(endpoint.resolve().status().as_u16(), 200);
        assert_eq!(endpoint.resolve().status().as_u16(), 503);
        assert_eq!(endpoint.resolve().status().as_u16(), 503);
    }

    #[test]
    fn test_accessors() {
        let endpoint = Endpoint::new("/ping", None, Box::new(StaticResolver::new(response(200))));
        assert_eq!(endpoint.path(), "/ping");
        assert!(endpoint.method().is_none());
    }

    #[test]
    fn test_debug_output_names_the_route() {
        let endpoint = Endpoint::new(
            "/health",
            Some(Method::GET),
            Box::new(StaticResolver::new(response(200))),
        );
        let rendered = format!("{endpoint:?}");
        assert!(rendered.contains("/health"), "{rendered}");
        assert!(rendered.contains("GET"), "{rendered}");
    }
}
