//! Request dispatch.
//!
//! The [`Dispatcher`] holds the endpoint table, built once at startup and
//! read-only afterwards. Lookup is exact on path, then on method, with an
//! any-method endpoint as the per-path fallback.

use std::collections::HashMap;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{Method, StatusCode};
use http_body_util::Full;
use tracing::{info, warn};

use crate::config::Settings;
use crate::endpoint::Endpoint;
use crate::error::ValidationError;

/// Maps incoming requests to endpoints and drives their resolvers.
#[derive(Debug)]
pub struct Dispatcher {
    routes: HashMap<String, PathEntry>,
    settings: Settings,
}

/// Endpoints registered under one path: one per explicit method, plus at
/// most one any-method fallback.
#[derive(Debug, Default)]
struct PathEntry {
    by_method: HashMap<Method, Endpoint>,
    any_method: Option<Endpoint>,
}

impl Dispatcher {
    /// Build the lookup table from fully-constructed endpoints.
    ///
    /// A second endpoint for the same (path, method) pair, or a second
    /// any-method endpoint for a path, is a configuration mistake the
    /// server refuses to start with.
    pub fn new(endpoints: Vec<Endpoint>, settings: Settings) -> Result<Self, ValidationError> {
        let mut routes: HashMap<String, PathEntry> = HashMap::new();

        for endpoint in endpoints {
            let path = endpoint.path().to_string();
            let entry = routes.entry(path.clone()).or_default();
            match endpoint.method().cloned() {
                Some(method) => {
                    if entry.by_method.contains_key(&method) {
                        return Err(ValidationError::DuplicateEndpoint {
                            method: method.to_string(),
                            path,
                        });
                    }
                    entry.by_method.insert(method, endpoint);
                }
                None => {
                    if entry.any_method.is_some() {
                        return Err(ValidationError::DuplicateEndpoint {
                            method: "ANY".to_string(),
                            path,
                        });
                    }
                    entry.any_method = Some(endpoint);
                }
            }
        }

        Ok(Self { routes, settings })
    }

    /// Exact-match lookup. A method-specific endpoint wins over the
    /// any-method endpoint registered for the same path.
    pub fn lookup(&self, method: &Method, path: &str) -> Option<&Endpoint> {
        let entry = self.routes.get(path)?;
        entry.by_method.get(method).or(entry.any_method.as_ref())
    }

    /// Handle one request: resolve the endpoint's next response, wait out
    /// its delay, then emit status, headers, and body.
    ///
    /// The delay blocks only this request's task; any resolver-internal
    /// lock was released inside `resolve()`.
    pub async fn handle(&self, method: &Method, path: &str) -> http::Response<Full<Bytes>> {
        let Some(endpoint) = self.lookup(method, path) else {
            if self.settings.log_unmatched {
                warn!(method = %method, path = %path, "no endpoint matches request");
            }
            return not_found();
        };

        let response = endpoint.resolve();

        if self.settings.log_requests {
            info!(
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                "request matched endpoint"
            );
        }

        let delay = response.delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        response.to_http()
    }
}

/// Transport default for requests no endpoint claims.
fn not_found() -> http::Response<Full<Bytes>> {
    let body = Bytes::from_static(
        br#"{"error":"not_found","message":"no endpoint matches this request"}"#,
    );
    let mut response = http::Response::new(Full::new(body));
    *response.status_mut() = StatusCode::NOT_FOUND;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::{EndBehavior, SequencedResolver, StaticResolver};
    use crate::response::MockResponse;
    use std::time::Duration;

    fn static_endpoint(path: &str, method: Option<Method>, status: u16) -> Endpoint {
        let response = MockResponse::builder().status(status).build().unwrap();
        Endpoint::new(path, method, Box::new(StaticResolver::new(response)))
    }

    fn dispatcher(endpoints: Vec<Endpoint>) -> Dispatcher {
        Dispatcher::new(endpoints, Settings::default()).unwrap()
    }

    #[test]
    fn test_lookup_exact_match() {
        let d = dispatcher(vec![static_endpoint("/users", Some(Method::GET), 200)]);

        assert!(d.lookup(&Method::GET, "/users").is_some());
        assert!(d.lookup(&Method::POST, "/users").is_none());
        assert!(d.lookup(&Method::GET, "/users/7").is_none());
    }

    #[test]
    fn test_any_method_endpoint_matches_every_method() {
        let d = dispatcher(vec![static_endpoint("/echo", None, 200)]);

        for method in [Method::GET, Method::POST, Method::DELETE, Method::PATCH] {
            assert!(d.lookup(&method, "/echo").is_some(), "{method}");
        }
    }

    #[test]
    fn test_method_specific_wins_over_any_method() {
        let d = dispatcher(vec![
            static_endpoint("/mixed", None, 200),
            static_endpoint("/mixed", Some(Method::POST), 201),
        ]);

        let via_post = d.lookup(&Method::POST, "/mixed").unwrap();
        assert_eq!(via_post.resolve().status().as_u16(), 201);

        let via_get = d.lookup(&Method::GET, "/mixed").unwrap();
        assert_eq!(via_get.resolve().status().as_u16(), 200);
    }

    #[test]
    fn test_duplicate_method_path_rejected() {
        let err = Dispatcher::new(
            vec![
                static_endpoint("/dup", Some(Method::GET), 200),
                static_endpoint("/dup", Some(Method::GET), 500),
            ],
            Settings::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            ValidationError::DuplicateEndpoint {
                method: "GET".to_string(),
                path: "/dup".to_string(),
            }
        );
    }

    #[test]
    fn test_debug_output_lists_registered_paths() {
        let d = dispatcher(vec![static_endpoint("/metrics", Some(Method::GET), 200)]);
        let rendered = format!("{d:?}");
        assert!(rendered.contains("/metrics"), "{rendered}");
    }

    #[test]
    fn test_duplicate_any_method_rejected() {
        let err = Dispatcher::new(
            vec![
                static_endpoint("/dup", None, 200),
                static_endpoint("/dup", None, 500),
            ],
            Settings::default(),
        )
        .unwrap_err();

        assert!(matches!(err, ValidationError::DuplicateEndpoint { .. }));
    }

    #[tokio::test]
    async fn test_handle_emits_status_headers_body() {
        let response = MockResponse::builder()
            .status(201)
            .header("x-request-id", "fixed")
            .body(r#"{"id":1}"#)
            .build()
            .unwrap();
        let endpoint = Endpoint::new(
            "/things",
            Some(Method::POST),
            Box::new(StaticResolver::new(response)),
        );
        let d = dispatcher(vec![endpoint]);

        let http = d.handle(&Method::POST, "/things").await;
        assert_eq!(http.status(), StatusCode::CREATED);
        assert_eq!(http.headers()["x-request-id"], "fixed");
    }

    #[tokio::test]
    async fn test_handle_unmatched_returns_not_found() {
        let d = dispatcher(vec![static_endpoint("/known", Some(Method::GET), 200)]);

        let http = d.handle(&Method::GET, "/unknown").await;
        assert_eq!(http.status(), StatusCode::NOT_FOUND);
        assert_eq!(http.headers()[CONTENT_TYPE], "application/json");
    }

    #[tokio::test]
    async fn test_handle_advances_sequenced_resolver() {
        let responses = vec![
            MockResponse::builder().status(202).build().unwrap(),
            MockResponse::builder().status(200).build().unwrap(),
        ];
        let resolver = SequencedResolver::new(responses, EndBehavior::RepeatLast).unwrap();
        let endpoint = Endpoint::new("/jobs", Some(Method::GET), Box::new(resolver));
        let d = dispatcher(vec![endpoint]);

        assert_eq!(d.handle(&Method::GET, "/jobs").await.status().as_u16(), 202);
        assert_eq!(d.handle(&Method::GET, "/jobs").await.status().as_u16(), 200);
        assert_eq!(d.handle(&Method::GET, "/jobs").await.status().as_u16(), 200);
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_waits_out_the_delay() {
        let response = MockResponse::builder()
            .delay(Duration::from_millis(250))
            .build()
            .unwrap();
        let endpoint = Endpoint::new(
            "/slow",
            Some(Method::GET),
            Box::new(StaticResolver::new(response)),
        );
        let d = dispatcher(vec![endpoint]);

        let started = tokio::time::Instant::now();
        let http = d.handle(&Method::GET, "/slow").await;
        assert_eq!(http.status(), StatusCode::OK);
        assert!(started.elapsed() >= Duration::from_millis(250));
    }
}
