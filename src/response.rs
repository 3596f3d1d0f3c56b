//! The response value served by an endpoint.
//!
//! A [`MockResponse`] is immutable once built: resolvers hand out clones,
//! and the body is a [`Bytes`] buffer so clones share the allocation.

use std::time::Duration;

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use http_body_util::Full;

use crate::error::ValidationError;

/// An immutable HTTP response: status, headers, body, and an optional
/// delay applied before any bytes are written.
///
/// Build one through [`MockResponse::builder`]; validation happens once at
/// construction so serving never has to deal with a malformed response.
#[derive(Debug, Clone, PartialEq)]
pub struct MockResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    delay: Duration,
}

impl MockResponse {
    /// Start building a response. Defaults: status 200, no headers, empty
    /// body, zero delay.
    pub fn builder() -> MockResponseBuilder {
        MockResponseBuilder::default()
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Assemble the transport-level response. Status and headers are set
    /// on the `http::Response` before the body is handed to hyper, which
    /// writes the status line and header block ahead of any body bytes.
    pub fn to_http(&self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body.clone()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

impl Default for MockResponse {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Bytes::new(),
            delay: Duration::ZERO,
        }
    }
}

/// Builder for [`MockResponse`].
///
/// Headers are collected as raw strings and converted in [`build`], so an
/// unrepresentable name or value is a [`ValidationError`] at startup
/// rather than a surprise at serve time. Repeated writes to the same
/// header name keep the last value.
///
/// [`build`]: MockResponseBuilder::build
#[derive(Debug, Default)]
pub struct MockResponseBuilder {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Bytes,
    delay: Duration,
}

impl MockResponseBuilder {
    pub fn status(mut self, code: u16) -> Self {
        self.status = Some(code);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Validate and construct the response.
    ///
    /// Rejects status codes outside 100..=599 and header names or values
    /// the transport cannot carry.
    pub fn build(self) -> Result<MockResponse, ValidationError> {
        let code = self.status.unwrap_or(200);
        if !(100..=599).contains(&code) {
            return Err(ValidationError::StatusOutOfRange(code));
        }
        let status = StatusCode::from_u16(code)
            .map_err(|_| ValidationError::StatusOutOfRange(code))?;

        let mut headers = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers {
            let parsed_name = name
                .parse::<HeaderName>()
                .map_err(|_| ValidationError::InvalidHeaderName(name.clone()))?;
            let parsed_value = value
                .parse::<HeaderValue>()
                .map_err(|_| ValidationError::InvalidHeaderValue(name.clone()))?;
            headers.insert(parsed_name, parsed_value);
        }

        Ok(MockResponse {
            status,
            headers,
            body: self.body,
            delay: self.delay,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let response = MockResponse::builder().build().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().is_empty());
        assert!(response.body().is_empty());
        assert_eq!(response.delay(), Duration::ZERO);
    }

    #[test]
    fn test_all_fields_settable() {
        let response = MockResponse::builder()
            .status(201)
            .header("Location", "/things/7")
            .body("created")
            .delay(Duration::from_millis(50))
            .build()
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(response.headers()["location"], "/things/7");
        assert_eq!(response.body().as_ref(), b"created");
        assert_eq!(response.delay(), Duration::from_millis(50));
    }

    #[test]
    fn test_status_out_of_range() {
        for code in [0, 99, 600, 1000] {
            let err = MockResponse::builder().status(code).build().unwrap_err();
            assert_eq!(err, ValidationError::StatusOutOfRange(code));
        }
    }

    #[test]
    fn test_boundary_statuses_accepted() {
        for code in [100, 599] {
            let response = MockResponse::builder().status(code).build().unwrap();
            assert_eq!(response.status().as_u16(), code);
        }
    }

    #[test]
    fn test_last_header_write_wins() {
        let response = MockResponse::builder()
            .header("X-Token", "first")
            .header("x-token", "second")
            .build()
            .unwrap();
        assert_eq!(response.headers()["x-token"], "second");
        assert_eq!(response.headers().len(), 1);
    }

    #[test]
    fn test_invalid_header_name_rejected() {
        let err = MockResponse::builder()
            .header("bad header", "v")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::InvalidHeaderName("bad header".to_string())
        );
    }

    #[test]
    fn test_invalid_header_value_rejected() {
        let err = MockResponse::builder()
            .header("x-note", "line\nbreak")
            .build()
            .unwrap_err();
        assert_eq!(err, ValidationError::InvalidHeaderValue("x-note".to_string()));
    }

    #[test]
    fn test_clones_share_body() {
        let response = MockResponse::builder().body("shared").build().unwrap();
        let copy = response.clone();
        // Bytes clones point at the same buffer.
        assert_eq!(response.body().as_ptr(), copy.body().as_ptr());
    }

    #[test]
    fn test_to_http() {
        let response = MockResponse::builder()
            .status(418)
            .header("content-type", "text/plain")
            .body("teapot")
            .build()
            .unwrap();

        let http = response.to_http();
        assert_eq!(http.status(), StatusCode::IM_A_TEAPOT);
        assert_eq!(http.headers()["content-type"], "text/plain");
    }
}
