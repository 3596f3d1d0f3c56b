//! Configuration for the mock server.
//!
//! A config file declares the listen address, logging settings, and the
//! endpoint list. Each endpoint carries exactly one response strategy:
//! `response`, `weighted`, or `sequence`. Parsing and validation both
//! happen at startup so a bad file never makes it to serving.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use http::Method;

use crate::endpoint::Endpoint;
use crate::error::{Error, Result, ValidationError};
use crate::resolver::{EndBehavior, Resolver, SequencedResolver, StaticResolver, WeightedResolver};
use crate::response::MockResponse;

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Listen address, e.g. "0.0.0.0:8080". Overridable on the command line.
    #[serde(default)]
    pub listen: Option<String>,

    /// Logging settings
    #[serde(default)]
    pub settings: Settings,

    /// Endpoint definitions
    #[serde(default)]
    pub endpoints: Vec<EndpointDefinition>,
}

impl Config {
    /// Load configuration from a YAML file. Parse errors surface here;
    /// semantic validation happens in [`build_endpoints`](Self::build_endpoints).
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Translate every endpoint definition into a ready-to-serve
    /// [`Endpoint`]. The first invalid definition aborts with its index
    /// and path attached, so the error points at a line in the file.
    pub fn build_endpoints(&self) -> Result<Vec<Endpoint>> {
        let mut endpoints = Vec::with_capacity(self.endpoints.len());
        for (index, definition) in self.endpoints.iter().enumerate() {
            let endpoint = definition.build().map_err(|source| Error::Endpoint {
                index,
                path: definition.path.clone(),
                source,
            })?;
            endpoints.push(endpoint);
        }
        Ok(endpoints)
    }
}

/// Global logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Log every matched request
    #[serde(default = "default_true")]
    pub log_requests: bool,

    /// Log requests no endpoint matches
    #[serde(default = "default_true")]
    pub log_unmatched: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_requests: true,
            log_unmatched: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A single endpoint definition.
///
/// Exactly one of `response`, `weighted`, and `sequence` must be present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EndpointDefinition {
    /// Request path, matched exactly. Must start with '/'.
    pub path: String,

    /// HTTP method to match. Omit to match every method.
    #[serde(default)]
    pub method: Option<String>,

    /// Static strategy: the same response every time
    #[serde(default)]
    pub response: Option<ResponseDefinition>,

    /// Weighted strategy: pick per request, proportionally to weight
    #[serde(default)]
    pub weighted: Option<Vec<WeightedEntry>>,

    /// Sequenced strategy: responses in declaration order
    #[serde(default)]
    pub sequence: Option<SequenceDefinition>,
}

impl EndpointDefinition {
    /// Validate this definition and build the endpoint it describes.
    pub fn build(&self) -> std::result::Result<Endpoint, ValidationError> {
        if !self.path.starts_with('/') {
            return Err(ValidationError::InvalidPath(self.path.clone()));
        }
        let method = self.parse_method()?;
        let resolver = self.build_resolver()?;
        Ok(Endpoint::new(&self.path, method, resolver))
    }

    /// Methods are matched case-insensitively, so "get" and "GET" are the
    /// same endpoint. An omitted or empty method matches every method.
    fn parse_method(&self) -> std::result::Result<Option<Method>, ValidationError> {
        match self.method.as_deref() {
            None | Some("") => Ok(None),
            Some(raw) => {
                let upper = raw.to_ascii_uppercase();
                Method::from_bytes(upper.as_bytes())
                    .map(Some)
                    .map_err(|_| ValidationError::InvalidMethod(raw.to_string()))
            }
        }
    }

    fn build_resolver(&self) -> std::result::Result<Box<dyn Resolver>, ValidationError> {
        match (&self.response, &self.weighted, &self.sequence) {
            (Some(response), None, None) => Ok(Box::new(StaticResolver::new(response.build()?))),
            (None, Some(entries), None) => {
                let mut weighted = Vec::with_capacity(entries.len());
                for entry in entries {
                    weighted.push((entry.response.build()?, entry.weight));
                }
                Ok(Box::new(WeightedResolver::new(weighted)?))
            }
            (None, None, Some(seq)) => {
                let mut responses = Vec::new();
                for (index, entry) in seq.responses.iter().enumerate() {
                    let (definition, count) = match entry {
                        SequenceEntry::Single(definition) => (definition, 1),
                        SequenceEntry::Counted(counted) => {
                            if counted.count == 0 {
                                return Err(ValidationError::ZeroCount { index });
                            }
                            (&counted.response, counted.count)
                        }
                    };
                    let response = definition.build()?;
                    for _ in 0..count {
                        responses.push(response.clone());
                    }
                }
                Ok(Box::new(SequencedResolver::new(responses, seq.end)?))
            }
            (response, weighted, sequence) => {
                let found = usize::from(response.is_some())
                    + usize::from(weighted.is_some())
                    + usize::from(sequence.is_some());
                Err(ValidationError::StrategyCount { found })
            }
        }
    }
}

/// One entry of a weighted strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeightedEntry {
    /// Relative selection weight. Must be positive.
    pub weight: u32,

    /// Response to return when this entry is picked
    pub response: ResponseDefinition,
}

/// The sequenced strategy: responses served in order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SequenceDefinition {
    /// What happens after the last entry: `loop` or `repeatLast`
    #[serde(default)]
    pub end: EndBehavior,

    /// Entries in serving order
    pub responses: Vec<SequenceEntry>,
}

/// One entry of a sequence: either a response, or `{count, response}` to
/// occupy several consecutive steps with the same response.
///
/// Order matters for untagged enums: the variant with required fields
/// comes first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SequenceEntry {
    Counted(CountedEntry),
    Single(ResponseDefinition),
}

/// A sequence entry expanded into `count` steps at build time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountedEntry {
    /// How many steps this entry occupies. Must be positive.
    pub count: u32,

    /// Response to serve on each of those steps
    pub response: ResponseDefinition,
}

/// A single response definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResponseDefinition {
    /// HTTP status code
    #[serde(default = "default_status")]
    pub status: u16,

    /// Response headers
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Response body
    #[serde(default)]
    pub body: Option<ResponseBody>,

    /// Delay before responding, in milliseconds
    #[serde(default)]
    pub delay_ms: u64,
}

fn default_status() -> u16 {
    200
}

impl Default for ResponseDefinition {
    fn default() -> Self {
        Self {
            status: default_status(),
            headers: HashMap::new(),
            body: None,
            delay_ms: 0,
        }
    }
}

impl ResponseDefinition {
    /// Build the immutable response this definition describes.
    ///
    /// When a body is present and no content-type header is configured,
    /// the body kind's natural content type is filled in.
    pub fn build(&self) -> std::result::Result<MockResponse, ValidationError> {
        let mut builder = MockResponse::builder()
            .status(self.status)
            .delay(Duration::from_millis(self.delay_ms));

        let mut has_content_type = false;
        for (name, value) in &self.headers {
            if name.eq_ignore_ascii_case("content-type") {
                has_content_type = true;
            }
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &self.body {
            if !has_content_type {
                builder = builder.header("content-type", body.content_type());
            }
            builder = builder.body(body.to_bytes()?);
        }

        builder.build()
    }
}

/// Response body configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseBody {
    /// Plain text body
    Text { content: String },
    /// JSON body, declared inline as YAML
    Json { content: serde_json::Value },
    /// Base64 encoded binary
    Base64 { content: String },
    /// Load from file at startup
    File { path: String },
}

impl ResponseBody {
    /// Materialize the body. File bodies are read here, once, so a missing
    /// file fails startup instead of a request.
    pub fn to_bytes(&self) -> std::result::Result<Bytes, ValidationError> {
        match self {
            ResponseBody::Text { content } => Ok(Bytes::from(content.clone())),
            ResponseBody::Json { content } => Ok(Bytes::from(content.to_string())),
            ResponseBody::Base64 { content } => {
                use base64::Engine;
                base64::engine::general_purpose::STANDARD
                    .decode(content)
                    .map(Bytes::from)
                    .map_err(|e| ValidationError::InvalidBase64(e.to_string()))
            }
            ResponseBody::File { path } => std::fs::read(path).map(Bytes::from).map_err(|e| {
                ValidationError::BodyFile {
                    path: path.clone(),
                    reason: e.to_string(),
                }
            }),
        }
    }

    /// Content type filled in when the headers do not name one.
    pub fn content_type(&self) -> &'static str {
        match self {
            ResponseBody::Text { .. } => "text/plain",
            ResponseBody::Json { .. } => "application/json",
            ResponseBody::Base64 { .. } => "application/octet-stream",
            ResponseBody::File { .. } => "application/octet-stream",
        }
    }
}
