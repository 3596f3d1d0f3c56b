//! mockd
//!
//! A standalone HTTP mock server driven by a YAML config file. Declare
//! endpoints with exact paths and methods, and for each one a response
//! strategy: a single static response, a weighted random pick, or a
//! sequence served in order.
//!
//! # Features
//!
//! - **Exact Routing**: Match requests by exact path, with optional method
//! - **Static Responses**: The same response on every request
//! - **Weighted Responses**: Random pick proportional to configured weights
//! - **Sequenced Responses**: Declaration order, then loop or repeat last
//! - **Latency Simulation**: Per-response fixed delays
//! - **Body Kinds**: Inline text and JSON, base64 binary, or file contents
//!
//! # Example Configuration
//!
//! ```yaml
//! endpoints:
//!   - path: /hello
//!     method: GET
//!     response:
//!       status: 200
//!       body:
//!         type: json
//!         content:
//!           message: "Hello, World!"
//!
//!   - path: /flaky
//!     weighted:
//!       - weight: 3
//!         response:
//!           status: 200
//!       - weight: 1
//!         response:
//!           status: 503
//!
//!   - path: /jobs/42
//!     method: GET
//!     sequence:
//!       end: repeatLast
//!       responses:
//!         - status: 202
//!         - status: 200
//! ```

pub mod config;
pub mod dispatch;
pub mod endpoint;
pub mod error;
pub mod resolver;
pub mod response;
pub mod server;

pub use config::{Config, Settings};
pub use dispatch::Dispatcher;
pub use endpoint::Endpoint;
pub use error::{Error, Result, ValidationError};
pub use resolver::{
    EndBehavior, NumberSource, Resolver, SequencedResolver, StaticResolver, ThreadRngSource,
    WeightedResolver,
};
pub use response::{MockResponse, MockResponseBuilder};
pub use server::Server;
