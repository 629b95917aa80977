//! Blocking HTTP client core for the release service.
//!
//! # Overview
//! Resolves requests against an immutable `Endpoint`, probes the server with
//! a bounded GET and sends JSON payloads with POST. Request construction and
//! response interpretation are pure (`build_*` / `parse_*`); the round-trip
//! itself goes through the `Transport` trait, and outcomes are reported to an
//! `EventSink` rather than a global logger.
//!
//! # Design
//! - `HttpClient` is stateless apart from its endpoint and two seams.
//! - Construction errors (`ConfigError`, `ClientError::InvalidEndpoint`) are
//!   returned to the caller, which decides whether to exit.
//! - Network errors are folded into `false` / `None` and never propagate.
//! - Every request is bounded by a 5 s connect and 5 s read timeout.

pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod events;
pub mod http;
pub mod target;
pub mod transport;

pub use client::HttpClient;
pub use config::{ConfigSource, Properties, ServerSettings};
pub use endpoint::{Endpoint, Scheme};
pub use error::{ClientError, ConfigError, TransportError};
pub use events::{ClientEvent, EventSink, RecordingSink, TracingSink};
pub use http::{HttpMethod, HttpRequest, HttpResponse, JsonPayload, JSON_CONTENT_TYPE};
pub use target::RelativeTarget;
pub use transport::{Timeouts, Transport, UreqTransport, DEFAULT_TIMEOUT};
