//! Connectivity probe and JSON POST against a fixed endpoint.
//!
//! # Design
//! `HttpClient` holds only an immutable `Endpoint` plus its two seams and
//! carries no state between calls. Each operation is split into a pure
//! `build_*` method that produces an `HttpRequest` and a pure `parse_*`
//! method that consumes an `HttpResponse`; `is_connected` and `post` glue the
//! two halves around a single `Transport::execute` call.
//!
//! Network failures never escape: they are reported to the `EventSink` and
//! folded into `false` (probe) or `Ok(None)` (POST). Only requests the client
//! refuses to build and 200 responses whose body is not a JSON object are
//! returned as `Err`.

use crate::endpoint::{Endpoint, Scheme};
use crate::error::ClientError;
use crate::events::{ClientEvent, EventSink, TracingSink};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, JsonPayload, JSON_CONTENT_TYPE};
use crate::target::RelativeTarget;
use crate::transport::{Transport, UreqTransport};

/// Synchronous client for a single remote server.
#[derive(Debug, Clone)]
pub struct HttpClient<T = UreqTransport, S = TracingSink> {
    endpoint: Endpoint,
    transport: T,
    sink: S,
}

impl HttpClient {
    /// Client with the blocking `ureq` transport and `tracing` output.
    pub fn new(endpoint: Endpoint) -> Self {
        Self::with_parts(endpoint, UreqTransport::default(), TracingSink)
    }

    /// Build the endpoint from its parts, then the client.
    pub fn connect(domain: &str, port: u16, use_https: bool) -> Result<Self, ClientError> {
        let endpoint = Endpoint::new(domain, port, Scheme::from_https(use_https))?;
        Ok(Self::new(endpoint))
    }
}

impl<T: Transport, S: EventSink> HttpClient<T, S> {
    pub fn with_parts(endpoint: Endpoint, transport: T, sink: S) -> Self {
        Self {
            endpoint,
            transport,
            sink,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn build_probe(&self) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.endpoint.root().to_string(),
            headers: Vec::new(),
            body: None,
        }
    }

    /// Reachable means the server answered with a status in `[200, 500)`;
    /// a 4xx still proves something is speaking HTTP on the other end.
    pub fn parse_probe(&self, response: &HttpResponse) -> bool {
        is_reachable(response.status)
    }

    pub fn build_post(
        &self,
        target: &RelativeTarget,
        body: &JsonPayload,
    ) -> Result<HttpRequest, ClientError> {
        let body =
            serde_json::to_string(body).map_err(|e| ClientError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url: self.endpoint.resolve(target)?.to_string(),
            headers: vec![("Content-Type".to_string(), JSON_CONTENT_TYPE.to_string())],
            body: Some(body),
        })
    }

    /// `Some` only for a 200 whose body is a JSON object; `None` for any
    /// other status, whatever the body.
    pub fn parse_post(&self, response: HttpResponse) -> Result<Option<JsonPayload>, ClientError> {
        if response.status != 200 {
            return Ok(None);
        }
        let value: serde_json::Value = serde_json::from_str(&response.body)
            .map_err(|e| ClientError::MalformedResponse(e.to_string()))?;
        match value {
            serde_json::Value::Object(map) => Ok(Some(map)),
            other => Err(ClientError::MalformedResponse(format!(
                "expected a JSON object, got {}",
                kind_of(&other)
            ))),
        }
    }

    /// Send one GET to the root and report whether the server is reachable.
    ///
    /// Only the status line is consulted; the body is never read.
    pub fn is_connected(&self) -> bool {
        let request = self.build_probe();
        match self.transport.status(&request) {
            Ok(status) => {
                let connected = is_reachable(status);
                let url = request.url;
                if connected {
                    self.sink.record(&ClientEvent::Connected { url, status });
                } else {
                    self.sink.record(&ClientEvent::ProbeRejected { url, status });
                }
                connected
            }
            Err(error) => {
                self.sink.record(&ClientEvent::ProbeFailed {
                    url: request.url,
                    error,
                });
                false
            }
        }
    }

    /// POST `body` to `target`, resolved against the endpoint root.
    pub fn post(&self, target: &str, body: &JsonPayload) -> Result<Option<JsonPayload>, ClientError> {
        let target = RelativeTarget::parse(target)?;
        self.post_target(&target, body)
    }

    pub fn post_target(
        &self,
        target: &RelativeTarget,
        body: &JsonPayload,
    ) -> Result<Option<JsonPayload>, ClientError> {
        let request = self.build_post(target, body)?;
        self.sink.record(&ClientEvent::PostSent {
            url: request.url.clone(),
        });

        match self.transport.execute(&request) {
            Ok(response) => {
                self.sink.record(&ClientEvent::PostStatus {
                    url: request.url.clone(),
                    status: response.status,
                });
                let parsed = self.parse_post(response);
                if let Err(error) = &parsed {
                    self.sink.record(&ClientEvent::PostMalformed {
                        url: request.url,
                        error: error.to_string(),
                    });
                }
                parsed
            }
            Err(error) => {
                self.sink.record(&ClientEvent::PostFailed {
                    url: request.url,
                    error,
                });
                Ok(None)
            }
        }
    }
}

fn is_reachable(status: u16) -> bool {
    (200..500).contains(&status)
}

fn kind_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
