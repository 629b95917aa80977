//! Executes `HttpRequest` values against the network.
//!
//! # Design
//! `Transport` is the single seam between the pure request/response logic in
//! `HttpClient` and real I/O. `UreqTransport` is the blocking production
//! implementation. A fresh `ureq::Agent` is built for every request, so no
//! connection outlives the call that opened it, and 4xx/5xx responses come
//! back as data instead of `Err` so status interpretation stays in the client.

use std::io;
use std::time::Duration;

use ureq::Agent;

use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Connect and read timeout applied to every request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Performs one HTTP round-trip.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;

    /// Status code only. Implementations that can stop after the status line
    /// should, so an unreadable or huge body cannot fail the call.
    fn status(&self, request: &HttpRequest) -> Result<u16, TransportError> {
        self.execute(request).map(|response| response.status)
    }
}

/// Bounds on how long a single round-trip may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Time allowed to establish the connection.
    pub connect: Duration,
    /// Time allowed for the response head and for the body to arrive.
    pub read: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: DEFAULT_TIMEOUT,
            read: DEFAULT_TIMEOUT,
        }
    }
}

/// Blocking transport backed by `ureq`.
#[derive(Debug, Clone, Default)]
pub struct UreqTransport {
    timeouts: Timeouts,
}

impl UreqTransport {
    pub fn new(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }

    pub fn timeouts(&self) -> Timeouts {
        self.timeouts
    }

    fn agent(&self) -> Agent {
        Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .timeout_connect(Some(self.timeouts.connect))
            .timeout_recv_response(Some(self.timeouts.read))
            .timeout_recv_body(Some(self.timeouts.read))
            .build()
            .new_agent()
    }
}

impl UreqTransport {
    /// Send the request and return once the response head has arrived.
    fn send(&self, request: &HttpRequest) -> Result<ureq::http::Response<ureq::Body>, TransportError> {
        let agent = self.agent();

        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = agent.get(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                builder.call()
            }
            HttpMethod::Post => {
                let mut builder = agent.post(&request.url);
                for (name, value) in &request.headers {
                    builder = builder.header(name.as_str(), value.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        result.map_err(classify)
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let mut response = self.send(request)?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    value.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response.body_mut().read_to_string().map_err(classify)?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }

    fn status(&self, request: &HttpRequest) -> Result<u16, TransportError> {
        // Dropping the response with its body unread closes the connection.
        self.send(request).map(|response| response.status().as_u16())
    }
}

fn classify(err: ureq::Error) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout(err.to_string()),
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
            TransportError::Connect(err.to_string())
        }
        ureq::Error::Io(ref io_err) => match io_err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                TransportError::Timeout(err.to_string())
            }
            io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::AddrNotAvailable => TransportError::Connect(err.to_string()),
            _ => TransportError::Io(err.to_string()),
        },
        other => TransportError::Io(other.to_string()),
    }
}
