//! Observability seam for `HttpClient`.
//!
//! # Design
//! The client never logs directly. It reports `ClientEvent`s to the
//! `EventSink` it holds, so embedders choose where outcomes go and tests can
//! assert on them without installing a global subscriber. `TracingSink` is
//! the default and forwards everything to `tracing`.

use std::sync::Mutex;

use tracing::{info, warn};

use crate::error::TransportError;

/// Something observable that happened during a client call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The probe got a status in `[200, 500)`.
    Connected { url: String, status: u16 },
    /// The probe got an answer outside `[200, 500)`.
    ProbeRejected { url: String, status: u16 },
    /// The probe never got an answer.
    ProbeFailed { url: String, error: TransportError },
    /// A POST is about to be sent.
    PostSent { url: String },
    /// A POST got an answer.
    PostStatus { url: String, status: u16 },
    /// A POST never got an answer.
    PostFailed { url: String, error: TransportError },
    /// A POST got a 200 whose body is not a JSON object.
    PostMalformed { url: String, error: String },
}

/// Receives client events.
pub trait EventSink {
    fn record(&self, event: &ClientEvent);
}

/// Forwards events to `tracing`: successes at info, failures at warn.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, event: &ClientEvent) {
        match event {
            ClientEvent::Connected { url, status } => {
                info!(%url, status, "connected");
            }
            ClientEvent::ProbeRejected { url, status } => {
                warn!(%url, status, "failed to connect: server answered outside 200..500");
            }
            ClientEvent::ProbeFailed { url, error } => {
                warn!(%url, %error, "failed to connect");
            }
            ClientEvent::PostSent { url } => {
                info!(%url, "POST request");
            }
            ClientEvent::PostStatus { url, status } => {
                if *status == 200 {
                    info!(%url, status, "POST response");
                } else {
                    warn!(%url, status, "POST returned no result");
                }
            }
            ClientEvent::PostFailed { url, error } => {
                warn!(%url, %error, "POST failed");
            }
            ClientEvent::PostMalformed { url, error } => {
                warn!(%url, %error, "POST response unusable");
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ClientEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far, oldest first.
    pub fn events(&self) -> Vec<ClientEvent> {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ClientEvent>> {
        // A poisoned log is still a valid log.
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for RecordingSink {
    fn record(&self, event: &ClientEvent) {
        self.lock().push(event.clone());
    }
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn record(&self, event: &ClientEvent) {
        (**self).record(event);
    }
}

impl<S: EventSink + ?Sized> EventSink for std::sync::Arc<S> {
    fn record(&self, event: &ClientEvent) {
        (**self).record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_sink_keeps_order() {
        let sink = RecordingSink::new();
        sink.record(&ClientEvent::PostSent {
            url: "http://a:1/x".to_string(),
        });
        sink.record(&ClientEvent::PostStatus {
            url: "http://a:1/x".to_string(),
            status: 404,
        });
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ClientEvent::PostSent { .. }));
        assert!(matches!(events[1], ClientEvent::PostStatus { status: 404, .. }));
    }

    #[test]
    fn tracing_sink_accepts_every_event() {
        let sink = TracingSink;
        let error = TransportError::Connect("refused".to_string());
        for event in [
            ClientEvent::Connected { url: "u".into(), status: 200 },
            ClientEvent::ProbeRejected { url: "u".into(), status: 503 },
            ClientEvent::ProbeFailed { url: "u".into(), error: error.clone() },
            ClientEvent::PostSent { url: "u".into() },
            ClientEvent::PostStatus { url: "u".into(), status: 200 },
            ClientEvent::PostFailed { url: "u".into(), error },
            ClientEvent::PostMalformed { url: "u".into(), error: "not json".into() },
        ] {
            sink.record(&event);
        }
    }
}
