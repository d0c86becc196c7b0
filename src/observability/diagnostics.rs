use parking_lot::Mutex;
use std::fmt::Debug;
use tracing::{debug, warn};

/// Which end of a response body a stripped char came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Leading,
    Trailing,
}

/// Severity of a diagnostic event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Warn,
}

/// Structured event emitted by the client while serving a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// A request is about to be handed to the transport.
    Request { method: String, path: String },

    /// Raw body received for a list call, before sanitization.
    ResponseBody { path: String, body: String },

    /// A non-graphic char was trimmed from a response body.
    NonGraphicRune { path: String, rune: char, edge: Edge },

    /// A response body could not be decoded.
    DecodeFailure {
        path: String,
        body: String,
        error: String,
    },
}

impl DiagnosticEvent {
    pub fn level(&self) -> Level {
        match self {
            DiagnosticEvent::NonGraphicRune { .. } => Level::Warn,
            _ => Level::Debug,
        }
    }
}

/// Sink for client diagnostics.
///
/// Injected into the client so that no logging state is global.
/// Implementations must be cheap and must not fail.
pub trait Diagnostics: Send + Sync + Debug {
    fn record(&self, event: DiagnosticEvent);
}

/// Forwards diagnostic events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDiagnostics;

impl Diagnostics for TracingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::Request { method, path } => {
                debug!(method = %method, path = %path, "Sending rules request");
            }
            DiagnosticEvent::ResponseBody { path, body } => {
                debug!(path = %path, body = %body, "Response body");
            }
            DiagnosticEvent::NonGraphicRune { path, rune, edge } => {
                warn!(
                    path = %path,
                    rune = ?rune,
                    codepoint = %format_args!("U+{:04X}", rune as u32),
                    edge = ?edge,
                    "Found non-printing char in response body"
                );
            }
            DiagnosticEvent::DecodeFailure { path, body, error } => {
                debug!(
                    path = %path,
                    body = %body,
                    error = %error,
                    "Failed to unmarshal rules response"
                );
            }
        }
    }
}

/// Keeps every event in memory, for tests and for callers that want
/// to inspect what happened during a call.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl RecordingDiagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, oldest first.
    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    /// Number of events recorded at the given level.
    pub fn count(&self, level: Level) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| e.level() == level)
            .count()
    }

    /// Chars reported as stripped, in the order they were reported.
    pub fn stripped_runes(&self) -> Vec<(char, Edge)> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DiagnosticEvent::NonGraphicRune { rune, edge, .. } => Some((*rune, *edge)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Diagnostics for RecordingDiagnostics {
    fn record(&self, event: DiagnosticEvent) {
        self.events.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_levels() {
        let warn_event = DiagnosticEvent::NonGraphicRune {
            path: "/api/v1/rules".to_string(),
            rune: '\0',
            edge: Edge::Leading,
        };
        let debug_event = DiagnosticEvent::Request {
            method: "GET".to_string(),
            path: "/api/v1/rules".to_string(),
        };

        assert_eq!(warn_event.level(), Level::Warn);
        assert_eq!(debug_event.level(), Level::Debug);
    }

    #[test]
    fn test_recording_diagnostics() {
        let diagnostics = RecordingDiagnostics::new();

        diagnostics.record(DiagnosticEvent::Request {
            method: "GET".to_string(),
            path: "/p".to_string(),
        });
        diagnostics.record(DiagnosticEvent::NonGraphicRune {
            path: "/p".to_string(),
            rune: '\u{feff}',
            edge: Edge::Leading,
        });

        assert_eq!(diagnostics.events().len(), 2);
        assert_eq!(diagnostics.count(Level::Warn), 1);
        assert_eq!(diagnostics.stripped_runes(), vec![('\u{feff}', Edge::Leading)]);

        diagnostics.clear();
        assert!(diagnostics.events().is_empty());
    }

    #[test]
    fn test_tracing_diagnostics_does_not_panic() {
        crate::observability::tracing::init_test_tracing();

        TracingDiagnostics.record(DiagnosticEvent::DecodeFailure {
            path: "/p".to_string(),
            body: "<html>".to_string(),
            error: "bad".to_string(),
        });
    }
}
