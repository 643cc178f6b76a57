//! Diagnostics sinks
//!
//! The resolver reports unresolved placeholders through a [`Diagnostics`]
//! sink rather than a global logger. [`LogDiagnostics`] forwards to the
//! `log` facade; [`MemoryDiagnostics`] keeps events for inspection.

use std::sync::{Arc, Mutex};

/// Message attached to every unresolved-placeholder event
pub const VARS_NOT_FOUND: &str = "Environment variables not found";

/// Receiver of resolver warnings and errors.
///
/// `vars_not_found` is the unresolved names joined by `", "`.
pub trait Diagnostics: Send + Sync {
    /// Optional placeholders were left unresolved
    fn warn(&self, message: &str, vars_not_found: &str);

    /// Mandatory placeholders were left unresolved
    fn error(&self, message: &str, vars_not_found: &str);
}

/// Forwards events to the `log` facade.
///
/// The unresolved names travel as the `varsNotFound` key-value field and are
/// repeated in the message for backends that drop structured fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn warn(&self, message: &str, vars_not_found: &str) {
        log::warn!(varsNotFound = vars_not_found; "{}: {}", message, vars_not_found);
    }

    fn error(&self, message: &str, vars_not_found: &str) {
        log::error!(varsNotFound = vars_not_found; "{}: {}", message, vars_not_found);
    }
}

/// Severity of a recorded event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Warn,
    Error,
}

/// A recorded diagnostics event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub level: Level,
    pub message: String,
    pub vars_not_found: String,
}

/// Records events in memory.
///
/// Clones share the same buffer, so one handle can be given to a resolver
/// while another is kept to inspect what was reported.
#[derive(Debug, Clone, Default)]
pub struct MemoryDiagnostics {
    events: Arc<Mutex<Vec<Event>>>,
}

impl MemoryDiagnostics {
    /// Create an empty recorder
    pub fn new() -> Self {
        Self::default()
    }

    /// All events recorded so far, oldest first
    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    /// Drop all recorded events
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn record(&self, level: Level, message: &str, vars_not_found: &str) {
        self.lock().push(Event {
            level,
            message: message.to_string(),
            vars_not_found: vars_not_found.to_string(),
        });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        // A poisoned buffer is still a consistent Vec
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Diagnostics for MemoryDiagnostics {
    fn warn(&self, message: &str, vars_not_found: &str) {
        self.record(Level::Warn, message, vars_not_found);
    }

    fn error(&self, message: &str, vars_not_found: &str) {
        self.record(Level::Error, message, vars_not_found);
    }
}
