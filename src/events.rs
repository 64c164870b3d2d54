//! Update events: the only channel from the core to the presentation layer.

use chrono::{DateTime, Local};
use crossbeam_channel::Sender;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

/// One timestamped log line.
#[derive(Debug, Clone)]
pub struct UpdateEvent {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Local>,
}

impl UpdateEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            timestamp: Local::now(),
        }
    }
}

/// Destination for events emitted by the worker.
///
/// Implementations must preserve emission order.
pub trait EventSink {
    fn emit(&self, event: UpdateEvent);

    fn info(&self, message: String) {
        self.emit(UpdateEvent::new(Severity::Info, message));
    }

    fn success(&self, message: String) {
        self.emit(UpdateEvent::new(Severity::Success, message));
    }

    fn error(&self, message: String) {
        self.emit(UpdateEvent::new(Severity::Error, message));
    }
}

/// Events are queued for the presentation thread. A dropped receiver means
/// nobody is watching any more; the run still completes.
impl EventSink for Sender<UpdateEvent> {
    fn emit(&self, event: UpdateEvent) {
        let _ = self.send(event);
    }
}

/// In-memory sink that keeps every event, in order.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Mutex<Vec<UpdateEvent>>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UpdateEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<UpdateEvent> {
        self.lock().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.lock()
            .iter()
            .filter(|e| e.severity == severity)
            .count()
    }
}

impl EventSink for EventLog {
    fn emit(&self, event: UpdateEvent) {
        self.lock().push(event);
    }
}
