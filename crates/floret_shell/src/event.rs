//! Event reporting sink.

use std::fmt;
use std::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventLevel {
    Info,
    Warn,
}

/// One reportable happening in a processing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub level: EventLevel,
    /// Short machine-friendly tag, e.g. "env-export" or "loc-pull".
    pub kind: String,
    pub message: String,
}

impl Event {
    pub fn info(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Event {
            level: EventLevel::Info,
            kind: kind.into(),
            message: message.into(),
        }
    }

    pub fn warn(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Event {
            level: EventLevel::Warn,
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

/// Opaque append-only event destination.
pub trait EventSink: Send + Sync {
    fn event(&self, event: Event);
}

/// Production sink: forwards events to `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn event(&self, event: Event) {
        match event.level {
            EventLevel::Info => info!(kind = %event.kind, "{}", event.message),
            EventLevel::Warn => warn!(kind = %event.kind, "{}", event.message),
        }
    }
}

/// Test sink that records events in order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut self.events.lock().expect("sink lock"))
    }
}

impl EventSink for MemorySink {
    fn event(&self, event: Event) {
        self.events.lock().expect("sink lock").push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.event(Event::info("a", "first"));
        sink.event(Event::warn("b", "second"));
        let events = sink.take();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, "a");
        assert_eq!(events[1].level, EventLevel::Warn);
        assert!(sink.take().is_empty());
    }

    #[test]
    fn display_is_compact() {
        let event = Event::info("loc-pull", "pulled fs:/tmp/x");
        assert_eq!(event.to_string(), "[loc-pull] pulled fs:/tmp/x");
    }
}
