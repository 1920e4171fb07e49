//--------------------------------------------------------------------------------------------------
// MODULE OVERVIEW
//--------------------------------------------------------------------------------------------------
// The outbound event surface. The engine publishes every event synchronously
// into an EventSink from within `process`: when `process` returns, every
// event the intent caused has been delivered in publish order.
//
// | Name          | Description                                        |
// |---------------|----------------------------------------------------|
// | EventSink     | Receiver trait for engine-emitted events.          |
// | EventRecord   | A published event plus capture metadata.           |
// | EventLog      | Ordered in-memory sink for post-hoc verification.  |
//--------------------------------------------------------------------------------------------------

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::messages::EngineEvent;

/// Receives engine events in publish order. Implementations are invoked
/// synchronously; a slow sink makes the caller wait.
pub trait EventSink {
    fn publish(&mut self, event: EngineEvent);
}

/// Plain buffering sink, convenient in tests.
impl EventSink for Vec<EngineEvent> {
    fn publish(&mut self, event: EngineEvent) {
        self.push(event);
    }
}

/// A published event with its capture metadata. The metadata is
/// observability only and never part of the verification contract.
#[derive(Debug, Clone, Serialize)]
pub struct EventRecord {
    /// Monotonic publish sequence number, starting at 1.
    pub sequence: u64,
    /// Wall-clock capture time.
    pub recorded_at: DateTime<Utc>,
    /// The published event.
    pub event: EngineEvent,
}

/// Ordered in-memory buffer of every published event.
#[derive(Debug)]
pub struct EventLog {
    records: Vec<EventRecord>,
    next_sequence: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_sequence: 1,
        }
    }

    /// Returns the recorded events in publish order, without metadata.
    pub fn events(&self) -> Vec<EngineEvent> {
        self.records.iter().map(|record| record.event.clone()).collect()
    }

    /// Returns the full records in publish order.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drops all recorded events and restarts the sequence.
    pub fn clear(&mut self) {
        self.records.clear();
        self.next_sequence = 1;
    }
}

impl EventSink for EventLog {
    fn publish(&mut self, event: EngineEvent) {
        debug!(sequence = self.next_sequence, ?event, "event published");
        self.records.push(EventRecord {
            sequence: self.next_sequence,
            recorded_at: Utc::now(),
            event,
        });
        self.next_sequence += 1;
    }
}
