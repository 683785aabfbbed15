//! Splitting validated events into bounded batches.

use serde::Serialize;

use crate::event::Event;

/// Largest batch the billing ingestion API accepts.
pub const MAX_EVENTS_PER_INGEST_BATCH: usize = 100;

/// An ordered, non-empty run of events. Serializes as a JSON array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Batch {
    events: Vec<Event>,
}

impl Batch {
    /// Wrap events in a batch. Returns `None` for an empty input.
    pub fn new(events: Vec<Event>) -> Option<Self> {
        (!events.is_empty()).then_some(Self { events })
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

/// Split events into consecutive batches of at most `max_size`.
///
/// Order is preserved and no batch is empty. A `max_size` of zero is
/// treated as one.
pub fn partition(events: Vec<Event>, max_size: usize) -> Vec<Batch> {
    let max_size = max_size.max(1);
    let mut batches = Vec::with_capacity(events.len().div_ceil(max_size));
    let mut current = Vec::with_capacity(max_size.min(events.len()));

    for event in events {
        current.push(event);
        if current.len() == max_size {
            batches.push(Batch {
                events: std::mem::take(&mut current),
            });
        }
    }
    if !current.is_empty() {
        batches.push(Batch { events: current });
    }

    batches
}
