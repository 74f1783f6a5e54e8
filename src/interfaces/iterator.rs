//! Event cursor interface.

use async_trait::async_trait;

use crate::event::Event;
use crate::interfaces::Result;

/// A restartable, lazy sequence of events.
///
/// Single pass unless rewound: `next` advances, `rewind` restarts from the
/// original position so the following `next` yields the first event again.
#[async_trait]
pub trait EventStreamIterator: Send {
    /// Advance and return the next event, or `None` once exhausted.
    async fn next(&mut self) -> Result<Option<Event>>;

    /// Restart from the first event.
    async fn rewind(&mut self) -> Result<()>;

    /// Zero-based index of the current event, `None` before the first
    /// `next` or after exhaustion.
    fn key(&self) -> Option<u64>;

    /// The event most recently returned by `next`.
    fn current(&self) -> Option<&Event>;

    /// Drain the remaining events.
    async fn collect_events(&mut self) -> Result<Vec<Event>> {
        let mut events = Vec::new();
        while let Some(event) = self.next().await? {
            events.push(event);
        }
        Ok(events)
    }
}

/// Cursor over an already materialized list, used for substituted reads.
#[derive(Debug, Clone, Default)]
pub struct InMemoryIterator {
    events: Vec<Event>,
    position: usize,
    current: Option<usize>,
}

impl InMemoryIterator {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events,
            position: 0,
            current: None,
        }
    }
}

#[async_trait]
impl EventStreamIterator for InMemoryIterator {
    async fn next(&mut self) -> Result<Option<Event>> {
        match self.events.get(self.position) {
            Some(event) => {
                self.current = Some(self.position);
                self.position += 1;
                Ok(Some(event.clone()))
            }
            None => {
                self.current = None;
                Ok(None)
            }
        }
    }

    async fn rewind(&mut self) -> Result<()> {
        self.position = 0;
        self.current = None;
        Ok(())
    }

    fn key(&self) -> Option<u64> {
        self.current.map(|index| index as u64)
    }

    fn current(&self) -> Option<&Event> {
        self.current.and_then(|index| self.events.get(index))
    }
}
