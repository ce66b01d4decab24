//! Append-only buffer of committed market events.

use bondbatch_types::MarketEvent;

/// Events produced by committed operations, oldest first.
///
/// Observers call [`EventLog::drain`] to consume them.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<MarketEvent>,
}

impl EventLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn emit(&mut self, event: MarketEvent) {
        tracing::debug!(kind = event.kind(), event = ?event, "Event emitted");
        self.events.push(event);
    }

    /// Append a whole operation's events at once.
    pub fn extend(&mut self, events: impl IntoIterator<Item = MarketEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    /// Take every pending event.
    pub fn drain(&mut self) -> Vec<MarketEvent> {
        std::mem::take(&mut self.events)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_log() {
        let mut log = EventLog::new();
        log.emit(MarketEvent::MarketOpened);
        log.extend([
            MarketEvent::FeesUpdated {
                buy_fee_pct: 1,
                sell_fee_pct: 2,
            },
        ]);
        assert_eq!(log.len(), 2);
        let events = log.drain();
        assert_eq!(events[0], MarketEvent::MarketOpened);
        assert!(log.is_empty());
    }
}
