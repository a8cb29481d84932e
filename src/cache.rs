//! Last-good-result cache
//!
//! One slot per result kind. Slots are only written from the success path
//! of an operation, so a failed call can never disturb what is cached.
//! Every accepted write emits a [`ResultEvent`] on a broadcast channel.

use crate::types::{BatchPredictionResult, PredictionResult};
use chrono::{DateTime, Utc};
use std::sync::RwLock;
use tokio::sync::broadcast;
use tracing::warn;

/// Which cache slot an event or entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    Single,
    Batch,
}

/// A cached response together with the request sequence that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct CachedResult<T> {
    pub sequence: u64,
    pub received_at: DateTime<Utc>,
    pub value: T,
}

/// Emitted after a cache slot has been overwritten
#[derive(Debug, Clone, PartialEq)]
pub struct ResultEvent {
    pub kind: ResultKind,
    pub sequence: u64,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of offering a response to the cache
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Stored,
    /// A response from a later-issued request is already cached
    Stale { cached_sequence: u64 },
}

struct Slot<T> {
    entry: RwLock<Option<CachedResult<T>>>,
}

impl<T: Clone> Slot<T> {
    fn new() -> Self {
        Self {
            entry: RwLock::new(None),
        }
    }

    fn get(&self) -> Option<CachedResult<T>> {
        match self.entry.read() {
            Ok(entry) => entry.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn store(&self, sequence: u64, value: T, discard_stale: bool) -> StoreOutcome {
        let mut entry = match self.entry.write() {
            Ok(entry) => entry,
            Err(poisoned) => poisoned.into_inner(),
        };

        if discard_stale {
            if let Some(current) = entry.as_ref() {
                if current.sequence > sequence {
                    return StoreOutcome::Stale {
                        cached_sequence: current.sequence,
                    };
                }
            }
        }

        *entry = Some(CachedResult {
            sequence,
            received_at: Utc::now(),
            value,
        });
        StoreOutcome::Stored
    }
}

/// Cache of the most recent successful single and batch results
pub struct ResultCache {
    single: Slot<PredictionResult>,
    batch: Slot<BatchPredictionResult>,
    discard_stale: bool,
    events: broadcast::Sender<ResultEvent>,
}

impl ResultCache {
    /// Create an empty cache. `event_capacity` is the per-subscriber buffer.
    pub fn new(discard_stale: bool, event_capacity: usize) -> Self {
        let (events, _) = broadcast::channel(event_capacity.max(1));
        Self {
            single: Slot::new(),
            batch: Slot::new(),
            discard_stale,
            events,
        }
    }

    pub fn last_single(&self) -> Option<CachedResult<PredictionResult>> {
        self.single.get()
    }

    pub fn last_batch(&self) -> Option<CachedResult<BatchPredictionResult>> {
        self.batch.get()
    }

    pub fn store_single(&self, sequence: u64, value: PredictionResult) -> StoreOutcome {
        let outcome = self.single.store(sequence, value, self.discard_stale);
        self.after_store(ResultKind::Single, sequence, outcome);
        outcome
    }

    pub fn store_batch(&self, sequence: u64, value: BatchPredictionResult) -> StoreOutcome {
        let outcome = self.batch.store(sequence, value, self.discard_stale);
        self.after_store(ResultKind::Batch, sequence, outcome);
        outcome
    }

    /// Receive an event for every accepted cache write from now on
    pub fn subscribe(&self) -> broadcast::Receiver<ResultEvent> {
        self.events.subscribe()
    }

    fn after_store(&self, kind: ResultKind, sequence: u64, outcome: StoreOutcome) {
        match outcome {
            StoreOutcome::Stored => {
                // No subscribers is fine
                let _ = self.events.send(ResultEvent {
                    kind,
                    sequence,
                    updated_at: Utc::now(),
                });
            }
            StoreOutcome::Stale { cached_sequence } => {
                warn!(
                    result = ?kind,
                    sequence = sequence,
                    cached_sequence = cached_sequence,
                    "Discarding stale response"
                );
            }
        }
    }
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(true, 16)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_cache() {
        let cache = ResultCache::default();
        assert!(cache.last_single().is_none());
        assert!(cache.last_batch().is_none());
    }

    #[test]
    fn test_store_emits_event() {
        let cache = ResultCache::default();
        let mut events = cache.subscribe();

        let outcome = cache.store_batch(1, BatchPredictionResult::new(json!({"results": []})));
        assert_eq!(outcome, StoreOutcome::Stored);

        let event = events.try_recv().unwrap();
        assert_eq!(event.kind, ResultKind::Batch);
        assert_eq!(event.sequence, 1);
        assert_eq!(
            cache.last_batch().unwrap().value.body(),
            &json!({"results": []})
        );
        assert!(cache.last_single().is_none());
    }

    #[test]
    fn test_stale_response_discarded() {
        let cache = ResultCache::new(true, 4);
        let mut events = cache.subscribe();

        cache.store_single(5, PredictionResult::new(json!({"newer": true})));
        let outcome = cache.store_single(3, PredictionResult::new(json!({"older": true})));

        assert_eq!(outcome, StoreOutcome::Stale { cached_sequence: 5 });
        assert_eq!(cache.last_single().unwrap().value.body(), &json!({"newer": true}));
        assert_eq!(events.try_recv().unwrap().sequence, 5);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_last_arrival_wins_without_discard() {
        let cache = ResultCache::new(false, 4);

        cache.store_single(5, PredictionResult::new(json!({"newer": true})));
        let outcome = cache.store_single(3, PredictionResult::new(json!({"older": true})));

        assert_eq!(outcome, StoreOutcome::Stored);
        assert_eq!(cache.last_single().unwrap().sequence, 3);
    }
}
