//! Per-record fraud check lifecycles.
//!
//! Each record id owns one `RequestState`. `analyze` flips it to `Pending` and
//! spawns the call on the tokio runtime; the call reports back through a
//! channel, and the owner of the manager applies completions one at a time with
//! [`FraudRequestManager::apply`]. Every issue bumps the record's generation, so
//! a completion from an older issue is dropped: the latest request wins, not
//! the latest response.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::error::FraudError;
use crate::models::{FraudQuery, FraudResult, JobRecord, RecordId};
use crate::scoring::ScoringService;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Succeeded(FraudResult),
    Failed(FraudError),
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }

    pub fn result(&self) -> Option<&FraudResult> {
        match self {
            RequestState::Succeeded(result) => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&FraudError> {
        match self {
            RequestState::Failed(error) => Some(error),
            _ => None,
        }
    }
}

static IDLE: RequestState = RequestState::Idle;

/// A finished call, waiting to be applied on the control thread.
#[derive(Debug)]
pub struct Completion {
    pub id: RecordId,
    pub generation: u64,
    pub outcome: Result<FraudResult, FraudError>,
}

#[derive(Debug, Default)]
struct Slot {
    state: RequestState,
    generation: u64,
}

pub struct FraudRequestManager {
    service: Arc<dyn ScoringService>,
    slots: HashMap<RecordId, Slot>,
    tx: mpsc::UnboundedSender<Completion>,
    rx: mpsc::UnboundedReceiver<Completion>,
}

impl FraudRequestManager {
    pub fn new(service: Arc<dyn ScoringService>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            service,
            slots: HashMap::new(),
            tx,
            rx,
        }
    }

    /// Current state of a record. Records never analyzed are `Idle`.
    pub fn status(&self, id: RecordId) -> &RequestState {
        self.slots.get(&id).map(|slot| &slot.state).unwrap_or(&IDLE)
    }

    #[allow(dead_code)]
    pub fn generation(&self, id: RecordId) -> u64 {
        self.slots.get(&id).map(|slot| slot.generation).unwrap_or(0)
    }

    pub fn pending_count(&self) -> usize {
        self.slots.values().filter(|slot| slot.state.is_pending()).count()
    }

    /// Starts a check for a catalog record. No validation on this path.
    ///
    /// Must be called from within a tokio runtime. Returns the generation of
    /// the issued request.
    pub fn analyze(&mut self, record: &JobRecord) -> u64 {
        let job_title = record.title.clone();
        self.issue(record.id, FraudQuery::from_record(record), Some(job_title))
    }

    /// Starts a check with an already built query.
    pub fn issue(&mut self, id: RecordId, query: FraudQuery, job_title: Option<String>) -> u64 {
        let slot = self.slots.entry(id).or_default();
        slot.generation += 1;
        slot.state = RequestState::Pending;
        let generation = slot.generation;

        tracing::info!(record_id = id, generation, "fraud check issued");

        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = service.predict(&query).await.map(|result| match job_title {
                Some(title) => result.with_job_title(&title),
                None => result,
            });
            // The receiver lives as long as the manager; a send error means it is gone
            let _ = tx.send(Completion {
                id,
                generation,
                outcome,
            });
        });

        generation
    }

    /// Puts a record back to `Idle`. An in-flight response for it is dropped.
    pub fn reset(&mut self, id: RecordId) {
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.generation += 1;
            slot.state = RequestState::Idle;
        }
    }

    /// Applies a completion.
    ///
    /// Returns the result when a success was applied, so the caller can show
    /// it once. Stale completions change nothing and return `None`.
    pub fn apply(&mut self, completion: Completion) -> Option<FraudResult> {
        let Completion {
            id,
            generation,
            outcome,
        } = completion;

        let Some(slot) = self.slots.get_mut(&id) else {
            tracing::warn!(record_id = id, generation, "completion for unknown record");
            return None;
        };
        if slot.generation != generation {
            tracing::debug!(
                record_id = id,
                generation,
                current = slot.generation,
                "discarding stale completion"
            );
            return None;
        }

        match outcome {
            Ok(result) => {
                tracing::info!(
                    record_id = id,
                    generation,
                    probability = result.probability,
                    is_fraud = result.is_fraud,
                    "fraud check succeeded"
                );
                slot.state = RequestState::Succeeded(result.clone());
                Some(result)
            }
            Err(error) => {
                tracing::warn!(record_id = id, generation, error = %error, "fraud check failed");
                slot.state = RequestState::Failed(error);
                None
            }
        }
    }

    /// Next completion without waiting, if one has arrived.
    pub fn try_next_completion(&mut self) -> Option<Completion> {
        self.rx.try_recv().ok()
    }

    /// Waits for the next completion.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        self.rx.recv().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::mock::{ScriptedScoring, ok};

    fn record(id: RecordId, title: &str) -> JobRecord {
        JobRecord::new(id, title, "Acme", "Some description")
    }

    #[tokio::test]
    async fn test_unknown_identity_is_idle() {
        let manager = FraudRequestManager::new(ScriptedScoring::new());
        assert_eq!(manager.status(42), &RequestState::Idle);
        assert_eq!(manager.generation(42), 0);
    }

    #[tokio::test]
    async fn test_analyze_sets_pending_then_succeeds() {
        let service = ScriptedScoring::new();
        let reply = service.expect_prediction();
        let mut manager = FraudRequestManager::new(service.clone());
        let job = record(0, "Data Scientist");

        manager.analyze(&job);
        assert_eq!(manager.status(0), &RequestState::Pending);
        assert_eq!(manager.pending_count(), 1);

        reply.send(ok(0.82, true)).unwrap();
        let completion = manager.next_completion().await.unwrap();
        let shown = manager.apply(completion).unwrap();

        assert_eq!(shown.job_title.as_deref(), Some("Data Scientist"));
        assert_eq!(shown.percent(), "82.0%");
        let state = manager.status(0);
        assert_eq!(state.result().map(|r| r.probability), Some(0.82));
        assert_eq!(manager.pending_count(), 0);
        assert_eq!(service.queries()[0].title, "Data Scientist");
    }

    #[tokio::test]
    async fn test_failure_sets_failed_without_event() {
        let service = ScriptedScoring::new();
        let reply = service.expect_prediction();
        let mut manager = FraudRequestManager::new(service);

        manager.analyze(&record(1, "Backend Developer"));
        reply
            .send(Err(FraudError::Service {
                status: 500,
                message: "model unavailable".to_string(),
            }))
            .unwrap();

        let completion = manager.next_completion().await.unwrap();
        assert!(manager.apply(completion).is_none());
        let error = manager.status(1).error().unwrap();
        assert_eq!(error.to_string(), "model unavailable");
    }

    #[tokio::test]
    async fn test_retrigger_from_terminal_states_goes_pending() {
        let service = ScriptedScoring::new();
        let first = service.expect_prediction();
        let second = service.expect_prediction();
        let third = service.expect_prediction();
        let mut manager = FraudRequestManager::new(service);
        let job = record(0, "Dev");

        manager.analyze(&job);
        first.send(ok(0.1, false)).unwrap();
        let c = manager.next_completion().await.unwrap();
        manager.apply(c);
        assert!(matches!(manager.status(0), RequestState::Succeeded(_)));

        manager.analyze(&job);
        assert_eq!(manager.status(0), &RequestState::Pending);
        second.send(Err(FraudError::Network("down".to_string()))).unwrap();
        let c = manager.next_completion().await.unwrap();
        manager.apply(c);
        assert!(matches!(manager.status(0), RequestState::Failed(_)));

        manager.analyze(&job);
        assert_eq!(manager.status(0), &RequestState::Pending);
        third.send(ok(0.5, false)).unwrap();
        let c = manager.next_completion().await.unwrap();
        manager.apply(c);
        assert_eq!(manager.generation(0), 3);
    }

    #[tokio::test]
    async fn test_second_analyze_while_pending_issues_another_call() {
        let service = ScriptedScoring::new();
        let first = service.expect_prediction();
        let second = service.expect_prediction();
        let mut manager = FraudRequestManager::new(service.clone());
        let job = record(0, "Dev");

        assert_eq!(manager.analyze(&job), 1);
        assert_eq!(manager.analyze(&job), 2);
        assert_eq!(manager.status(0), &RequestState::Pending);

        second.send(ok(0.9, true)).unwrap();
        first.send(ok(0.2, false)).unwrap();
        let mut events = Vec::new();
        for _ in 0..2 {
            let c = manager.next_completion().await.unwrap();
            if let Some(result) = manager.apply(c) {
                events.push(result);
            }
        }
        assert_eq!(service.queries().len(), 2);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].probability, 0.9);
    }

    #[tokio::test]
    async fn test_stale_response_does_not_overwrite_newer_request() {
        let service = ScriptedScoring::new();
        let first = service.expect_prediction();
        let second = service.expect_prediction();
        let mut manager = FraudRequestManager::new(service);
        let job = record(0, "Dev");

        manager.analyze(&job);
        manager.analyze(&job);

        // Newer request resolves first, older one arrives late
        second.send(ok(0.75, true)).unwrap();
        let c = manager.next_completion().await.unwrap();
        assert!(manager.apply(c).is_some());

        first.send(ok(0.05, false)).unwrap();
        let c = manager.next_completion().await.unwrap();
        assert_eq!(c.generation, 1);
        assert!(manager.apply(c).is_none());

        assert_eq!(manager.status(0).result().map(|r| r.probability), Some(0.75));
    }

    #[tokio::test]
    async fn test_stale_response_while_newer_still_pending() {
        let service = ScriptedScoring::new();
        let first = service.expect_prediction();
        let _second = service.expect_prediction();
        let mut manager = FraudRequestManager::new(service);
        let job = record(0, "Dev");

        manager.analyze(&job);
        manager.analyze(&job);

        first.send(ok(0.05, false)).unwrap();
        let c = manager.next_completion().await.unwrap();
        assert!(manager.apply(c).is_none());
        assert_eq!(manager.status(0), &RequestState::Pending);
    }

    #[tokio::test]
    async fn test_identities_are_independent() {
        let service = ScriptedScoring::new();
        let a = service.expect_prediction();
        let b = service.expect_prediction();
        let mut manager = FraudRequestManager::new(service);

        manager.analyze(&record(0, "A"));
        manager.analyze(&record(1, "B"));

        b.send(Err(FraudError::Network("down".to_string()))).unwrap();
        let c = manager.next_completion().await.unwrap();
        manager.apply(c);
        assert!(matches!(manager.status(1), RequestState::Failed(_)));
        assert_eq!(manager.status(0), &RequestState::Pending);

        a.send(ok(0.3, false)).unwrap();
        let c = manager.next_completion().await.unwrap();
        manager.apply(c);
        assert!(matches!(manager.status(0), RequestState::Succeeded(_)));
        assert!(matches!(manager.status(1), RequestState::Failed(_)));
    }

    #[tokio::test]
    async fn test_reset_discards_in_flight_response() {
        let service = ScriptedScoring::new();
        let reply = service.expect_prediction();
        let mut manager = FraudRequestManager::new(service);

        manager.analyze(&record(0, "Dev"));
        manager.reset(0);
        assert_eq!(manager.status(0), &RequestState::Idle);

        reply.send(ok(0.9, true)).unwrap();
        let c = manager.next_completion().await.unwrap();
        assert!(manager.apply(c).is_none());
        assert_eq!(manager.status(0), &RequestState::Idle);
    }

    #[tokio::test]
    async fn test_try_next_completion_is_empty_while_pending() {
        let service = ScriptedScoring::new();
        let _reply = service.expect_prediction();
        let mut manager = FraudRequestManager::new(service);

        manager.analyze(&record(0, "Dev"));
        assert!(manager.try_next_completion().is_none());
    }
}
