//! Prediction client: single, batch and generate-then-predict
//!
//! Each operation issues its request(s), reports failures at the operation
//! boundary and only touches the result cache on success. Operations take
//! `&self` and may run concurrently; every issued request draws a sequence
//! number so the cache can tell newer responses from stale ones.

use crate::cache::{CachedResult, ResultCache, ResultEvent, StoreOutcome};
use crate::config::{AppConfig, CacheConfig};
use crate::error::{Operation, PredictionError};
use crate::metrics::ClientMetrics;
use crate::transport::{HttpTransport, Transport};
use crate::types::{
    BatchPredictionResult, GenerationRequest, GenerationResponse, PredictionResult, Transaction,
};
use serde::Serialize;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, error, info};
use uuid::Uuid;

pub const PREDICT_PATH: &str = "/predict";
pub const PREDICT_BATCH_PATH: &str = "/predict_batch";
pub const GENERATE_PATH: &str = "/generate_transactions";

/// Wire shape of a batch request
#[derive(Serialize)]
struct BatchRequest<'a> {
    transactions: &'a [Transaction],
}

/// Identity of one issued request
struct Ticket {
    sequence: u64,
    request_id: String,
    started: Instant,
}

/// Client for the fraud-scoring backend
pub struct PredictionClient<T = HttpTransport> {
    transport: T,
    cache: ResultCache,
    metrics: Arc<ClientMetrics>,
    sequence: AtomicU64,
}

impl PredictionClient<HttpTransport> {
    /// Create an HTTP-backed client from configuration
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let transport = HttpTransport::new(&config.backend)?;
        info!(
            base_url = %transport.base_url(),
            timeout_ms = ?config.backend.timeout_ms,
            discard_stale = config.cache.discard_stale_responses,
            "Prediction client initialized"
        );
        Ok(Self::new(transport, &config.cache))
    }
}

impl<T: Transport> PredictionClient<T> {
    pub fn new(transport: T, cache: &CacheConfig) -> Self {
        Self {
            transport,
            cache: ResultCache::new(cache.discard_stale_responses, cache.event_capacity),
            metrics: Arc::new(ClientMetrics::new()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn metrics(&self) -> Arc<ClientMetrics> {
        self.metrics.clone()
    }

    /// Most recent successful single result, if any
    pub fn last_single_result(&self) -> Option<PredictionResult> {
        self.cache.last_single().map(|entry| entry.value)
    }

    /// Most recent successful batch result, if any
    pub fn last_batch_result(&self) -> Option<BatchPredictionResult> {
        self.cache.last_batch().map(|entry| entry.value)
    }

    /// Cached single result with its sequence and arrival time
    pub fn single_entry(&self) -> Option<CachedResult<PredictionResult>> {
        self.cache.last_single()
    }

    /// Cached batch result with its sequence and arrival time
    pub fn batch_entry(&self) -> Option<CachedResult<BatchPredictionResult>> {
        self.cache.last_batch()
    }

    /// Receive a [`ResultEvent`] after every accepted cache update
    pub fn subscribe(&self) -> broadcast::Receiver<ResultEvent> {
        self.cache.subscribe()
    }

    /// Parse operator text and score it as a single transaction.
    ///
    /// A parse failure is reported as an input error and nothing is sent.
    pub async fn predict_single_text(&self, text: &str) -> Result<PredictionResult, PredictionError> {
        match Transaction::from_json_str(text) {
            Ok(transaction) => self.predict_single(&transaction).await,
            Err(e) => {
                self.report_failure(Operation::SinglePredict, None, &e);
                Err(e)
            }
        }
    }

    /// Score one transaction. The body on the wire is the transaction itself.
    pub async fn predict_single(
        &self,
        transaction: &Transaction,
    ) -> Result<PredictionResult, PredictionError> {
        let ticket = self.issue();
        debug!(
            request_id = %ticket.request_id,
            sequence = ticket.sequence,
            transaction_id = ?transaction.id(),
            fields = transaction.len(),
            "Sending single prediction request"
        );

        let body = Value::Object(transaction.fields().clone());
        let response = self
            .transport
            .post_json(PREDICT_PATH, &body, &ticket.request_id)
            .await
            .and_then(|body| reject_error_body(PREDICT_PATH, body));

        let body = self.complete(Operation::SinglePredict, &ticket, response)?;
        let result = PredictionResult::new(body);

        let outcome = self.cache.store_single(ticket.sequence, result.clone());
        self.note_outcome(outcome);

        info!(
            request_id = %ticket.request_id,
            transaction_id = ?transaction.id(),
            score = ?result.score().map(|s| s.probability),
            latency_ms = ticket.started.elapsed().as_millis() as u64,
            "Single prediction completed"
        );
        Ok(result)
    }

    /// Parse a JSON array of transactions and score it as one batch.
    ///
    /// A parse failure is reported as an input error and nothing is sent.
    pub async fn predict_batch_text(
        &self,
        text: &str,
    ) -> Result<BatchPredictionResult, PredictionError> {
        match Transaction::parse_batch(text) {
            Ok(transactions) => self.predict_batch(&transactions).await,
            Err(e) => {
                self.report_failure(Operation::BatchPredict, None, &e);
                Err(e)
            }
        }
    }

    /// Score an ordered sequence in one request. An empty sequence is sent as-is.
    pub async fn predict_batch(
        &self,
        transactions: &[Transaction],
    ) -> Result<BatchPredictionResult, PredictionError> {
        let ticket = self.issue();
        debug!(
            request_id = %ticket.request_id,
            sequence = ticket.sequence,
            count = transactions.len(),
            "Sending batch prediction request"
        );

        let body = serde_json::to_value(BatchRequest { transactions })
            .map_err(|e| PredictionError::input(format!("cannot encode batch: {e}")));
        let response = match body {
            Ok(body) => self
                .transport
                .post_json(PREDICT_BATCH_PATH, &body, &ticket.request_id)
                .await
                .and_then(|body| reject_error_body(PREDICT_BATCH_PATH, body)),
            Err(e) => Err(e),
        };

        let body = self.complete(Operation::BatchPredict, &ticket, response)?;
        let result = BatchPredictionResult::new(body);

        let outcome = self.cache.store_batch(ticket.sequence, result.clone());
        self.note_outcome(outcome);

        info!(
            request_id = %ticket.request_id,
            count = transactions.len(),
            latency_ms = ticket.started.elapsed().as_millis() as u64,
            "Batch prediction completed"
        );
        Ok(result)
    }

    /// Ask the backend for `count` simulated transactions, then batch-score them.
    ///
    /// Missing or non-positive counts become 10. If generation fails the
    /// batch step never runs and the error is a generation error. A
    /// successful generation without transactions still runs the batch
    /// step with an empty sequence.
    pub async fn generate_then_predict(
        &self,
        count: Option<i64>,
    ) -> Result<BatchPredictionResult, PredictionError> {
        let request = GenerationRequest::new(count);
        let ticket = self.issue();
        debug!(
            request_id = %ticket.request_id,
            sequence = ticket.sequence,
            count = request.count(),
            "Requesting transaction generation"
        );

        let generated = self
            .transport
            .get_json(GENERATE_PATH, &request.query(), &ticket.request_id)
            .await
            .and_then(|body| reject_error_body(GENERATE_PATH, body))
            .and_then(|body| GenerationResponse::from_body(GENERATE_PATH, body))
            .map_err(PredictionError::generation);

        let generated = match generated {
            Ok(generated) => {
                self.metrics
                    .record_success(Operation::Generate, ticket.started.elapsed());
                generated
            }
            Err(e) => {
                self.report_failure(Operation::Generate, Some(&ticket), &e);
                return Err(e);
            }
        };

        info!(
            request_id = %ticket.request_id,
            requested = request.count(),
            generated = generated.transactions.len(),
            "Transactions generated"
        );

        self.predict_batch(&generated.transactions).await
    }

    fn issue(&self) -> Ticket {
        self.metrics.record_issued();
        Ticket {
            sequence: self.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            request_id: Uuid::new_v4().to_string(),
            started: Instant::now(),
        }
    }

    /// Record the outcome of a round trip, reporting failures
    fn complete(
        &self,
        operation: Operation,
        ticket: &Ticket,
        response: Result<Value, PredictionError>,
    ) -> Result<Value, PredictionError> {
        match response {
            Ok(body) => {
                self.metrics
                    .record_success(operation, ticket.started.elapsed());
                Ok(body)
            }
            Err(e) => {
                self.report_failure(operation, Some(ticket), &e);
                Err(e)
            }
        }
    }

    fn report_failure(&self, operation: Operation, ticket: Option<&Ticket>, e: &PredictionError) {
        self.metrics.record_failure(e.kind());
        error!(
            operation = %operation,
            error_kind = %e.kind(),
            cause_kind = %e.root_kind(),
            request_id = ticket.map(|t| t.request_id.as_str()).unwrap_or("-"),
            sequence = ticket.map(|t| t.sequence).unwrap_or(0),
            error = %e,
            "Operation failed"
        );
    }

    fn note_outcome(&self, outcome: StoreOutcome) {
        if let StoreOutcome::Stale { .. } = outcome {
            self.metrics.record_stale();
        }
    }
}

/// Treat `{"detail": ...}` and `{"error": ...}` envelopes as backend failures
fn reject_error_body(endpoint: &str, body: Value) -> Result<Value, PredictionError> {
    if let Value::Object(fields) = &body {
        if fields.len() == 1 && (fields.contains_key("detail") || fields.contains_key("error")) {
            return Err(PredictionError::backend(endpoint, None, body.to_string()));
        }
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_error_envelopes_rejected() {
        let err = reject_error_body(PREDICT_PATH, json!({"detail": "Not Found"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);

        let err = reject_error_body(PREDICT_PATH, json!({"error": "model offline"})).unwrap_err();
        assert!(err.to_string().contains("model offline"));
    }

    #[test]
    fn test_regular_bodies_pass_through() {
        for body in [
            json!({"isFraud": false}),
            json!({"results": []}),
            json!({"error": null, "probability": 0.2}),
            json!([1, 2, 3]),
        ] {
            assert_eq!(reject_error_body(PREDICT_PATH, body.clone()).unwrap(), body);
        }
    }

    #[test]
    fn test_batch_request_shape() {
        let txs = vec![
            Transaction::from_value(json!({"id": 1})).unwrap(),
            Transaction::from_value(json!({"id": 2})).unwrap(),
        ];
        let body = serde_json::to_value(BatchRequest { transactions: &txs }).unwrap();
        assert_eq!(body, json!({"transactions": [{"id": 1}, {"id": 2}]}));

        let body = serde_json::to_value(BatchRequest { transactions: &[] }).unwrap();
        assert_eq!(body, json!({"transactions": []}));
    }
}
