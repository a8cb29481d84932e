//! Request and response shapes for backend-side transaction synthesis

use crate::error::PredictionError;
use crate::types::transaction::{json_type_name, Transaction};
use serde_json::Value;

/// Count used when the operator gives none, or a non-positive one
pub const DEFAULT_GENERATION_COUNT: u32 = 10;

/// How many simulated transactions to synthesize
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationRequest {
    count: u32,
}

impl GenerationRequest {
    /// Coerce an operator-supplied count. Missing, zero and negative
    /// counts fall back to [`DEFAULT_GENERATION_COUNT`]; counts beyond
    /// `u32::MAX` saturate.
    pub fn new(count: Option<i64>) -> Self {
        let count = match count {
            Some(n) if n > 0 => u32::try_from(n).unwrap_or(u32::MAX),
            _ => DEFAULT_GENERATION_COUNT,
        };
        Self { count }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Query string pairs for the generation endpoint
    pub fn query(&self) -> Vec<(&'static str, String)> {
        vec![("number", self.count.to_string())]
    }
}

impl Default for GenerationRequest {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Decoded generation response; only `transactions` is read
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GenerationResponse {
    pub transactions: Vec<Transaction>,
}

impl GenerationResponse {
    /// Extract the transaction sequence from a generation body.
    ///
    /// A body without a `transactions` field (including a non-object body
    /// or `null`) yields an empty sequence so the batch step still runs.
    /// A `transactions` field that is not an array of objects is malformed.
    pub fn from_body(endpoint: &str, body: Value) -> Result<Self, PredictionError> {
        let transactions = match body {
            Value::Object(mut fields) => fields.remove("transactions").unwrap_or(Value::Null),
            _ => Value::Null,
        };

        match transactions {
            Value::Null => Ok(Self::default()),
            Value::Array(items) => {
                let transactions = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, item)| match item {
                        Value::Object(fields) => Ok(Transaction::from(fields)),
                        other => Err(PredictionError::backend(
                            endpoint,
                            None,
                            format!(
                                "generated transaction {} is {}, expected an object",
                                i + 1,
                                json_type_name(&other)
                            ),
                        )),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Self { transactions })
            }
            other => Err(PredictionError::backend(
                endpoint,
                None,
                format!(
                    "`transactions` is {}, expected an array",
                    json_type_name(&other)
                ),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde_json::json;

    #[test]
    fn test_count_defaults() {
        assert_eq!(GenerationRequest::new(None).count(), 10);
        assert_eq!(GenerationRequest::new(Some(0)).count(), 10);
        assert_eq!(GenerationRequest::new(Some(-3)).count(), 10);
        assert_eq!(GenerationRequest::new(Some(5)).count(), 5);
        assert_eq!(GenerationRequest::new(Some(i64::MAX)).count(), u32::MAX);
        assert_eq!(GenerationRequest::default().query(), vec![("number", "10".to_string())]);
    }

    #[test]
    fn test_extracts_transactions_in_order() {
        let body = json!({
            "transactions": [{"TransactionID": "SIM000001"}, {"TransactionID": "SIM000002"}],
            "count": 2
        });
        let response = GenerationResponse::from_body("/generate_transactions", body).unwrap();

        let ids: Vec<_> = response.transactions.iter().filter_map(Transaction::id).collect();
        assert_eq!(ids, ["SIM000001", "SIM000002"]);
    }

    #[test]
    fn test_missing_transactions_is_empty() {
        let response = GenerationResponse::from_body("/g", json!({"count": 0})).unwrap();
        assert!(response.transactions.is_empty());

        let response = GenerationResponse::from_body("/g", Value::Null).unwrap();
        assert!(response.transactions.is_empty());

        let response = GenerationResponse::from_body("/g", json!({"transactions": null})).unwrap();
        assert!(response.transactions.is_empty());
    }

    #[test]
    fn test_malformed_transactions_field() {
        let err = GenerationResponse::from_body("/g", json!({"transactions": "oops"})).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Backend);

        let err = GenerationResponse::from_body("/g", json!({"transactions": [1]})).unwrap_err();
        assert!(err.to_string().contains("generated transaction 1"));
    }
}
