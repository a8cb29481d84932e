//! Transaction records forwarded to the scoring backend
//!
//! A transaction is kept as an ordered JSON object. The client never
//! enforces a schema: whatever fields the operator supplies are exactly
//! what goes on the wire, in the same order.

use crate::error::PredictionError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Field names that carry the transaction identifier, in lookup order
const ID_FIELDS: [&str; 3] = ["TransactionID", "transaction_id", "id"];

/// One financial transfer to be scored, forwarded verbatim
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transaction(Map<String, Value>);

impl Transaction {
    /// Parse operator-supplied JSON text into a transaction.
    ///
    /// Fails with an input error when the text is not valid JSON or is
    /// valid JSON but not an object. An empty document is an error, not an
    /// empty transaction.
    pub fn from_json_str(text: &str) -> Result<Self, PredictionError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| PredictionError::input(format!("malformed JSON: {e}")))?;
        Self::from_value(value)
    }

    /// Accept an already decoded value if it is a JSON object
    pub fn from_value(value: Value) -> Result<Self, PredictionError> {
        match value {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(PredictionError::input(format!(
                "expected a JSON object, found {}",
                json_type_name(&other)
            ))),
        }
    }

    /// Parse a JSON array of transaction objects, keeping order
    pub fn parse_batch(text: &str) -> Result<Vec<Self>, PredictionError> {
        let value: Value = serde_json::from_str(text)
            .map_err(|e| PredictionError::input(format!("malformed JSON: {e}")))?;

        match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    Self::from_value(item).map_err(|e| match e {
                        PredictionError::Input { reason } => {
                            PredictionError::input(format!("transaction {}: {reason}", i + 1))
                        }
                        other => other,
                    })
                })
                .collect(),
            other => Err(PredictionError::input(format!(
                "expected a JSON array of transactions, found {}",
                json_type_name(&other)
            ))),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Identifier for log correlation, if the record carries one
    pub fn id(&self) -> Option<String> {
        ID_FIELDS
            .iter()
            .find_map(|field| match self.0.get(*field)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
    }

    /// Transfer type, recognized from either encoding.
    ///
    /// A `type` string field wins. Otherwise exactly one of the one-hot
    /// `type_*` flags must be set; zero or several set flags yield `None`.
    pub fn transaction_type(&self) -> Option<TransactionType> {
        if let Some(Value::String(tag)) = self.0.get("type") {
            return tag.parse().ok();
        }

        let mut found = None;
        for kind in TransactionType::ALL {
            let flag = format!("type_{}", kind.as_str());
            if self.0.get(&flag).map(is_truthy).unwrap_or(false) {
                if found.is_some() {
                    return None;
                }
                found = Some(kind);
            }
        }
        found
    }
}

impl From<Map<String, Value>> for Transaction {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

impl From<Transaction> for Value {
    fn from(tx: Transaction) -> Self {
        tx.into_value()
    }
}

/// Transfer kinds seen in the scoring data set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    Payment,
    CashOut,
    Debit,
    Transfer,
}

impl TransactionType {
    pub const ALL: [TransactionType; 4] = [
        TransactionType::Payment,
        TransactionType::CashOut,
        TransactionType::Debit,
        TransactionType::Transfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Payment => "PAYMENT",
            TransactionType::CashOut => "CASH_OUT",
            TransactionType::Debit => "DEBIT",
            TransactionType::Transfer => "TRANSFER",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransactionType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown transaction type: {s}"))
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
        _ => false,
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
