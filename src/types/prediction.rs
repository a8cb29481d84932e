//! Backend responses to prediction requests
//!
//! Both result types wrap the decoded body as-is. The client stores and
//! returns them without interpretation; [`ScoreView`] is a read-only
//! display helper for the field layout the scoring service is known to use.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Response to a single-transaction request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PredictionResult(Value);

impl PredictionResult {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    pub fn body(&self) -> &Value {
        &self.0
    }

    /// Score fields, when the body has the usual `probability`/`prediction` layout
    pub fn score(&self) -> Option<ScoreView> {
        ScoreView::from_body(&self.0)
    }
}

impl fmt::Display for PredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pretty(f, &self.0)
    }
}

/// Response to a batch request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchPredictionResult(Value);

impl BatchPredictionResult {
    pub fn new(body: Value) -> Self {
        Self(body)
    }

    pub fn body(&self) -> &Value {
        &self.0
    }

    /// Per-transaction entries if the body carries a `results` or `predictions` array
    pub fn entries(&self) -> Option<&[Value]> {
        ["results", "predictions"]
            .iter()
            .find_map(|field| self.0.get(*field)?.as_array())
            .map(Vec::as_slice)
    }
}

impl fmt::Display for BatchPredictionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pretty(f, &self.0)
    }
}

fn write_pretty(f: &mut fmt::Formatter<'_>, value: &Value) -> fmt::Result {
    match serde_json::to_string_pretty(value) {
        Ok(text) => f.write_str(&text),
        Err(_) => write!(f, "{value}"),
    }
}

/// Display view of a scored transaction
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreView {
    /// Fraud probability (0.0 - 1.0)
    pub probability: f64,
    /// Decision flag as reported by the backend
    pub prediction: Option<i64>,
    /// Decision threshold the backend applied
    pub threshold: Option<f64>,
    pub model_name: Option<String>,
    pub model_version: Option<String>,
}

impl ScoreView {
    /// Read the score fields from a response body. Returns `None` when
    /// `probability` is absent or not numeric.
    pub fn from_body(body: &Value) -> Option<Self> {
        let probability = body.get("probability")?.as_f64()?;
        let prediction = body.get("prediction").and_then(|v| {
            v.as_i64()
                .or_else(|| v.as_bool().map(i64::from))
        });
        let threshold = body.get("threshold").and_then(Value::as_f64);
        let metadata = body.get("metadata");
        let text_field = |name: &str| {
            metadata
                .and_then(|m| m.get(name))
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
        };

        Some(Self {
            probability,
            prediction,
            threshold,
            model_name: text_field("model_name"),
            model_version: text_field("model_version"),
        })
    }

    /// Probability as a percentage string, e.g. `87.5%`
    pub fn probability_percent(&self) -> String {
        format!("{:.1}%", self.probability * 100.0)
    }
}

impl fmt::Display for ScoreView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "probability={}", self.probability_percent())?;
        if let Some(prediction) = self.prediction {
            write!(f, " prediction={prediction}")?;
        }
        if let Some(threshold) = self.threshold {
            write!(f, " threshold={threshold:.2}")?;
        }
        if let Some(name) = &self.model_name {
            write!(f, " model={name}")?;
            if let Some(version) = &self.model_version {
                write!(f, "@{version}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_score_view_from_backend_body() {
        let result = PredictionResult::new(json!({
            "probability": 0.875,
            "prediction": 1,
            "threshold": 0.61,
            "metadata": {
                "model_version": "3",
                "model_type": "XGBClassifier",
                "model_name": "fraud_model"
            }
        }));

        let score = result.score().unwrap();
        assert_eq!(score.probability, 0.875);
        assert_eq!(score.prediction, Some(1));
        assert_eq!(score.threshold, Some(0.61));
        assert_eq!(score.model_name.as_deref(), Some("fraud_model"));
        assert_eq!(score.probability_percent(), "87.5%");
        assert_eq!(
            score.to_string(),
            "probability=87.5% prediction=1 threshold=0.61 model=fraud_model@3"
        );
    }

    #[test]
    fn test_score_view_absent_for_opaque_body() {
        let result = PredictionResult::new(json!({"isFraud": false}));
        assert!(result.score().is_none());
        assert_eq!(result.body(), &json!({"isFraud": false}));
    }

    #[test]
    fn test_batch_entries() {
        let batch = BatchPredictionResult::new(json!({"results": [{"p": 0.1}, {"p": 0.9}]}));
        assert_eq!(batch.entries().map(<[Value]>::len), Some(2));

        let batch = BatchPredictionResult::new(json!({"summary": {}}));
        assert!(batch.entries().is_none());
    }
}
