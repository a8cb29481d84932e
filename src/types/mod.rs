//! Type definitions for the prediction client

pub mod generation;
pub mod prediction;
pub mod transaction;

pub use generation::{GenerationRequest, GenerationResponse, DEFAULT_GENERATION_COUNT};
pub use prediction::{BatchPredictionResult, PredictionResult, ScoreView};
pub use transaction::{Transaction, TransactionType};
