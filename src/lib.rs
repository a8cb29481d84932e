//! Fraud Prediction Client Library
//!
//! Submits transactions to a remote fraud-scoring service one at a time,
//! in bulk, or after asking the service to synthesize a batch, and keeps
//! the most recent good result of each kind.

pub mod cache;
pub mod client;
pub mod config;
pub mod console;
pub mod display;
pub mod error;
pub mod metrics;
pub mod transport;
pub mod types;

pub use cache::{ResultCache, ResultEvent, ResultKind};
pub use client::PredictionClient;
pub use config::AppConfig;
pub use display::{DisplayToggles, ResultPanel};
pub use error::{ErrorKind, Operation, PredictionError};
pub use transport::{HttpTransport, Transport};
pub use types::{BatchPredictionResult, PredictionResult, Transaction};
