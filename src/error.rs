//! Error taxonomy for prediction operations

use std::fmt;
use thiserror::Error;

/// The client operation a diagnostic refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    SinglePredict,
    BatchPredict,
    Generate,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::SinglePredict => "predict_single",
            Operation::BatchPredict => "predict_batch",
            Operation::Generate => "generate_transactions",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse classification of a [`PredictionError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operator input was not a valid transaction
    Input,
    /// The request never completed
    Transport,
    /// The backend answered with a failure
    Backend,
    /// The generation step of generate-then-predict failed
    Generation,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Input => "input",
            ErrorKind::Transport => "transport",
            ErrorKind::Backend => "backend",
            ErrorKind::Generation => "generation",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors surfaced by the prediction client
#[derive(Error, Debug)]
pub enum PredictionError {
    /// Transaction text could not be parsed; nothing was sent
    #[error("Invalid transaction input: {reason}")]
    Input { reason: String },

    /// Connection, DNS, timeout or body read failure
    #[error("Transport error on {endpoint}: {reason}")]
    Transport { endpoint: String, reason: String },

    /// Non-success status, undecodable body or error-shaped body
    #[error("Backend error on {endpoint}{}: {body}", status_suffix(.status))]
    Backend {
        endpoint: String,
        status: Option<u16>,
        body: String,
    },

    /// Synthesis failed before scoring could start
    #[error("Transaction generation failed: {0}")]
    Generation(#[source] Box<PredictionError>),
}

impl PredictionError {
    pub fn input(reason: impl Into<String>) -> Self {
        PredictionError::Input {
            reason: reason.into(),
        }
    }

    pub fn transport(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        PredictionError::Transport {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    pub fn backend(endpoint: impl Into<String>, status: Option<u16>, body: impl Into<String>) -> Self {
        PredictionError::Backend {
            endpoint: endpoint.into(),
            status,
            body: body.into(),
        }
    }

    /// Wrap a failure of the generation step
    pub fn generation(cause: PredictionError) -> Self {
        PredictionError::Generation(Box::new(cause))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            PredictionError::Input { .. } => ErrorKind::Input,
            PredictionError::Transport { .. } => ErrorKind::Transport,
            PredictionError::Backend { .. } => ErrorKind::Backend,
            PredictionError::Generation(_) => ErrorKind::Generation,
        }
    }

    /// Kind of the innermost cause, e.g. the transport failure behind a generation error
    pub fn root_kind(&self) -> ErrorKind {
        match self {
            PredictionError::Generation(cause) => cause.root_kind(),
            other => other.kind(),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (HTTP {s})")).unwrap_or_default()
}
