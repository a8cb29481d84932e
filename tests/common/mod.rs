//! Recording in-memory transport shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use fraud_prediction_client::config::CacheConfig;
use fraud_prediction_client::{PredictionClient, PredictionError, Transport};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

/// One request as the transport saw it
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
    pub query: Vec<(String, String)>,
    pub request_id: String,
}

struct Scripted {
    result: Result<Value, PredictionError>,
    gate: Option<oneshot::Receiver<()>>,
}

/// Transport answering from per-path scripted responses, in order
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<Recorded>>,
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for the next request to `path`
    pub fn respond(&self, path: &str, result: Result<Value, PredictionError>) {
        self.push(path, Scripted { result, gate: None });
    }

    /// Queue a response that is held back until the returned sender fires
    pub fn respond_when_released(
        &self,
        path: &str,
        result: Result<Value, PredictionError>,
    ) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(
            path,
            Scripted {
                result,
                gate: Some(rx),
            },
        );
        tx
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    fn push(&self, path: &str, scripted: Scripted) {
        self.scripts
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(scripted);
    }

    async fn answer(&self, recorded: Recorded) -> Result<Value, PredictionError> {
        let path = recorded.path.clone();
        self.requests.lock().unwrap().push(recorded);

        let scripted = self
            .scripts
            .lock()
            .unwrap()
            .get_mut(&path)
            .and_then(VecDeque::pop_front);

        match scripted {
            Some(Scripted { result, gate }) => {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                result
            }
            None => Err(PredictionError::transport(&path, "no scripted response")),
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(
        &self,
        path: &str,
        body: &Value,
        request_id: &str,
    ) -> Result<Value, PredictionError> {
        self.answer(Recorded {
            method: "POST",
            path: path.to_string(),
            body: Some(body.clone()),
            query: Vec::new(),
            request_id: request_id.to_string(),
        })
        .await
    }

    async fn get_json(
        &self,
        path: &str,
        query: &[(&str, String)],
        request_id: &str,
    ) -> Result<Value, PredictionError> {
        self.answer(Recorded {
            method: "GET",
            path: path.to_string(),
            body: None,
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            request_id: request_id.to_string(),
        })
        .await
    }
}

pub fn client() -> PredictionClient<MockTransport> {
    PredictionClient::new(MockTransport::new(), &CacheConfig::default())
}

pub fn client_with(cache: CacheConfig) -> PredictionClient<MockTransport> {
    PredictionClient::new(MockTransport::new(), &cache)
}
