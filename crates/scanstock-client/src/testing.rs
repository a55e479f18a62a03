//! In-memory backend for unit tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ClientError, ClientResult};
use crate::http::Backend;

/// A request the scripted backend received.
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Get(Vec<(String, String)>),
    Post(Value),
}

impl Recorded {
    /// Value of a query pair or body field named `key`.
    pub fn param(&self, key: &str) -> Option<String> {
        match self {
            Recorded::Get(pairs) => pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()),
            Recorded::Post(body) => body.get(key).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
        }
    }
}

enum Step {
    Reply(ClientResult<Value>),
    Stall(Duration),
}

/// Replays queued responses in order and records every request.
///
/// Once the script runs out every call answers `null`.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, body: Value) -> Self {
        self.push(Step::Reply(Ok(body)))
    }

    pub fn fail(self, error: ClientError) -> Self {
        self.push(Step::Reply(Err(error)))
    }

    /// Sleeps for `delay` before answering `null`.
    pub fn stall(self, delay: Duration) -> Self {
        self.push(Step::Stall(delay))
    }

    fn push(self, step: Step) -> Self {
        self.script.lock().unwrap().push_back(step);
        self
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    async fn answer(&self, request: Recorded) -> ClientResult<Value> {
        self.requests.lock().unwrap().push(request);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(reply)) => reply,
            Some(Step::Stall(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(Value::Null)
            }
            None => Ok(Value::Null),
        }
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn get(&self, query: &[(&str, &str)]) -> ClientResult<Value> {
        let pairs = query
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.answer(Recorded::Get(pairs)).await
    }

    async fn post(&self, body: &Value) -> ClientResult<Value> {
        self.answer(Recorded::Post(body.clone())).await
    }
}
