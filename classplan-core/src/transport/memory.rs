//! In-memory transport serving canned JSON, for tests and offline use.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::error::{ClassplanError, ClassplanResult};
use crate::transport::{ApiRequest, Transport};

/// Serves responses from a `uri -> JSON` map and records every request it sees.
///
/// Section searches are keyed by bare uri, so every `section/find.json` call
/// returns the same fixture regardless of its form body.
#[derive(Default)]
pub struct MemoryTransport {
    responses: Mutex<HashMap<String, Value>>,
    failing: Mutex<HashSet<String>>,
    requests: Mutex<Vec<ApiRequest>>,
    latency: Mutex<HashMap<String, Duration>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a fixture file shaped as `{"<uri>": <response>, ...}`.
    pub fn from_fixture(path: &Path) -> ClassplanResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let map: HashMap<String, Value> = serde_json::from_str(&content).map_err(|e| {
            ClassplanError::Config(format!("Invalid fixture {}: {e}", path.display()))
        })?;

        let transport = Self::new();
        *transport.responses.lock() = map;
        Ok(transport)
    }

    pub fn with(self, uri: &str, response: Value) -> Self {
        self.respond(uri, response);
        self
    }

    pub fn respond(&self, uri: &str, response: Value) {
        self.responses.lock().insert(uri.to_string(), response);
    }

    /// Make every request to `uri` fail with a 500.
    pub fn fail(&self, uri: &str) {
        self.failing.lock().insert(uri.to_string());
    }

    pub fn recover(&self, uri: &str) {
        self.failing.lock().remove(uri);
    }

    /// Delay responses for `uri`, to hold a fetch in flight.
    pub fn delay(&self, uri: &str, latency: Duration) {
        self.latency.lock().insert(uri.to_string(), latency);
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self, uri: &str) -> usize {
        self.requests.lock().iter().filter(|r| r.uri == uri).count()
    }

    pub fn clear_requests(&self) {
        self.requests.lock().clear();
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: &ApiRequest) -> ClassplanResult<Vec<u8>> {
        self.requests.lock().push(request.clone());

        let latency = self.latency.lock().get(&request.uri).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.lock().contains(&request.uri) {
            return Err(ClassplanError::Status {
                uri: request.uri.clone(),
                status: 500,
            });
        }

        let response = self.responses.lock().get(&request.uri).cloned();

        match response {
            Some(Value::String(raw)) => Ok(raw.into_bytes()),
            Some(value) => serde_json::to_vec(&value)
                .map_err(|e| ClassplanError::Serialization(e.to_string())),
            None => Err(ClassplanError::Status {
                uri: request.uri.clone(),
                status: 404,
            }),
        }
    }
}
