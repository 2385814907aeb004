// In-memory data store used by tests
use crate::api::middleware::AppError;
use crate::services::database::adapter::{DataStore, Row, SqlParam, StoreProvider};
use serde_json::Value;
use std::sync::{Arc, Mutex};

/// Canned outcome for statements whose text contains a marker
enum Reply {
    Rows(Vec<Row>),
    Fail(String),
}

/// Records every `(sql, params)` pair and replays canned rows
#[derive(Default)]
pub struct FakeStore {
    replies: Mutex<Vec<(String, Reply)>>,
    calls: Mutex<Vec<(String, Vec<SqlParam>)>>,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Answer statements containing `marker` with `rows`
    pub fn reply(&self, marker: &str, rows: Vec<Value>) {
        let rows = rows
            .into_iter()
            .map(|row| match row {
                Value::Object(map) => map,
                other => panic!("fake rows must be objects, got {}", other),
            })
            .collect();
        self.replies
            .lock()
            .unwrap()
            .push((marker.to_string(), Reply::Rows(rows)));
    }

    /// Fail statements containing `marker`
    pub fn fail(&self, marker: &str, message: &str) {
        self.replies
            .lock()
            .unwrap()
            .push((marker.to_string(), Reply::Fail(message.to_string())));
    }

    pub fn calls(&self) -> Vec<(String, Vec<SqlParam>)> {
        self.calls.lock().unwrap().clone()
    }

    /// The single recorded call whose SQL contains `marker`
    pub fn call_containing(&self, marker: &str) -> (String, Vec<SqlParam>) {
        let matching: Vec<_> = self
            .calls()
            .into_iter()
            .filter(|(sql, _)| sql.contains(marker))
            .collect();
        assert_eq!(matching.len(), 1, "expected one call containing {:?}", marker);
        matching.into_iter().next().unwrap()
    }
}

#[async_trait::async_trait]
impl DataStore for FakeStore {
    async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));

        let replies = self.replies.lock().unwrap();
        // Fails take priority so a test can break one stage regardless of reply order
        for (marker, reply) in replies.iter() {
            if let Reply::Fail(message) = reply {
                if sql.contains(marker.as_str()) {
                    return Err(AppError::Database(message.clone()));
                }
            }
        }
        for (marker, reply) in replies.iter() {
            if let Reply::Rows(rows) = reply {
                if sql.contains(marker.as_str()) {
                    return Ok(rows.clone());
                }
            }
        }
        Ok(Vec::new())
    }
}

/// Provider that always hands out the same fake store
pub struct FakeProvider {
    pub store: Arc<FakeStore>,
}

impl FakeProvider {
    pub fn new(store: Arc<FakeStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl StoreProvider for FakeProvider {
    async fn acquire(&self) -> Result<Arc<dyn DataStore>, AppError> {
        Ok(self.store.clone())
    }
}
