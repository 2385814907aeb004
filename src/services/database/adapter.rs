// Data store abstraction consumed by the query engine
use crate::api::middleware::AppError;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_postgres::types::ToSql;

/// One result row keyed by column name
pub type Row = Map<String, Value>;

/// Positional parameter bound to a `$n` placeholder
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Date(NaiveDate),
    Int(i64),
}

impl SqlParam {
    pub fn as_tosql(&self) -> &(dyn ToSql + Sync) {
        match self {
            SqlParam::Text(value) => value,
            SqlParam::Date(value) => value,
            SqlParam::Int(value) => value,
        }
    }
}

impl fmt::Display for SqlParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlParam::Text(value) => f.write_str(value),
            SqlParam::Date(value) => write!(f, "{}", value.format("%Y-%m-%d")),
            SqlParam::Int(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(value: &str) -> Self {
        SqlParam::Text(value.to_string())
    }
}

impl From<NaiveDate> for SqlParam {
    fn from(value: NaiveDate) -> Self {
        SqlParam::Date(value)
    }
}

impl From<i64> for SqlParam {
    fn from(value: i64) -> Self {
        SqlParam::Int(value)
    }
}

/// Row-returning data store: `(sql, positional params) -> rows`
#[async_trait::async_trait]
pub trait DataStore: Send + Sync {
    async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>, AppError>;
}

/// Hands out a data store for one request
#[async_trait::async_trait]
pub trait StoreProvider: Send + Sync {
    async fn acquire(&self) -> Result<Arc<dyn DataStore>, AppError>;
}

/// Store that is only acquired from its provider when the first statement runs
///
/// Requests rejected before any resolver runs never touch the provider. The
/// acquired store is reused for the rest of the request.
pub struct DeferredStore {
    provider: Arc<dyn StoreProvider>,
    store: OnceCell<Arc<dyn DataStore>>,
}

impl DeferredStore {
    pub fn new(provider: Arc<dyn StoreProvider>) -> Self {
        Self {
            provider,
            store: OnceCell::new(),
        }
    }
}

#[async_trait::async_trait]
impl DataStore for DeferredStore {
    async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<Vec<Row>, AppError> {
        let store = self
            .store
            .get_or_try_init(|| self.provider.acquire())
            .await?;
        store.query(sql, params).await
    }
}
