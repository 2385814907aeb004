// Data store abstraction for the query engine
pub mod adapter;
pub mod postgresql;
#[cfg(test)]
pub mod fake;

pub use adapter::{DataStore, DeferredStore, Row, SqlParam, StoreProvider};
pub use postgresql::PostgresStore;
