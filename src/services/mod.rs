pub mod acquisition_service;
pub mod connection_pool;
pub mod database; // Data store seam and the PostgreSQL store
pub mod llm_service;
pub mod nl_query_service;
pub mod prompts;
pub mod query_builder;
pub mod result_shaper;
pub mod schema;

pub use acquisition_service::*;
pub use connection_pool::*;
pub use llm_service::*;
pub use nl_query_service::*;
pub use schema::*;
