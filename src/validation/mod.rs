pub mod structured_query_validator;

pub use structured_query_validator::*;
