pub mod acquisition;
pub mod structured_query;

pub use acquisition::*;
pub use structured_query::*;
