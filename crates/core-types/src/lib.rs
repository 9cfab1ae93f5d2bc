pub mod enums;
pub mod error;
pub mod value;

// Re-export the core types to provide a clean public API.
pub use enums::DatabaseType;
pub use error::CoreError;
pub use value::{BuiltQuery, GeneratedKey, Params, Row, SqlValue};
