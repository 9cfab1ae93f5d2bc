use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Unsupported bind value: {0}")]
    UnsupportedValue(String),
}
