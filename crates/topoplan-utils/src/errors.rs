use thiserror::Error;

/// Infrastructure-specific errors for topoplan-utils
#[derive(Error, Debug)]
pub enum UtilsError {
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Plan error: {0}")]
    Plan(#[from] topoplan_core::PlanError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to parse: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

pub type Result<T> = std::result::Result<T, UtilsError>;
