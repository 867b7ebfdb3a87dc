use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontendError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Resource exhausted: {0}")]
    ResourceExhausted(String),

    #[error("Geometry oracle failure: {0}")]
    OracleFailure(String),

    #[error("Invalid sensor dimensions: width={0}, height={1}")]
    InvalidDimensions(u32, u32),

    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrontendError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        FrontendError::InvalidArgument(msg.into())
    }

    pub(crate) fn oracle(msg: impl Into<String>) -> Self {
        FrontendError::OracleFailure(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, FrontendError>;

/// Allocates an empty vector with room for `len` records, surfacing
/// allocation failure instead of aborting.
pub(crate) fn try_with_capacity<T>(len: usize, what: &str) -> Result<Vec<T>> {
    let mut records = Vec::new();
    records
        .try_reserve_exact(len)
        .map_err(|e| FrontendError::ResourceExhausted(format!("{what}: {e}")))?;
    Ok(records)
}
