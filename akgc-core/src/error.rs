//! Error types for the AKGC core library.
//!
//! Uses `thiserror` for one error enum per collaborator boundary. Only
//! [`GenerationError`] and [`ConfigError`] ever reach callers of the
//! correction pipeline; embedding and lookup failures are recovered inside
//! the scorers and the fact provider.

/// Top-level error type for the AKGC core library.
#[derive(Debug, thiserror::Error)]
pub enum AkgcError {
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the generation collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation unavailable: {message}")]
    Unavailable { message: String },

    #[error("Generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Invalid generation response: {message}")]
    InvalidResponse { message: String },
}

/// Errors from the embedding collaborator.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Embedding request failed: {message}")]
    Request { message: String },

    #[error("Invalid embedding response: {message}")]
    InvalidResponse { message: String },

    #[error("Nothing to embed")]
    EmptyInput,

    #[error("Embedding dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },
}

/// Errors from the knowledge-lookup collaborator.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LookupError {
    #[error("Lookup connection failed: {message}")]
    Connection { message: String },

    #[error("Lookup timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Lookup returned HTTP {status}")]
    Status { status: u16 },

    #[error("Invalid lookup response: {message}")]
    InvalidResponse { message: String },

    #[error("No knowledge found for '{entity}'")]
    NotFound { entity: String },
}

impl LookupError {
    /// Transient failures are worth another attempt; everything else is final.
    pub fn is_retryable(&self) -> bool {
        match self {
            LookupError::Connection { .. } | LookupError::Timeout { .. } => true,
            LookupError::Status { status } => *status == 429 || *status >= 500,
            LookupError::InvalidResponse { .. } | LookupError::NotFound { .. } => false,
        }
    }
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration load failed: {message}")]
    Load { message: String },
}

/// A type alias for results using the top-level `AkgcError`.
pub type Result<T> = std::result::Result<T, AkgcError>;
