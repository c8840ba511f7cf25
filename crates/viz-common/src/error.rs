//! Error types for volcano-viz components.

use thiserror::Error;

/// Result type alias using VizError.
pub type VizResult<T> = Result<T, VizError>;

/// Primary error type for request routing and rendering.
#[derive(Debug, Error)]
pub enum VizError {
    // === Startup Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    // === Resolution Errors ===
    #[error("Unknown backend binding: {0}")]
    UnknownBackend(String),

    #[error("Unknown data source: {0}")]
    UnknownDataSource(String),

    #[error("Unknown renderer kind: {0}")]
    UnknownRendererKind(String),

    #[error("Data source '{data_source}' does not support action '{action}'")]
    UnknownAction { data_source: String, action: String },

    // === Pool Errors ===
    #[error("Timed out waiting for a client from pool '{0}'")]
    PoolTimeout(String),

    // === Remote Errors ===
    #[error("Transport error: {0}")]
    Transport(String),

    // === Validation Errors ===
    #[error("Invalid area of interest: {0}")]
    InvalidArea(String),

    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    // === Rendering Errors ===
    #[error("Rendering failed: {0}")]
    Render(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VizError {
    /// Stable kind token for structured error results.
    pub fn kind(&self) -> &'static str {
        match self {
            VizError::Config(_) => "ConfigError",
            VizError::UnknownBackend(_) => "UnknownBackend",
            VizError::UnknownDataSource(_) => "UnknownDataSource",
            VizError::UnknownRendererKind(_) => "UnknownRendererKind",
            VizError::UnknownAction { .. } => "UnknownAction",
            VizError::PoolTimeout(_) => "PoolTimeout",
            VizError::Transport(_) => "TransportError",
            VizError::InvalidArea(_) => "InvalidArea",
            VizError::InvalidParameter { .. } => "InvalidParameter",
            VizError::Render(_) => "RenderError",
            VizError::Internal(_) => "InternalError",
        }
    }

    /// Whether this failure aborts startup rather than a single request.
    pub fn is_fatal(&self) -> bool {
        matches!(self, VizError::Config(_))
    }
}

// Conversion from common error types
impl From<std::io::Error> for VizError {
    fn from(err: std::io::Error) -> Self {
        VizError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for VizError {
    fn from(err: serde_json::Error) -> Self {
        VizError::Internal(format!("JSON error: {}", err))
    }
}
