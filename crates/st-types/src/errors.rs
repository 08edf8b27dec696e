use thiserror::Error;

/// Main error type for the SafeTL system
#[derive(Error, Debug)]
pub enum StError {
    #[error("Pool error: {0}")]
    Pool(#[from] PoolError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Pool-related errors
#[derive(Error, Debug)]
pub enum PoolError {
    #[error("Operation not supported by this pool: {operation}")]
    Unsupported { operation: String },

    #[error("Capability not supported by the active pool: {capability}")]
    CapabilityNotSupported { capability: String },

    #[error("Invalid pool configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("Index {index} out of range for {len} entries")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Point is not part of the pool and querying non-existent points is disabled")]
    PointNotInPool,

    #[error("Insufficient data: requested {requested} points, only {available} available")]
    InsufficientData { requested: usize, available: usize },

    #[error("Failed to load {path}: {message}")]
    Load { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PoolError {
    pub fn unsupported(operation: &str) -> Self {
        Self::Unsupported {
            operation: operation.to_string(),
        }
    }

    pub fn capability(capability: &str) -> Self {
        Self::CapabilityNotSupported {
            capability: capability.to_string(),
        }
    }

    /// True when the error means "this pool cannot do that" rather than
    /// "the call was wrong".
    pub fn is_capability_absence(&self) -> bool {
        matches!(
            self,
            PoolError::Unsupported { .. } | PoolError::CapabilityNotSupported { .. }
        )
    }
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    #[error("No tasks configured")]
    NoTasks,
}

/// Result type alias for pool operations
pub type PoolResult<T> = Result<T, PoolError>;

/// Result type alias for SafeTL operations
pub type StResult<T> = Result<T, StError>;

/// Macro for creating invalid-input pool errors
#[macro_export]
macro_rules! invalid_input {
    ($($arg:tt)*) => {
        $crate::PoolError::InvalidInput { message: format!($($arg)*) }
    };
}

/// Macro for creating invalid-configuration pool errors
#[macro_export]
macro_rules! invalid_config {
    ($($arg:tt)*) => {
        $crate::PoolError::InvalidConfiguration { message: format!($($arg)*) }
    };
}
