use thiserror::Error;

/// Error types for the astrofunc-rs library.
#[derive(Error, Debug)]
pub enum FunctionError {
    /// Malformed metadata or a parameter declaration that violates its own bounds.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An axis unit is incompatible with what the function requires.
    #[error("Unit mismatch on the {axis} axis: {message}")]
    UnitMismatch { axis: String, message: String },

    /// A cross-parameter physical constraint does not hold for the current values.
    #[error("Model domain violation: {0}")]
    ModelDomainViolation(String),

    /// The function needs an optional collaborator that is not available in this process.
    #[error("Function '{function}' requires '{capability}', which is not available")]
    DependencyUnavailable { function: String, capability: String },

    /// Parameter not found.
    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    /// Error for parameter-related problems (bounds violations on mutation).
    #[error("Parameter error: {0}")]
    ParameterError(String),

    /// Error indicating a mismatch in array lengths.
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// Invalid state of a function instance (e.g. auxiliary data not loaded).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// I/O error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML metadata deserialization error.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

impl FunctionError {
    /// Shorthand for a unit mismatch on the named axis.
    pub fn unit_mismatch(axis: &str, message: impl Into<String>) -> Self {
        FunctionError::UnitMismatch {
            axis: axis.to_string(),
            message: message.into(),
        }
    }
}

impl From<crate::parameters::parameter::ParameterError> for FunctionError {
    fn from(err: crate::parameters::parameter::ParameterError) -> Self {
        FunctionError::ParameterError(format!("{}", err))
    }
}

impl From<crate::parameters::expression::ExpressionError> for FunctionError {
    fn from(err: crate::parameters::expression::ExpressionError) -> Self {
        FunctionError::Configuration(format!("{}", err))
    }
}

impl From<crate::units::UnitError> for FunctionError {
    fn from(err: crate::units::UnitError) -> Self {
        FunctionError::Configuration(format!("{}", err))
    }
}

/// Result type alias for astrofunc-rs operations.
pub type Result<T> = std::result::Result<T, FunctionError>;
