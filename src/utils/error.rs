use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Input error: {message}")]
    InputError { message: String },

    #[error("Request timed out after {timeout_ms}ms")]
    NetworkTimeout { timeout_ms: u128 },

    #[error("Transport error: {0}")]
    TransportError(#[from] reqwest::Error),

    #[error("Decode service returned HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("Malformed decode response: {message}")]
    MalformedResponse { message: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Network,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn input(message: impl Into<String>) -> Self {
        EtlError::InputError {
            message: message.into(),
        }
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        EtlError::MalformedResponse {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::InputError { .. } | EtlError::CsvError(_) => ErrorCategory::Input,
            EtlError::NetworkTimeout { .. }
            | EtlError::TransportError(_)
            | EtlError::HttpStatus { .. }
            | EtlError::MalformedResponse { .. } => ErrorCategory::Network,
            EtlError::IoError(_) => ErrorCategory::Output,
            EtlError::ConfigError { .. }
            | EtlError::ConfigValidationError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Output => ErrorSeverity::Critical,
        }
    }

    /// Whether another attempt at the same batch could succeed.
    /// A 4xx other than 429 means the request itself is bad and is not resent.
    pub fn is_retryable(&self) -> bool {
        match self {
            EtlError::NetworkTimeout { .. } | EtlError::TransportError(_) => true,
            EtlError::HttpStatus { status } => *status == 429 || *status >= 500,
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::InputError { message } => format!("Cannot read the VIN list: {}", message),
            EtlError::CsvError(e) => format!("The VIN list is not valid CSV: {}", e),
            EtlError::IoError(e) => format!("Could not write output files: {}", e),
            EtlError::NetworkTimeout { .. }
            | EtlError::TransportError(_)
            | EtlError::HttpStatus { .. } => {
                "The VIN decoding service could not be reached".to_string()
            }
            EtlError::MalformedResponse { .. } => {
                "The VIN decoding service returned an unexpected response".to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => {
                "Check that the input file exists and has a header row with a VIN column"
            }
            ErrorCategory::Network => {
                "Check network connectivity or raise --base-delay-secs to back off further"
            }
            ErrorCategory::Output => "Check that the output directory exists and is writable",
            ErrorCategory::Configuration => "Review the command-line flags and the --config file",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;
