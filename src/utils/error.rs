use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenewError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Bundle decoding failed: {0}")]
    DecodeError(#[from] base64::DecodeError),

    #[error("API error {code}: {message} (request id: {request_id})")]
    ApiError {
        code: String,
        message: String,
        request_id: String,
    },

    #[error("Request signing failed: {message}")]
    SigningError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Certificate bundle error: {message}")]
    BundleError { message: String },

    #[error("Restart command failed: {message}")]
    RestartError { message: String },

    #[error("{operation} timed out after {seconds}s")]
    TimeoutError { operation: String, seconds: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Api,
    FileSystem,
    Process,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl RenewError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            RenewError::ConfigError { .. }
            | RenewError::InvalidConfigValueError { .. }
            | RenewError::MissingConfigError { .. }
            | RenewError::SigningError { .. } => ErrorCategory::Configuration,
            RenewError::HttpError(_) => ErrorCategory::Network,
            RenewError::ApiError { .. }
            | RenewError::SerializationError(_)
            | RenewError::DecodeError(_) => ErrorCategory::Api,
            RenewError::ZipError(_) | RenewError::IoError(_) | RenewError::BundleError { .. } => {
                ErrorCategory::FileSystem
            }
            RenewError::RestartError { .. } | RenewError::TimeoutError { .. } => {
                ErrorCategory::Process
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Api | ErrorCategory::Process => ErrorSeverity::High,
            ErrorCategory::Configuration | ErrorCategory::FileSystem => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            RenewError::ApiError { code, .. } if code.starts_with("AuthFailure") => {
                "Check TENCENT_SECRET_ID / TENCENT_SECRET_KEY and the system clock"
            }
            RenewError::ApiError { .. } => "Check the certificate console for quota or domain issues",
            RenewError::HttpError(_) => "Check network connectivity and retry",
            RenewError::MissingConfigError { .. }
            | RenewError::InvalidConfigValueError { .. }
            | RenewError::ConfigError { .. } => "Fix the command line flags or the config file",
            RenewError::SigningError { .. } => "Check the secret key format",
            RenewError::IoError(_) | RenewError::ZipError(_) | RenewError::BundleError { .. } => {
                "Check that the save directory exists and is writable"
            }
            RenewError::SerializationError(_) | RenewError::DecodeError(_) => {
                "The API returned an unexpected payload, retry later"
            }
            RenewError::RestartError { .. } | RenewError::TimeoutError { .. } => {
                "Check the web server configuration and restart it manually"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Network => format!("Could not reach the certificate API: {}", self),
            ErrorCategory::Api => format!("Certificate API rejected the request: {}", self),
            ErrorCategory::FileSystem => format!("Could not install the certificate: {}", self),
            ErrorCategory::Process => format!("Web server restart failed: {}", self),
        }
    }

    /// Exit code for the CLI, derived from the severity.
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, RenewError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_failure_suggestion() {
        let err = RenewError::ApiError {
            code: "AuthFailure.SignatureFailure".to_string(),
            message: "bad signature".to_string(),
            request_id: "req-1".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Api);
        assert!(err.recovery_suggestion().contains("TENCENT_SECRET_ID"));
        assert_eq!(err.exit_code(), 1);
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = RenewError::MissingConfigError {
            field: "secret_id".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.exit_code(), 3);
        assert!(err.user_friendly_message().starts_with("Invalid configuration"));
    }

    #[test]
    fn test_timeout_is_process_error() {
        let err = RenewError::TimeoutError {
            operation: "systemctl".to_string(),
            seconds: 30,
        };
        assert_eq!(err.category(), ErrorCategory::Process);
        assert_eq!(err.to_string(), "systemctl timed out after 30s");
    }
}
