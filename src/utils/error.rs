use thiserror::Error;

#[derive(Error, Debug)]
pub enum FillerError {
    #[error("HTTP request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Could not verify user identity: {message}")]
    IdentityError { message: String },

    #[error("Backend call '{call}' failed: {message}")]
    GatewayError { call: String, message: String },

    #[error("Persistence call timed out after {seconds}s")]
    PersistenceTimeout { seconds: u64 },

    #[error("Form transport failed: {message}")]
    TransportError { message: String },

    #[error("A submission pass is already in progress")]
    PipelineBusy,
}

pub type Result<T> = std::result::Result<T, FillerError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Validation,
    System,
}

impl FillerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            FillerError::ConfigError { .. }
            | FillerError::InvalidConfigValueError { .. }
            | FillerError::MissingConfigError { .. } => ErrorCategory::Configuration,
            FillerError::ApiError(_)
            | FillerError::GatewayError { .. }
            | FillerError::PersistenceTimeout { .. }
            | FillerError::TransportError { .. }
            | FillerError::IdentityError { .. } => ErrorCategory::Network,
            FillerError::PipelineBusy => ErrorCategory::Validation,
            FillerError::IoError(_) | FillerError::SerializationError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單行被拒不致命，重送即可
            FillerError::TransportError { .. } | FillerError::PipelineBusy => ErrorSeverity::Low,
            FillerError::GatewayError { .. } | FillerError::PersistenceTimeout { .. } => {
                ErrorSeverity::Medium
            }
            FillerError::ApiError(_)
            | FillerError::ConfigError { .. }
            | FillerError::InvalidConfigValueError { .. }
            | FillerError::MissingConfigError { .. } => ErrorSeverity::High,
            // 無法確認身份時整個工作階段作廢
            FillerError::IdentityError { .. }
            | FillerError::IoError(_)
            | FillerError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            FillerError::ApiError(_) | FillerError::TransportError { .. } => {
                "Check network connectivity and the form endpoint URL".to_string()
            }
            FillerError::ConfigError { .. }
            | FillerError::InvalidConfigValueError { .. }
            | FillerError::MissingConfigError { .. } => {
                "Review the configuration file (or reload a preset) and try again".to_string()
            }
            FillerError::IdentityError { .. } => {
                "Verify the script backend URL and that your account is authorized".to_string()
            }
            FillerError::GatewayError { .. } => {
                "Rows may have been submitted but not saved; resubmit to retry persistence"
                    .to_string()
            }
            FillerError::PersistenceTimeout { .. } => {
                "The backend may still have saved the rows; check before resubmitting".to_string()
            }
            FillerError::PipelineBusy => {
                "Wait for the current submission pass to finish".to_string()
            }
            FillerError::IoError(_) | FillerError::SerializationError(_) => {
                "Check file paths and permissions".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            FillerError::IdentityError { .. } => {
                "Could not verify your identity with the backend".to_string()
            }
            FillerError::GatewayError { .. } => {
                "Form submission finished, but saving the rows failed".to_string()
            }
            FillerError::PipelineBusy => "Submission already in progress".to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_error_is_critical() {
        let err = FillerError::IdentityError {
            message: "no email".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.category(), ErrorCategory::Network);
    }

    #[test]
    fn test_transport_error_is_low_severity() {
        let err = FillerError::TransportError {
            message: "connection reset".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.category(), ErrorCategory::Network);
    }
}
