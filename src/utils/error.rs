use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Io,
    Parsing,
    Processing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ErrorSeverity {
    /// Process exit code of the CLI for an error of this severity.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

impl SimError {
    pub fn processing(message: impl Into<String>) -> Self {
        SimError::ProcessingError {
            message: message.into(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        SimError::InvalidConfigValueError {
            field: field.into(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            SimError::ConfigError { .. }
            | SimError::MissingConfigError { .. }
            | SimError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            SimError::IoError(_) | SimError::ZipError(_) => ErrorCategory::Io,
            SimError::YamlError(_)
            | SimError::TomlError(_)
            | SimError::SerializationError(_)
            | SimError::CsvError(_) => ErrorCategory::Parsing,
            SimError::ProcessingError { .. } | SimError::ValidationError { .. } => {
                ErrorCategory::Processing
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Configuration | ErrorCategory::Parsing => ErrorSeverity::High,
            ErrorCategory::Processing => ErrorSeverity::Medium,
            ErrorCategory::Io => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            SimError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in the scenario file", field)
            }
            SimError::MissingConfigError { field } => {
                format!("Add the '{}' field to the scenario file", field)
            }
            SimError::ConfigError { .. } => {
                "Check the scenario file extension (.yaml, .yml or .toml) and its layout".to_string()
            }
            SimError::YamlError(_) | SimError::TomlError(_) => {
                "Check the scenario file syntax and that all nine top-level sections are present"
                    .to_string()
            }
            SimError::IoError(_) | SimError::ZipError(_) => {
                "Check that the paths exist and are writable".to_string()
            }
            SimError::CsvError(_) | SimError::SerializationError(_) => {
                "Report this as a bug: exported data could not be serialized".to_string()
            }
            SimError::ProcessingError { .. } | SimError::ValidationError { .. } => {
                "Check the dimensions of the input arrays".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid scenario: {}", self),
            ErrorCategory::Parsing => format!("Could not read scenario: {}", self),
            ErrorCategory::Io => format!("File system problem: {}", self),
            ErrorCategory::Processing => format!("Computation failed: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_value_is_configuration_error() {
        let err = SimError::invalid_value("grid.pixel_size", -1.0, "must be positive");
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
        assert!(err.recovery_suggestion().contains("grid.pixel_size"));
        assert!(err.to_string().contains("-1"));
    }

    #[test]
    fn test_io_error_is_critical() {
        let err: SimError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert!(err.user_friendly_message().starts_with("File system problem"));
        assert_eq!(err.severity().exit_code(), 3);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ErrorSeverity::Low.exit_code(), 0);
        assert_eq!(SimError::processing("boom").severity().exit_code(), 2);
        assert_eq!(SimError::invalid_value("x", 1, "bad").severity().exit_code(), 1);
    }
}
