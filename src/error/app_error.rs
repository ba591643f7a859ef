use crate::config::error::ConfigError;
use crate::error::DatabaseErrorConverter;
use thiserror::Error;

/// Application-wide error type.
///
/// Absence on read paths is never an error: stores and services return
/// `Option`/`bool` for that. `NotFound` is reserved for writes that must hit
/// an existing document, and `Duplicate` is kept apart from `Database` so
/// callers can tell a taken email from a store fault.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found error with entity, field, and value information
    #[error("Resource not found: {entity} with {field}={value}")]
    NotFound {
        entity: String,
        field: String,
        value: String,
    },

    /// Duplicate entry error for unique constraint violations
    #[error("Duplicate entry: {entity}.{field} = '{value}' already exists")]
    Duplicate {
        entity: String,
        field: String,
        value: String,
    },

    /// Validation error with field-specific details
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Unauthorized access error with authentication message
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// The requester does not own the resource it tried to change
    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    /// Database operation error with operation context
    #[error("Database operation failed: {operation}")]
    Database {
        operation: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration error with key information
    #[error("Configuration error: {key}")]
    Configuration {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    /// Connection pool error
    #[error("Connection pool error")]
    ConnectionPool {
        #[source]
        source: anyhow::Error,
    },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn not_found(entity: &str, field: &str, value: impl ToString) -> Self {
        AppError::NotFound {
            entity: entity.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        }
    }

    pub fn validation(field: &str, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error reports a unique-key conflict.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, AppError::Duplicate { .. })
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(error: diesel::result::Error) -> Self {
        DatabaseErrorConverter::convert_diesel_error(error, "database operation")
    }
}

impl From<ConfigError> for AppError {
    fn from(error: ConfigError) -> Self {
        let key = match &error {
            ConfigError::ValidationError { field, .. } => field.clone(),
            _ => "settings".to_string(),
        };
        AppError::Configuration {
            key,
            source: anyhow::Error::from(error),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        // Report the first failing field; the message carries the rule text.
        let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));

        match fields.first() {
            Some((field, errs)) => {
                let reason = errs
                    .first()
                    .and_then(|e| e.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "invalid value".to_string());
                AppError::Validation {
                    field: field.to_string(),
                    reason,
                }
            }
            None => AppError::Validation {
                field: "input".to_string(),
                reason: errors.to_string(),
            },
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Probe {
        #[validate(email(message = "Invalid email format"))]
        email: String,
    }

    #[test]
    fn test_validation_errors_convert_to_first_field() {
        let probe = Probe {
            email: "not-an-email".to_string(),
        };
        let err: AppError = probe.validate().unwrap_err().into();

        match err {
            AppError::Validation { field, reason } => {
                assert_eq!(field, "email");
                assert_eq!(reason, "Invalid email format");
            }
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    #[test]
    fn test_config_error_keeps_field_as_key() {
        let err: AppError = ConfigError::validation("database.url", "missing").into();
        match err {
            AppError::Configuration { key, .. } => assert_eq!(key, "database.url"),
            other => panic!("Expected Configuration error, got: {:?}", other),
        }
    }

    #[test]
    fn test_is_duplicate() {
        let dup = AppError::Duplicate {
            entity: "users".to_string(),
            field: "email".to_string(),
            value: "a@x.com".to_string(),
        };
        assert!(dup.is_duplicate());
        assert!(!AppError::not_found("user", "id", 1).is_duplicate());
    }
}
