use std::sync::OnceLock;

use crate::error::AppError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use regex::Regex;

/// Tables owned by this crate, longest first so `friend_requests_*` is not
/// mistaken for a table called `friend`.
const KNOWN_TABLES: &[&str] = &["friend_requests", "articles", "messages", "users"];

/// Index and constraint name suffixes PostgreSQL and our migrations use.
const CONSTRAINT_SUFFIXES: &[&str] = &["_key", "_idx", "_pkey", "_fkey", "_check"];

/// Matches "Key (field)=(value)" in PostgreSQL detail messages
static KEY_VALUE: OnceLock<Regex> = OnceLock::new();

fn key_value_pattern() -> &'static Regex {
    KEY_VALUE.get_or_init(|| {
        Regex::new(r"Key \(([^)]+)\)=\(([^)]*)\)").expect("key/value pattern is valid")
    })
}

/// Utility for converting database errors to structured AppError variants.
///
/// Unique violations are the only constraint failures the stores expect
/// (the email index on `users`), so they get a dedicated mapping to
/// `AppError::Duplicate`; everything else stays a `Database` fault.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let message = info.message();
                let detail = info.details().unwrap_or(message);

                match Self::parse_unique_violation(detail, info.constraint_name()) {
                    Some((entity, field, value)) => AppError::Duplicate {
                        entity,
                        field,
                        value,
                    },
                    None => AppError::Database {
                        operation: operation.to_string(),
                        source: anyhow::Error::msg(format!(
                            "Unique constraint violation: {}",
                            message
                        )),
                    },
                }
            }
            DieselError::DatabaseError(_, info) => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::msg(format!("Database error: {}", info.message())),
            },
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    /// Extracts (entity, field, value) from a unique violation.
    ///
    /// The constraint name decides entity and field; the value comes from the
    /// `Key (..)=(..)` detail when the server sends one.
    pub fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let key_value = Self::extract_key_value(message);

        if let Some((entity, field)) = constraint_name.and_then(Self::parse_constraint_name) {
            let value = key_value
                .map(|(_, value)| value)
                .unwrap_or_else(|| "duplicate_value".to_string());
            return Some((entity, field, value));
        }

        key_value.map(|(field, value)| ("resource".to_string(), field, value))
    }

    /// Splits a name such as `users_email_key` into ("users", "email").
    pub fn parse_constraint_name(constraint: &str) -> Option<(String, String)> {
        let table = KNOWN_TABLES
            .iter()
            .find(|table| constraint.starts_with(&format!("{}_", table)))?;

        let rest = &constraint[table.len() + 1..];
        let field = CONSTRAINT_SUFFIXES
            .iter()
            .find_map(|suffix| rest.strip_suffix(suffix))
            .unwrap_or(rest);

        if field.is_empty() {
            return None;
        }
        Some((table.to_string(), field.to_string()))
    }

    fn extract_key_value(message: &str) -> Option<(String, String)> {
        key_value_pattern()
            .captures(message)
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
    }
}
