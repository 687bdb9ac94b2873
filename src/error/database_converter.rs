use crate::error::AppError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Converts Diesel database errors into structured AppError variants.
///
/// Unique violations are parsed into `Duplicate` with entity/field/value
/// extracted from the Postgres constraint name and DETAIL line; everything
/// else becomes a `Database` error carrying the failed operation.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                let message = info.message().to_string();
                if let Some((entity, field, value)) =
                    Self::parse_unique_violation(&message, info.constraint_name())
                {
                    AppError::Duplicate {
                        entity,
                        field,
                        value,
                    }
                } else {
                    AppError::Database {
                        operation: operation.to_string(),
                        source: anyhow::Error::msg(format!(
                            "Unique constraint violation: {}",
                            message
                        )),
                    }
                }
            }
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

    /// Parses a unique violation into (entity, field, value).
    ///
    /// Postgres names unique constraints `{table}_{column}_key` and reports
    /// the conflicting value as `Key (column)=(value) already exists.`
    fn parse_unique_violation(
        message: &str,
        constraint_name: Option<&str>,
    ) -> Option<(String, String, String)> {
        let (field, value) = Self::extract_key_value(message)?;
        let entity = constraint_name
            .and_then(|name| name.strip_suffix("_key"))
            .and_then(|name| name.strip_suffix(&format!("_{}", field)))
            .unwrap_or("record")
            .to_string();
        Some((entity, field, value))
    }

    fn extract_key_value(message: &str) -> Option<(String, String)> {
        let start = message.find("Key (")? + "Key (".len();
        let rest = &message[start..];
        let field_end = rest.find(")=(")?;
        let field = &rest[..field_end];
        let value_part = &rest[field_end + ")=(".len()..];
        let value_end = value_part.find(')')?;
        Some((field.to_string(), value_part[..value_end].to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    struct MockDatabaseErrorInfo {
        message: String,
        constraint_name: Option<String>,
    }

    impl diesel::result::DatabaseErrorInformation for MockDatabaseErrorInfo {
        fn message(&self) -> &str {
            &self.message
        }

        fn details(&self) -> Option<&str> {
            None
        }

        fn hint(&self) -> Option<&str> {
            None
        }

        fn table_name(&self) -> Option<&str> {
            None
        }

        fn column_name(&self) -> Option<&str> {
            None
        }

        fn constraint_name(&self) -> Option<&str> {
            self.constraint_name.as_deref()
        }

        fn statement_position(&self) -> Option<i32> {
            None
        }
    }

    #[test]
    fn test_convert_not_found_error() {
        let error = DieselError::NotFound;
        let result = DatabaseErrorConverter::convert_diesel_error(error, "find flight");

        match result {
            AppError::NotFound { entity, .. } => assert_eq!(entity, "resource"),
            _ => panic!("Expected NotFound error"),
        }
    }

    #[test]
    fn test_convert_unique_violation_with_constraint_name() {
        let info = MockDatabaseErrorInfo {
            message: "duplicate key value violates unique constraint \"device_tokens_token_key\"\nDETAIL: Key (token)=(abcdef) already exists.".to_string(),
            constraint_name: Some("device_tokens_token_key".to_string()),
        };

        let error = DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, Box::new(info));
        let result = DatabaseErrorConverter::convert_diesel_error(error, "insert device token");

        match result {
            AppError::Duplicate {
                entity,
                field,
                value,
            } => {
                assert_eq!(entity, "device_tokens");
                assert_eq!(field, "token");
                assert_eq!(value, "abcdef");
            }
            _ => panic!("Expected Duplicate error, got: {:?}", result),
        }
    }

    #[test]
    fn test_convert_other_database_error() {
        let info = MockDatabaseErrorInfo {
            message: "deadlock detected".to_string(),
            constraint_name: None,
        };

        let error = DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, Box::new(info));
        let result = DatabaseErrorConverter::convert_diesel_error(error, "update connection");

        match result {
            AppError::Database { operation, .. } => assert_eq!(operation, "update connection"),
            _ => panic!("Expected Database error, got: {:?}", result),
        }
    }
}
