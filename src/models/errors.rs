use thiserror::Error;

/// Service-level errors that can occur in business logic
#[derive(Debug, Error)]
pub enum ServiceError {
    /// `key` is whatever the caller looked the food up by: a name or an id.
    #[error("Food {key} not found")]
    FoodNotFound { key: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Storage unavailable: {source}")]
    StorageUnavailable {
        #[from]
        source: RepositoryError,
    },
}

/// Repository-level errors for data access operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("AWS SDK error: {message}")]
    AwsSdk { message: String },

    #[error("DynamoDB table not found: {table_name}. Ensure the table exists and IAM permissions are correct.")]
    TableNotFound { table_name: String },

    #[error("Malformed item: {message}")]
    MalformedItem { message: String },

    #[error("Item already exists: {id}")]
    AlreadyExists { id: String },
}

/// Validation errors for input data
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required field missing: {field}")]
    RequiredField { field: String },

    #[error("Invalid format: {field}, expected={expected}")]
    InvalidFormat { field: String, expected: String },
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::ValidationError {
            message: err.to_string(),
        }
    }
}

/// Result type alias for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ServiceError::FoodNotFound {
            key: "acorn".to_string(),
        };
        assert_eq!(error.to_string(), "Food acorn not found");

        let validation_error = ValidationError::RequiredField {
            field: "imgURL".to_string(),
        };
        assert_eq!(validation_error.to_string(), "Required field missing: imgURL");
    }

    #[test]
    fn test_error_conversion() {
        let validation_error = ValidationError::InvalidFormat {
            field: "id".to_string(),
            expected: "UUID".to_string(),
        };

        let service_error: ServiceError = validation_error.into();
        match service_error {
            ServiceError::ValidationError { message } => {
                assert_eq!(message, "Invalid format: id, expected=UUID");
            }
            _ => panic!("Expected ValidationError conversion"),
        }
    }

    #[test]
    fn test_repository_error_becomes_storage_unavailable() {
        let repo_error = RepositoryError::TableNotFound {
            table_name: "BunnyFoods".to_string(),
        };

        let service_error: ServiceError = repo_error.into();
        match service_error {
            ServiceError::StorageUnavailable { source } => {
                assert!(source.to_string().contains("BunnyFoods"));
            }
            _ => panic!("Expected StorageUnavailable conversion"),
        }
    }
}
