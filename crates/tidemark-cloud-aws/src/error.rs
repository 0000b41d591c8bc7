//! AWS provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("{code}: {message}")]
    Service { code: String, message: String },

    #[error("Request failed: {0}")]
    Transport(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound(_))
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, AwsError::InvalidState(_))
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(AwsError::NotFound("user group ug-1".to_string()).is_not_found());
        assert!(AwsError::InvalidState("deleting".to_string()).is_invalid_state());

        let err = AwsError::Service {
            code: "ThrottlingException".to_string(),
            message: "Rate exceeded".to_string(),
        };
        assert!(!err.is_not_found());
        assert_eq!(err.to_string(), "ThrottlingException: Rate exceeded");
    }
}
