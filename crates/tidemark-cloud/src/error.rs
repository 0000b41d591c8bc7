//! Cloud provider error types

use crate::action::Operation;
use std::time::Duration;
use thiserror::Error;

/// Boxed error returned by refresh functions and client traits
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn last(status: &Option<String>) -> &str {
    status.as_deref().unwrap_or("none observed")
}

/// Terminal failures of a state wait
///
/// Every variant names the resource and the last status seen, so the
/// message alone is enough to diagnose a stuck resource.
#[derive(Error, Debug)]
pub enum WaitError {
    #[error("error refreshing {resource} (last status: {}): {source}", last(.last_status))]
    Refresh {
        resource: String,
        last_status: Option<String>,
        #[source]
        source: BoxError,
    },

    #[error("unexpected state '{status}' for {resource}, wanted target {target:?}")]
    UnexpectedState {
        resource: String,
        status: String,
        target: Vec<String>,
    },

    #[error(
        "timeout while waiting for {resource} to reach {target:?} (last status: {}, timeout: {timeout:?})",
        last(.last_status)
    )]
    Timeout {
        resource: String,
        last_status: Option<String>,
        target: Vec<String>,
        timeout: Duration,
    },

    #[error("cancelled while waiting for {resource} (last status: {})", last(.last_status))]
    Cancelled {
        resource: String,
        last_status: Option<String>,
    },

    #[error("couldn't find {resource} after {checks} checks (last status: {})", last(.last_status))]
    NotFound {
        resource: String,
        checks: u32,
        last_status: Option<String>,
    },
}

impl WaitError {
    /// Resource identifier the wait was bound to
    pub fn resource(&self) -> &str {
        match self {
            WaitError::Refresh { resource, .. }
            | WaitError::UnexpectedState { resource, .. }
            | WaitError::Timeout { resource, .. }
            | WaitError::Cancelled { resource, .. }
            | WaitError::NotFound { resource, .. } => resource,
        }
    }

    /// Last status observed before the wait gave up
    pub fn last_status(&self) -> Option<&str> {
        match self {
            WaitError::UnexpectedState { status, .. } => Some(status),
            WaitError::Refresh { last_status, .. }
            | WaitError::Timeout { last_status, .. }
            | WaitError::Cancelled { last_status, .. }
            | WaitError::NotFound { last_status, .. } => last_status.as_deref(),
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, WaitError::Timeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WaitError::Cancelled { .. })
    }
}

/// Cloud provider errors
#[derive(Error, Debug)]
pub enum CloudError {
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("error {op} {resource_type} ({id}): {source}")]
    Operation {
        op: Operation,
        resource_type: String,
        id: String,
        #[source]
        source: BoxError,
    },

    #[error(transparent)]
    Wait(#[from] WaitError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CloudError {
    /// Wrap a failure with the lifecycle operation and the resource it hit
    pub fn operation(
        op: Operation,
        resource_type: impl Into<String>,
        id: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        CloudError::Operation {
            op,
            resource_type: resource_type.into(),
            id: id.into(),
            source: source.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CloudError>;
