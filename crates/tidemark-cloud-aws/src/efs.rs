//! EFS file system policies

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tidemark_cloud::{Change, CloudError, Operation, OperationContext, Resource};

pub const FILE_SYSTEM_POLICY_TYPE: &str = "aws_efs_file_system_policy";
const DISPLAY_NAME: &str = "EFS File System Policy";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSystemPolicyDescription {
    pub file_system_id: String,
    pub policy: String,
}

#[async_trait]
pub trait EfsApi: Send + Sync {
    async fn put_file_system_policy(
        &self,
        file_system_id: &str,
        policy: &str,
    ) -> Result<FileSystemPolicyDescription>;

    /// Fails with `AwsError::NotFound` when either the file system or its
    /// policy does not exist
    async fn describe_file_system_policy(
        &self,
        file_system_id: &str,
    ) -> Result<FileSystemPolicyDescription>;

    async fn delete_file_system_policy(&self, file_system_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystemPolicyConfig {
    pub file_system_id: String,
    pub policy: String,
}

impl FileSystemPolicyConfig {
    pub fn new(
        file_system_id: impl Into<String>,
        policy: impl Into<String>,
    ) -> tidemark_cloud::Result<Self> {
        let config = Self {
            file_system_id: file_system_id.into(),
            policy: policy.into(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> tidemark_cloud::Result<()> {
        if self.file_system_id.trim().is_empty() {
            return Err(CloudError::InvalidConfig(
                "file_system_id must not be empty".to_string(),
            ));
        }

        serde_json::from_str::<serde_json::Value>(&self.policy).map_err(|e| {
            CloudError::InvalidConfig(format!("policy is not valid JSON: {}", e))
        })?;
        Ok(())
    }
}

/// Whether two policy documents are the same JSON value
pub fn policies_equivalent(a: &str, b: &str) -> bool {
    match (
        serde_json::from_str::<serde_json::Value>(a),
        serde_json::from_str::<serde_json::Value>(b),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSystemPolicyState {
    pub file_system_id: String,
    pub policy: String,
}

impl From<FileSystemPolicyDescription> for FileSystemPolicyState {
    fn from(description: FileSystemPolicyDescription) -> Self {
        Self {
            file_system_id: description.file_system_id,
            policy: description.policy,
        }
    }
}

pub struct FileSystemPolicyResource {
    client: Arc<dyn EfsApi>,
}

impl FileSystemPolicyResource {
    pub fn new(client: Arc<dyn EfsApi>) -> Self {
        Self { client }
    }

    async fn put(
        &self,
        config: &FileSystemPolicyConfig,
        op: Operation,
    ) -> tidemark_cloud::Result<FileSystemPolicyState> {
        config.validate()?;
        tracing::debug!("Putting {} for {}", DISPLAY_NAME, config.file_system_id);

        self.client
            .put_file_system_policy(&config.file_system_id, &config.policy)
            .await
            .map(FileSystemPolicyState::from)
            .map_err(|e| CloudError::operation(op, DISPLAY_NAME, &config.file_system_id, e))
    }
}

#[async_trait]
impl Resource for FileSystemPolicyResource {
    type Config = FileSystemPolicyConfig;
    type State = FileSystemPolicyState;

    fn type_name(&self) -> &'static str {
        FILE_SYSTEM_POLICY_TYPE
    }

    async fn create(
        &self,
        _ctx: &OperationContext,
        config: &FileSystemPolicyConfig,
    ) -> tidemark_cloud::Result<FileSystemPolicyState> {
        self.put(config, Operation::Create).await
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        id: &str,
    ) -> tidemark_cloud::Result<Option<FileSystemPolicyState>> {
        match self.client.describe_file_system_policy(id).await {
            Ok(description) => Ok(Some(description.into())),
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} ({}) not found, removing from state: {}", DISPLAY_NAME, id, e);
                Ok(None)
            }
            Err(e) => Err(CloudError::operation(Operation::Read, DISPLAY_NAME, id, e)),
        }
    }

    async fn update(
        &self,
        _ctx: &OperationContext,
        _id: &str,
        _prior: &FileSystemPolicyConfig,
        desired: &FileSystemPolicyConfig,
    ) -> tidemark_cloud::Result<FileSystemPolicyState> {
        self.put(desired, Operation::Update).await
    }

    async fn delete(&self, _ctx: &OperationContext, id: &str) -> tidemark_cloud::Result<()> {
        tracing::debug!("Deleting {}: {}", DISPLAY_NAME, id);
        self.client
            .delete_file_system_policy(id)
            .await
            .map_err(|e| CloudError::operation(Operation::Delete, DISPLAY_NAME, id, e))?;

        tracing::debug!("{} ({}) deleted", DISPLAY_NAME, id);
        Ok(())
    }

    fn diff(&self, prior: &FileSystemPolicyConfig, desired: &FileSystemPolicyConfig) -> Change {
        let policy = if policies_equivalent(&prior.policy, &desired.policy) {
            Change::NoOp
        } else {
            Change::Update
        };
        Change::replace_when_changed(&prior.file_system_id, &desired.file_system_id).max(policy)
    }
}
