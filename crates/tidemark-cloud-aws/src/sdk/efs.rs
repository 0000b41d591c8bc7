use super::classify;
use crate::efs::{EfsApi, FileSystemPolicyDescription};
use crate::error::Result;
use async_trait::async_trait;
use aws_sdk_efs::Client;

const NOT_FOUND: &[&str] = &["FileSystemNotFound", "PolicyNotFound"];
const INVALID_STATE: &[&str] = &["IncorrectFileSystemLifeCycleState"];

pub struct SdkEfs {
    client: Client,
}

impl SdkEfs {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl EfsApi for SdkEfs {
    async fn put_file_system_policy(
        &self,
        file_system_id: &str,
        policy: &str,
    ) -> Result<FileSystemPolicyDescription> {
        let output = self
            .client
            .put_file_system_policy()
            .file_system_id(file_system_id)
            .policy(policy)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, INVALID_STATE))?;

        Ok(FileSystemPolicyDescription {
            file_system_id: output
                .file_system_id()
                .unwrap_or(file_system_id)
                .to_string(),
            policy: output.policy().unwrap_or(policy).to_string(),
        })
    }

    async fn describe_file_system_policy(
        &self,
        file_system_id: &str,
    ) -> Result<FileSystemPolicyDescription> {
        let output = self
            .client
            .describe_file_system_policy()
            .file_system_id(file_system_id)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, INVALID_STATE))?;

        Ok(FileSystemPolicyDescription {
            file_system_id: output
                .file_system_id()
                .unwrap_or(file_system_id)
                .to_string(),
            policy: output.policy().unwrap_or_default().to_string(),
        })
    }

    async fn delete_file_system_policy(&self, file_system_id: &str) -> Result<()> {
        self.client
            .delete_file_system_policy()
            .file_system_id(file_system_id)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, INVALID_STATE))?;
        Ok(())
    }
}
