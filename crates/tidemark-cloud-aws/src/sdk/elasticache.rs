use super::classify;
use crate::elasticache::{
    CreateUserGroupInput, ElastiCacheApi, ModifyUserGroupInput, UserGroupDescription,
};
use crate::error::Result;
use async_trait::async_trait;
use aws_sdk_elasticache::Client;
use aws_sdk_elasticache::types::UserGroup;

const NOT_FOUND: &[&str] = &["UserGroupNotFound"];
const INVALID_STATE: &[&str] = &["InvalidUserGroupState"];

pub struct SdkElastiCache {
    client: Client,
}

impl SdkElastiCache {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn describe(group: &UserGroup) -> UserGroupDescription {
    UserGroupDescription {
        user_group_id: group.user_group_id().unwrap_or_default().to_string(),
        arn: group.arn().map(str::to_string),
        engine: group.engine().unwrap_or_default().to_string(),
        status: group.status().unwrap_or_default().to_string(),
        user_ids: group.user_ids().iter().cloned().collect(),
    }
}

#[async_trait]
impl ElastiCacheApi for SdkElastiCache {
    async fn create_user_group(
        &self,
        input: CreateUserGroupInput,
    ) -> Result<UserGroupDescription> {
        let output = self
            .client
            .create_user_group()
            .user_group_id(&input.user_group_id)
            .engine(&input.engine)
            .set_user_ids(Some(input.user_ids.clone()))
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, INVALID_STATE))?;

        Ok(UserGroupDescription {
            user_group_id: output
                .user_group_id()
                .unwrap_or(&input.user_group_id)
                .to_string(),
            arn: output.arn().map(str::to_string),
            engine: output.engine().unwrap_or(&input.engine).to_string(),
            status: output.status().unwrap_or_default().to_string(),
            user_ids: output.user_ids().iter().cloned().collect(),
        })
    }

    async fn describe_user_group(
        &self,
        user_group_id: &str,
    ) -> Result<Option<UserGroupDescription>> {
        let result = self
            .client
            .describe_user_groups()
            .user_group_id(user_group_id)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, INVALID_STATE));

        match result {
            Ok(output) => Ok(output.user_groups().first().map(describe)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn modify_user_group(&self, input: ModifyUserGroupInput) -> Result<()> {
        let mut request = self
            .client
            .modify_user_group()
            .user_group_id(&input.user_group_id);
        if !input.user_ids_to_add.is_empty() {
            request = request.set_user_ids_to_add(Some(input.user_ids_to_add));
        }
        if !input.user_ids_to_remove.is_empty() {
            request = request.set_user_ids_to_remove(Some(input.user_ids_to_remove));
        }

        request
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, INVALID_STATE))?;
        Ok(())
    }

    async fn delete_user_group(&self, user_group_id: &str) -> Result<()> {
        self.client
            .delete_user_group()
            .user_group_id(user_group_id)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, INVALID_STATE))?;
        Ok(())
    }
}
