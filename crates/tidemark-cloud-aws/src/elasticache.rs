//! ElastiCache user groups
//!
//! Create and update return once the group is `active` again; delete returns
//! once the group is gone.

use crate::error::{AwsError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tidemark_cloud::{
    Change, CloudError, Operation, OperationContext, PollOutcome, PollPolicy, Refreshed, Resource,
    WaitError, wait_for_state,
};

pub const USER_GROUP_TYPE: &str = "aws_elasticache_user_group";
const DISPLAY_NAME: &str = "ElastiCache User Group";
const SUPPORTED_ENGINE: &str = "REDIS";
const PENDING_STATES: &[&str] = &["creating", "modifying"];
const MIN_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// User group as described by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroupDescription {
    pub user_group_id: String,
    pub arn: Option<String>,
    pub engine: String,
    pub status: String,
    pub user_ids: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserGroupInput {
    pub user_group_id: String,
    pub engine: String,
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyUserGroupInput {
    pub user_group_id: String,
    pub user_ids_to_add: Vec<String>,
    pub user_ids_to_remove: Vec<String>,
}

/// ElastiCache operations used by the user group resource
#[async_trait]
pub trait ElastiCacheApi: Send + Sync {
    async fn create_user_group(&self, input: CreateUserGroupInput)
    -> Result<UserGroupDescription>;

    /// `Ok(None)` when the group does not exist
    async fn describe_user_group(&self, user_group_id: &str)
    -> Result<Option<UserGroupDescription>>;

    async fn modify_user_group(&self, input: ModifyUserGroupInput) -> Result<()>;

    async fn delete_user_group(&self, user_group_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroupConfig {
    pub user_group_id: String,
    pub engine: String,
    #[serde(default)]
    pub user_ids: BTreeSet<String>,
}

impl UserGroupConfig {
    pub fn new(
        user_group_id: impl Into<String>,
        engine: &str,
        user_ids: impl IntoIterator<Item = impl Into<String>>,
    ) -> tidemark_cloud::Result<Self> {
        let user_group_id = user_group_id.into();
        if user_group_id.trim().is_empty() {
            return Err(CloudError::InvalidConfig(
                "user_group_id must not be empty".to_string(),
            ));
        }

        if !engine.eq_ignore_ascii_case(SUPPORTED_ENGINE) {
            return Err(CloudError::InvalidConfig(format!(
                "engine must be {}, got '{}'",
                SUPPORTED_ENGINE, engine
            )));
        }

        Ok(Self {
            user_group_id,
            engine: SUPPORTED_ENGINE.to_string(),
            user_ids: user_ids.into_iter().map(Into::into).collect(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserGroupState {
    pub id: String,
    pub arn: Option<String>,
    pub engine: String,
    pub user_group_id: String,
    pub user_ids: BTreeSet<String>,
    pub status: String,
}

impl From<UserGroupDescription> for UserGroupState {
    fn from(group: UserGroupDescription) -> Self {
        Self {
            id: group.user_group_id.clone(),
            arn: group.arn,
            engine: group.engine,
            user_group_id: group.user_group_id,
            user_ids: group.user_ids,
            status: group.status,
        }
    }
}

pub struct UserGroupResource {
    client: Arc<dyn ElastiCacheApi>,
}

impl UserGroupResource {
    pub fn new(client: Arc<dyn ElastiCacheApi>) -> Self {
        Self { client }
    }

    fn active_policy(ctx: &OperationContext, op: Operation) -> PollPolicy {
        PollPolicy::new(PENDING_STATES.iter().copied(), ["active"])
            .with_timeout(ctx.timeout(op))
            .with_min_interval(MIN_POLL_INTERVAL)
            .with_delay(ctx.poll_delay)
    }

    fn deleted_policy(ctx: &OperationContext) -> PollPolicy {
        PollPolicy::new(["deleting"], Vec::<String>::new())
            .with_timeout(ctx.timeout(Operation::Delete))
            .with_min_interval(MIN_POLL_INTERVAL)
            .with_delay(ctx.poll_delay)
            .absent_is_success()
    }

    async fn wait(
        &self,
        ctx: &OperationContext,
        id: &str,
        policy: &PollPolicy,
    ) -> std::result::Result<PollOutcome<UserGroupDescription>, WaitError> {
        let resource = format!("{} ({})", DISPLAY_NAME, id);
        wait_for_state(&resource, policy, &ctx.cancel, || {
            let client = Arc::clone(&self.client);
            let id = id.to_string();
            async move {
                match client.describe_user_group(&id).await? {
                    Some(group) => {
                        let status = group.status.clone();
                        Ok::<_, AwsError>(Refreshed::found(group, status))
                    }
                    None => Ok(Refreshed::NotFound),
                }
            }
        })
        .await
    }

    async fn wait_active(
        &self,
        ctx: &OperationContext,
        id: &str,
        op: Operation,
    ) -> tidemark_cloud::Result<UserGroupState> {
        tracing::info!("Waiting for {} ({}) to be available", DISPLAY_NAME, id);
        let outcome = self
            .wait(ctx, id, &Self::active_policy(ctx, op))
            .await
            .map_err(|e| CloudError::operation(op, DISPLAY_NAME, id, e))?;

        outcome
            .into_value()
            .map(UserGroupState::from)
            .ok_or_else(|| CloudError::ResourceNotFound(format!("{} ({})", DISPLAY_NAME, id)))
    }
}

/// A delete wait that failed because the group vanished or is mid-transition
/// still counts as deleted.
fn delete_wait_settled(err: &WaitError) -> bool {
    match err {
        WaitError::Refresh { source, .. } => source
            .downcast_ref::<AwsError>()
            .is_some_and(|e| e.is_not_found() || e.is_invalid_state()),
        _ => false,
    }
}

#[async_trait]
impl Resource for UserGroupResource {
    type Config = UserGroupConfig;
    type State = UserGroupState;

    fn type_name(&self) -> &'static str {
        USER_GROUP_TYPE
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        config: &UserGroupConfig,
    ) -> tidemark_cloud::Result<UserGroupState> {
        let input = CreateUserGroupInput {
            user_group_id: config.user_group_id.clone(),
            engine: config.engine.clone(),
            user_ids: config.user_ids.iter().cloned().collect(),
        };

        let created = self.client.create_user_group(input).await.map_err(|e| {
            CloudError::operation(Operation::Create, DISPLAY_NAME, &config.user_group_id, e)
        })?;

        self.wait_active(ctx, &created.user_group_id, Operation::Create)
            .await
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        id: &str,
    ) -> tidemark_cloud::Result<Option<UserGroupState>> {
        match self.client.describe_user_group(id).await {
            Ok(Some(group)) => Ok(Some(group.into())),
            Ok(None) => {
                tracing::warn!("{} ({}) not found, removing from state", DISPLAY_NAME, id);
                Ok(None)
            }
            Err(e) if e.is_not_found() => {
                tracing::warn!("{} ({}) not found, removing from state", DISPLAY_NAME, id);
                Ok(None)
            }
            Err(e) => Err(CloudError::operation(Operation::Read, DISPLAY_NAME, id, e)),
        }
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        id: &str,
        prior: &UserGroupConfig,
        desired: &UserGroupConfig,
    ) -> tidemark_cloud::Result<UserGroupState> {
        let to_add: Vec<String> = desired
            .user_ids
            .difference(&prior.user_ids)
            .cloned()
            .collect();
        let to_remove: Vec<String> = prior
            .user_ids
            .difference(&desired.user_ids)
            .cloned()
            .collect();

        if to_add.is_empty() && to_remove.is_empty() {
            return self
                .read(ctx, id)
                .await?
                .ok_or_else(|| CloudError::ResourceNotFound(format!("{} ({})", DISPLAY_NAME, id)));
        }

        let input = ModifyUserGroupInput {
            user_group_id: desired.user_group_id.clone(),
            user_ids_to_add: to_add,
            user_ids_to_remove: to_remove,
        };
        self.client
            .modify_user_group(input)
            .await
            .map_err(|e| CloudError::operation(Operation::Update, DISPLAY_NAME, id, e))?;

        self.wait_active(ctx, id, Operation::Update).await
    }

    async fn delete(&self, ctx: &OperationContext, id: &str) -> tidemark_cloud::Result<()> {
        match self.client.delete_user_group(id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("{} ({}) already deleted", DISPLAY_NAME, id);
            }
            Err(e) => return Err(CloudError::operation(Operation::Delete, DISPLAY_NAME, id, e)),
        }

        tracing::info!("Waiting for {} ({}) to be deleted", DISPLAY_NAME, id);
        match self.wait(ctx, id, &Self::deleted_policy(ctx)).await {
            Ok(_) => Ok(()),
            Err(e) if delete_wait_settled(&e) => Ok(()),
            Err(e) => Err(CloudError::operation(Operation::Delete, DISPLAY_NAME, id, e)),
        }
    }

    fn diff(&self, prior: &UserGroupConfig, desired: &UserGroupConfig) -> Change {
        let engine = if prior.engine.eq_ignore_ascii_case(&desired.engine) {
            Change::NoOp
        } else {
            Change::Replace
        };

        // ModifyUserGroup cannot rename a group
        engine
            .max(Change::replace_when_changed(
                &prior.user_group_id,
                &desired.user_group_id,
            ))
            .max(Change::when_changed(&prior.user_ids, &desired.user_ids))
    }
}
