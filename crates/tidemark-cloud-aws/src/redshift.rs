//! Redshift scheduled actions

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tidemark_cloud::{Change, CloudError, Operation, OperationContext, Resource};

pub const SCHEDULED_ACTION_TYPE: &str = "aws_redshift_scheduled_action";
const DISPLAY_NAME: &str = "Redshift Scheduled Action";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

/// What the scheduled action does to its cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum TargetAction {
    PauseCluster {
        cluster_identifier: String,
    },
    ResumeCluster {
        cluster_identifier: String,
    },
    ResizeCluster {
        cluster_identifier: String,
        #[serde(default)]
        classic: Option<bool>,
        #[serde(default)]
        cluster_type: Option<String>,
        #[serde(default)]
        node_type: Option<String>,
        #[serde(default)]
        number_of_nodes: Option<i32>,
    },
}

impl TargetAction {
    pub fn cluster_identifier(&self) -> &str {
        match self {
            TargetAction::PauseCluster { cluster_identifier }
            | TargetAction::ResumeCluster { cluster_identifier }
            | TargetAction::ResizeCluster {
                cluster_identifier, ..
            } => cluster_identifier,
        }
    }

    fn validate(&self) -> tidemark_cloud::Result<()> {
        if self.cluster_identifier().trim().is_empty() {
            return Err(CloudError::InvalidConfig(
                "target_action.cluster_identifier must not be empty".to_string(),
            ));
        }

        if let TargetAction::ResizeCluster {
            number_of_nodes: Some(n),
            ..
        } = self
            && *n < 1
        {
            return Err(CloudError::InvalidConfig(format!(
                "target_action.number_of_nodes must be at least 1, got {}",
                n
            )));
        }

        Ok(())
    }
}

/// Parse a `2006-01-02T15:04:05-0700` style timestamp
pub fn parse_timestamp(value: &str) -> tidemark_cloud::Result<DateTime<FixedOffset>> {
    DateTime::parse_from_str(value, TIMESTAMP_FORMAT).map_err(|e| {
        CloudError::InvalidConfig(format!(
            "invalid timestamp '{}', expected {}: {}",
            value, TIMESTAMP_FORMAT, e
        ))
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledActionConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub start_time: Option<DateTime<FixedOffset>>,
    #[serde(default)]
    pub end_time: Option<DateTime<FixedOffset>>,
    pub schedule: String,
    pub iam_role: String,
    pub target_action: TargetAction,
}

fn default_active() -> bool {
    true
}

impl ScheduledActionConfig {
    pub fn new(
        name: impl Into<String>,
        schedule: impl Into<String>,
        iam_role: impl Into<String>,
        target_action: TargetAction,
    ) -> tidemark_cloud::Result<Self> {
        let config = Self {
            name: name.into(),
            description: None,
            active: default_active(),
            start_time: None,
            end_time: None,
            schedule: schedule.into(),
            iam_role: iam_role.into(),
            target_action,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Set the schedule window from `%Y-%m-%dT%H:%M:%S%z` strings
    pub fn with_window(
        mut self,
        start_time: Option<&str>,
        end_time: Option<&str>,
    ) -> tidemark_cloud::Result<Self> {
        self.start_time = start_time.map(parse_timestamp).transpose()?;
        self.end_time = end_time.map(parse_timestamp).transpose()?;
        Ok(self)
    }

    pub fn validate(&self) -> tidemark_cloud::Result<()> {
        for (field, value) in [
            ("name", &self.name),
            ("schedule", &self.schedule),
            ("iam_role", &self.iam_role),
        ] {
            if value.trim().is_empty() {
                return Err(CloudError::InvalidConfig(format!(
                    "{} must not be empty",
                    field
                )));
            }
        }
        self.target_action.validate()
    }

    fn to_input(&self) -> ScheduledActionInput {
        ScheduledActionInput {
            name: self.name.clone(),
            schedule: self.schedule.clone(),
            iam_role: self.iam_role.clone(),
            target_action: self.target_action.clone(),
            description: self.description.clone(),
            enable: self.active,
            start_time: self.start_time.map(|t| t.with_timezone(&Utc)),
            end_time: self.end_time.map(|t| t.with_timezone(&Utc)),
        }
    }
}

/// Create/modify request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledActionInput {
    pub name: String,
    pub schedule: String,
    pub iam_role: String,
    pub target_action: TargetAction,
    pub description: Option<String>,
    pub enable: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

/// Scheduled action as described by the API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledActionDescription {
    pub name: String,
    pub description: Option<String>,
    /// `ACTIVE` or `DISABLED`
    pub state: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub schedule: String,
    pub iam_role: String,
    pub target_action: Option<TargetAction>,
}

#[async_trait]
pub trait RedshiftApi: Send + Sync {
    async fn create_scheduled_action(&self, input: ScheduledActionInput) -> Result<()>;

    async fn describe_scheduled_actions(&self, name: &str)
    -> Result<Vec<ScheduledActionDescription>>;

    async fn modify_scheduled_action(&self, input: ScheduledActionInput) -> Result<()>;

    async fn delete_scheduled_action(&self, name: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledActionState {
    pub name: String,
    pub description: Option<String>,
    pub active: bool,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub schedule: String,
    pub iam_role: String,
    pub target_action: Option<TargetAction>,
}

impl From<ScheduledActionDescription> for ScheduledActionState {
    fn from(action: ScheduledActionDescription) -> Self {
        Self {
            active: action.state.as_deref() == Some("ACTIVE"),
            name: action.name,
            description: action.description,
            start_time: action.start_time,
            end_time: action.end_time,
            schedule: action.schedule,
            iam_role: action.iam_role,
            target_action: action.target_action,
        }
    }
}

pub struct ScheduledActionResource {
    client: Arc<dyn RedshiftApi>,
}

impl ScheduledActionResource {
    pub fn new(client: Arc<dyn RedshiftApi>) -> Self {
        Self { client }
    }

    async fn read_existing(
        &self,
        ctx: &OperationContext,
        id: &str,
        op: Operation,
    ) -> tidemark_cloud::Result<ScheduledActionState> {
        self.read(ctx, id).await?.ok_or_else(|| {
            CloudError::operation(op, DISPLAY_NAME, id, "scheduled action not found after write")
        })
    }
}

#[async_trait]
impl Resource for ScheduledActionResource {
    type Config = ScheduledActionConfig;
    type State = ScheduledActionState;

    fn type_name(&self) -> &'static str {
        SCHEDULED_ACTION_TYPE
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        config: &ScheduledActionConfig,
    ) -> tidemark_cloud::Result<ScheduledActionState> {
        config.validate()?;
        tracing::debug!("Creating {}: {}", DISPLAY_NAME, config.name);

        self.client
            .create_scheduled_action(config.to_input())
            .await
            .map_err(|e| CloudError::operation(Operation::Create, DISPLAY_NAME, &config.name, e))?;

        self.read_existing(ctx, &config.name, Operation::Create).await
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        id: &str,
    ) -> tidemark_cloud::Result<Option<ScheduledActionState>> {
        let mut actions = match self.client.describe_scheduled_actions(id).await {
            Ok(actions) => actions,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(CloudError::operation(Operation::Read, DISPLAY_NAME, id, e)),
        };

        if actions.len() != 1 {
            tracing::warn!("Unable to find {} ({}), removing from state", DISPLAY_NAME, id);
            return Ok(None);
        }

        Ok(actions.pop().map(ScheduledActionState::from))
    }

    async fn update(
        &self,
        ctx: &OperationContext,
        id: &str,
        _prior: &ScheduledActionConfig,
        desired: &ScheduledActionConfig,
    ) -> tidemark_cloud::Result<ScheduledActionState> {
        desired.validate()?;
        tracing::debug!("Updating {}: {}", DISPLAY_NAME, id);

        let mut input = desired.to_input();
        input.name = id.to_string();
        self.client
            .modify_scheduled_action(input)
            .await
            .map_err(|e| CloudError::operation(Operation::Update, DISPLAY_NAME, id, e))?;

        self.read_existing(ctx, id, Operation::Update).await
    }

    async fn delete(&self, _ctx: &OperationContext, id: &str) -> tidemark_cloud::Result<()> {
        tracing::debug!("Deleting {}: {}", DISPLAY_NAME, id);
        match self.client.delete_scheduled_action(id).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(CloudError::operation(Operation::Delete, DISPLAY_NAME, id, e)),
        }
    }

    fn diff(&self, prior: &ScheduledActionConfig, desired: &ScheduledActionConfig) -> Change {
        Change::replace_when_changed(&prior.name, &desired.name).max(Change::when_changed(
            &(
                &prior.description,
                prior.active,
                prior.start_time,
                prior.end_time,
                &prior.schedule,
                &prior.iam_role,
                &prior.target_action,
            ),
            &(
                &desired.description,
                desired.active,
                desired.start_time,
                desired.end_time,
                &desired.schedule,
                &desired.iam_role,
                &desired.target_action,
            ),
        ))
    }
}
