use super::{build_error, classify};
use crate::error::Result;
use crate::redshift::{
    RedshiftApi, ScheduledActionDescription, ScheduledActionInput, TargetAction,
};
use async_trait::async_trait;
use aws_sdk_redshift::Client;
use aws_sdk_redshift::primitives::DateTime as SmithyDateTime;
use aws_sdk_redshift::types::{
    PauseClusterMessage, ResizeClusterMessage, ResumeClusterMessage, ScheduledAction,
    ScheduledActionType,
};
use chrono::{DateTime, Utc};

const NOT_FOUND: &[&str] = &["ScheduledActionNotFound"];

pub struct SdkRedshift {
    client: Client,
}

impl SdkRedshift {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

fn to_smithy(time: DateTime<Utc>) -> SmithyDateTime {
    SmithyDateTime::from_secs(time.timestamp())
}

fn from_smithy(time: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.secs(), time.subsec_nanos())
}

fn to_sdk_action(action: &TargetAction) -> Result<ScheduledActionType> {
    let builder = ScheduledActionType::builder();
    let builder = match action {
        TargetAction::PauseCluster { cluster_identifier } => builder.pause_cluster(
            PauseClusterMessage::builder()
                .cluster_identifier(cluster_identifier)
                .build()
                .map_err(build_error)?,
        ),
        TargetAction::ResumeCluster { cluster_identifier } => builder.resume_cluster(
            ResumeClusterMessage::builder()
                .cluster_identifier(cluster_identifier)
                .build()
                .map_err(build_error)?,
        ),
        TargetAction::ResizeCluster {
            cluster_identifier,
            classic,
            cluster_type,
            node_type,
            number_of_nodes,
        } => builder.resize_cluster(
            ResizeClusterMessage::builder()
                .cluster_identifier(cluster_identifier)
                .set_classic(*classic)
                .set_cluster_type(cluster_type.clone())
                .set_node_type(node_type.clone())
                .set_number_of_nodes(*number_of_nodes)
                .build()
                .map_err(build_error)?,
        ),
    };
    Ok(builder.build())
}

fn from_sdk_action(action: &ScheduledActionType) -> Option<TargetAction> {
    if let Some(pause) = action.pause_cluster() {
        return Some(TargetAction::PauseCluster {
            cluster_identifier: pause.cluster_identifier().to_string(),
        });
    }
    if let Some(resume) = action.resume_cluster() {
        return Some(TargetAction::ResumeCluster {
            cluster_identifier: resume.cluster_identifier().to_string(),
        });
    }
    action
        .resize_cluster()
        .map(|resize| TargetAction::ResizeCluster {
            cluster_identifier: resize.cluster_identifier().to_string(),
            classic: resize.classic(),
            cluster_type: resize.cluster_type().map(str::to_string),
            node_type: resize.node_type().map(str::to_string),
            number_of_nodes: resize.number_of_nodes(),
        })
}

fn describe(action: &ScheduledAction) -> ScheduledActionDescription {
    ScheduledActionDescription {
        name: action.scheduled_action_name().unwrap_or_default().to_string(),
        description: action.scheduled_action_description().map(str::to_string),
        state: action.state().map(|s| s.as_str().to_string()),
        start_time: action.start_time().and_then(from_smithy),
        end_time: action.end_time().and_then(from_smithy),
        schedule: action.schedule().unwrap_or_default().to_string(),
        iam_role: action.iam_role().unwrap_or_default().to_string(),
        target_action: action.target_action().and_then(from_sdk_action),
    }
}

#[async_trait]
impl RedshiftApi for SdkRedshift {
    async fn create_scheduled_action(&self, input: ScheduledActionInput) -> Result<()> {
        self.client
            .create_scheduled_action()
            .scheduled_action_name(input.name)
            .schedule(input.schedule)
            .iam_role(input.iam_role)
            .target_action(to_sdk_action(&input.target_action)?)
            .set_scheduled_action_description(input.description)
            .enable(input.enable)
            .set_start_time(input.start_time.map(to_smithy))
            .set_end_time(input.end_time.map(to_smithy))
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, &[]))?;
        Ok(())
    }

    async fn describe_scheduled_actions(
        &self,
        name: &str,
    ) -> Result<Vec<ScheduledActionDescription>> {
        let output = self
            .client
            .describe_scheduled_actions()
            .scheduled_action_name(name)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, &[]))?;

        Ok(output.scheduled_actions().iter().map(describe).collect())
    }

    async fn modify_scheduled_action(&self, input: ScheduledActionInput) -> Result<()> {
        self.client
            .modify_scheduled_action()
            .scheduled_action_name(input.name)
            .schedule(input.schedule)
            .iam_role(input.iam_role)
            .target_action(to_sdk_action(&input.target_action)?)
            .set_scheduled_action_description(input.description)
            .enable(input.enable)
            .set_start_time(input.start_time.map(to_smithy))
            .set_end_time(input.end_time.map(to_smithy))
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, &[]))?;
        Ok(())
    }

    async fn delete_scheduled_action(&self, name: &str) -> Result<()> {
        self.client
            .delete_scheduled_action()
            .scheduled_action_name(name)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, &[]))?;
        Ok(())
    }
}
