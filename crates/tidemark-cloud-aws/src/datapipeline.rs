//! Data Pipeline pipelines
//!
//! Pipelines carry no status of their own while being deleted, so the delete
//! wait reports `DELETING` for as long as the pipeline is still visible.

use crate::error::{AwsError, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tidemark_cloud::{
    Change, CloudError, Operation, OperationContext, PollPolicy, Refreshed, Resource,
    wait_for_state,
};

pub const PIPELINE_TYPE: &str = "aws_datapipeline_pipeline";
const DISPLAY_NAME: &str = "Data Pipeline";
const DELETING_STATUS: &str = "DELETING";
const DELETE_POLL_INTERVAL: Duration = Duration::from_secs(10);
const UNIQUE_ID_PREFIX: &str = "tidemark-";

static UNIQUE_ID_COUNTER: AtomicU32 = AtomicU32::new(0);

/// Idempotency token for pipeline creation, unique within this process
pub fn unique_id() -> String {
    let counter = UNIQUE_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!(
        "{}{}{:08x}",
        UNIQUE_ID_PREFIX,
        Utc::now().format("%Y%m%d%H%M%S%f"),
        counter
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePipelineInput {
    pub name: String,
    pub unique_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineDescription {
    pub pipeline_id: String,
    pub name: String,
    pub description: Option<String>,
}

#[async_trait]
pub trait DataPipelineApi: Send + Sync {
    /// Returns the new pipeline id
    async fn create_pipeline(&self, input: CreatePipelineInput) -> Result<String>;

    /// `Ok(None)` when the pipeline does not exist or has been deleted
    async fn describe_pipeline(&self, pipeline_id: &str) -> Result<Option<PipelineDescription>>;

    async fn delete_pipeline(&self, pipeline_id: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PipelineConfig {
    pub fn new(name: impl Into<String>) -> tidemark_cloud::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(CloudError::InvalidConfig("name must not be empty".to_string()));
        }
        Ok(Self {
            name,
            description: None,
        })
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineState {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

impl From<PipelineDescription> for PipelineState {
    fn from(pipeline: PipelineDescription) -> Self {
        Self {
            id: pipeline.pipeline_id,
            name: pipeline.name,
            description: pipeline.description,
        }
    }
}

pub struct PipelineResource {
    client: Arc<dyn DataPipelineApi>,
}

impl PipelineResource {
    pub fn new(client: Arc<dyn DataPipelineApi>) -> Self {
        Self { client }
    }

    async fn wait_deleted(&self, ctx: &OperationContext, id: &str) -> tidemark_cloud::Result<()> {
        let policy = PollPolicy::new([DELETING_STATUS], Vec::<String>::new())
            .with_timeout(ctx.timeout(Operation::Delete))
            .with_min_interval(DELETE_POLL_INTERVAL)
            .absent_is_success();

        let resource = format!("{} ({})", DISPLAY_NAME, id);
        tracing::info!("Waiting for {} to be deleted", resource);
        wait_for_state(&resource, &policy, &ctx.cancel, || {
            let client = Arc::clone(&self.client);
            let id = id.to_string();
            async move {
                match client.describe_pipeline(&id).await {
                    Ok(Some(pipeline)) => Ok(Refreshed::found(pipeline, DELETING_STATUS)),
                    Ok(None) => Ok(Refreshed::NotFound),
                    Err(e) if e.is_not_found() => Ok(Refreshed::NotFound),
                    Err(e) => Err::<_, AwsError>(e),
                }
            }
        })
        .await
        .map_err(|e| CloudError::operation(Operation::Delete, DISPLAY_NAME, id, e))?;
        Ok(())
    }
}

#[async_trait]
impl Resource for PipelineResource {
    type Config = PipelineConfig;
    type State = PipelineState;

    fn type_name(&self) -> &'static str {
        PIPELINE_TYPE
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        config: &PipelineConfig,
    ) -> tidemark_cloud::Result<PipelineState> {
        let input = CreatePipelineInput {
            name: config.name.clone(),
            unique_id: unique_id(),
            description: config.description.clone(),
        };

        let id = self.client.create_pipeline(input).await.map_err(|e| {
            CloudError::operation(Operation::Create, DISPLAY_NAME, &config.name, e)
        })?;
        tracing::info!("{} ID: {}", DISPLAY_NAME, id);

        self.read(ctx, &id)
            .await?
            .ok_or_else(|| CloudError::ResourceNotFound(format!("{} ({})", DISPLAY_NAME, id)))
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        id: &str,
    ) -> tidemark_cloud::Result<Option<PipelineState>> {
        match self.client.describe_pipeline(id).await {
            Ok(Some(pipeline)) => Ok(Some(pipeline.into())),
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
        _prior: &PipelineConfig,
        _desired: &PipelineConfig,
    ) -> tidemark_cloud::Result<PipelineState> {
        // Every configurable field forces replacement
        self.read(ctx, id)
            .await?
            .ok_or_else(|| CloudError::ResourceNotFound(format!("{} ({})", DISPLAY_NAME, id)))
    }

    async fn delete(&self, ctx: &OperationContext, id: &str) -> tidemark_cloud::Result<()> {
        match self.client.delete_pipeline(id).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!("{} ({}) already deleted", DISPLAY_NAME, id);
                return Ok(());
            }
            Err(e) => return Err(CloudError::operation(Operation::Delete, DISPLAY_NAME, id, e)),
        }

        self.wait_deleted(ctx, id).await
    }

    fn diff(&self, prior: &PipelineConfig, desired: &PipelineConfig) -> Change {
        Change::replace_when_changed(prior, desired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tidemark_cloud::{ProviderMeta, WaitError};

    /// Pipeline store whose deletes take `visible_after_delete` describes to
    /// become visible
    #[derive(Default)]
    struct MockDataPipeline {
        pipelines: Mutex<Vec<PipelineDescription>>,
        unique_ids: Mutex<HashSet<String>>,
        visible_after_delete: Mutex<u32>,
        deleted: Mutex<bool>,
        describes: Mutex<u32>,
    }

    #[async_trait]
    impl DataPipelineApi for MockDataPipeline {
        async fn create_pipeline(&self, input: CreatePipelineInput) -> Result<String> {
            assert!(self.unique_ids.lock().unwrap().insert(input.unique_id));
            let id = format!("df-{:04}", self.pipelines.lock().unwrap().len());
            self.pipelines.lock().unwrap().push(PipelineDescription {
                pipeline_id: id.clone(),
                name: input.name,
                description: input.description,
            });
            Ok(id)
        }

        async fn describe_pipeline(&self, pipeline_id: &str) -> Result<Option<PipelineDescription>> {
            *self.describes.lock().unwrap() += 1;
            if *self.deleted.lock().unwrap() {
                let mut remaining = self.visible_after_delete.lock().unwrap();
                if *remaining == 0 {
                    return Err(AwsError::NotFound(format!("pipeline {pipeline_id}")));
                }
                *remaining -= 1;
            }
            Ok(self
                .pipelines
                .lock()
                .unwrap()
                .iter()
                .find(|p| p.pipeline_id == pipeline_id)
                .cloned())
        }

        async fn delete_pipeline(&self, pipeline_id: &str) -> Result<()> {
            if !self
                .pipelines
                .lock()
                .unwrap()
                .iter()
                .any(|p| p.pipeline_id == pipeline_id)
            {
                return Err(AwsError::NotFound(format!("pipeline {pipeline_id}")));
            }
            *self.deleted.lock().unwrap() = true;
            Ok(())
        }
    }

    fn ctx() -> OperationContext {
        OperationContext::new(ProviderMeta {
            region: "us-east-1".to_string(),
            partition: "aws".to_string(),
        })
    }

    #[test]
    fn test_unique_ids_differ() {
        let a = unique_id();
        let b = unique_id();
        assert!(a.starts_with("tidemark-"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let resource = PipelineResource::new(Arc::new(MockDataPipeline::default()));
        let config = PipelineConfig::new("nightly-export")
            .unwrap()
            .with_description("exports");

        let state = resource.create(&ctx(), &config).await.unwrap();
        assert_eq!(state.id, "df-0000");
        assert_eq!(state.description.as_deref(), Some("exports"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_waits_while_visible() {
        let mock = Arc::new(MockDataPipeline::default());
        *mock.visible_after_delete.lock().unwrap() = 2;
        let resource = PipelineResource::new(mock.clone());
        let state = resource
            .create(&ctx(), &PipelineConfig::new("p").unwrap())
            .await
            .unwrap();
        let before = *mock.describes.lock().unwrap();

        let start = tokio::time::Instant::now();
        resource.delete(&ctx(), &state.id).await.unwrap();

        assert_eq!(*mock.describes.lock().unwrap() - before, 3);
        assert_eq!(start.elapsed(), Duration::from_secs(20));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_times_out_while_visible() {
        let mock = Arc::new(MockDataPipeline::default());
        *mock.visible_after_delete.lock().unwrap() = u32::MAX;
        let resource = PipelineResource::new(mock);
        let state = resource
            .create(&ctx(), &PipelineConfig::new("p").unwrap())
            .await
            .unwrap();

        let mut timeouts = tidemark_cloud::Timeouts::default();
        timeouts.delete = Duration::from_secs(60);
        let err = resource
            .delete(&ctx().with_timeouts(timeouts), &state.id)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CloudError::Operation { ref source, .. }
                if source.downcast_ref::<WaitError>().is_some_and(WaitError::is_timeout)
        ));
    }

    #[tokio::test]
    async fn test_delete_of_missing_pipeline_succeeds() {
        let resource = PipelineResource::new(Arc::new(MockDataPipeline::default()));
        resource.delete(&ctx(), "df-missing").await.unwrap();
    }

    #[test]
    fn test_name_and_description_force_replacement() {
        let resource = PipelineResource::new(Arc::new(MockDataPipeline::default()));
        let prior = PipelineConfig::new("p").unwrap().with_description("a");

        assert_eq!(resource.diff(&prior, &prior.clone()), Change::NoOp);
        assert_eq!(
            resource.diff(&prior, &prior.clone().with_description("b")),
            Change::Replace
        );
        assert_eq!(
            resource.diff(&prior, &PipelineConfig::new("q").unwrap().with_description("a")),
            Change::Replace
        );
    }
}
