use super::classify;
use crate::datapipeline::{CreatePipelineInput, DataPipelineApi, PipelineDescription};
use crate::error::Result;
use async_trait::async_trait;
use aws_sdk_datapipeline::Client;

/// A deleted pipeline can still be described for a while; both count as gone
const NOT_FOUND: &[&str] = &["PipelineNotFoundException", "PipelineDeletedException"];

pub struct SdkDataPipeline {
    client: Client,
}

impl SdkDataPipeline {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl DataPipelineApi for SdkDataPipeline {
    async fn create_pipeline(&self, input: CreatePipelineInput) -> Result<String> {
        let output = self
            .client
            .create_pipeline()
            .name(input.name)
            .unique_id(input.unique_id)
            .set_description(input.description)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, &[]))?;

        Ok(output.pipeline_id().to_string())
    }

    async fn describe_pipeline(&self, pipeline_id: &str) -> Result<Option<PipelineDescription>> {
        let result = self
            .client
            .describe_pipelines()
            .pipeline_ids(pipeline_id)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, &[]));

        let output = match result {
            Ok(output) => output,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        Ok(output
            .pipeline_description_list()
            .iter()
            .find(|p| p.pipeline_id() == pipeline_id)
            .map(|p| PipelineDescription {
                pipeline_id: p.pipeline_id().to_string(),
                name: p.name().to_string(),
                description: p.description().map(str::to_string),
            }))
    }

    async fn delete_pipeline(&self, pipeline_id: &str) -> Result<()> {
        self.client
            .delete_pipeline()
            .pipeline_id(pipeline_id)
            .send()
            .await
            .map_err(|e| classify(e, NOT_FOUND, &[]))?;
        Ok(())
    }
}
