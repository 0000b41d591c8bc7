use super::classify;
use crate::ec2::{Ec2Api, Filter};
use crate::error::Result;
use async_trait::async_trait;
use aws_sdk_ec2::Client;

pub struct SdkEc2 {
    client: Client,
}

impl SdkEc2 {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl Ec2Api for SdkEc2 {
    async fn describe_network_acls(&self, filters: Option<Vec<Filter>>) -> Result<Vec<String>> {
        let filters = filters.map(|filters| {
            filters
                .into_iter()
                .map(|f| {
                    aws_sdk_ec2::types::Filter::builder()
                        .name(f.name)
                        .set_values(Some(f.values))
                        .build()
                })
                .collect()
        });

        let output = self
            .client
            .describe_network_acls()
            .set_filters(filters)
            .send()
            .await
            .map_err(|e| classify(e, &[], &[]))?;

        Ok(output
            .network_acls()
            .iter()
            .filter_map(|acl| acl.network_acl_id().map(str::to_string))
            .collect())
    }
}
