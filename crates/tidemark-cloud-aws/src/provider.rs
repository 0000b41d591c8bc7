//! AWS provider
//!
//! Holds the provider configuration and one client handle per service, and
//! hands out resource and data source handlers bound to those clients.

use crate::billing::BillingServiceAccount;
use crate::datapipeline::{DataPipelineApi, PipelineResource};
use crate::directconnect::{ConnectionAssociationResource, DirectConnectApi};
use crate::ec2::{Ec2Api, NetworkAcls};
use crate::efs::{EfsApi, FileSystemPolicyResource};
use crate::elasticache::{ElastiCacheApi, UserGroupResource};
use crate::redshift::{RedshiftApi, ScheduledActionResource};
use std::sync::Arc;
use tidemark_cloud::{OperationContext, ProviderConfig};

/// Per-service client handles
#[derive(Clone)]
pub struct AwsClients {
    pub elasticache: Arc<dyn ElastiCacheApi>,
    pub redshift: Arc<dyn RedshiftApi>,
    pub efs: Arc<dyn EfsApi>,
    pub ec2: Arc<dyn Ec2Api>,
    pub directconnect: Arc<dyn DirectConnectApi>,
    pub datapipeline: Arc<dyn DataPipelineApi>,
}

pub struct AwsProvider {
    config: ProviderConfig,
    clients: AwsClients,
}

impl AwsProvider {
    pub fn new(config: ProviderConfig, clients: AwsClients) -> Self {
        Self { config, clients }
    }

    /// Build a provider from the ambient AWS configuration (environment,
    /// profiles, instance metadata) for the configured region
    #[cfg(feature = "sdk")]
    pub async fn from_env(config: ProviderConfig) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .load()
            .await;

        tracing::info!("AWS provider initialized: region={}", config.region);
        Self::new(config, AwsClients::from_sdk_config(&sdk_config))
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn region(&self) -> &str {
        &self.config.region
    }

    /// Fresh context for one lifecycle call
    pub fn context(&self) -> OperationContext {
        OperationContext::from_config(&self.config)
    }

    pub fn user_groups(&self) -> UserGroupResource {
        UserGroupResource::new(Arc::clone(&self.clients.elasticache))
    }

    pub fn scheduled_actions(&self) -> ScheduledActionResource {
        ScheduledActionResource::new(Arc::clone(&self.clients.redshift))
    }

    pub fn file_system_policies(&self) -> FileSystemPolicyResource {
        FileSystemPolicyResource::new(Arc::clone(&self.clients.efs))
    }

    pub fn connection_associations(&self) -> ConnectionAssociationResource {
        ConnectionAssociationResource::new(Arc::clone(&self.clients.directconnect))
    }

    pub fn pipelines(&self) -> PipelineResource {
        PipelineResource::new(Arc::clone(&self.clients.datapipeline))
    }

    pub fn network_acls(&self) -> NetworkAcls {
        NetworkAcls::new(Arc::clone(&self.clients.ec2))
    }

    pub fn billing_service_account(&self) -> BillingServiceAccount {
        BillingServiceAccount
    }
}
