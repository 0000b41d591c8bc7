//! AWS provider for Tidemark
//!
//! Resource kinds and data sources built on the `tidemark-cloud` lifecycle
//! traits. Each service is reached through a client trait
//! ([`ElastiCacheApi`], [`RedshiftApi`], ...) so handlers can run against
//! any implementation; the `sdk` feature provides the real AWS SDK ones.
//!
//! # Resources
//!
//! - `aws_elasticache_user_group`
//! - `aws_redshift_scheduled_action`
//! - `aws_efs_file_system_policy`
//! - `aws_dx_connection_association`
//! - `aws_datapipeline_pipeline`
//!
//! # Data sources
//!
//! - `aws_network_acls`
//! - `aws_billing_service_account`
//!
//! # Example
//!
//! ```ignore
//! use tidemark_cloud::{ProviderConfig, Resource};
//! use tidemark_cloud_aws::{AwsProvider, UserGroupConfig};
//!
//! let provider = AwsProvider::from_env(ProviderConfig::load()?).await;
//! let ctx = provider.context();
//!
//! let config = UserGroupConfig::new("app-users", "redis", ["default"])?;
//! let state = provider.user_groups().create(&ctx, &config).await?;
//! ```

pub mod billing;
pub mod datapipeline;
pub mod directconnect;
pub mod ec2;
pub mod efs;
pub mod elasticache;
pub mod error;
pub mod provider;
pub mod redshift;
#[cfg(feature = "sdk")]
pub mod sdk;

pub use billing::{BillingServiceAccount, BillingServiceAccountOutput};
pub use datapipeline::{DataPipelineApi, PipelineConfig, PipelineResource, PipelineState};
pub use directconnect::{
    ConnectionAssociationConfig, ConnectionAssociationResource, ConnectionAssociationState,
    DirectConnectApi,
};
pub use ec2::{Ec2Api, Filter, NetworkAcls, NetworkAclsOutput, NetworkAclsQuery};
pub use efs::{EfsApi, FileSystemPolicyConfig, FileSystemPolicyResource, FileSystemPolicyState};
pub use elasticache::{ElastiCacheApi, UserGroupConfig, UserGroupResource, UserGroupState};
pub use error::{AwsError, Result};
pub use provider::{AwsClients, AwsProvider};
pub use redshift::{
    RedshiftApi, ScheduledActionConfig, ScheduledActionResource, ScheduledActionState,
    TargetAction,
};
