//! Client trait implementations backed by the AWS SDK
//!
//! Only compiled with the `sdk` feature.

mod datapipeline;
mod directconnect;
mod ec2;
mod efs;
mod elasticache;
mod redshift;

pub use datapipeline::SdkDataPipeline;
pub use directconnect::SdkDirectConnect;
pub use ec2::SdkEc2;
pub use efs::SdkEfs;
pub use elasticache::SdkElastiCache;
pub use redshift::SdkRedshift;

use crate::error::AwsError;
use crate::provider::AwsClients;
use aws_sdk_ec2::error::{ProvideErrorMetadata, SdkError};
use std::sync::Arc;

impl AwsClients {
    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self {
            elasticache: Arc::new(SdkElastiCache::new(config)),
            redshift: Arc::new(SdkRedshift::new(config)),
            efs: Arc::new(SdkEfs::new(config)),
            ec2: Arc::new(SdkEc2::new(config)),
            directconnect: Arc::new(SdkDirectConnect::new(config)),
            datapipeline: Arc::new(SdkDataPipeline::new(config)),
        }
    }
}

/// Classify an SDK failure by its service error code
pub(crate) fn classify<E, R>(
    err: SdkError<E, R>,
    not_found_codes: &[&str],
    invalid_state_codes: &[&str],
) -> AwsError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    match &err {
        SdkError::ServiceError(context) => {
            let service_err = context.err();
            let code = service_err.code().unwrap_or("Unknown").to_string();
            let message = service_err
                .message()
                .map(str::to_string)
                .unwrap_or_else(|| service_err.to_string());

            if not_found_codes.contains(&code.as_str()) {
                AwsError::NotFound(message)
            } else if invalid_state_codes.contains(&code.as_str()) {
                AwsError::InvalidState(message)
            } else {
                AwsError::Service { code, message }
            }
        }
        _ => AwsError::Transport(err.to_string()),
    }
}

pub(crate) fn build_error(err: aws_sdk_ec2::error::BuildError) -> AwsError {
    AwsError::InvalidRequest(err.to_string())
}
