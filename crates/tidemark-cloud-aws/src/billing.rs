//! AWS billing service account

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tidemark_cloud::{DataSource, OperationContext};

pub const BILLING_SERVICE_ACCOUNT_TYPE: &str = "aws_billing_service_account";

/// Account that delivers billing reports
pub const BILLING_ACCOUNT_ID: &str = "386209384616";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingServiceAccountOutput {
    pub id: String,
    pub arn: String,
}

#[derive(Debug, Default)]
pub struct BillingServiceAccount;

#[async_trait]
impl DataSource for BillingServiceAccount {
    type Query = ();
    type Output = BillingServiceAccountOutput;

    fn type_name(&self) -> &'static str {
        BILLING_SERVICE_ACCOUNT_TYPE
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        _query: &(),
    ) -> tidemark_cloud::Result<BillingServiceAccountOutput> {
        Ok(BillingServiceAccountOutput {
            id: BILLING_ACCOUNT_ID.to_string(),
            arn: format!("arn:{}:iam::{}:root", ctx.meta.partition, BILLING_ACCOUNT_ID),
        })
    }
}
