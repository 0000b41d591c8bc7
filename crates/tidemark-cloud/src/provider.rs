//! Resource lifecycle traits
//!
//! Every managed resource kind implements [`Resource`]; read-only lookups
//! implement [`DataSource`]. Handlers own their client handles and receive
//! everything else they need through an [`OperationContext`].

use crate::action::{Change, Operation};
use crate::config::ProviderConfig;
use crate::error::Result;
use crate::state::ResourceState;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Lifecycle of one managed resource kind
#[async_trait]
pub trait Resource: Send + Sync {
    /// Desired configuration, validated when constructed
    type Config: Serialize + DeserializeOwned + Send + Sync;

    /// State read back from the remote API
    type State: Serialize + DeserializeOwned + Send + Sync;

    /// Resource type name (e.g., "aws_elasticache_user_group")
    fn type_name(&self) -> &'static str;

    /// Create the resource and return its state
    async fn create(&self, ctx: &OperationContext, config: &Self::Config) -> Result<Self::State>;

    /// Read current state. `None` means the resource is gone and should be
    /// dropped from managed state.
    async fn read(&self, ctx: &OperationContext, id: &str) -> Result<Option<Self::State>>;

    /// Apply an in-place update
    async fn update(
        &self,
        ctx: &OperationContext,
        id: &str,
        prior: &Self::Config,
        desired: &Self::Config,
    ) -> Result<Self::State>;

    /// Delete the resource
    async fn delete(&self, ctx: &OperationContext, id: &str) -> Result<()>;

    /// Decide how to move from `prior` to `desired`
    fn diff(&self, prior: &Self::Config, desired: &Self::Config) -> Change;

    /// Flatten typed state into the provider-neutral representation
    fn to_resource_state(&self, id: &str, state: &Self::State) -> Result<ResourceState> {
        ResourceState::flatten(id, self.type_name(), state)
    }
}

/// Read-only lookup
#[async_trait]
pub trait DataSource: Send + Sync {
    type Query: Serialize + DeserializeOwned + Send + Sync;
    type Output: Serialize + DeserializeOwned + Send + Sync;

    /// Data source type name (e.g., "aws_network_acls")
    fn type_name(&self) -> &'static str;

    async fn read(&self, ctx: &OperationContext, query: &Self::Query) -> Result<Self::Output>;
}

/// Per-operation timeouts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub create: Duration,
    pub read: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            create: Duration::from_secs(20 * 60),
            read: Duration::from_secs(20 * 60),
            update: Duration::from_secs(20 * 60),
            delete: Duration::from_secs(20 * 60),
        }
    }
}

impl Timeouts {
    pub fn for_operation(&self, op: Operation) -> Duration {
        match op {
            Operation::Create => self.create,
            Operation::Read => self.read,
            Operation::Update => self.update,
            Operation::Delete => self.delete,
        }
    }
}

/// Provider metadata visible to every handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderMeta {
    pub region: String,
    pub partition: String,
}

/// Everything a lifecycle call needs besides its client handles
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub meta: ProviderMeta,
    pub timeouts: Timeouts,
    /// Delay before the first status check of waits that use one
    pub poll_delay: Duration,
    pub cancel: CancellationToken,
}

impl OperationContext {
    pub fn new(meta: ProviderMeta) -> Self {
        Self {
            meta,
            timeouts: Timeouts::default(),
            poll_delay: Duration::from_secs(30),
            cancel: CancellationToken::new(),
        }
    }

    /// Build a context from loaded provider configuration
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            meta: ProviderMeta {
                region: config.region.clone(),
                partition: config.partition.clone(),
            },
            timeouts: config.timeouts.to_timeouts(),
            poll_delay: Duration::from_secs(config.poll_delay_secs),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_poll_delay(mut self, delay: Duration) -> Self {
        self.poll_delay = delay;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn timeout(&self, op: Operation) -> Duration {
        self.timeouts.for_operation(op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_per_operation() {
        let timeouts = Timeouts {
            create: Duration::from_secs(1),
            read: Duration::from_secs(2),
            update: Duration::from_secs(3),
            delete: Duration::from_secs(4),
        };

        assert_eq!(timeouts.for_operation(Operation::Create), Duration::from_secs(1));
        assert_eq!(timeouts.for_operation(Operation::Update), Duration::from_secs(3));
        assert_eq!(timeouts.for_operation(Operation::Delete), Duration::from_secs(4));
    }

    #[test]
    fn test_context_from_config() {
        let config = ProviderConfig {
            region: "eu-west-1".to_string(),
            poll_delay_secs: 5,
            ..Default::default()
        };

        let ctx = OperationContext::from_config(&config);
        assert_eq!(ctx.meta.region, "eu-west-1");
        assert_eq!(ctx.meta.partition, "aws");
        assert_eq!(ctx.poll_delay, Duration::from_secs(5));
        assert_eq!(ctx.timeout(Operation::Create), Duration::from_secs(1200));
        assert!(!ctx.cancel.is_cancelled());
    }
}
