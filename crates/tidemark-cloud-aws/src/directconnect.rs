//! Direct Connect connection to LAG associations

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tidemark_cloud::{Change, CloudError, Operation, OperationContext, Resource};

pub const CONNECTION_ASSOCIATION_TYPE: &str = "aws_dx_connection_association";
const DISPLAY_NAME: &str = "Direct Connect Connection Association";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescription {
    pub connection_id: String,
    pub lag_id: Option<String>,
    pub connection_state: String,
}

#[async_trait]
pub trait DirectConnectApi: Send + Sync {
    async fn associate_connection_with_lag(
        &self,
        connection_id: &str,
        lag_id: &str,
    ) -> Result<ConnectionDescription>;

    /// `Ok(None)` when the connection does not exist
    async fn describe_connection(&self, connection_id: &str)
    -> Result<Option<ConnectionDescription>>;

    async fn disassociate_connection_from_lag(
        &self,
        connection_id: &str,
        lag_id: &str,
    ) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionAssociationConfig {
    pub connection_id: String,
    pub lag_id: String,
}

impl ConnectionAssociationConfig {
    pub fn new(
        connection_id: impl Into<String>,
        lag_id: impl Into<String>,
    ) -> tidemark_cloud::Result<Self> {
        let config = Self {
            connection_id: connection_id.into(),
            lag_id: lag_id.into(),
        };
        if config.connection_id.trim().is_empty() || config.lag_id.trim().is_empty() {
            return Err(CloudError::InvalidConfig(
                "connection_id and lag_id are required".to_string(),
            ));
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionAssociationState {
    pub id: String,
    pub connection_id: String,
    pub lag_id: String,
}

/// Resource id: `<connection_id>/<lag_id>`
pub fn association_id(connection_id: &str, lag_id: &str) -> String {
    format!("{}/{}", connection_id, lag_id)
}

/// Split a resource id into connection id and LAG id
pub fn parse_association_id(id: &str) -> tidemark_cloud::Result<(&str, &str)> {
    match id.split_once('/') {
        Some((connection_id, lag_id)) if !connection_id.is_empty() && !lag_id.is_empty() => {
            Ok((connection_id, lag_id))
        }
        _ => Err(CloudError::InvalidConfig(format!(
            "invalid {} id '{}', expected <connection_id>/<lag_id>",
            DISPLAY_NAME, id
        ))),
    }
}

pub struct ConnectionAssociationResource {
    client: Arc<dyn DirectConnectApi>,
}

impl ConnectionAssociationResource {
    pub fn new(client: Arc<dyn DirectConnectApi>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Resource for ConnectionAssociationResource {
    type Config = ConnectionAssociationConfig;
    type State = ConnectionAssociationState;

    fn type_name(&self) -> &'static str {
        CONNECTION_ASSOCIATION_TYPE
    }

    async fn create(
        &self,
        ctx: &OperationContext,
        config: &ConnectionAssociationConfig,
    ) -> tidemark_cloud::Result<ConnectionAssociationState> {
        let id = association_id(&config.connection_id, &config.lag_id);
        tracing::debug!(
            "Associating connection {} with LAG {}",
            config.connection_id,
            config.lag_id
        );

        self.client
            .associate_connection_with_lag(&config.connection_id, &config.lag_id)
            .await
            .map_err(|e| CloudError::operation(Operation::Create, DISPLAY_NAME, &id, e))?;

        self.read(ctx, &id).await?.ok_or_else(|| {
            CloudError::operation(
                Operation::Create,
                DISPLAY_NAME,
                &id,
                "connection is not on the requested LAG after association",
            )
        })
    }

    async fn read(
        &self,
        _ctx: &OperationContext,
        id: &str,
    ) -> tidemark_cloud::Result<Option<ConnectionAssociationState>> {
        let (connection_id, lag_id) = parse_association_id(id)?;

        let connection = match self.client.describe_connection(connection_id).await {
            Ok(connection) => connection,
            Err(e) if e.is_not_found() => None,
            Err(e) => return Err(CloudError::operation(Operation::Read, DISPLAY_NAME, id, e)),
        };

        let Some(connection) = connection else {
            tracing::warn!(
                "Direct Connect Connection ({}) not found, removing from state",
                connection_id
            );
            return Ok(None);
        };

        if connection.lag_id.as_deref() != Some(lag_id) {
            tracing::warn!(
                "Direct Connect Connection ({}) is no longer on LAG {}, removing from state",
                connection_id,
                lag_id
            );
            return Ok(None);
        }

        Ok(Some(ConnectionAssociationState {
            id: id.to_string(),
            connection_id: connection.connection_id,
            lag_id: lag_id.to_string(),
        }))
    }

    async fn update(
        &self,
        _ctx: &OperationContext,
        id: &str,
        _prior: &ConnectionAssociationConfig,
        _desired: &ConnectionAssociationConfig,
    ) -> tidemark_cloud::Result<ConnectionAssociationState> {
        Err(CloudError::operation(
            Operation::Update,
            DISPLAY_NAME,
            id,
            "association cannot be updated in place",
        ))
    }

    async fn delete(&self, ctx: &OperationContext, id: &str) -> tidemark_cloud::Result<()> {
        let (connection_id, lag_id) = parse_association_id(id)?;
        if self.read(ctx, id).await?.is_none() {
            tracing::debug!("{} ({}) already removed", DISPLAY_NAME, id);
            return Ok(());
        }

        tracing::debug!("Disassociating connection {} from LAG {}", connection_id, lag_id);
        match self
            .client
            .disassociate_connection_from_lag(connection_id, lag_id)
            .await
        {
            Ok(()) => Ok(()),
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(CloudError::operation(Operation::Delete, DISPLAY_NAME, id, e)),
        }
    }

    fn diff(
        &self,
        prior: &ConnectionAssociationConfig,
        desired: &ConnectionAssociationConfig,
    ) -> Change {
        Change::replace_when_changed(prior, desired)
    }
}
