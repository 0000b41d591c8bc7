use super::classify;
use crate::directconnect::{ConnectionDescription, DirectConnectApi};
use crate::error::{AwsError, Result};
use async_trait::async_trait;
use aws_sdk_directconnect::Client;
use aws_sdk_directconnect::types::Connection;

/// Direct Connect reports every client-side failure with this one code
const CLIENT_EXCEPTION: &str = "DirectConnectClientException";

pub struct SdkDirectConnect {
    client: Client,
}

impl SdkDirectConnect {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

/// Missing connections and LAGs come back as a generic client exception
fn refine(err: AwsError) -> AwsError {
    match err {
        AwsError::Service { code, message }
            if code == CLIENT_EXCEPTION && message.contains("Could not find") =>
        {
            AwsError::NotFound(message)
        }
        other => other,
    }
}

fn describe(connection: &Connection) -> ConnectionDescription {
    ConnectionDescription {
        connection_id: connection.connection_id().unwrap_or_default().to_string(),
        lag_id: connection.lag_id().map(str::to_string),
        connection_state: connection
            .connection_state()
            .map(|s| s.as_str().to_string())
            .unwrap_or_default(),
    }
}

#[async_trait]
impl DirectConnectApi for SdkDirectConnect {
    async fn associate_connection_with_lag(
        &self,
        connection_id: &str,
        lag_id: &str,
    ) -> Result<ConnectionDescription> {
        let output = self
            .client
            .associate_connection_with_lag()
            .connection_id(connection_id)
            .lag_id(lag_id)
            .send()
            .await
            .map_err(|e| refine(classify(e, &[], &[])))?;

        Ok(ConnectionDescription {
            connection_id: output.connection_id().unwrap_or(connection_id).to_string(),
            lag_id: output.lag_id().map(str::to_string),
            connection_state: output
                .connection_state()
                .map(|s| s.as_str().to_string())
                .unwrap_or_default(),
        })
    }

    async fn describe_connection(
        &self,
        connection_id: &str,
    ) -> Result<Option<ConnectionDescription>> {
        let result = self
            .client
            .describe_connections()
            .connection_id(connection_id)
            .send()
            .await
            .map_err(|e| refine(classify(e, &[], &[])));

        match result {
            Ok(output) => Ok(output
                .connections()
                .iter()
                .find(|c| c.connection_id() == Some(connection_id))
                .map(describe)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn disassociate_connection_from_lag(
        &self,
        connection_id: &str,
        lag_id: &str,
    ) -> Result<()> {
        self.client
            .disassociate_connection_from_lag()
            .connection_id(connection_id)
            .lag_id(lag_id)
            .send()
            .await
            .map_err(|e| refine(classify(e, &[], &[])))?;
        Ok(())
    }
}
