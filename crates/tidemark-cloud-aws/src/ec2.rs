//! EC2 lookups

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tidemark_cloud::{CloudError, DataSource, OperationContext};

pub const NETWORK_ACLS_TYPE: &str = "aws_network_acls";

/// EC2 describe filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub name: String,
    pub values: Vec<String>,
}

impl Filter {
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
pub trait Ec2Api: Send + Sync {
    /// Ids of the matching network ACLs. `None` sends no filters at all.
    async fn describe_network_acls(&self, filters: Option<Vec<Filter>>) -> Result<Vec<String>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAclsQuery {
    #[serde(default)]
    pub vpc_id: Option<String>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    #[serde(default)]
    pub filters: Vec<Filter>,
}

impl NetworkAclsQuery {
    /// Build the request filters. The API rejects an empty filter list,
    /// so no criteria yields `None`.
    pub fn build_filters(&self) -> Option<Vec<Filter>> {
        let mut filters = Vec::new();

        if let Some(vpc_id) = &self.vpc_id {
            filters.push(Filter::new("vpc-id", [vpc_id.as_str()]));
        }

        filters.extend(
            self.tags
                .iter()
                .map(|(key, value)| Filter::new(format!("tag:{}", key), [value.as_str()])),
        );
        filters.extend(self.filters.iter().cloned());

        if filters.is_empty() { None } else { Some(filters) }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkAclsOutput {
    pub id: String,
    pub ids: BTreeSet<String>,
}

pub struct NetworkAcls {
    client: Arc<dyn Ec2Api>,
}

impl NetworkAcls {
    pub fn new(client: Arc<dyn Ec2Api>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DataSource for NetworkAcls {
    type Query = NetworkAclsQuery;
    type Output = NetworkAclsOutput;

    fn type_name(&self) -> &'static str {
        NETWORK_ACLS_TYPE
    }

    async fn read(
        &self,
        ctx: &OperationContext,
        query: &NetworkAclsQuery,
    ) -> tidemark_cloud::Result<NetworkAclsOutput> {
        let filters = query.build_filters();
        tracing::debug!("DescribeNetworkAcls filters: {:?}", filters);

        let ids = self
            .client
            .describe_network_acls(filters)
            .await
            .map_err(|e| CloudError::ApiError(format!("describing network ACLs: {}", e)))?;

        if ids.is_empty() {
            return Err(CloudError::ResourceNotFound(
                "no matching network ACLs found".to_string(),
            ));
        }

        Ok(NetworkAclsOutput {
            id: ctx.meta.region.clone(),
            ids: ids.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tidemark_cloud::ProviderMeta;

    struct MockEc2 {
        ids: Vec<&'static str>,
        requests: Mutex<Vec<Option<Vec<Filter>>>>,
    }

    impl MockEc2 {
        fn new(ids: &[&'static str]) -> Self {
            Self {
                ids: ids.to_vec(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Ec2Api for MockEc2 {
        async fn describe_network_acls(&self, filters: Option<Vec<Filter>>) -> Result<Vec<String>> {
            self.requests.lock().unwrap().push(filters);
            Ok(self.ids.iter().map(|s| s.to_string()).collect())
        }
    }

    fn ctx() -> OperationContext {
        OperationContext::new(ProviderMeta {
            region: "eu-west-1".to_string(),
            partition: "aws".to_string(),
        })
    }

    #[test]
    fn test_build_filters() {
        assert_eq!(NetworkAclsQuery::default().build_filters(), None);

        let query = NetworkAclsQuery {
            vpc_id: Some("vpc-1".to_string()),
            tags: BTreeMap::from([("env".to_string(), "prod".to_string())]),
            filters: vec![Filter::new("default", ["true"])],
        };
        assert_eq!(
            query.build_filters(),
            Some(vec![
                Filter::new("vpc-id", ["vpc-1"]),
                Filter::new("tag:env", ["prod"]),
                Filter::new("default", ["true"]),
            ])
        );
    }

    #[tokio::test]
    async fn test_read_collects_sorted_ids() {
        let mock = Arc::new(MockEc2::new(&["acl-b", "acl-a", "acl-b"]));
        let source = NetworkAcls::new(mock.clone());

        let output = source.read(&ctx(), &NetworkAclsQuery::default()).await.unwrap();
        assert_eq!(output.id, "eu-west-1");
        assert_eq!(output.ids.into_iter().collect::<Vec<_>>(), ["acl-a", "acl-b"]);
        assert_eq!(mock.requests.lock().unwrap()[0], None);
    }

    #[tokio::test]
    async fn test_no_matches_is_an_error() {
        let source = NetworkAcls::new(Arc::new(MockEc2::new(&[])));
        let err = source
            .read(&ctx(), &NetworkAclsQuery::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no matching network ACLs found"));
    }
}
