//! AWS Cloud Map registry client

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_servicediscovery::config::Region;
use aws_sdk_servicediscovery::error::DisplayErrorContext;
use aws_sdk_servicediscovery::types::{FilterCondition, ServiceFilter, ServiceFilterName};
use aws_sdk_servicediscovery::Client;
use tracing::info;

use super::{InstanceSummary, NamespaceSummary, Page, Registry, ServiceSummary};
use crate::error::{Error, Result};

/// Cloud Map implementation of [`Registry`]
#[derive(Clone, Debug)]
pub struct CloudMapRegistry {
    client: Client,
}

impl CloudMapRegistry {
    /// Wrap an already configured SDK client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Build a client from the AWS default provider chain.
    ///
    /// An explicit `region` wins over the environment and instance metadata.
    /// Fails if no region can be resolved at all.
    pub async fn from_env(region: Option<String>) -> Result<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;

        let resolved = sdk_config.region().ok_or_else(|| {
            Error::ConfigError("SD configuration requires a region".to_string())
        })?;
        info!("Using Cloud Map in region {}", resolved);

        Ok(Self::new(Client::new(&sdk_config)))
    }
}

#[async_trait]
impl Registry for CloudMapRegistry {
    async fn list_namespaces(&self, page_token: Option<String>) -> Result<Page<NamespaceSummary>> {
        let output = self
            .client
            .list_namespaces()
            .set_next_token(page_token)
            .send()
            .await
            .map_err(|e| Error::registry("ListNamespaces", DisplayErrorContext(e)))?;

        let items = output
            .namespaces()
            .iter()
            .map(|ns| NamespaceSummary {
                id: ns.id().unwrap_or_default().to_string(),
                name: ns.name().unwrap_or_default().to_string(),
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn list_services(
        &self,
        namespace_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<ServiceSummary>> {
        let filter = ServiceFilter::builder()
            .name(ServiceFilterName::NamespaceId)
            .values(namespace_id)
            .condition(FilterCondition::Eq)
            .build()
            .map_err(|e| Error::registry("ListServices", e))?;

        let output = self
            .client
            .list_services()
            .filters(filter)
            .set_next_token(page_token)
            .send()
            .await
            .map_err(|e| Error::registry("ListServices", DisplayErrorContext(e)))?;

        let items = output
            .services()
            .iter()
            .map(|s| ServiceSummary {
                name: s.name().unwrap_or_default().to_string(),
            })
            .collect();

        Ok(Page {
            items,
            next_token: output.next_token().map(str::to_string),
        })
    }

    async fn discover_instances(
        &self,
        namespace_name: &str,
        service_name: &str,
    ) -> Result<Vec<InstanceSummary>> {
        let output = self
            .client
            .discover_instances()
            .namespace_name(namespace_name)
            .service_name(service_name)
            .send()
            .await
            .map_err(|e| Error::registry("DiscoverInstances", DisplayErrorContext(e)))?;

        Ok(output
            .instances()
            .iter()
            .map(|inst| InstanceSummary {
                instance_id: inst.instance_id().unwrap_or_default().to_string(),
                attributes: inst.attributes().cloned().unwrap_or_default(),
            })
            .collect())
    }
}
