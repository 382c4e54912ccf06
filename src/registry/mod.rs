//! Service registry boundary
//!
//! The registry is a three level hierarchy: namespaces contain services,
//! services contain live instances. Listing calls are paginated; use
//! [`paginate`] to consume them as a stream of pages.

#[cfg(feature = "cloudmap")]
pub mod cloudmap;
pub mod memory;
mod paginate;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

pub use paginate::{paginate, Page};

#[cfg(feature = "cloudmap")]
pub use cloudmap::CloudMapRegistry;
pub use memory::StaticRegistry;

/// Instance attribute holding the IPv4 address
pub const ATTR_INSTANCE_IPV4: &str = "AWS_INSTANCE_IPV4";
/// Instance attribute holding the IPv6 address
pub const ATTR_INSTANCE_IPV6: &str = "AWS_INSTANCE_IPV6";
/// Instance attribute holding the port
pub const ATTR_INSTANCE_PORT: &str = "AWS_INSTANCE_PORT";

/// Summary of a registry namespace
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NamespaceSummary {
    pub id: String,
    pub name: String,
}

/// Summary of a service inside a namespace
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceSummary {
    pub name: String,
}

/// A live instance of a service with its free-form attributes
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InstanceSummary {
    pub instance_id: String,
    pub attributes: HashMap<String, String>,
}

impl InstanceSummary {
    pub fn new(instance_id: impl Into<String>) -> Self {
        Self {
            instance_id: instance_id.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Attribute value, treating an empty string as absent
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Query surface of a hierarchical service registry
#[async_trait]
pub trait Registry: Send + Sync {
    /// List one page of namespaces
    async fn list_namespaces(&self, page_token: Option<String>) -> Result<Page<NamespaceSummary>>;

    /// List one page of services belonging to the namespace with `namespace_id`
    async fn list_services(
        &self,
        namespace_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<ServiceSummary>>;

    /// Discover the live instances of a service
    async fn discover_instances(
        &self,
        namespace_name: &str,
        service_name: &str,
    ) -> Result<Vec<InstanceSummary>>;
}
