//! In-memory registry snapshot
//!
//! Serves a fixed namespace/service/instance tree through the [`Registry`]
//! trait with real page-token pagination. Each level can be marked as
//! failing so partial-failure handling can be exercised without a live
//! registry. The snapshot can be replaced between refresh cycles.

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{InstanceSummary, NamespaceSummary, Page, Registry, ServiceSummary};
use crate::error::{Error, Result};

const DEFAULT_PAGE_SIZE: usize = 100;

/// A service and the instances it currently reports
#[derive(Clone, Debug, Default)]
pub struct ServiceRecord {
    pub name: String,
    pub instances: Vec<InstanceSummary>,
    /// Instance discovery for this service returns an error
    pub fail_discovery: bool,
}

impl ServiceRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_instance(mut self, instance: InstanceSummary) -> Self {
        self.instances.push(instance);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_discovery = true;
        self
    }
}

/// A namespace and its services
#[derive(Clone, Debug)]
pub struct NamespaceRecord {
    pub summary: NamespaceSummary,
    pub services: Vec<ServiceRecord>,
    /// Service listing for this namespace returns an error
    pub fail_listing: bool,
    /// Service listing fails once this many pages have been served
    pub fail_listing_after_pages: Option<usize>,
}

impl NamespaceRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            summary: NamespaceSummary {
                id: id.into(),
                name: name.into(),
            },
            services: Vec::new(),
            fail_listing: false,
            fail_listing_after_pages: None,
        }
    }

    pub fn with_service(mut self, service: ServiceRecord) -> Self {
        self.services.push(service);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Serve `pages` pages of services, then fail the listing
    pub fn failing_after_pages(mut self, pages: usize) -> Self {
        self.fail_listing_after_pages = Some(pages);
        self
    }
}

/// Complete registry contents at one point in time
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub namespaces: Vec<NamespaceRecord>,
    /// Namespace enumeration itself returns an error
    pub fail_namespace_listing: bool,
    /// Namespace enumeration fails once this many pages have been served
    pub fail_namespace_listing_after_pages: Option<usize>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, namespace: NamespaceRecord) -> Self {
        self.namespaces.push(namespace);
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail_namespace_listing = true;
        self
    }

    /// Serve `pages` pages of namespaces, then fail the enumeration
    pub fn failing_after_pages(mut self, pages: usize) -> Self {
        self.fail_namespace_listing_after_pages = Some(pages);
        self
    }
}

/// Registry backed by an in-memory [`Snapshot`]
pub struct StaticRegistry {
    snapshot: RwLock<Snapshot>,
    page_size: usize,
}

impl StaticRegistry {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Serve listings in pages of at most `page_size` entries
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Replace the registry contents seen by subsequent calls
    pub async fn replace(&self, snapshot: Snapshot) {
        *self.snapshot.write().await = snapshot;
    }

    fn page_of<T: Clone>(
        &self,
        operation: &'static str,
        items: &[T],
        page_token: Option<String>,
        fail_after_pages: Option<usize>,
    ) -> Result<Page<T>> {
        let start = match page_token {
            None => 0,
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| Error::registry(operation, format!("invalid page token {:?}", token)))?,
        };
        if let Some(limit) = fail_after_pages {
            let page_index = start / self.page_size;
            if page_index >= limit {
                return Err(Error::registry(
                    operation,
                    format!("listing unavailable after {} pages", limit),
                ));
            }
        }
        let end = items.len().min(start.saturating_add(self.page_size));
        let page = items.get(start..end).unwrap_or_default().to_vec();
        let next_token = (end < items.len()).then(|| end.to_string());
        Ok(Page {
            items: page,
            next_token,
        })
    }
}

#[async_trait]
impl Registry for StaticRegistry {
    async fn list_namespaces(&self, page_token: Option<String>) -> Result<Page<NamespaceSummary>> {
        let snapshot = self.snapshot.read().await;
        if snapshot.fail_namespace_listing {
            return Err(Error::registry("ListNamespaces", "namespace listing unavailable"));
        }
        let summaries: Vec<NamespaceSummary> = snapshot
            .namespaces
            .iter()
            .map(|ns| ns.summary.clone())
            .collect();
        self.page_of(
            "ListNamespaces",
            &summaries,
            page_token,
            snapshot.fail_namespace_listing_after_pages,
        )
    }

    async fn list_services(
        &self,
        namespace_id: &str,
        page_token: Option<String>,
    ) -> Result<Page<ServiceSummary>> {
        let snapshot = self.snapshot.read().await;
        let Some(namespace) = snapshot
            .namespaces
            .iter()
            .find(|ns| ns.summary.id == namespace_id)
        else {
            return Ok(Page::last(Vec::new()));
        };
        if namespace.fail_listing {
            return Err(Error::registry(
                "ListServices",
                format!("service listing unavailable for {}", namespace.summary.name),
            ));
        }
        let services: Vec<ServiceSummary> = namespace
            .services
            .iter()
            .map(|s| ServiceSummary {
                name: s.name.clone(),
            })
            .collect();
        self.page_of(
            "ListServices",
            &services,
            page_token,
            namespace.fail_listing_after_pages,
        )
    }

    async fn discover_instances(
        &self,
        namespace_name: &str,
        service_name: &str,
    ) -> Result<Vec<InstanceSummary>> {
        let snapshot = self.snapshot.read().await;
        let service = snapshot
            .namespaces
            .iter()
            .filter(|ns| ns.summary.name == namespace_name)
            .flat_map(|ns| ns.services.iter())
            .find(|s| s.name == service_name)
            .ok_or_else(|| {
                Error::registry(
                    "DiscoverInstances",
                    format!("service {}/{} not found", namespace_name, service_name),
                )
            })?;
        if service.fail_discovery {
            return Err(Error::registry(
                "DiscoverInstances",
                format!("discovery unavailable for {}/{}", namespace_name, service_name),
            ));
        }
        Ok(service.instances.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{StreamExt, TryStreamExt};

    use crate::registry::paginate;

    fn snapshot_with(count: usize) -> Snapshot {
        (0..count).fold(Snapshot::new(), |snap, i| {
            snap.with_namespace(NamespaceRecord::new(format!("ns-{}", i), format!("name-{}", i)))
        })
    }

    fn registry_with(count: usize) -> StaticRegistry {
        StaticRegistry::new(snapshot_with(count)).with_page_size(2)
    }

    #[tokio::test]
    async fn test_namespace_pages_respect_page_size() {
        let registry = registry_with(5);
        let first = registry.list_namespaces(None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_token.as_deref(), Some("2"));

        let pages: Vec<Vec<NamespaceSummary>> =
            paginate(|token| registry.list_namespaces(token)).try_collect().await.unwrap();
        assert_eq!(pages.iter().map(Vec::len).collect::<Vec<_>>(), vec![2, 2, 1]);
    }

    #[tokio::test]
    async fn test_invalid_token_is_an_error() {
        let registry = registry_with(1);
        let err = registry.list_namespaces(Some("x".into())).await.unwrap_err();
        assert!(matches!(err, Error::RegistryError { operation: "ListNamespaces", .. }));
    }

    #[tokio::test]
    async fn test_failure_flags() {
        let snapshot = Snapshot::new().with_namespace(
            NamespaceRecord::new("ns-1", "ns1")
                .with_service(ServiceRecord::new("svc1").failing()),
        );
        let registry = StaticRegistry::new(snapshot.clone());
        assert!(registry.discover_instances("ns1", "svc1").await.is_err());
        assert!(registry.list_services("ns-1", None).await.is_ok());

        registry.replace(snapshot.failing()).await;
        assert!(registry.list_namespaces(None).await.is_err());
    }

    #[tokio::test]
    async fn test_failure_after_pages_serves_earlier_pages() {
        let registry =
            StaticRegistry::new(snapshot_with(3).failing_after_pages(1)).with_page_size(1);

        let first = registry.list_namespaces(None).await.unwrap();
        assert_eq!(first.items.len(), 1);
        let err = registry.list_namespaces(first.next_token).await.unwrap_err();
        assert!(matches!(err, Error::RegistryError { operation: "ListNamespaces", .. }));

        let pages: Vec<Result<Vec<NamespaceSummary>>> =
            paginate(|token| registry.list_namespaces(token)).collect().await;
        assert_eq!(pages.len(), 2);
        assert!(pages[0].is_ok());
        assert!(pages[1].is_err());
    }
}
