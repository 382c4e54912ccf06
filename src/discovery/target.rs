//! Source identities and target groups

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

/// Group label carrying the namespace name
pub const LABEL_NAMESPACE_NAME: &str = "__meta_cloudmap_namespace_name";
/// Group label carrying the service name
pub const LABEL_SERVICE_NAME: &str = "__meta_cloudmap_service_name";
/// Per-target label carrying the scrape address
pub const ADDRESS_LABEL: &str = "__address__";

/// Label name to value mapping
pub type LabelSet = BTreeMap<String, String>;

/// Identity of a discoverable source: one service inside one namespace
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceSpec {
    pub namespace: String,
    pub service: String,
}

impl SourceSpec {
    pub fn new(namespace: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            service: service.into(),
        }
    }
}

impl fmt::Display for SourceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.service)
    }
}

/// Current state of one source as handed to the output sink.
///
/// A group with a source string and no targets tells the sink to drop
/// that source.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TargetGroup {
    pub source: String,
    pub labels: LabelSet,
    pub targets: Vec<LabelSet>,
}

impl TargetGroup {
    /// Empty group for `spec` carrying the namespace and service labels
    pub fn for_source(spec: &SourceSpec) -> Self {
        let mut labels = LabelSet::new();
        labels.insert(LABEL_NAMESPACE_NAME.to_string(), spec.namespace.clone());
        labels.insert(LABEL_SERVICE_NAME.to_string(), spec.service.clone());
        Self {
            source: spec.to_string(),
            labels,
            targets: Vec::new(),
        }
    }

    /// Removal signal for a source that is gone from the registry
    pub fn deletion(spec: &SourceSpec) -> Self {
        Self {
            source: spec.to_string(),
            ..Default::default()
        }
    }

    /// Append a target reachable at `address`
    pub fn push_address(&mut self, address: impl Into<String>) {
        let mut target = LabelSet::new();
        target.insert(ADDRESS_LABEL.to_string(), address.into());
        self.targets.push(target);
    }

    /// Scrape addresses of all targets, in target order
    pub fn addresses(&self) -> impl Iterator<Item = &str> {
        self.targets
            .iter()
            .filter_map(|t| t.get(ADDRESS_LABEL).map(String::as_str))
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}
