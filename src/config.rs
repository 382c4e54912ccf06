//! Discovery configuration

use std::time::Duration;

use crate::error::{Error, Result};

/// Default time between refresh cycles, as for the `--target.refresh` flag
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Construction parameters for a discovery run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveryConfig {
    /// AWS region of the Cloud Map registry. `None` defers to the SDK provider chain.
    pub region: Option<String>,
    /// Time between the start of two refresh cycles
    pub refresh_interval: Duration,
    /// Only namespaces with exactly this name are walked
    pub namespace: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            region: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            namespace: None,
        }
    }
}

impl DiscoveryConfig {
    /// Build a config from the raw command line values
    pub fn from_args(
        region: Option<String>,
        refresh_secs: u64,
        namespace: Option<String>,
    ) -> Result<Self> {
        let config = Self {
            region: region.filter(|r| !r.is_empty()),
            refresh_interval: Duration::from_secs(refresh_secs),
            namespace,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval.is_zero() {
            return Err(Error::ConfigError(
                "refresh interval must be greater than zero".to_string(),
            ));
        }
        if matches!(self.namespace.as_deref(), Some("")) {
            return Err(Error::ConfigError(
                "namespace filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
