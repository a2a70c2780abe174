use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::models::DealerInfo;
use crate::selectors::VehicleSelectors;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Fixed user agent; rotates through a browser pool when unset
    pub user_agent: Option<String>,
    /// In-flight detail page extractions per dealer
    pub max_concurrency: usize,
    pub pool_max_idle_per_host: usize,
    pub collect_images: bool,
    pub max_images: usize,
    pub selectors: VehicleSelectors,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            user_agent: None,
            max_concurrency: 8,
            pool_max_idle_per_host: 8,
            collect_images: false,
            max_images: 10,
            selectors: VehicleSelectors::default(),
        }
    }
}

impl ScraperConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw).context("Failed to parse scraper config")?;
        if config.max_concurrency == 0 {
            anyhow::bail!("max_concurrency must be at least 1");
        }
        Ok(config)
    }
}

/// One dealer in a harvest plan, with the detail pages the caller wants extracted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealerEntry {
    #[serde(flatten)]
    pub dealer: DealerInfo,
    #[serde(default)]
    pub listings: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarvestPlan {
    #[serde(default)]
    pub dealers: Vec<DealerEntry>,
}

impl HarvestPlan {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read harvest plan {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Invalid harvest plan {}", path.display()))
    }
}
