//! Configuration loading and management

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Character limits applied to listing text fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingLimits {
    /// Maximum title length in characters
    pub title_max_len: usize,

    /// Maximum description length in characters
    pub description_max_len: usize,
}

impl Default for ListingLimits {
    fn default() -> Self {
        Self {
            title_max_len: 100,
            description_max_len: 500,
        }
    }
}

/// Complete configuration for a marketplace client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Name of the document collection holding listings
    pub collection: String,

    /// Number of listings fetched per page
    pub page_size: usize,

    /// Search scans larger than this many records log a warning
    pub search_scan_warn_threshold: usize,

    /// Text field limits
    #[serde(flatten)]
    pub limits: ListingLimits,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            collection: "listings".to_string(),
            // 3x3 grid
            page_size: 9,
            search_scan_warn_threshold: 500,
            limits: ListingLimits::default(),
        }
    }
}

impl MarketplaceConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Load configuration from a YAML string
    ///
    /// Missing keys fall back to their defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Page size, ensuring it stays within 1..=100
    pub fn page_size(&self) -> usize {
        self.page_size.clamp(1, 100)
    }
}
