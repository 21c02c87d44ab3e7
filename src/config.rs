//! Engine configuration.
//!
//! Groups the policy knobs of the filter and patch engines together with the
//! pagination and location settings used by the standard provider. All fields
//! have sensible defaults, so `EngineConfig::default()` is a working setup.
//!
//! ```rust
//! use scim_engine::config::EngineConfig;
//!
//! let config = EngineConfig::default()
//!     .with_base_url("https://scim.example.com/v2")
//!     .with_strict_remove(false);
//! assert!(!config.patch.strict_remove);
//! ```

use crate::error::{BuildError, BuildResult};
use serde::{Deserialize, Serialize};

/// Top-level configuration shared by the engines and the standard provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Base URL used to build `meta.location` (e.g. "https://scim.example.com/v2")
    pub base_url: String,
    pub filter: FilterConfig,
    pub patch: PatchConfig,
    pub pagination: PaginationConfig,
}

/// Filter parser limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FilterConfig {
    /// Maximum nesting of parentheses, `not` and value-path brackets.
    pub max_depth: usize,
}

/// Patch engine policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatchConfig {
    /// When true, a `remove` whose path selects nothing fails with `NoSuchTarget`.
    /// When false, such a removal is a no-op.
    pub strict_remove: bool,
}

/// List paging defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaginationConfig {
    /// Page size used when a search request has no `count`
    pub default_count: usize,
    /// Upper bound applied to any requested `count`
    pub max_count: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost/v2".to_string(),
            filter: FilterConfig::default(),
            patch: PatchConfig::default(),
            pagination: PaginationConfig::default(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { max_depth: 32 }
    }
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            strict_remove: true,
        }
    }
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_count: 100,
            max_count: 1000,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON document. Missing fields take their defaults.
    pub fn from_json_str(content: &str) -> BuildResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the base URL used for resource locations.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Choose strict or lenient handling of removals that match nothing.
    pub fn with_strict_remove(mut self, strict: bool) -> Self {
        self.patch.strict_remove = strict;
        self
    }

    /// Set the maximum filter nesting depth.
    pub fn with_max_filter_depth(mut self, depth: usize) -> Self {
        self.filter.max_depth = depth;
        self
    }

    /// Set the default and maximum page sizes.
    pub fn with_pagination(mut self, default_count: usize, max_count: usize) -> Self {
        self.pagination = PaginationConfig {
            default_count,
            max_count,
        };
        self
    }

    /// Check internal consistency of the configuration.
    pub fn validate(&self) -> BuildResult<()> {
        if self.filter.max_depth == 0 {
            return Err(BuildError::InvalidConfiguration {
                message: "filter.maxDepth must be at least 1".to_string(),
            });
        }
        if self.pagination.default_count > self.pagination.max_count {
            return Err(BuildError::InvalidConfiguration {
                message: "pagination.defaultCount cannot exceed pagination.maxCount".to_string(),
            });
        }
        Ok(())
    }
}
