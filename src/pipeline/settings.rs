use crate::models::Catalog;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for resolving, fanning out and committing tracks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub resolver: ResolverSettings,
    pub fan_out: FanOutSettings,
    pub commit: CommitSettings,
}

/// How a single song reference is matched against search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverSettings {
    pub exact_limit: usize, // Results requested by the field-scoped query
    pub broad_limit: usize, // Results requested by the unscoped query
    pub title_weight: f64,
    pub artist_weight: f64,
    pub acceptance_threshold: f64, // Best score must be strictly above this
    #[serde(default)]
    pub title_only_fallback: bool, // Retry with just the title when the broad query finds nothing
}

/// Bounded concurrency for resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FanOutSettings {
    pub workers: usize,
    pub group_size: Option<usize>, // None dispatches everything as one group
    #[serde(default)]
    pub group_pause_ms: u64,
}

/// Chunking and retry policy for playlist writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommitSettings {
    pub chunk_size: usize,
    pub max_attempts: u32,      // Total attempts per chunk, first try included
    pub default_wait_secs: u64, // Used when the server sends no Retry-After
    pub backoff_multiplier: u32,
}

impl FanOutSettings {
    pub fn group_pause(&self) -> Duration {
        Duration::from_millis(self.group_pause_ms)
    }
}

impl CommitSettings {
    pub fn default_wait(&self) -> Duration {
        Duration::from_secs(self.default_wait_secs)
    }
}

impl PipelineSettings {
    /// Reference settings for each catalog
    pub fn for_catalog(catalog: Catalog) -> Self {
        match catalog {
            Catalog::Spotify => PipelineSettings {
                resolver: ResolverSettings {
                    exact_limit: 1,
                    broad_limit: 10,
                    title_weight: 0.6,
                    artist_weight: 0.4,
                    acceptance_threshold: 0.5,
                    title_only_fallback: false,
                },
                fan_out: FanOutSettings {
                    workers: 5,
                    group_size: None,
                    group_pause_ms: 0,
                },
                commit: CommitSettings {
                    chunk_size: 100,
                    max_attempts: 3,
                    default_wait_secs: 5,
                    backoff_multiplier: 2,
                },
            },
            Catalog::YouTubeMusic => PipelineSettings {
                resolver: ResolverSettings {
                    exact_limit: 1,
                    broad_limit: 5,
                    title_weight: 0.6,
                    artist_weight: 0.4,
                    acceptance_threshold: 0.6,
                    title_only_fallback: true,
                },
                fan_out: FanOutSettings {
                    workers: 5,
                    group_size: Some(10),
                    group_pause_ms: 1000,
                },
                commit: CommitSettings {
                    chunk_size: 50,
                    max_attempts: 3,
                    default_wait_secs: 5,
                    backoff_multiplier: 2,
                },
            },
        }
    }

    /// Load settings from a JSON file and check them against the catalog's limits
    pub fn load_from_file(path: &str, catalog: Catalog) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: PipelineSettings = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse settings '{}': {}", path, e))?;
        settings.validate(catalog)?;
        Ok(settings)
    }

    pub fn validate(&self, catalog: Catalog) -> Result<()> {
        let r = &self.resolver;
        if r.title_weight <= r.artist_weight {
            anyhow::bail!(
                "title_weight ({}) must be greater than artist_weight ({})",
                r.title_weight,
                r.artist_weight
            );
        }
        if r.title_weight < 0.0 || r.artist_weight < 0.0 {
            anyhow::bail!("match weights must not be negative");
        }
        if ((r.title_weight + r.artist_weight) - 1.0).abs() > 1e-6 {
            anyhow::bail!("title_weight and artist_weight must sum to 1.0");
        }
        if !(0.0..=1.0).contains(&r.acceptance_threshold) {
            anyhow::bail!("acceptance_threshold must be within 0.0..=1.0");
        }
        if r.exact_limit == 0 || r.broad_limit == 0 {
            anyhow::bail!("search limits must be at least 1");
        }
        if self.fan_out.workers == 0 {
            anyhow::bail!("fan_out.workers must be at least 1");
        }
        if self.fan_out.group_size == Some(0) {
            anyhow::bail!("fan_out.group_size must be at least 1 when set");
        }

        let c = &self.commit;
        let max_chunk = catalog.max_items_per_add();
        if c.chunk_size == 0 || c.chunk_size > max_chunk {
            anyhow::bail!(
                "commit.chunk_size must be between 1 and {} for {}",
                max_chunk,
                catalog
            );
        }
        if c.max_attempts == 0 {
            anyhow::bail!("commit.max_attempts must be at least 1");
        }
        if c.backoff_multiplier == 0 {
            anyhow::bail!("commit.backoff_multiplier must be at least 1");
        }
        Ok(())
    }
}
