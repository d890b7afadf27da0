//! Source list and fetch settings.
//!
//! The source list is fixed for the lifetime of the process. It comes from an
//! optional YAML file; without one, the built-in list of AI news feeds is used.
//!
//! ```yaml
//! sources:
//!   - name: Hugging Face Blog
//!     endpoint: https://huggingface.co/blog/feed.xml
//! proxy_prefix: https://r.jina.ai/
//! timeout_secs: 20
//! max_retries: 1
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, instrument};
use url::Url;

use crate::error::ConfigError;
use crate::models::Source;

pub const DEFAULT_TIMEOUT_SECS: u64 = 20;
pub const DEFAULT_USER_AGENT: &str = concat!("feed_snapshots/", env!("CARGO_PKG_VERSION"));

const DEFAULT_SOURCES: &[(&str, &str)] = &[
    ("OpenAI Blog", "https://openai.com/blog/rss.xml"),
    ("Google DeepMind", "https://deepmind.google/blog/rss.xml"),
    ("Anthropic", "https://www.anthropic.com/news/rss.xml"),
    (
        "MIT Technology Review - AI",
        "https://www.technologyreview.com/topic/artificial-intelligence/feed",
    ),
    ("VentureBeat AI", "https://venturebeat.com/category/ai/feed/"),
    ("Synced Review", "https://syncedreview.com/feed/"),
    ("Hugging Face Blog", "https://huggingface.co/blog/feed.xml"),
    (
        "The Verge - AI",
        "https://www.theverge.com/ai-artificial-intelligence/rss/index.xml",
    ),
    ("NVIDIA Blog - AI", "https://blogs.nvidia.com/blog/category/ai/feed/"),
];

/// YAML shape of the config file. Every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    sources: Option<Vec<Source>>,
    proxy_prefix: Option<String>,
    timeout_secs: Option<u64>,
    max_retries: Option<usize>,
    user_agent: Option<String>,
}

/// Validated runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedConfig {
    pub sources: Vec<Source>,
    pub proxy_prefix: Option<String>,
    /// Upper bound on one source's fetch, retries included.
    pub fetch_timeout: Duration,
    pub max_retries: usize,
    pub user_agent: String,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            proxy_prefix: None,
            fetch_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 0,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

pub fn default_sources() -> Vec<Source> {
    DEFAULT_SOURCES
        .iter()
        .map(|(name, endpoint)| Source::new(*name, *endpoint))
        .collect()
}

impl FeedConfig {
    /// Parse and validate a YAML config document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] on invalid YAML, an empty or duplicate source
    /// name, an unparseable endpoint, or a zero timeout.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = serde_yaml::from_str(yaml)?;
        let defaults = Self::default();
        let config = Self {
            sources: raw.sources.unwrap_or(defaults.sources),
            proxy_prefix: raw.proxy_prefix.filter(|p| !p.trim().is_empty()),
            fetch_timeout: raw
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.fetch_timeout),
            max_retries: raw.max_retries.unwrap_or(defaults.max_retries),
            user_agent: raw.user_agent.unwrap_or(defaults.user_agent),
        };
        config.validate()?;
        Ok(config)
    }

    /// Load from `path`, or fall back to defaults when no path is given.
    #[instrument(level = "info")]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No config file given; using built-in sources");
            return Ok(Self::default());
        };
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: PathBuf::from(path),
            source,
        })?;
        let config = Self::from_yaml(&yaml)?;
        info!(sources = config.sources.len(), "Loaded feed config");
        Ok(config)
    }

    /// Apply command-line overrides on top of the loaded file values.
    pub fn with_overrides(
        mut self,
        timeout_secs: Option<u64>,
        max_retries: Option<usize>,
        proxy_prefix: Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(secs) = timeout_secs {
            self.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = max_retries {
            self.max_retries = retries;
        }
        if let Some(prefix) = proxy_prefix.filter(|p| !p.trim().is_empty()) {
            self.proxy_prefix = Some(prefix);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        let mut seen = std::collections::HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(ConfigError::Invalid("source name must not be empty".into()));
            }
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate source name: {}",
                    source.name
                )));
            }
            Url::parse(&source.endpoint).map_err(|e| ConfigError::Endpoint {
                name: source.name.clone(),
                source: e,
            })?;
        }
        Ok(())
    }
}
