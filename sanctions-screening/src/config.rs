//! Configuration for sanctions screening

use crate::document::DocumentFormat;
use crate::error::{Error, Result};
use crate::similarity::{SimilarityScorer, DEFAULT_MATCH_THRESHOLD};
use crate::source::{FileSource, HttpSource, WatchlistSource};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Screening configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Name matching
    #[serde(default)]
    pub matching: MatchingConfig,

    /// Watchlist source and loading policy
    #[serde(default)]
    pub watchlist: WatchlistConfig,
}

/// Name matching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum score for a word-pair to count and for a name to match
    pub threshold: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_MATCH_THRESHOLD,
        }
    }
}

impl MatchingConfig {
    pub fn scorer(&self) -> SimilarityScorer {
        SimilarityScorer::new(self.threshold)
    }
}

/// Watchlist configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchlistConfig {
    /// Local document path
    pub path: Option<PathBuf>,

    /// Download URL, used when no path is set
    pub url: Option<String>,

    /// Document format; inferred from the path when unset
    pub format: Option<DocumentFormat>,

    /// Download timeout (seconds)
    pub fetch_timeout_secs: u64,

    /// Treat a document without usable entries as a load error
    pub reject_empty: bool,

    /// Periodic reload interval (seconds)
    pub refresh_interval_secs: Option<u64>,
}

impl Default for WatchlistConfig {
    fn default() -> Self {
        Self {
            path: None,
            url: None,
            format: None,
            fetch_timeout_secs: 10,
            reject_empty: false,
            refresh_interval_secs: None,
        }
    }
}

impl WatchlistConfig {
    /// The configured source, or `None` when neither path nor url is set
    pub fn source(&self) -> Result<Option<Arc<dyn WatchlistSource>>> {
        if let Some(path) = &self.path {
            let mut source = FileSource::new(path);
            if let Some(format) = self.format {
                source = source.with_format(format);
            }
            return Ok(Some(Arc::new(source)));
        }

        if let Some(url) = &self.url {
            let source = HttpSource::new(
                url.clone(),
                self.format.unwrap_or_default(),
                Duration::from_secs(self.fetch_timeout_secs),
            )?;
            return Ok(Some(Arc::new(source)));
        }

        Ok(None)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs.map(Duration::from_secs)
    }
}

impl Config {
    /// Load from a TOML file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(threshold) = std::env::var("SCREENING_MATCH_THRESHOLD") {
            config.matching.threshold = threshold
                .parse()
                .map_err(|e| Error::Config(format!("Invalid SCREENING_MATCH_THRESHOLD: {}", e)))?;
        }

        if let Ok(path) = std::env::var("SCREENING_WATCHLIST_PATH") {
            config.watchlist.path = Some(PathBuf::from(path));
        }

        if let Ok(url) = std::env::var("SCREENING_WATCHLIST_URL") {
            config.watchlist.url = Some(url);
        }

        if let Ok(format) = std::env::var("SCREENING_WATCHLIST_FORMAT") {
            config.watchlist.format = Some(match format.to_lowercase().as_str() {
                "xml" => DocumentFormat::Xml,
                "json" => DocumentFormat::Json,
                other => {
                    return Err(Error::Config(format!("Unknown watchlist format: {}", other)))
                }
            });
        }

        if let Ok(flag) = std::env::var("SCREENING_REJECT_EMPTY") {
            config.watchlist.reject_empty = matches!(flag.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(secs) = std::env::var("SCREENING_REFRESH_INTERVAL_SECS") {
            config.watchlist.refresh_interval_secs = Some(
                secs.parse()
                    .map_err(|e| Error::Config(format!("Invalid SCREENING_REFRESH_INTERVAL_SECS: {}", e)))?,
            );
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let threshold = self.matching.threshold;
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(Error::Config(format!(
                "Match threshold must be in (0, 1], got {}",
                threshold
            )));
        }

        if self.watchlist.refresh_interval_secs == Some(0) {
            return Err(Error::Config("Refresh interval must be positive".to_string()));
        }

        Ok(())
    }
}
