//! Configuration types for Marquee components.
//!
//! Values are layered: hardcoded defaults, then an optional TOML file
//! (`~/.config/marquee/marquee.toml` or `--config`), then environment
//! variables and CLI flags applied by the binary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::error::AppError;

/// Base URL of the TMDB v3 REST API.
pub const DEFAULT_API_URL: &str = "https://api.themoviedb.org/3";

/// Default directory holding the three collections.
pub const DEFAULT_DATA_DIR: &str = "data";

// =============================================================================
// HTTP
// =============================================================================

/// HTTP client configuration for external API calls.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Values used to seed a checkpoint the first time Discovery runs.
///
/// Once a checkpoint exists on disk its own `pages_per_run` and `max_pages`
/// win; these are only the defaults for a fresh deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// First page to fetch.
    pub start_page: u32,
    /// Number of pages fetched per Discovery invocation.
    pub pages_per_run: u32,
    /// Discovery refuses to run once the cursor reaches this page.
    pub max_pages: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        // The discover endpoint stops serving results after page 500.
        Self {
            start_page: 1,
            pages_per_run: 10,
            max_pages: 500,
        }
    }
}

// =============================================================================
// Detail stages
// =============================================================================

/// What a detail stage does with an id whose fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Append nothing; the id stays pending and is fetched again next cycle.
    #[default]
    Retry,
    /// Append an `{"id": <id>}` placeholder; the id is never fetched again.
    Placeholder,
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Retry => write!(f, "retry"),
            Self::Placeholder => write!(f, "placeholder"),
        }
    }
}

impl FromStr for FailurePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "retry" => Ok(Self::Retry),
            "placeholder" => Ok(Self::Placeholder),
            _ => Err(AppError::ConfigError(format!(
                "Unknown failure policy: '{}'. Valid options: retry, placeholder",
                s
            ))),
        }
    }
}

/// Names of the three collections inside the document store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNames {
    pub checkpoint: String,
    pub movies: String,
    pub credits: String,
}

impl Default for StoreNames {
    fn default() -> Self {
        Self {
            checkpoint: "movies_ids.json".to_string(),
            movies: "movies.json".to_string(),
            credits: "credits.json".to_string(),
        }
    }
}

// =============================================================================
// Harvest
// =============================================================================

/// Harvest run configuration.
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// Number of cycles in a scheduled run.
    pub cycles: u32,
    /// Pause between two consecutive cycles.
    pub pause: Duration,
    /// Checkpoint seed values.
    pub discovery: DiscoveryConfig,
    /// Handling of failed detail fetches.
    pub failure_policy: FailurePolicy,
    /// Save the detail collection after this many appended records.
    /// `None` saves once, at the end of the stage.
    pub flush_every: Option<usize>,
    /// Collection names.
    pub stores: StoreNames,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            cycles: 10,
            pause: Duration::from_secs(5 * 60),
            discovery: DiscoveryConfig::default(),
            failure_policy: FailurePolicy::default(),
            flush_every: Some(50),
            stores: StoreNames::default(),
        }
    }
}

impl HarvestConfig {
    /// Sets the number of scheduled cycles.
    pub fn with_cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    /// Sets the pause between cycles.
    pub fn with_pause(mut self, pause: Duration) -> Self {
        self.pause = pause;
        self
    }

    /// Sets the failure policy used by both detail stages.
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Sets the flush interval. Zero is treated as "save once at the end".
    pub fn with_flush_every(mut self, every: Option<usize>) -> Self {
        self.flush_every = every.filter(|n| *n > 0);
        self
    }

    /// Sets the checkpoint seed values.
    pub fn with_discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.discovery = discovery;
        self
    }
}

// =============================================================================
// Configuration file (marquee.toml)
// =============================================================================

/// Contents of `marquee.toml`. Every field is optional and overrides the
/// built-in default when present.
///
/// # Example
///
/// ```toml
/// api_url = "https://api.themoviedb.org/3"
/// data_dir = "/var/lib/marquee"
/// cycles = 10
/// pause_secs = 300
/// pages_per_run = 10
/// max_pages = 500
/// failure_policy = "retry"
/// flush_every = 50
/// timeout_secs = 30
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub api_url: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub cycles: Option<u32>,
    pub pause_secs: Option<u64>,
    pub pages_per_run: Option<u32>,
    pub max_pages: Option<u32>,
    pub failure_policy: Option<FailurePolicy>,
    pub flush_every: Option<usize>,
    pub timeout_secs: Option<u64>,
}

impl FileConfig {
    /// Overlays the file values on top of `base`.
    pub fn apply(&self, mut base: HarvestConfig) -> HarvestConfig {
        if let Some(cycles) = self.cycles {
            base.cycles = cycles;
        }
        if let Some(secs) = self.pause_secs {
            base.pause = Duration::from_secs(secs);
        }
        if let Some(pages) = self.pages_per_run {
            base.discovery.pages_per_run = pages;
        }
        if let Some(max) = self.max_pages {
            base.discovery.max_pages = max;
        }
        if let Some(policy) = self.failure_policy {
            base.failure_policy = policy;
        }
        if let Some(every) = self.flush_every {
            base = base.with_flush_every(Some(every));
        }
        base
    }

    /// HTTP settings derived from the file.
    pub fn http_config(&self) -> HttpConfig {
        let mut http = HttpConfig::default();
        if let Some(secs) = self.timeout_secs {
            http.timeout = Duration::from_secs(secs);
        }
        http
    }
}

/// Default configuration file name.
pub const CONFIG_FILE_NAME: &str = "marquee.toml";

/// Returns the default configuration directory path: `~/.config/marquee/`.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("marquee"))
}

/// Returns the default configuration file path: `~/.config/marquee/marquee.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join(CONFIG_FILE_NAME))
}

/// Load the configuration file.
///
/// # Returns
/// * `Ok(Some(config))` - file found and parsed
/// * `Ok(None)` - no file at the default location (defaults apply)
/// * `Err(e)` - a custom path that does not exist, or an invalid file
pub fn load_file_config(path: Option<PathBuf>) -> Result<Option<FileConfig>, AppError> {
    let using_default_path = path.is_none();
    let config_path = match path {
        Some(p) => p,
        None => match default_config_path() {
            Some(p) => p,
            None => return Ok(None),
        },
    };

    if !config_path.exists() {
        if using_default_path {
            tracing::debug!(path = %config_path.display(), "No config file, using defaults");
            return Ok(None);
        }
        return Err(AppError::ConfigError(format!(
            "Config file not found: {}",
            config_path.display()
        )));
    }

    read_file_config(&config_path).map(Some)
}

fn read_file_config(path: &Path) -> Result<FileConfig, AppError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    toml::from_str(&content).map_err(|e| {
        AppError::ConfigError(format!("Invalid TOML in '{}': {}", path.display(), e))
    })
}
