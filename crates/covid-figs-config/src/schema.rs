//! Configuration schema definitions using serde.

use covid_figs_common::{file_slug, parse_timezone, Feed, LoggingConfig, RepositoryConfig, Result};
use serde::{Deserialize, Serialize};

/// Main configuration structure for a covid-figs run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Upstream data repository.
    pub source: SourceConfig,
    /// Object storage destination.
    pub storage: StorageConfig,
    /// Geographic areas to render, in render order.
    pub areas: Vec<AreaConfig>,
    /// Chart sizing and smoothing parameters.
    pub charts: ChartsConfig,
    /// Local output options.
    pub output: OutputConfig,
    /// Log sink configuration.
    pub logging: LoggingConfig,
}

/// Upstream data repository configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Repository identifier, `owner/name`.
    pub repo: String,
    /// Base URL of the commits API.
    pub api_base_url: String,
    /// Base URL of the raw content host.
    pub raw_base_url: String,
    /// Branch CSV files are read from.
    pub branch: String,
    /// Path of the regional feed inside the repository.
    pub regional_path: String,
    /// Path of the national feed inside the repository.
    pub national_path: String,
    /// IANA zone used to display the last-modified time.
    pub timezone: String,
    /// User agent sent to the upstream hosts.
    pub user_agent: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
    /// Columns parsed as dates.
    pub date_columns: Vec<String>,
    /// Date column used as the row index.
    pub index_column: String,
}

impl SourceConfig {
    /// Repository path of the CSV behind `feed`.
    pub fn path_for(&self, feed: Feed) -> &str {
        match feed {
            Feed::Regional => &self.regional_path,
            Feed::National => &self.national_path,
        }
    }

    /// Client configuration for the repository hosts.
    pub fn repository_config(&self) -> Result<RepositoryConfig> {
        Ok(RepositoryConfig {
            repo: self.repo.clone(),
            api_base_url: self.api_base_url.clone(),
            raw_base_url: self.raw_base_url.clone(),
            branch: self.branch.clone(),
            user_agent: self.user_agent.clone(),
            timeout_secs: self.timeout_seconds,
            timezone: parse_timezone(&self.timezone)?,
        })
    }
}

/// Object storage destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Destination bucket.
    pub bucket_name: String,
    /// Key prefix prepended to every uploaded file.
    pub prefix: String,
    /// Bucket region; the ambient AWS configuration is used when unset.
    pub region: Option<String>,
    /// Whether uploads are readable by anyone.
    pub public_read: bool,
}

/// One rendered geographic area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaConfig {
    /// Display name used in titles and file names.
    pub name: String,
    /// Feed the area's rows come from.
    pub feed: Feed,
    /// Value of `denominazione_regione` selecting the area in the regional feed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl AreaConfig {
    /// An area backed by one region of the regional feed.
    pub fn regional(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            region: Some(name.clone()),
            name,
            feed: Feed::Regional,
        }
    }

    /// An area backed by the national feed.
    pub fn national(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feed: Feed::National,
            region: None,
        }
    }

    /// File-name stem and report key of the area.
    pub fn slug(&self) -> String {
        file_slug(&self.name)
    }
}

/// Chart sizing and growth-factor smoothing parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// Width in pixels of a standalone chart.
    pub figure_width: u32,
    /// Height in pixels of a standalone chart.
    pub figure_height: u32,
    /// Width in pixels of the overview grid.
    pub overview_width: u32,
    /// Height in pixels of the overview grid.
    pub overview_height: u32,
    /// Days between the two differences of the growth ratio.
    pub lookback: usize,
    /// Trailing window of the simple moving average.
    pub window: usize,
    /// Span of the exponential moving average.
    pub span: usize,
    /// Fixed y range of the overview growth charts.
    pub growth_y_limit: Option<[f64; 2]>,
}

/// Local output options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Also write CSV snapshots next to every saved chart.
    pub save_csv: bool,
    /// Also render the standalone chart of every overview panel.
    pub save_figures: bool,
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<()> {
        crate::validator::ConfigValidator::validate(self)
    }

    /// Feeds used by at least one area, in fetch order.
    pub fn feeds(&self) -> Vec<Feed> {
        Feed::ALL
            .into_iter()
            .filter(|feed| self.areas.iter().any(|a| a.feed == *feed))
            .collect()
    }
}
