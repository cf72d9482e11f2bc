use serde::Deserialize;

/// Main configuration structure for GreenScan
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub browser: BrowserConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub estimation: EstimationConfig,
    pub narrative: NarrativeConfig,
    pub output: OutputConfig,
}

/// Which page fetch strategy the crawler uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategyKind {
    /// Plain HTTP requests, no rendering
    Http,
    /// Full rendering through a WebDriver-controlled browser
    Browser,
    /// Browser when a WebDriver endpoint is configured and reachable, HTTP otherwise
    #[default]
    Auto,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched per scan
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Maximum link depth followed from the start URL
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Fetch strategy selection
    #[serde(rename = "fetch-strategy")]
    pub fetch_strategy: FetchStrategyKind,

    /// Per-page timeout for the HTTP strategy (seconds)
    #[serde(rename = "http-timeout-secs")]
    pub http_timeout_secs: u64,

    /// Per-page timeout for the browser strategy (seconds)
    #[serde(rename = "browser-timeout-secs")]
    pub browser_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 50,
            max_depth: 3,
            fetch_strategy: FetchStrategyKind::Auto,
            http_timeout_secs: 10,
            browser_timeout_secs: 90,
        }
    }
}

/// WebDriver connection settings for the browser strategy
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    #[serde(rename = "webdriver-url")]
    pub webdriver_url: Option<String>,
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "GreenScan".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/greenscan".to_string(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    pub fn header_value(&self) -> String {
        format!(
            "Mozilla/5.0 (compatible; {}/{}; +{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

/// Estimation defaults and tunable energy coefficients
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Region used when a scan request does not name one
    #[serde(rename = "default-region")]
    pub default_region: String,

    #[serde(rename = "network-kwh-per-mb")]
    pub network_kwh_per_mb: f64,

    #[serde(rename = "cpu-kwh-per-second")]
    pub cpu_kwh_per_second: f64,

    #[serde(rename = "layout-kwh-per-1000-nodes")]
    pub layout_kwh_per_1000_nodes: f64,
}

impl Default for EstimationConfig {
    fn default() -> Self {
        let coefficients = crate::estimate::EnergyCoefficients::default();
        Self {
            default_region: "us-east-1".to_string(),
            network_kwh_per_mb: coefficients.network_kwh_per_mb,
            cpu_kwh_per_second: coefficients.cpu_kwh_per_second,
            layout_kwh_per_1000_nodes: coefficients.layout_kwh_per_1000_nodes,
        }
    }
}

impl EstimationConfig {
    pub fn coefficients(&self) -> crate::estimate::EnergyCoefficients {
        crate::estimate::EnergyCoefficients {
            network_kwh_per_mb: self.network_kwh_per_mb,
            cpu_kwh_per_second: self.cpu_kwh_per_second,
            layout_kwh_per_1000_nodes: self.layout_kwh_per_1000_nodes,
        }
    }
}

/// Narrative-generation service configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NarrativeConfig {
    pub enabled: bool,

    /// Base URL of the text-generation API
    pub endpoint: String,

    pub model: String,

    /// Name of the environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,
}

impl Default for NarrativeConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: "https://generativelanguage.googleapis.com/v1".to_string(),
            model: "gemini-2.5-flash".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            timeout_secs: 60,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite job database
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory where first-page snapshots are written
    #[serde(rename = "snapshot-dir")]
    pub snapshot_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./greenscan.db".to_string(),
            snapshot_dir: "./snapshots".to_string(),
        }
    }
}
