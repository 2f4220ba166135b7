use serde::Deserialize;
use std::ops::RangeInclusive;
use std::time::Duration;

/// Desktop browser identity presented to the documentation site
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Main configuration structure for the documentation crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub index: IndexConfig,
}

/// Fetch orchestration behaviour
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of page indices rendered at the same time
    #[serde(rename = "max-concurrent-renders")]
    pub max_concurrent_renders: u32,

    /// Maximum number of render attempts per page index
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,

    /// Random delay before every attempt (milliseconds, inclusive bounds)
    #[serde(rename = "attempt-jitter-ms")]
    pub attempt_jitter_ms: (u64, u64),

    /// Random delay right before the page visit (milliseconds, inclusive bounds)
    #[serde(rename = "visit-jitter-ms")]
    pub visit_jitter_ms: (u64, u64),

    /// Fixed pause after a failed attempt (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_renders: 3,
            max_attempts: 3,
            attempt_jitter_ms: (3_000, 8_000),
            visit_jitter_ms: (1_000, 3_000),
            retry_backoff_ms: 10_000,
        }
    }
}

impl CrawlerConfig {
    /// Same limits with every delay set to zero
    pub fn without_delays(self) -> Self {
        Self {
            attempt_jitter_ms: (0, 0),
            visit_jitter_ms: (0, 0),
            retry_backoff_ms: 0,
            ..self
        }
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Render service and browser identity configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Endpoint of the headless-browser render service
    pub endpoint: String,

    /// Documentation page URL; the page index is appended as `?index=`
    #[serde(rename = "base-url")]
    pub base_url: String,

    #[serde(rename = "user-agent")]
    pub user_agent: String,

    pub locale: String,

    #[serde(rename = "accept-language")]
    pub accept_language: String,

    pub referer: String,

    /// Whole-page budget inside the browser (milliseconds)
    #[serde(rename = "page-timeout-ms")]
    pub page_timeout_ms: u64,

    /// Budget for each in-page element wait (milliseconds)
    #[serde(rename = "wait-timeout-ms")]
    pub wait_timeout_ms: u64,

    /// Extra time granted to the render service on top of the page budget
    #[serde(rename = "grace-ms")]
    pub grace_ms: u64,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:11235/render".to_string(),
            base_url: "https://tsanghi.com/fin/doc".to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            locale: "zh-CN".to_string(),
            accept_language: "zh-CN,zh;q=0.9,en;q=0.8".to_string(),
            referer: "https://tsanghi.com/".to_string(),
            page_timeout_ms: 30_000,
            wait_timeout_ms: 5_000,
            grace_ms: 15_000,
        }
    }
}

impl RendererConfig {
    /// Upper bound for one call to the render service
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.page_timeout_ms + self.grace_ms)
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving one artifact per page index
    pub directory: String,

    /// Consolidated results file inside `directory`, used by `--resume`
    #[serde(rename = "results-file")]
    pub results_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: "tsanghi_docs".to_string(),
            results_file: "all_results.json".to_string(),
        }
    }
}

/// Inclusive bounds of the three page index components
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub first: (u32, u32),
    pub second: (u32, u32),
    pub third: (u32, u32),
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            first: (2, 5),
            second: (1, 5),
            third: (1, 5),
        }
    }
}

impl IndexConfig {
    pub fn ranges(&self) -> [RangeInclusive<u32>; 3] {
        [
            self.first.0..=self.first.1,
            self.second.0..=self.second.1,
            self.third.0..=self.third.1,
        ]
    }
}
