use crate::config::types::{Config, CrawlerConfig, IndexConfig, OutputConfig, RendererConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_renderer_config(&config.renderer)?;
    validate_output_config(&config.output)?;
    validate_index_config(&config.index)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_renders < 1 || config.max_concurrent_renders > 32 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_renders must be between 1 and 32, got {}",
            config.max_concurrent_renders
        )));
    }

    if config.max_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be >= 1, got {}",
            config.max_attempts
        )));
    }

    validate_range("attempt_jitter_ms", config.attempt_jitter_ms)?;
    validate_range("visit_jitter_ms", config.visit_jitter_ms)?;

    Ok(())
}

/// Validates render service configuration
fn validate_renderer_config(config: &RendererConfig) -> Result<(), ConfigError> {
    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid endpoint: {}", e)))?;

    let base = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;
    if base.scheme() != "http" && base.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "base_url must use http or https, got '{}'",
            config.base_url
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.page_timeout_ms == 0 || config.wait_timeout_ms == 0 {
        return Err(ConfigError::Validation(
            "page_timeout_ms and wait_timeout_ms must be > 0".to_string(),
        ));
    }

    if config.wait_timeout_ms > config.page_timeout_ms {
        return Err(ConfigError::Validation(format!(
            "wait_timeout_ms ({}) cannot exceed page_timeout_ms ({})",
            config.wait_timeout_ms, config.page_timeout_ms
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.is_empty() {
        return Err(ConfigError::Validation(
            "directory cannot be empty".to_string(),
        ));
    }

    if config.results_file.is_empty() || config.results_file.contains(['/', '\\']) {
        return Err(ConfigError::Validation(format!(
            "results_file must be a plain file name, got '{}'",
            config.results_file
        )));
    }

    Ok(())
}

/// Validates the page index ranges
fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    validate_range("index.first", config.first)?;
    validate_range("index.second", config.second)?;
    validate_range("index.third", config.third)?;
    Ok(())
}

fn validate_range<T: PartialOrd + std::fmt::Display>(
    name: &str,
    (min, max): (T, T),
) -> Result<(), ConfigError> {
    if min > max {
        return Err(ConfigError::Validation(format!(
            "{} lower bound {} is greater than upper bound {}",
            name, min, max
        )));
    }
    Ok(())
}
