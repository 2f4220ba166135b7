use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// The hash is logged at start-up and carried in the run summary so two runs
/// can be told apart.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
///
/// Without a path the defaults are used and hashed from their `Debug` form.
pub fn load_config_with_hash(path: Option<&Path>) -> Result<(Config, String), ConfigError> {
    match path {
        Some(path) => {
            let config = load_config(path)?;
            let hash = compute_config_hash(path)?;
            Ok((config, hash))
        }
        None => {
            let config = Config::default();
            validate(&config)?;
            let hash = hash_content(&format!("{:?}", config));
            Ok((config, hash))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawler]
max-concurrent-renders = 2
max-attempts = 4
attempt-jitter-ms = [100, 200]
visit-jitter-ms = [10, 20]
retry-backoff-ms = 500

[renderer]
endpoint = "http://localhost:9000/render"
base-url = "https://docs.example.com/fin/doc"
page-timeout-ms = 20000

[output]
directory = "./out"

[index]
first = [2, 3]
second = [1, 1]
third = [1, 2]
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.max_concurrent_renders, 2);
        assert_eq!(config.crawler.max_attempts, 4);
        assert_eq!(config.crawler.attempt_jitter_ms, (100, 200));
        assert_eq!(config.renderer.endpoint, "http://localhost:9000/render");
        assert_eq!(config.renderer.page_timeout_ms, 20_000);
        // Unset keys keep their defaults
        assert_eq!(config.renderer.locale, "zh-CN");
        assert_eq!(config.output.directory, "./out");
        assert_eq!(config.output.results_file, "all_results.json");
        assert_eq!(config.index.first, (2, 3));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.crawler.max_concurrent_renders, 3);
        assert_eq!(config.crawler.max_attempts, 3);
        assert_eq!(config.index.first, (2, 5));
        assert_eq!(config.output.directory, "tsanghi_docs");
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/crawler.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[crawler]
max-concurrent-renders = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_config("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_defaults_are_hashed_without_a_file() {
        let (config, hash) = load_config_with_hash(None).unwrap();
        assert_eq!(config.crawler.max_attempts, 3);
        assert_eq!(hash.len(), 64);
    }
}
