use crate::config::types::CrawlConfig;
use crate::url::base_domain_of;
use crate::ConfigError;

/// Validates the merged run configuration
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    validate_start_url(&config.start_url)?;
    validate_limits(config)?;
    validate_extensions(&config.doc_extensions)?;
    validate_output_dir(config)?;
    Ok(())
}

/// The start URL must be http(s) with a host, since it defines the crawl scope
fn validate_start_url(start_url: &str) -> Result<(), ConfigError> {
    base_domain_of(start_url)
        .map(|_| ())
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", start_url, e)))
}

fn validate_limits(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.max_concurrent < 1 || config.max_concurrent > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent must be between 1 and 100, got {}",
            config.max_concurrent
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    Ok(())
}

fn validate_extensions(extensions: &[String]) -> Result<(), ConfigError> {
    if extensions.is_empty() {
        return Err(ConfigError::Validation(
            "at least one document extension is required".to_string(),
        ));
    }
    Ok(())
}

fn validate_output_dir(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.output_dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output_dir cannot be empty".to_string(),
        ));
    }
    Ok(())
}
