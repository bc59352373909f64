use crate::config::types::{Config, CrawlerConfig, LimitsConfig, OutputConfig, UserAgentConfig};
use crate::{ConfigError, ConfigResult};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_crawler_config(&config.crawler)?;
    validate_limits_config(&config.limits)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> ConfigResult<()> {
    if config.max_concurrent_fetches < 1 || config.max_concurrent_fetches > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_fetches must be between 1 and 100, got {}",
            config.max_concurrent_fetches
        )));
    }

    if config.max_concurrent_downloads < 1 || config.max_concurrent_downloads > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_downloads must be between 1 and 100, got {}",
            config.max_concurrent_downloads
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be >= 1, got {}",
            config.request_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the termination policy
fn validate_limits_config(config: &LimitsConfig) -> ConfigResult<()> {
    if config.max_pages == Some(0) {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1 when set".to_string(),
        ));
    }

    if config.deadline_secs == Some(0) {
        return Err(ConfigError::Validation(
            "deadline_secs must be >= 1 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> ConfigResult<()> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if let Some(contact) = &config.contact_url {
        Url::parse(contact)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> ConfigResult<()> {
    if config.data_path.is_empty() {
        return Err(ConfigError::Validation(
            "data_path cannot be empty".to_string(),
        ));
    }

    if config.image_dir.is_empty() {
        return Err(ConfigError::Validation(
            "image_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}
