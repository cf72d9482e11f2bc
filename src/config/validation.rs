use crate::config::types::{
    Config, CrawlerConfig, EstimationConfig, NarrativeConfig, OutputConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound on the page budget a single scan may request
pub const MAX_PAGES_LIMIT: u32 = 1000;

/// Upper bound on the link depth a single scan may request
pub const MAX_DEPTH_LIMIT: u32 = 10;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_browser_config(config)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_estimation_config(&config.estimation)?;
    validate_narrative_config(&config.narrative)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler budgets and timeouts
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 || config.max_pages > MAX_PAGES_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_pages must be between 1 and {}, got {}",
            MAX_PAGES_LIMIT, config.max_pages
        )));
    }

    if config.max_depth > MAX_DEPTH_LIMIT {
        return Err(ConfigError::Validation(format!(
            "max_depth must be <= {}, got {}",
            MAX_DEPTH_LIMIT, config.max_depth
        )));
    }

    if config.http_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "http_timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.browser_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "browser_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// An explicit browser strategy needs somewhere to connect to
fn validate_browser_config(config: &Config) -> Result<(), ConfigError> {
    use crate::config::FetchStrategyKind;

    match (&config.browser.webdriver_url, config.crawler.fetch_strategy) {
        (Some(url), _) => {
            Url::parse(url)
                .map_err(|e| ConfigError::InvalidUrl(format!("Invalid webdriver_url: {}", e)))?;
        }
        (None, FetchStrategyKind::Browser) => {
            return Err(ConfigError::Validation(
                "fetch_strategy = \"browser\" requires browser.webdriver_url".to_string(),
            ));
        }
        (None, _) => {}
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
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

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    Ok(())
}

/// Coefficients must keep the estimate a non-negative lower bound
fn validate_estimation_config(config: &EstimationConfig) -> Result<(), ConfigError> {
    if config.default_region.trim().is_empty() {
        return Err(ConfigError::Validation(
            "default_region cannot be empty".to_string(),
        ));
    }

    let coefficients = [
        ("network_kwh_per_mb", config.network_kwh_per_mb),
        ("cpu_kwh_per_second", config.cpu_kwh_per_second),
        ("layout_kwh_per_1000_nodes", config.layout_kwh_per_1000_nodes),
    ];
    for (name, value) in coefficients {
        if !value.is_finite() || value < 0.0 {
            return Err(ConfigError::Validation(format!(
                "{} must be a finite, non-negative number, got {}",
                name, value
            )));
        }
    }

    Ok(())
}

fn validate_narrative_config(config: &NarrativeConfig) -> Result<(), ConfigError> {
    if !config.enabled {
        return Ok(());
    }

    Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid narrative endpoint: {}", e)))?;

    if config.model.is_empty() {
        return Err(ConfigError::Validation(
            "narrative model cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "narrative timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.snapshot_dir.is_empty() {
        return Err(ConfigError::Validation(
            "snapshot_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchStrategyKind;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_page_budget_bounds() {
        let mut config = Config::default();
        config.crawler.max_pages = 0;
        assert!(validate(&config).is_err());

        config.crawler.max_pages = MAX_PAGES_LIMIT + 1;
        assert!(validate(&config).is_err());

        config.crawler.max_pages = 1;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_depth_zero_is_allowed() {
        let mut config = Config::default();
        config.crawler.max_depth = 0;
        assert!(validate(&config).is_ok());

        config.crawler.max_depth = MAX_DEPTH_LIMIT + 1;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_browser_strategy_requires_webdriver() {
        let mut config = Config::default();
        config.crawler.fetch_strategy = FetchStrategyKind::Browser;
        assert!(validate(&config).is_err());

        config.browser.webdriver_url = Some("http://localhost:4444".to_string());
        assert!(validate(&config).is_ok());

        config.browser.webdriver_url = Some("not a url".to_string());
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_negative_coefficient_rejected() {
        let mut config = Config::default();
        config.estimation.cpu_kwh_per_second = -1.0;
        assert!(validate(&config).is_err());

        config.estimation.cpu_kwh_per_second = f64::NAN;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_crawler_name_characters() {
        let mut config = Config::default();
        config.user_agent.crawler_name = "Green Scan!".to_string();
        assert!(validate(&config).is_err());

        config.user_agent.crawler_name = "green-scan".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_narrative_endpoint_checked_only_when_enabled() {
        let mut config = Config::default();
        config.narrative.endpoint = "::bad::".to_string();
        assert!(validate(&config).is_ok());

        config.narrative.enabled = true;
        assert!(validate(&config).is_err());
    }
}
