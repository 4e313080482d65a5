use std::collections::HashSet;

use super::{types::Config, AuthMethod, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - API key is present when api_key auth is selected
/// - Backend URL is set
/// - Search limits are usable
/// - Category ids and labels are unique
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    if config.backend.url.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "backend.url cannot be empty".to_string(),
        ));
    }

    if config.search.max_results == 0 {
        return Err(ConfigError::ValidationError(
            "search.max_results must be at least 1".to_string(),
        ));
    }

    if config.search.cache_ttl_ms == 0 {
        return Err(ConfigError::ValidationError(
            "search.cache_ttl_ms must be greater than 0".to_string(),
        ));
    }

    let mut ids = HashSet::new();
    let mut labels = HashSet::new();
    for category in &config.downloads.categories {
        if !ids.insert(category.id) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate category id {}",
                category.id
            )));
        }
        if !labels.insert(category.label.to_lowercase()) {
            return Err(ConfigError::ValidationError(format!(
                "duplicate category label '{}'",
                category.label
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        AuthConfig, BackendConfig, CategoryConfig, DatabaseConfig, DownloadsConfig, SearchConfig,
        ServerConfig,
    };

    fn valid_config() -> Config {
        Config {
            auth: AuthConfig {
                method: AuthMethod::None,
                api_key: None,
            },
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            backend: BackendConfig {
                url: "http://localhost:4712".to_string(),
                timeout_secs: 30,
            },
            search: SearchConfig::default(),
            downloads: DownloadsConfig::default(),
        }
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = valid_config();
        config.server.port = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_api_key_required() {
        let mut config = valid_config();
        config.auth.method = AuthMethod::ApiKey;
        assert!(validate_config(&config).is_err());

        config.auth.api_key = Some("key".to_string());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_empty_backend_url_fails() {
        let mut config = valid_config();
        config.backend.url = "  ".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_duplicate_categories_fail() {
        let mut config = valid_config();
        config.downloads.categories = vec![
            CategoryConfig {
                id: 1,
                label: "tv".to_string(),
                path: String::new(),
            },
            CategoryConfig {
                id: 1,
                label: "movies".to_string(),
                path: String::new(),
            },
        ];
        assert!(validate_config(&config).is_err());

        config.downloads.categories[1].id = 2;
        config.downloads.categories[1].label = "TV".to_string();
        assert!(validate_config(&config).is_err());

        config.downloads.categories[1].label = "movies".to_string();
        assert!(validate_config(&config).is_ok());
    }
}
