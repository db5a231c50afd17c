use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

/// How post listings are paged. The index and the search results can be
/// paginated independently; category and tag listings never are.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: u32,
    pub paginate_index: bool,
    pub paginate_search: bool,
}

impl Default for ListingConfig {
    fn default() -> Self {
        ListingConfig {
            page_size: 10,
            paginate_index: true,
            paginate_search: true,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct FeatureConfig {
    /// Registers the comment/reply submission and moderation endpoints.
    pub comments_enabled: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        FeatureConfig { comments_enabled: true }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    #[serde(default)]
    pub listing: ListingConfig,
    #[serde(default)]
    pub features: FeatureConfig,
    // These fields will be populated from the .env file
    pub database_path: String,
    pub media_path: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub admin_url_prefix: String,
    pub use_secure_cookies: bool,
}

fn required_var(name: &str) -> Result<String, config::ConfigError> {
    env::var(name).map_err(|_| {
        config::ConfigError::Message(format!(
            "FATAL: Environment variable '{}' is not set in your .env file.",
            name
        ))
    })
}

fn require_absolute(name: &str, value: &str) -> Result<(), config::ConfigError> {
    if Path::new(value).is_relative() {
        return Err(config::ConfigError::Message(format!(
            "FATAL: The '{}' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
            name, value
        )));
    }
    Ok(())
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path).map_err(|e| {
            config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}",
                env_path.display(),
                e
            ))
        })?;

        let database_path = required_var("DATABASE_PATH")?;
        let media_path = required_var("MEDIA_PATH")?;
        require_absolute("DATABASE_PATH", &database_path)?;
        require_absolute("MEDIA_PATH", &media_path)?;

        // 128 hex characters decode to the 64-byte cookie signing key.
        let session_secret_key = required_var("SESSION_SECRET_KEY")?;
        if session_secret_key.len() != 128 || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes).".to_string(),
            ));
        }

        let admin_url_prefix = required_var("ADMIN_URL_PREFIX")?;
        if admin_url_prefix.is_empty()
            || !admin_url_prefix.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(config::ConfigError::Message(
                "FATAL: 'ADMIN_URL_PREFIX' must not be empty and can only contain letters, numbers, underscores, and hyphens.".to_string(),
            ));
        }

        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_default();
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let use_secure_cookies = env::var("USE_SECURE_COOKIES")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);

        let config: Config = config::Config::builder()
            // Web host/port, listing and feature switches live in the TOML file.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("media_path", media_path)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .set_override("admin_url_prefix", admin_url_prefix)?
            .build()?
            .try_deserialize()?;

        if config.listing.page_size == 0 {
            return Err(config::ConfigError::Message(
                "FATAL: 'listing.page_size' must be greater than zero.".to_string(),
            ));
        }
        Ok(config)
    }

    /// Returns the full path to the blog database file inside its own folder.
    pub fn blog_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path).join("blog").join("blog.db")
    }

    /// Where unauthenticated moderation attempts are sent.
    pub fn login_path(&self) -> String {
        format!("/management/{}/login", self.admin_url_prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listing_defaults_paginate_everything() {
        let listing = ListingConfig::default();
        assert_eq!(listing.page_size, 10);
        assert!(listing.paginate_index && listing.paginate_search);
        assert!(FeatureConfig::default().comments_enabled);
    }

    #[test]
    fn partial_listing_section_keeps_defaults() {
        let listing: ListingConfig = serde_json::from_str(r#"{"page_size": 3}"#).unwrap();
        assert_eq!(listing.page_size, 3);
        assert!(listing.paginate_search);
    }

    #[test]
    fn derived_paths() {
        let config = Config {
            web: WebConfig { host: "127.0.0.1".into(), port: 8080 },
            listing: ListingConfig::default(),
            features: FeatureConfig::default(),
            database_path: "/srv/blog/data".into(),
            media_path: "/srv/blog/media".into(),
            allowed_origins: String::new(),
            log_level: "info".into(),
            session_secret_key: "00".repeat(64),
            admin_url_prefix: "staff".into(),
            use_secure_cookies: false,
        };
        assert_eq!(config.blog_db_path(), PathBuf::from("/srv/blog/data/blog/blog.db"));
        assert_eq!(config.login_path(), "/management/staff/login");
    }
}
