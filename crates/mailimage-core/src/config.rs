//! Configuration module
//!
//! This module provides the configuration for the submission pipeline, the stores it
//! commits to, the reply mailer and the HTTP read surface. Everything is read from the
//! environment; `Default` carries the same defaults so tests can build a config directly.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::backend::MetadataBackend;

// Common constants
const TOKEN_LENGTH: usize = 8;
const TOKEN_EXPIRY_SECS: u64 = 24 * 60 * 60;
const MAX_TOKEN_EXPIRY_SECS: u64 = 365 * 24 * 60 * 60;
const SUBJECT_MAX_CHARS: usize = 25;
const TEXT_MAX_CHARS: usize = 200;
const THUMBNAIL_WIDTH: u32 = 250;
const THUMBNAIL_HEIGHT: u32 = 200;
const SMTP_PORT: u16 = 25;
const DEFAULT_STORAGE_PATH: &str = "/var/lib/mailimage";
const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_ALLOWED_CONTENT_TYPES: &str = "image/jpeg,image/png,image/jpg";
const DEFAULT_SPAM_PREFIX: &str = "***SPAM***";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub debug: bool,
    pub log_path: Option<PathBuf>,
    // Storage configuration
    pub storage_path: PathBuf,
    pub metadata_backend: MetadataBackend,
    pub redis_url: String,
    pub key_prefix: String,
    // Delete links
    pub base_url: String,
    pub delete_redirect_url: Option<String>,
    pub token_length: usize,
    pub token_expiry: Duration,
    // Submission validation
    pub subject_max_chars: usize,
    pub text_max_chars: usize,
    pub allowed_content_types: Vec<String>,
    pub spam_prefix: String,
    // Thumbnails
    pub thumbnail_width: u32,
    pub thumbnail_height: u32,
    // Reply mail
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_tls: bool,
    pub smtp_from: String,
    pub response_regards: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            debug: false,
            log_path: None,
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            metadata_backend: MetadataBackend::Redis,
            redis_url: DEFAULT_REDIS_URL.to_string(),
            key_prefix: "mailimage".to_string(),
            base_url: "http://localhost:5000".to_string(),
            delete_redirect_url: None,
            token_length: TOKEN_LENGTH,
            token_expiry: Duration::from_secs(TOKEN_EXPIRY_SECS),
            subject_max_chars: SUBJECT_MAX_CHARS,
            text_max_chars: TEXT_MAX_CHARS,
            allowed_content_types: split_list(DEFAULT_ALLOWED_CONTENT_TYPES),
            spam_prefix: DEFAULT_SPAM_PREFIX.to_string(),
            thumbnail_width: THUMBNAIL_WIDTH,
            thumbnail_height: THUMBNAIL_HEIGHT,
            smtp_host: "localhost".to_string(),
            smtp_port: SMTP_PORT,
            smtp_user: None,
            smtp_password: None,
            smtp_tls: false,
            smtp_from: "mailimage <mailimage@example.com>".to_string(),
            response_regards: "Regards".to_string(),
        }
    }
}

fn split_list(s: &str) -> Vec<String> {
    s.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn env_flag(name: &str, default: bool) -> bool {
    env::var(name)
        .map(|v| {
            let v = v.trim().to_lowercase();
            !(v.is_empty() || v == "0" || v == "false" || v == "no")
        })
        .unwrap_or(default)
}

/// Parse a numeric setting. Unset or blank falls back to the default; anything else must
/// parse.
fn parse_number<T: FromStr>(
    name: &str,
    value: Option<String>,
    default: T,
) -> Result<T, anyhow::Error> {
    match value.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(default),
        Some(v) => v
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number, got {:?}", name, v)),
    }
}

fn env_number<T: FromStr>(name: &str, default: T) -> Result<T, anyhow::Error> {
    parse_number(name, env::var(name).ok(), default)
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let defaults = Config::default();

        let metadata_backend = match env::var("METADATA_BACKEND") {
            Ok(s) => s.parse()?,
            Err(_) => defaults.metadata_backend,
        };

        let config = Config {
            environment: env::var("ENVIRONMENT").unwrap_or(defaults.environment),
            debug: env_flag("DEBUG", false),
            log_path: env::var("LOG_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            storage_path: env::var("MAILIMAGE_PATH")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or(defaults.storage_path),
            metadata_backend,
            redis_url: env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            key_prefix: env::var("REDIS_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            base_url: env::var("BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.base_url),
            delete_redirect_url: env::var("DELETE_REDIRECT_URL")
                .ok()
                .filter(|s| !s.is_empty()),
            token_length: env_number("TOKEN_LENGTH", TOKEN_LENGTH)?,
            token_expiry: Duration::from_secs(env_number("TOKEN_EXPIRY_SECS", TOKEN_EXPIRY_SECS)?),
            subject_max_chars: env_number("SUBJECT_MAX_CHARS", SUBJECT_MAX_CHARS)?,
            text_max_chars: env_number("TEXT_MAX_CHARS", TEXT_MAX_CHARS)?,
            allowed_content_types: split_list(
                &env::var("ALLOWED_CONTENT_TYPES")
                    .unwrap_or_else(|_| DEFAULT_ALLOWED_CONTENT_TYPES.to_string()),
            ),
            spam_prefix: env::var("SPAM_PREFIX").unwrap_or(defaults.spam_prefix),
            thumbnail_width: env_number("THUMBNAIL_WIDTH", THUMBNAIL_WIDTH)?,
            thumbnail_height: env_number("THUMBNAIL_HEIGHT", THUMBNAIL_HEIGHT)?,
            smtp_host: env::var("SMTP_HOST")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.smtp_host),
            smtp_port: env_number("SMTP_PORT", SMTP_PORT)?,
            smtp_user: env::var("SMTP_USER").ok().filter(|s| !s.is_empty()),
            smtp_password: env::var("SMTP_PASSWORD").ok().filter(|s| !s.is_empty()),
            smtp_tls: env_flag("SMTP_TLS", false),
            smtp_from: env::var("SMTP_FROM")
                .ok()
                .filter(|s| !s.is_empty())
                .unwrap_or(defaults.smtp_from),
            response_regards: env::var("RESPONSE_REGARDS").unwrap_or(defaults.response_regards),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.token_length == 0 {
            return Err(anyhow::anyhow!("TOKEN_LENGTH must be greater than zero"));
        }

        let expiry = self.token_expiry.as_secs();
        if expiry == 0 || expiry > MAX_TOKEN_EXPIRY_SECS {
            return Err(anyhow::anyhow!(
                "TOKEN_EXPIRY_SECS must be between 1 and {}",
                MAX_TOKEN_EXPIRY_SECS
            ));
        }

        if self.subject_max_chars == 0 || self.text_max_chars == 0 {
            return Err(anyhow::anyhow!(
                "SUBJECT_MAX_CHARS and TEXT_MAX_CHARS must be greater than zero"
            ));
        }

        if self.smtp_port == 0 {
            return Err(anyhow::anyhow!("SMTP_PORT must be greater than zero"));
        }

        if self.allowed_content_types.is_empty() {
            return Err(anyhow::anyhow!(
                "ALLOWED_CONTENT_TYPES must name at least one image type"
            ));
        }

        if self.thumbnail_width == 0 || self.thumbnail_height == 0 {
            return Err(anyhow::anyhow!(
                "THUMBNAIL_WIDTH and THUMBNAIL_HEIGHT must be greater than zero"
            ));
        }

        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(anyhow::anyhow!("BASE_URL must be an http(s) URL"));
        }

        if self.metadata_backend == MetadataBackend::Redis
            && !(self.redis_url.starts_with("redis://") || self.redis_url.starts_with("rediss://"))
        {
            return Err(anyhow::anyhow!(
                "REDIS_URL must be a valid redis connection string"
            ));
        }

        Ok(())
    }

    /// Link the submitter follows to delete their entry.
    pub fn delete_link(&self, token: &str) -> String {
        format!("{}/delete/{}", self.base_url.trim_end_matches('/'), token)
    }

    /// Human readable validity window of a delete link, e.g. "24 hours".
    pub fn token_validity_text(&self) -> String {
        let secs = self.token_expiry.as_secs();
        if secs >= 3600 && secs % 3600 == 0 {
            format!("{} hours", secs / 3600)
        } else if secs >= 60 && secs % 60 == 0 {
            format!("{} minutes", secs / 60)
        } else {
            format!("{} seconds", secs)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.token_length, 8);
        assert_eq!(config.subject_max_chars, 25);
        assert_eq!(config.text_max_chars, 200);
        assert_eq!((config.thumbnail_width, config.thumbnail_height), (250, 200));
        assert_eq!(
            config.allowed_content_types,
            vec!["image/jpeg", "image/png", "image/jpg"]
        );
    }

    #[test]
    fn rejects_zero_token_length() {
        let config = Config {
            token_length: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn numbers_fall_back_to_default_only_when_unset() {
        assert_eq!(parse_number("SUBJECT_MAX_CHARS", None, 25usize).unwrap(), 25);
        assert_eq!(
            parse_number("SUBJECT_MAX_CHARS", Some(" 40 ".to_string()), 25usize).unwrap(),
            40
        );
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = parse_number("TEXT_MAX_CHARS", Some("lots".to_string()), 200usize).unwrap_err();
        assert!(err.to_string().contains("TEXT_MAX_CHARS"));
        assert!(parse_number("THUMBNAIL_WIDTH", Some("-250".to_string()), 250u32).is_err());
        assert!(parse_number("SMTP_PORT", Some("70000".to_string()), 25u16).is_err());
    }

    #[test]
    fn rejects_token_expiry_out_of_range() {
        for secs in [0, MAX_TOKEN_EXPIRY_SECS + 1, u64::MAX] {
            let config = Config {
                token_expiry: Duration::from_secs(secs),
                ..Config::default()
            };
            assert!(config.validate().is_err(), "{}", secs);
        }
    }

    #[test]
    fn rejects_non_redis_url_for_redis_backend() {
        let config = Config {
            redis_url: "postgresql://localhost/db".to_string(),
            ..Config::default()
        };
        assert!(config.validate().is_err());

        let memory = Config {
            metadata_backend: MetadataBackend::Memory,
            redis_url: String::new(),
            ..Config::default()
        };
        assert!(memory.validate().is_ok());
    }

    #[test]
    fn delete_link_joins_base_url() {
        let config = Config {
            base_url: "https://images.example.com/".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.delete_link("AbCdEfGh"),
            "https://images.example.com/delete/AbCdEfGh"
        );
    }

    #[test]
    fn token_validity_text_uses_largest_whole_unit() {
        assert_eq!(Config::default().token_validity_text(), "24 hours");
        let config = Config {
            token_expiry: Duration::from_secs(90),
            ..Config::default()
        };
        assert_eq!(config.token_validity_text(), "90 seconds");
    }
}
