use serde::{Deserialize, Serialize};
use std::env;

use crate::blog_interface::API_PREFIX;
use crate::error::{AppError, AppResult};

pub const DEFAULT_POSTS_PER_PAGE: i64 = 10;
pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &["txt", "pdf", "png", "jpg", "jpeg", "gif"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub blog: BlogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogConfig {
    pub posts_per_page: i64,
    /// Directory uploaded post images are written to
    pub images_folder: String,
    /// URL prefix images are served under
    pub images_prefix: String,
    pub allowed_extensions: Vec<String>,
    /// Keep a binary copy of each uploaded image in the post row
    pub inline_images: bool,
    pub seed_sample_data: bool,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            posts_per_page: DEFAULT_POSTS_PER_PAGE,
            images_folder: "static/post_images".to_string(),
            images_prefix: "static/post_images".to_string(),
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
            inline_images: true,
            seed_sample_data: false,
        }
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let defaults = BlogConfig::default();
        let config = Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "sqlite:data/blog.db".to_string()),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "3000".to_string())
                    .parse()
                    .unwrap_or(3000),
            },
            blog: BlogConfig {
                posts_per_page: env::var("POSTS_PER_PAGE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.posts_per_page),
                images_folder: env::var("POST_IMAGES_FOLDER")
                    .unwrap_or(defaults.images_folder),
                images_prefix: env::var("POST_IMAGES_PREFIX")
                    .unwrap_or(defaults.images_prefix),
                allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                    .map(|v| parse_extensions(&v))
                    .unwrap_or(defaults.allowed_extensions),
                inline_images: env::var("INLINE_POST_IMAGES")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(defaults.inline_images),
                seed_sample_data: env::var("SEED_SAMPLE_DATA")
                    .map(|v| parse_flag(&v))
                    .unwrap_or(defaults.seed_sample_data),
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.blog.posts_per_page <= 0 {
            return Err(AppError::ConfigurationError(format!(
                "POSTS_PER_PAGE must be positive, got {}",
                self.blog.posts_per_page
            )));
        }
        if self.blog.allowed_extensions.is_empty() {
            return Err(AppError::ConfigurationError(
                "ALLOWED_EXTENSIONS must name at least one extension".to_string(),
            ));
        }
        validate_images_prefix(&self.blog.images_prefix)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Images are mounted with `nest_service`, which cannot take the root, a
/// path parameter or the API prefix.
fn validate_images_prefix(prefix: &str) -> AppResult<()> {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(AppError::ConfigurationError(format!(
            "POST_IMAGES_PREFIX must not be the root path, got {:?}",
            prefix
        )));
    }
    if trimmed.contains(|c: char| matches!(c, '{' | '}' | '*')) || trimmed.contains("//") {
        return Err(AppError::ConfigurationError(format!(
            "POST_IMAGES_PREFIX must be a plain path, got {:?}",
            prefix
        )));
    }
    let api_root = API_PREFIX.trim_matches('/');
    if trimmed == api_root || trimmed.starts_with(&format!("{}/", api_root)) {
        return Err(AppError::ConfigurationError(format!(
            "POST_IMAGES_PREFIX must not live under {}",
            API_PREFIX
        )));
    }
    Ok(())
}

/// Parse a comma separated extension list, e.g. `"png, .JPG,gif"`.
pub fn parse_extensions(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(blog: BlogConfig) -> Config {
        Config {
            database: DatabaseConfig { url: "sqlite::memory:".to_string() },
            server: ServerConfig { host: "127.0.0.1".to_string(), port: 8080 },
            blog,
        }
    }

    #[test]
    fn test_parse_extensions() {
        assert_eq!(parse_extensions("png, .JPG,,gif "), vec!["png", "jpg", "gif"]);
        assert!(parse_extensions(" , ").is_empty());
    }

    #[test]
    fn test_defaults() {
        let blog = BlogConfig::default();
        assert_eq!(blog.posts_per_page, 10);
        assert_eq!(blog.allowed_extensions.len(), 6);
        assert!(blog.allowed_extensions.contains(&"jpeg".to_string()));
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let config = config_with(BlogConfig { posts_per_page: 0, ..BlogConfig::default() });
        assert!(matches!(config.validate(), Err(AppError::ConfigurationError(_))));
        assert_eq!(config.server_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_images_prefix_must_be_mountable() {
        for prefix in ["/", "", "  ", "//", "/api/v1", "api/v1/images", "/files/{name}"] {
            let config = config_with(BlogConfig {
                images_prefix: prefix.to_string(),
                ..BlogConfig::default()
            });
            assert!(
                matches!(config.validate(), Err(AppError::ConfigurationError(_))),
                "prefix {:?} should be rejected",
                prefix
            );
        }

        for prefix in ["static/post_images", "/media/", "api-images"] {
            let config = config_with(BlogConfig {
                images_prefix: prefix.to_string(),
                ..BlogConfig::default()
            });
            assert!(config.validate().is_ok(), "prefix {:?} should be accepted", prefix);
        }
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("off"));
    }
}
