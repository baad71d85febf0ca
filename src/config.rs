use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Config file looked up in the current directory.
pub const CONFIG_FILE: &str = ".pr-digest.toml";

/// Environment variable overriding `site.base_url`.
pub const BASE_URL_ENV: &str = "PR_DIGEST_BASE_URL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .pr-digest.toml.
///
/// Every field has a default, so the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Published site and feed channel settings
    #[serde(default)]
    pub site: SiteConfig,

    /// Repository the digested PRs belong to
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// LLM prompt limits
    #[serde(default)]
    pub prompt: PromptConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Root URL of the published digest pages
    pub base_url: String,
    pub title: String,
    pub description: String,
    pub language: String,
    pub copyright: String,
    /// Channel image, relative to `base_url`
    pub image: String,
    /// Directory holding `<yyyy>/<MM>/<dd>.md` digest files
    pub content_dir: PathBuf,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://prozolic.github.io/PRDigest.NET/".to_string(),
            title: "PR Digest.NET".to_string(),
            description: "dotnet/runtimeにマージされたPull RequestをAIで日本語要約".to_string(),
            language: "ja".to_string(),
            copyright: "Copyright © 2025 prozolic".to_string(),
            image: "icon-512.png".to_string(),
            content_dir: PathBuf::from("archives"),
        }
    }
}

impl SiteConfig {
    /// `base_url` with exactly one trailing slash.
    pub fn root(&self) -> String {
        format!("{}/", self.base_url.trim_end_matches('/'))
    }

    /// Page URL for a digest date key, e.g. `.../2025/01/15.html`.
    pub fn page_url(&self, target: &str) -> String {
        format!("{}{}.html", self.root(), target)
    }

    pub fn feed_url(&self) -> String {
        format!("{}feed.xml", self.root())
    }

    pub fn image_url(&self) -> String {
        format!("{}{}", self.root(), self.image)
    }

    /// Markdown source path for a digest date key.
    pub fn digest_path(&self, target: &str) -> PathBuf {
        self.content_dir.join(format!("{}.md", target))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    pub owner: String,
    pub name: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            owner: "dotnet".to_string(),
            name: "runtime".to_string(),
        }
    }
}

impl RepositoryConfig {
    /// `owner/name`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Upstream URL of a pull request.
    pub fn pull_request_url(&self, number: &str) -> String {
        format!("https://github.com/{}/{}/pull/{}", self.owner, self.name, number)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    /// Changed files listed before the remainder is summarized
    pub max_files: usize,
    /// Most recent maintainer comments included
    pub max_comments: usize,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_files: 20,
            max_comments: 10,
        }
    }
}

impl Config {
    /// Load configuration from .pr-digest.toml in the current directory.
    /// Returns default config if the file doesn't exist.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };
        Ok(config.with_env_overrides())
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Apply `PR_DIGEST_BASE_URL` on top of the file values.
    pub fn with_env_overrides(mut self) -> Config {
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.trim().is_empty() {
                self.site.base_url = base_url;
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.site.base_url, "https://prozolic.github.io/PRDigest.NET/");
        assert_eq!(config.repository.full_name(), "dotnet/runtime");
        assert_eq!(config.prompt.max_files, 20);
        assert_eq!(config.prompt.max_comments, 10);
    }

    #[test]
    fn test_parse_partial_config_toml() {
        let toml_str = r#"
[site]
base_url = "https://example.com/digest"
title = "Example Digest"

[repository]
owner = "rust-lang"
name = "rust"

[prompt]
max_files = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.site.title, "Example Digest");
        assert_eq!(config.site.language, "ja");
        assert_eq!(config.repository.pull_request_url("7"), "https://github.com/rust-lang/rust/pull/7");
        assert_eq!(config.prompt.max_files, 5);
        assert_eq!(config.prompt.max_comments, 10);
    }

    #[test]
    fn test_site_urls_normalize_trailing_slash() {
        let site = SiteConfig {
            base_url: "https://example.com/digest".to_string(),
            ..SiteConfig::default()
        };
        assert_eq!(site.page_url("2025/01/15"), "https://example.com/digest/2025/01/15.html");
        assert_eq!(site.feed_url(), "https://example.com/digest/feed.xml");
        assert_eq!(site.image_url(), "https://example.com/digest/icon-512.png");
        assert_eq!(site.digest_path("2025/01/15"), PathBuf::from("archives/2025/01/15.md"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[site]\ncontent_dir = \"digests\"\n").unwrap();
        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.site.content_dir, PathBuf::from("digests"));
    }

    #[test]
    fn test_load_from_invalid_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[site\n").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_from_missing_file() {
        let err = Config::load_from(Path::new("/nonexistent/.pr-digest.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead(_)));
    }
}
