use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{GmailError, Result};

/// Body sent in every automatic reply
pub const DEFAULT_REPLY_BODY: &str = "Thank you for your email. I hope this message finds you well. I am currently on vacation and will be out of the office. During this time, I will have limited access to email and may not be able to respond immediately.";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub reply: ReplyConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub execution: ExecutionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    #[serde(default = "default_token_cache_path")]
    pub token_cache_path: PathBuf,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            token_cache_path: default_token_cache_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
    /// Draw a new delay before every tick instead of once at startup
    #[serde(default = "default_rerandomize")]
    pub rerandomize_each_tick: bool,
    #[serde(default = "default_query")]
    pub query: String,
    #[serde(default = "default_label_ids")]
    pub label_ids: Vec<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: default_min_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
            rerandomize_each_tick: default_rerandomize(),
            query: default_query(),
            label_ids: default_label_ids(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl PollConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyConfig {
    #[serde(default = "default_label_name")]
    pub label_name: String,
    #[serde(default = "default_body")]
    pub body: String,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            label_name: default_label_name(),
            body: default_body(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExecutionConfig {
    #[serde(default)]
    pub dry_run: bool,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

fn default_token_cache_path() -> PathBuf {
    PathBuf::from(".gmail-autoreply/token.json")
}

fn default_min_delay_secs() -> u64 {
    45
}

fn default_max_delay_secs() -> u64 {
    120
}

fn default_rerandomize() -> bool {
    true
}

fn default_query() -> String {
    "is:unread".to_string()
}

fn default_label_ids() -> Vec<String> {
    vec!["INBOX".to_string()]
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_label_name() -> String {
    "AutoReplied".to_string()
}

fn default_body() -> String {
    DEFAULT_REPLY_BODY.to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

impl Config {
    pub async fn load(path: &Path) -> Result<Self> {
        // If file doesn't exist, return default config with warning
        if !path.exists() {
            tracing::warn!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| GmailError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        config.validate()?;

        tracing::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                GmailError::ConfigError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| GmailError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        tokio::fs::write(path, content)
            .await
            .map_err(|e| GmailError::ConfigError(format!("Failed to write config file: {}", e)))?;

        tracing::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.poll.min_delay_secs == 0 {
            return Err(GmailError::ConfigError(
                "poll.min_delay_secs must be at least 1".to_string(),
            ));
        }
        if self.poll.min_delay_secs > self.poll.max_delay_secs {
            return Err(GmailError::ConfigError(format!(
                "poll.min_delay_secs ({}) cannot exceed poll.max_delay_secs ({})",
                self.poll.min_delay_secs, self.poll.max_delay_secs
            )));
        }
        if self.poll.request_timeout_secs == 0 {
            return Err(GmailError::ConfigError(
                "poll.request_timeout_secs must be greater than 0".to_string(),
            ));
        }
        if self.poll.query.trim().is_empty() && self.poll.label_ids.is_empty() {
            return Err(GmailError::ConfigError(
                "poll.query and poll.label_ids cannot both be empty".to_string(),
            ));
        }
        if self.poll.label_ids.iter().any(|l| l.is_empty()) {
            return Err(GmailError::ConfigError(
                "poll.label_ids cannot contain empty strings".to_string(),
            ));
        }

        if self.reply.label_name.trim().is_empty() {
            return Err(GmailError::ConfigError(
                "reply.label_name cannot be empty".to_string(),
            ));
        }
        if self.reply.body.is_empty() {
            return Err(GmailError::ConfigError(
                "reply.body cannot be empty".to_string(),
            ));
        }
        // The reply is sent as 7bit text
        if !self.reply.body.is_ascii() {
            return Err(GmailError::ConfigError(
                "reply.body must be ASCII (sent with 7bit transfer encoding)".to_string(),
            ));
        }

        if self.server.host.is_empty() {
            return Err(GmailError::ConfigError(
                "server.host cannot be empty".to_string(),
            ));
        }

        tracing::debug!("Configuration validation passed");
        Ok(())
    }

    /// Create an example configuration file
    pub async fn create_example(path: &Path) -> Result<()> {
        let config = Self::default();
        config.save(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.poll.min_delay_secs, 45);
        assert_eq!(config.poll.max_delay_secs, 120);
        assert!(config.poll.rerandomize_each_tick);
        assert_eq!(config.poll.query, "is:unread");
        assert_eq!(config.poll.label_ids, vec!["INBOX".to_string()]);
        assert_eq!(config.poll.request_timeout(), Duration::from_secs(30));

        assert_eq!(config.reply.label_name, "AutoReplied");
        assert!(config.reply.body.starts_with("Thank you for your email."));

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.auth.credentials_path, PathBuf::from("credentials.json"));
        assert!(!config.execution.dry_run);
    }

    #[test]
    fn test_config_validation_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_min_delay() {
        let mut config = Config::default();
        config.poll.min_delay_secs = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("at least 1"));
    }

    #[test]
    fn test_config_validation_inverted_delay_range() {
        let mut config = Config::default();
        config.poll.min_delay_secs = 121;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot exceed"));
    }

    #[test]
    fn test_config_validation_equal_delay_bounds() {
        let mut config = Config::default();
        config.poll.min_delay_secs = 60;
        config.poll.max_delay_secs = 60;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.poll.request_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_empty_filters() {
        let mut config = Config::default();
        config.poll.query = "  ".to_string();
        config.poll.label_ids.clear();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("cannot both be empty"));
    }

    #[test]
    fn test_config_validation_empty_label_name() {
        let mut config = Config::default();
        config.reply.label_name = "".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("label_name cannot be empty"));
    }

    #[test]
    fn test_config_validation_non_ascii_body() {
        let mut config = Config::default();
        config.reply.body = "Bin im Urlaub – bis bald".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("ASCII"));
    }

    #[tokio::test]
    async fn test_config_load_save_roundtrip() {
        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();

        let mut config = Config::default();
        config.server.port = 8081;
        config.poll.rerandomize_each_tick = false;
        config.save(path).await.unwrap();

        let loaded = Config::load(path).await.unwrap();
        assert_eq!(loaded.server.port, 8081);
        assert!(!loaded.poll.rerandomize_each_tick);
        assert_eq!(loaded.reply.body, DEFAULT_REPLY_BODY);
    }

    #[tokio::test]
    async fn test_config_load_nonexistent_returns_default() {
        let path = Path::new("/tmp/nonexistent-autoreply-config-12345.toml");
        let config = Config::load(path).await.unwrap();
        assert_eq!(config.poll.min_delay_secs, 45);
    }

    #[tokio::test]
    async fn test_config_load_invalid_toml() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), "this is not valid toml {[}]")
            .await
            .unwrap();

        let result = Config::load(temp_file.path()).await;
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Failed to parse config file"));
    }

    #[tokio::test]
    async fn test_config_partial_with_defaults() {
        let temp_file = NamedTempFile::new().unwrap();
        let partial_config = r#"
[poll]
min_delay_secs = 10
max_delay_secs = 20

[execution]
dry_run = true
"#;
        tokio::fs::write(temp_file.path(), partial_config).await.unwrap();

        let config = Config::load(temp_file.path()).await.unwrap();
        assert_eq!(config.poll.min_delay_secs, 10);
        assert_eq!(config.poll.max_delay_secs, 20);
        assert!(config.execution.dry_run);

        assert_eq!(config.poll.query, "is:unread");
        assert_eq!(config.reply.label_name, "AutoReplied");
        assert_eq!(config.server.port, 3000);
    }

    #[tokio::test]
    async fn test_config_load_rejects_invalid_values() {
        let temp_file = NamedTempFile::new().unwrap();
        tokio::fs::write(temp_file.path(), "[poll]\nmin_delay_secs = 0\n")
            .await
            .unwrap();

        assert!(Config::load(temp_file.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_create_example() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::create_example(&path).await.unwrap();
        assert!(path.exists());

        let config = Config::load(&path).await.unwrap();
        assert_eq!(config.reply.label_name, "AutoReplied");
    }
}
