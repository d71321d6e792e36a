use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// Config (root)
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub platform: PlatformConfig,
    #[serde(default)]
    pub cards: CardsConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = match fs::read_to_string(path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(e)),
        };
        Ok(serde_saphyr::from_str(&contents)?)
    }
}

// ============================================================================
// ServerConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_request_timeout() -> u64 {
    30
}

// ============================================================================
// PlatformConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct PlatformConfig {
    #[serde(default = "default_platform_base_url")]
    pub base_url: String,
    /// Bearer token for outbound API calls.
    #[serde(default)]
    pub channel_access_token: String,
    /// HMAC secret for webhook signature validation. Empty disables
    /// validation (local development only).
    #[serde(default)]
    pub channel_secret: String,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: default_platform_base_url(),
            channel_access_token: String::new(),
            channel_secret: String::new(),
        }
    }
}

fn default_platform_base_url() -> String {
    "https://api.line.me/v2/bot".to_string()
}

// ============================================================================
// CardsConfig
// ============================================================================

/// Front-end deep-link targets for card action buttons.
#[derive(Debug, Deserialize)]
pub struct CardsConfig {
    #[serde(default = "default_edit_url")]
    pub edit_url: String,
    #[serde(default = "default_list_url")]
    pub list_url: String,
}

impl Default for CardsConfig {
    fn default() -> Self {
        Self {
            edit_url: default_edit_url(),
            list_url: default_list_url(),
        }
    }
}

fn default_edit_url() -> String {
    "https://liff.line.me/2007783990-0Y48Q7rB".to_string()
}

fn default_list_url() -> String {
    "https://liff.line.me/2007783990-rbm2POM6".to_string()
}

// ============================================================================
// OcrConfig
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct OcrConfig {
    /// Text-recognition endpoint. Unset disables OCR; image messages then
    /// get a static acknowledgment.
    #[serde(default)]
    pub endpoint: Option<String>,
}

// ============================================================================
// ExportConfig
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ExportConfig {
    /// Target spreadsheet. Unset disables the export sink.
    #[serde(default)]
    pub spreadsheet_id: Option<String>,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default = "default_sheets_base_url")]
    pub base_url: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            sheet_name: default_sheet_name(),
            access_token: None,
            base_url: default_sheets_base_url(),
        }
    }
}

fn default_sheet_name() -> String {
    "Messages".to_string()
}

fn default_sheets_base_url() -> String {
    "https://sheets.googleapis.com/v4/spreadsheets".to_string()
}

// ============================================================================
// ConfigError
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Yaml(#[from] serde_saphyr::Error),
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4000);
        assert_eq!(config.server.request_timeout_seconds, 30);
        assert_eq!(config.platform.base_url, "https://api.line.me/v2/bot");
        assert!(config.platform.channel_access_token.is_empty());
        assert!(config.ocr.endpoint.is_none());
        assert!(config.export.spreadsheet_id.is_none());
        assert_eq!(config.export.sheet_name, "Messages");
    }

    #[tokio::test]
    async fn test_load_missing_file_returns_defaults() {
        let tmp_dir = TempDir::new().unwrap();
        let missing_path = tmp_dir.path().join("missing-config.yaml");
        let config = Config::load(missing_path.to_str().unwrap()).await.unwrap();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 4000);
    }

    #[tokio::test]
    async fn test_load_valid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  host: "127.0.0.1"
  port: 3000
  request_timeout_seconds: 60
platform:
  channel_access_token: "token-123"
  channel_secret: "secret-456"
ocr:
  endpoint: "https://ocr.example.com/api/v1"
export:
  spreadsheet_id: "sheet-abc"
  access_token: "sheets-token"
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.request_timeout_seconds, 60);
        assert_eq!(config.platform.channel_access_token, "token-123");
        assert_eq!(config.platform.channel_secret, "secret-456");
        assert_eq!(
            config.ocr.endpoint.as_deref(),
            Some("https://ocr.example.com/api/v1")
        );
        assert_eq!(config.export.spreadsheet_id.as_deref(), Some("sheet-abc"));
        assert_eq!(config.export.sheet_name, "Messages"); // default
    }

    #[tokio::test]
    async fn test_load_partial_yaml_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
server:
  port: 9000
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(config.server.host, "0.0.0.0"); // default
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.request_timeout_seconds, 30); // default
        assert_eq!(config.platform.base_url, "https://api.line.me/v2/bot"); // default
    }

    #[tokio::test]
    async fn test_load_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid: yaml: content: [").unwrap();

        let result = Config::load(file.path().to_str().unwrap()).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_config_error_display() {
        let io_error = ConfigError::Io(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "test",
        ));
        assert!(io_error.to_string().contains("failed to read config file"));
    }
}
