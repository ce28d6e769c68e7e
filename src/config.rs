use crate::error::{AppError, ErrorKind};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "client.json";

const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_ANALYZE_PATH: &str = "/analyze";
const DEFAULT_UPLOAD_FIELD: &str = "file";
// Matches the analysis server's MAX_CONTENT_LENGTH.
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    pub analyze_path: String,
    pub upload_field: String,
    pub max_upload_bytes: u64,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            analyze_path: DEFAULT_ANALYZE_PATH.to_string(),
            upload_field: DEFAULT_UPLOAD_FIELD.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            request_timeout_secs: None,
        }
    }
}

impl ClientConfig {
    /// Load `client.json` from `dir`, falling back to defaults when the file is absent,
    /// then apply `GROWMATE_*` environment overrides.
    pub fn load(dir: &Path) -> Result<Self, AppError> {
        let path = dir.join(CONFIG_FILE_NAME);
        let config = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                AppError::new(
                    ErrorKind::Config,
                    format!("Failed to read config file {}: {}", path.display(), e),
                )
            })?;
            serde_json::from_str(&content).map_err(|e| {
                AppError::new(
                    ErrorKind::Config,
                    format!("Failed to parse config file {}: {}", path.display(), e),
                )
            })?
        } else {
            ClientConfig::default()
        };

        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("GROWMATE_SERVER_URL") {
            self.server_url = url;
        }
        if let Some(path) = lookup("GROWMATE_ANALYZE_PATH") {
            self.analyze_path = path;
        }
        if let Some(field) = lookup("GROWMATE_UPLOAD_FIELD") {
            self.upload_field = field;
        }
        if let Some(raw) = lookup("GROWMATE_MAX_UPLOAD_BYTES") {
            self.max_upload_bytes = parse_number("GROWMATE_MAX_UPLOAD_BYTES", &raw)?;
        }
        if let Some(raw) = lookup("GROWMATE_REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(parse_number("GROWMATE_REQUEST_TIMEOUT_SECS", &raw)?);
        }
        Ok(self)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64, AppError> {
    raw.trim().parse::<u64>().map_err(|e| {
        AppError::new(
            ErrorKind::Config,
            format!("{} must be a non-negative integer, got {:?}: {}", key, raw, e),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_target_local_analysis_server() {
        let config = ClientConfig::default();
        assert_eq!(config.server_url, "http://127.0.0.1:5000");
        assert_eq!(config.analyze_path, "/analyze");
        assert_eq!(config.upload_field, "file");
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert!(config.request_timeout().is_none());
    }

    #[test]
    fn partial_json_keeps_remaining_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{ "server_url": "https://scan.example" }"#).unwrap();
        assert_eq!(config.server_url, "https://scan.example");
        assert_eq!(config.upload_field, "file");
    }

    #[test]
    fn environment_overrides_win() {
        let config = ClientConfig::default()
            .with_overrides(lookup_from(&[
                ("GROWMATE_UPLOAD_FIELD", "image"),
                ("GROWMATE_REQUEST_TIMEOUT_SECS", "30"),
            ]))
            .unwrap();
        assert_eq!(config.upload_field, "image");
        assert_eq!(config.request_timeout(), Some(Duration::from_secs(30)));
    }

    #[test]
    fn rejects_malformed_numbers() {
        let err = ClientConfig::default()
            .with_overrides(lookup_from(&[("GROWMATE_MAX_UPLOAD_BYTES", "lots")]))
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Config);
    }

    #[test]
    fn reads_client_json_from_directory() {
        let dir = std::env::temp_dir().join("growmate-scan-config-load");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join(CONFIG_FILE_NAME),
            r#"{ "analyze_path": "/v2/analyze", "request_timeout_secs": 45 }"#,
        )
        .unwrap();

        let loaded = ClientConfig::load(&dir).unwrap();
        if std::env::var("GROWMATE_ANALYZE_PATH").is_err() {
            assert_eq!(loaded.analyze_path, "/v2/analyze");
        }

        std::fs::write(dir.join(CONFIG_FILE_NAME), "{ nope").unwrap();
        assert_eq!(ClientConfig::load(&dir).unwrap_err().kind, ErrorKind::Config);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
