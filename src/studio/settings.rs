use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-3-pro-image-preview";
pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.into()
}

fn default_model() -> String {
    DEFAULT_MODEL.into()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.into()
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudioSettings {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl StudioSettings {
    /// Returns a redacted clone that replaces the key with masked form when non-empty.
    pub fn masked(&self) -> Self {
        let mut cloned = self.clone();
        if let Some(key) = cloned.api_key.as_mut() {
            if !key.is_empty() {
                let prefix: String = key.chars().take(2).collect();
                *key = format!("{}****", prefix);
            }
        }
        cloned
    }

    pub fn normalize(mut self) -> Self {
        self.endpoint = self.endpoint.trim().trim_end_matches('/').to_string();
        if self.endpoint.is_empty() {
            self.endpoint = default_endpoint();
        }
        self.model = self.model.trim().to_string();
        if self.model.is_empty() {
            self.model = default_model();
        }
        self.api_key_env = self.api_key_env.trim().to_string();
        if self.api_key_env.is_empty() {
            self.api_key_env = default_api_key_env();
        }
        if let Some(key) = self.api_key.take() {
            let trimmed = key.trim();
            if !trimmed.is_empty() {
                self.api_key = Some(trimmed.to_string());
            }
        }
        if self.request_timeout_secs == 0 {
            self.request_timeout_secs = default_request_timeout_secs();
        }
        self
    }
}

pub fn load_studio_settings(path: &Path) -> io::Result<StudioSettings> {
    let bytes = fs::read(path)?;
    let settings: StudioSettings = serde_json::from_slice(&bytes)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    Ok(settings.normalize())
}

pub fn save_studio_settings(path: &Path, settings: &StudioSettings) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_vec_pretty(settings)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    fs::write(path, json)
}

pub fn default_settings_path(root: &Path) -> PathBuf {
    root.join("studio_settings.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn masked_keeps_two_chars() {
        let settings = StudioSettings {
            api_key: Some("AIzaSecret".into()),
            ..StudioSettings::default()
        };
        assert_eq!(settings.masked().api_key.as_deref(), Some("AI****"));
        assert_eq!(StudioSettings::default().masked().api_key, None);
    }

    #[test]
    fn normalize_trims_and_restores_defaults() {
        let settings = StudioSettings {
            endpoint: " http://localhost:9000/ ".into(),
            model: "  ".into(),
            api_key: Some("   ".into()),
            api_key_env: "".into(),
            request_timeout_secs: 0,
        }
        .normalize();
        assert_eq!(settings.endpoint, "http://localhost:9000");
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.api_key, None);
        assert_eq!(settings.api_key_env, DEFAULT_API_KEY_ENV);
        assert_eq!(settings.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn settings_file_roundtrip_fills_missing_fields() {
        let temp = TempDir::new().expect("temp dir");
        let path = default_settings_path(&temp.path().join("config"));
        let settings = StudioSettings {
            model: "custom-image-model".into(),
            api_key: Some("key-123".into()),
            ..StudioSettings::default()
        };
        save_studio_settings(&path, &settings).expect("save");
        assert_eq!(load_studio_settings(&path).expect("load"), settings);

        fs::write(&path, br#"{"model":"other"}"#).expect("overwrite");
        let partial = load_studio_settings(&path).expect("load partial");
        assert_eq!(partial.model, "other");
        assert_eq!(partial.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(partial.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn invalid_json_is_invalid_data() {
        let temp = TempDir::new().expect("temp dir");
        let path = temp.path().join("studio_settings.json");
        fs::write(&path, b"not json").expect("write");
        let err = load_studio_settings(&path).expect_err("invalid");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
