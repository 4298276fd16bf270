use crate::application_impl::{SessionConfig, StorageKeys};
use crate::infra_http::HttpTransportConfig;
use anyhow::{Result, anyhow};
use config::{Config, File};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub auth: Auth,
    pub transport: Transport,
    pub storage: Storage,
    pub log: Log,
}

#[derive(Debug, Deserialize)]
pub struct Auth {
    pub api_url: String,
    pub expiry_buffer_secs: u64,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Transport {
    pub backend: String, // "fake" or "http"
}

#[derive(Debug, Deserialize)]
pub struct Storage {
    pub backend: String, // "memory" or "file"
    pub path: String,
    pub access_key: String,
    pub refresh_key: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

impl Settings {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            expiry_buffer_secs: self.auth.expiry_buffer_secs,
            storage_keys: StorageKeys {
                access: self.storage.access_key.clone(),
                refresh: self.storage.refresh_key.clone(),
            },
        }
    }

    pub fn http_transport_config(&self) -> HttpTransportConfig {
        HttpTransportConfig {
            api_url: self.auth.api_url.clone(),
            request_timeout: Duration::from_secs(self.auth.request_timeout_secs),
        }
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
