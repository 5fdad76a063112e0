//! Application configuration.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default routing base path.
pub const DEFAULT_BASE_PATH: &str = "/viaje.ro/";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Backend project URL (optional; signed-out use works without it).
    pub api_url: Option<String>,

    /// Backend anon key (optional).
    pub anon_key: Option<String>,

    /// Base path the app is served under (default: "/viaje.ro/").
    pub base_path: String,

    /// Origin used to build auth redirect URLs.
    pub site_origin: String,

    /// GeoJSON file path or URL with municipality outlines (optional).
    pub geojson: Option<String>,

    /// Directory holding `cidades.json`, `estados.json` and `pais.json`.
    pub reference_dir: PathBuf,

    /// Settings file used while signed out.
    pub settings_path: PathBuf,

    /// File the CLI keeps the signed-in session in.
    pub session_path: PathBuf,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Municipalities whose outlines are fetched concurrently.
    pub geometry_batch_size: usize,

    /// Time allowed to probe a cover photo's dimensions, in seconds.
    pub image_timeout_seconds: u64,
}

/// Backend secrets file structure.
#[derive(Debug, Deserialize)]
struct BackendSecrets {
    url: String,
    anon_key: String,
}

impl AppConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let (api_url, anon_key) = load_backend_secrets();
        let defaults = Self::default();

        Self {
            api_url,
            anon_key,
            base_path: std::env::var("VIAJERO_BASE_PATH")
                .map(|p| normalize_base_path(&p))
                .unwrap_or(defaults.base_path),
            site_origin: std::env::var("VIAJERO_SITE_ORIGIN")
                .map(|o| o.trim_end_matches('/').to_string())
                .unwrap_or(defaults.site_origin),
            geojson: std::env::var("VIAJERO_GEOJSON").ok(),
            reference_dir: std::env::var("VIAJERO_REFERENCE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.reference_dir),
            settings_path: std::env::var("VIAJERO_SETTINGS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_path),
            session_path: defaults.session_path,
            request_timeout_seconds: env_number("VIAJERO_REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            geometry_batch_size: env_number("VIAJERO_GEOMETRY_BATCH_SIZE")
                .filter(|&n| n > 0)
                .unwrap_or(defaults.geometry_batch_size),
            image_timeout_seconds: env_number("VIAJERO_IMAGE_TIMEOUT_SECONDS")
                .unwrap_or(defaults.image_timeout_seconds),
        }
    }

    /// URL the auth service sends users back to: `{site_origin}{base_path}`.
    #[must_use]
    pub fn redirect_url(&self) -> String {
        format!("{}{}", self.site_origin, self.base_path)
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

/// Ensure a base path starts and ends with `/`.
#[must_use]
pub fn normalize_base_path(path: &str) -> String {
    let trimmed = path.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else {
        format!("/{trimmed}/")
    }
}

/// Load backend secrets from file or environment.
fn load_backend_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [".secrets/supabase.json", "../.secrets/supabase.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<BackendSecrets>(path) {
            tracing::info!(path = %path, "Loaded backend secrets from file");
            return (Some(secrets.url), Some(secrets.anon_key));
        }
    }

    tracing::debug!("Backend secrets file not found, using environment variables");
    (
        std::env::var("VIAJERO_API_URL").ok(),
        std::env::var("VIAJERO_ANON_KEY").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn data_dir() -> PathBuf {
    directories::ProjectDirs::from("ro", "viaje", "viajero")
        .map_or_else(|| PathBuf::from(".viajero"), |dirs| dirs.data_dir().to_path_buf())
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = data_dir();
        Self {
            api_url: None,
            anon_key: None,
            base_path: DEFAULT_BASE_PATH.into(),
            site_origin: "http://localhost:8080".into(),
            geojson: None,
            reference_dir: PathBuf::from("data"),
            settings_path: data_dir.join("settings.json"),
            session_path: data_dir.join("session.json"),
            request_timeout_seconds: 30,
            geometry_batch_size: 10,
            image_timeout_seconds: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_paths_gain_slashes() {
        assert_eq!(normalize_base_path("viaje.ro"), "/viaje.ro/");
        assert_eq!(normalize_base_path("/viaje.ro/"), "/viaje.ro/");
        assert_eq!(normalize_base_path(""), "/");
    }

    #[test]
    fn redirect_joins_origin_and_base_path() {
        let config = AppConfig {
            site_origin: "https://example.github.io".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.redirect_url(), "https://example.github.io/viaje.ro/");
    }

    #[test]
    fn defaults_match_the_documented_limits() {
        let config = AppConfig::default();
        assert_eq!(config.geometry_batch_size, 10);
        assert_eq!(config.image_timeout_seconds, 10);
        assert_eq!(config.base_path, DEFAULT_BASE_PATH);
    }
}
