use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub web: WebConfig,
    pub ingest: IngestConfig,
    pub epg: EpgConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Primary playlist source. Empty means ingestion is unconfigured and
    /// every trigger fails before the checking phase.
    pub playlist_url: String,
    /// Root directory for bucket files, the index and the ingest state.
    pub channels_dir: PathBuf,
    /// Prefix for bucket URLs in the index; empty means relative paths.
    pub public_base_url: String,
    pub readme_title: String,
    /// Buckets larger than this are split into ordered chunks; 0 = unlimited.
    pub max_items_per_file: usize,
    pub split_by_group: bool,
    pub split_by_language: bool,
    pub split_by_country: bool,
    /// Regex markers matched against "name group-title url"; series wins ties.
    pub series_markers: Vec<String>,
    pub vod_markers: Vec<String>,
    /// Bearer token required on the ingest trigger; empty means open.
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpgConfig {
    /// XMLTV guide source. Empty means the EPG query endpoint returns a
    /// client error.
    pub url: String,
    /// JSON file the default channel provider reads the caller channel list
    /// from.
    pub channels_file: PathBuf,
    pub cache_ttl_seconds: u64,
    pub fetch_timeout_seconds: u64,
    /// Forward schedule window when the request does not specify one.
    pub default_range_hours: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            ingest: IngestConfig {
                playlist_url: String::new(),
                channels_dir: PathBuf::from("./data/channels"),
                public_base_url: String::new(),
                readme_title: "IPTV Index".to_string(),
                max_items_per_file: 1000,
                split_by_group: false,
                split_by_language: false,
                split_by_country: false,
                series_markers: vec![
                    r"(?i)\bseries\b".to_string(),
                    r"(?i)S\d{1,2}E\d{1,2}".to_string(),
                    "/series/".to_string(),
                ],
                vod_markers: vec![
                    r"(?i)\bvod\b".to_string(),
                    r"(?i)\bmovie(s)?\b".to_string(),
                    "/movie/".to_string(),
                ],
                token: String::new(),
            },
            epg: EpgConfig {
                url: String::new(),
                channels_file: PathBuf::from("./data/channels.json"),
                cache_ttl_seconds: 600,
                fetch_timeout_seconds: 20,
                default_range_hours: 24,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(&config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::create_dir_all("./data/channels")?;
            std::fs::write(&config_file, contents)?;
            Ok(default_config)
        }
    }
}
