//! Zone data source management.
//!
//! A source yields the raw zone dataset as undecoded rows; decoding and
//! validation of each row happen in the repository.

mod file;
mod http;

pub use file::FileZoneSource;
pub use http::HttpZoneSource;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::entities::ZoneRow;

/// Where the zone dataset is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoneSourceKind {
    File,
    Http,
}

impl ZoneSourceKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "file" => Some(ZoneSourceKind::File),
            "http" | "https" => Some(ZoneSourceKind::Http),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneSourceKind::File => "file",
            ZoneSourceKind::Http => "http",
        }
    }
}

/// Zone source configuration.
#[derive(Debug, Clone)]
pub struct ZoneSourceConfig {
    pub kind: ZoneSourceKind,
    pub path: PathBuf,
    pub url: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum ZoneSourceError {
    #[error("Failed to read zone file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Zone endpoint request failed: {0}")]
    Http(String),

    #[error("Zone dataset is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Zone source is misconfigured: {0}")]
    Config(String),
}

/// Yields the raw zone dataset.
#[async_trait::async_trait]
pub trait ZoneSource: Send + Sync {
    /// Source kind, used as a metrics label.
    fn kind(&self) -> ZoneSourceKind;

    /// Human-readable location for logs.
    fn describe(&self) -> String;

    /// Fails only when the dataset is unreachable or not a JSON array.
    async fn fetch(&self) -> Result<Vec<ZoneRow>, ZoneSourceError>;
}

/// Creates the zone source described by the configuration.
pub fn create_source(config: &ZoneSourceConfig) -> Result<Arc<dyn ZoneSource>, ZoneSourceError> {
    match config.kind {
        ZoneSourceKind::File => Ok(Arc::new(FileZoneSource::new(config.path.clone()))),
        ZoneSourceKind::Http => {
            let url = config
                .url
                .clone()
                .filter(|u| !u.trim().is_empty())
                .ok_or_else(|| ZoneSourceError::Config("http source requires a url".to_string()))?;
            let source = HttpZoneSource::new(url, Duration::from_secs(config.timeout_secs))?;
            Ok(Arc::new(source))
        }
    }
}
