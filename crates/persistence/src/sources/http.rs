//! Zone dataset fetched from an HTTP endpoint.

use std::time::Duration;

use reqwest::Client;

use crate::entities::{parse_rows, ZoneRow};
use crate::sources::{ZoneSource, ZoneSourceError, ZoneSourceKind};

#[derive(Debug, Clone)]
pub struct HttpZoneSource {
    client: Client,
    url: String,
}

impl HttpZoneSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, ZoneSourceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ZoneSourceError::Http(e.to_string()))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait::async_trait]
impl ZoneSource for HttpZoneSource {
    fn kind(&self) -> ZoneSourceKind {
        ZoneSourceKind::Http
    }

    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn fetch(&self) -> Result<Vec<ZoneRow>, ZoneSourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ZoneSourceError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ZoneSourceError::Http(format!(
                "{} returned status {}",
                self.url, status
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ZoneSourceError::Http(e.to_string()))?;
        Ok(parse_rows(&bytes)?)
    }
}
