//! Where station readings come from.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Url;
use tracing::debug;

use crate::fetch::{HttpClient, fetch_bytes};
use crate::parser::{LastData, parse_last_data};
use crate::stations::Station;

/// Public endpoint serving device feeds by slug.
pub const DEFAULT_BASE_URL: &str = "https://lightning.ambientweather.net";

/// Abstraction over a provider of per-station readings.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Returns the station's most recent reading.
    async fn last_data(&self, station: &Station) -> Result<LastData>;
}

/// Reads the public Ambient Weather device feed.
pub struct AmbientWeather<C> {
    client: C,
    base_url: String,
}

impl<C: HttpClient> AmbientWeather<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// `<base>/devices?public.slug=<slug>`
    pub fn device_url(&self, slug: &str) -> Result<Url> {
        let url = Url::parse_with_params(
            &format!("{}/devices", self.base_url),
            &[("public.slug", slug)],
        )?;
        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClient> WeatherSource for AmbientWeather<C> {
    async fn last_data(&self, station: &Station) -> Result<LastData> {
        let url = self.device_url(&station.slug)?;
        let bytes = fetch_bytes(&self.client, url.as_str())
            .await
            .with_context(|| format!("fetch failed for station '{}'", station.name))?;
        debug!(bytes = bytes.len(), "Feed bytes received, parsing");
        parse_last_data(&bytes)
            .with_context(|| format!("unreadable feed for station '{}'", station.name))
    }
}
