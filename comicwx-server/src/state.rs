use std::sync::Arc;

use anyhow::{Context, Result};
use comicwx_core::{
    ComicService, Config, SofterWorldSource, WeatherService,
    upstream::{Client, build_client},
    weather::default_provider_from_config,
};

/// Everything a request handler needs, built once at startup.
#[derive(Debug, Clone)]
pub struct AppState {
    pub comics: Arc<ComicService>,
    pub weather: Arc<WeatherService>,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = http_client(config)?;

        Ok(Self {
            comics: Arc::new(comic_service(config, http.clone())?),
            weather: Arc::new(weather_service(config, http)?),
        })
    }
}

pub fn http_client(config: &Config) -> Result<Client> {
    build_client(config.request_timeout()).context("Failed to build HTTP client")
}

pub fn comic_service(config: &Config, http: Client) -> Result<ComicService> {
    let source = SofterWorldSource::new(&config.comic, http).context("Invalid comic configuration")?;
    Ok(ComicService::new(Arc::new(source)))
}

pub fn weather_service(config: &Config, http: Client) -> Result<WeatherService> {
    let provider =
        default_provider_from_config(config, http).context("Invalid weather configuration")?;
    tracing::info!(provider = %provider.id(), "weather provider ready");
    Ok(WeatherService::new(provider))
}
