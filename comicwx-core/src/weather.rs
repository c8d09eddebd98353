//! Weather providers and their construction from configuration.

use std::{
    fmt::{self, Debug},
    str::FromStr,
};

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    Config, WeatherReport, WeatherRequest,
    error::{Error, Result},
};

pub mod openweather;
pub mod wttr;

use openweather::OpenWeatherProvider;
use wttr::WttrProvider;

/// Known weather backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    /// wttr.in PNG renderings, no credentials.
    Wttr,
    /// OpenWeatherMap current conditions, needs an API key.
    OpenWeather,
}

const NAMES: &[(&str, ProviderId)] = &[
    ("wttr", ProviderId::Wttr),
    ("wttr.in", ProviderId::Wttr),
    ("openweather", ProviderId::OpenWeather),
    ("openweathermap", ProviderId::OpenWeather),
];

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::Wttr => "wttr",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        matches!(self, ProviderId::OpenWeather)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderId {
    type Err = anyhow::Error;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let wanted = name.trim().to_ascii_lowercase();
        NAMES
            .iter()
            .find(|(alias, _)| *alias == wanted)
            .map(|(_, id)| *id)
            .ok_or_else(|| {
                anyhow::anyhow!("Unknown provider '{name}', expected one of: wttr, openweather")
            })
    }
}

#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    /// Fetches a renderable weather report. One upstream round trip per call
    /// for image providers; nothing is cached.
    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReport>;
}

/// Builds the provider `id`, sharing `http` for its requests.
pub fn provider_from_config(
    id: ProviderId,
    config: &Config,
    http: Client,
) -> Result<Box<dyn WeatherProvider>> {
    let base_url = config.provider_base_url(id);

    let boxed: Box<dyn WeatherProvider> = match id {
        ProviderId::Wttr => Box::new(WttrProvider::new(base_url, http)),
        ProviderId::OpenWeather => {
            let api_key = config.provider_api_key(id).ok_or_else(|| {
                Error::Config(format!(
                    "{id} needs an API key: run `comicwx configure {id}` \
                     or set OPENWEATHERMAP_API_KEY"
                ))
            })?;
            Box::new(OpenWeatherProvider::new(api_key.to_owned(), base_url, http))
        }
    };

    Ok(boxed)
}

pub fn default_provider_from_config(
    config: &Config,
    http: Client,
) -> Result<Box<dyn WeatherProvider>> {
    let id = config
        .default_provider_id()
        .map_err(|e| Error::Config(e.to_string()))?;
    provider_from_config(id, config, http)
}
