use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::{Error, Result},
    model::{WeatherReport, WeatherRequest, WeatherSummary, Zipcode},
    upstream,
};

use super::{ProviderId, WeatherProvider};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
const UPSTREAM: &str = "OpenWeather";

/// Current conditions from OpenWeatherMap, located through its zip geocoder.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: Option<&str>, http: Client) -> Self {
        Self {
            api_key,
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            http,
        }
    }

    async fn locate(&self, zipcode: &Zipcode) -> Result<OwGeo> {
        let url = format!("{}/geo/1.0/zip", self.base_url);
        let zip = format!("{},US", zip_base(zipcode));

        let req = self
            .http
            .get(url)
            .query(&[("zip", zip.as_str()), ("appid", self.api_key.as_str())]);

        let res = upstream::send(UPSTREAM, req, || {
            Error::not_found(format!("unknown zipcode {zipcode}"))
        })
        .await?;
        upstream::read_json(UPSTREAM, res).await
    }

    async fn fetch_current(&self, geo: &OwGeo) -> Result<WeatherSummary> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let lat = geo.lat.to_string();
        let lon = geo.lon.to_string();

        let req = self.http.get(url).query(&[
            ("lat", lat.as_str()),
            ("lon", lon.as_str()),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
        ]);

        let res = upstream::send(UPSTREAM, req, || {
            Error::not_found(format!("no weather available for {}", geo.name))
        })
        .await?;
        let parsed: OwCurrentResponse = upstream::read_json(UPSTREAM, res).await?;

        let observation_time = DateTime::<Utc>::from_timestamp(parsed.dt, 0).unwrap_or_else(Utc::now);

        let condition = parsed
            .weather
            .first()
            .map(|w| w.description.clone())
            .unwrap_or_else(|| "Unknown".to_string());

        let location_name = match &geo.country {
            Some(country) => format!("{}, {}", geo.name, country),
            None => geo.name.clone(),
        };

        Ok(WeatherSummary {
            provider: ProviderId::OpenWeather.to_string(),
            location_name,
            temperature_c: parsed.main.temp,
            feels_like_c: parsed.main.feels_like,
            condition,
            humidity_pct: parsed.main.humidity,
            wind_speed_mps: parsed.wind.speed,
            observation_time,
        })
    }
}

/// The geocoder only understands the five-digit form.
fn zip_base(zipcode: &Zipcode) -> &str {
    zipcode
        .as_str()
        .split_once('-')
        .map_or(zipcode.as_str(), |(base, _)| base)
}

#[derive(Debug, Deserialize)]
struct OwGeo {
    name: String,
    lat: f64,
    lon: f64,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    dt: i64,
    main: OwMain,
    weather: Vec<OwWeather>,
    wind: OwWind,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReport> {
        let geo = self.locate(&request.zipcode).await?;
        tracing::debug!(zipcode = %request.zipcode, name = %geo.name, "resolved zipcode");

        let summary = self.fetch_current(&geo).await?;
        Ok(WeatherReport::Summary(summary))
    }
}
