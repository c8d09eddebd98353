use async_trait::async_trait;
use reqwest::Client;

use crate::{
    error::{Error, Result},
    model::{ImagePayload, WeatherReport, WeatherRequest},
    upstream,
};

use super::{ProviderId, WeatherProvider};

const DEFAULT_BASE_URL: &str = "https://wttr.in";
const UPSTREAM: &str = "wttr.in";

/// PNG weather renderings from wttr.in, in metric units.
#[derive(Debug, Clone)]
pub struct WttrProvider {
    base_url: String,
    http: Client,
}

impl WttrProvider {
    pub fn new(base_url: Option<&str>, http: Client) -> Self {
        Self {
            base_url: base_url
                .unwrap_or(DEFAULT_BASE_URL)
                .trim_end_matches('/')
                .to_string(),
            http,
        }
    }

    /// `{base}/{zip}_{options}.png?m`, where options are the view digit,
    /// `q` (no "Weather report" header) and `p` (frame) when requested.
    pub fn image_url(&self, request: &WeatherRequest) -> String {
        let mut options = String::with_capacity(3);
        options.push(request.view.digit());
        options.push('q');
        if request.frame {
            options.push('p');
        }

        format!("{}/{}_{}.png?m", self.base_url, request.zipcode, options)
    }
}

#[async_trait]
impl WeatherProvider for WttrProvider {
    fn id(&self) -> ProviderId {
        ProviderId::Wttr
    }

    async fn get_weather(&self, request: &WeatherRequest) -> Result<WeatherReport> {
        let url = self.image_url(request);
        tracing::debug!(zipcode = %request.zipcode, %url, "fetching weather image");

        let res = upstream::send(UPSTREAM, self.http.get(&url), || {
            Error::not_found(format!("no weather available for zipcode {}", request.zipcode))
        })
        .await?;
        let (bytes, content_type) = upstream::read_image(UPSTREAM, res).await?;

        tracing::info!(zipcode = %request.zipcode, bytes = bytes.len(), "fetched weather image");
        Ok(WeatherReport::Image(ImagePayload::new(bytes, content_type)))
    }
}
