//! Request orchestration shared by the HTTP server and the CLI.

use std::sync::Arc;

use parking_lot::Mutex;
use rand::{SeedableRng, rngs::StdRng};

use crate::{
    comic::{self, ComicSource},
    error::Result,
    model::{Comic, Dimensions, ImagePayload, WeatherReport, WeatherRequest},
    render,
    weather::WeatherProvider,
};

/// Resolves comics (specific or random) and renders them.
#[derive(Debug)]
pub struct ComicService {
    source: Arc<dyn ComicSource>,
    rng: Mutex<StdRng>,
}

impl ComicService {
    pub fn new(source: Arc<dyn ComicSource>) -> Self {
        Self::with_rng(source, StdRng::from_entropy())
    }

    /// Uses `rng` for random selection, so tests can seed it.
    pub fn with_rng(source: Arc<dyn ComicSource>, rng: StdRng) -> Self {
        Self {
            source,
            rng: Mutex::new(rng),
        }
    }

    fn resolve_number(&self, number: Option<u32>) -> u32 {
        number.unwrap_or_else(|| {
            let range = self.source.range();
            let picked = comic::pick_number(&range, &mut *self.rng.lock());
            tracing::debug!(picked, "picked random comic");
            picked
        })
    }

    /// Metadata for `number`, or for a random comic when `None`.
    pub async fn comic(&self, number: Option<u32>) -> Result<Comic> {
        let number = self.resolve_number(number);
        self.source.fetch_comic(number).await
    }

    /// The comic and its image. Without `dimensions` the upstream bytes are
    /// returned untouched; otherwise a JPEG canvas of exactly that size.
    pub async fn comic_image(
        &self,
        number: Option<u32>,
        dimensions: Option<Dimensions>,
    ) -> Result<(Comic, ImagePayload)> {
        let comic = self.comic(number).await?;
        let original = self.source.fetch_image(&comic).await?;

        let Some(dims) = dimensions else {
            return Ok((comic, original));
        };

        let decoded = render::decode(&original.bytes)?;
        let canvas = render::compose_comic(&decoded, &comic.page_url, &comic.alt_text, dims)?;
        let jpeg = render::encode_jpeg(&canvas)?;

        tracing::info!(number = comic.number, size = %dims, "rendered comic");
        Ok((comic, ImagePayload::jpeg(jpeg)))
    }
}

/// Fetches weather from the configured provider and scales images on request.
#[derive(Debug)]
pub struct WeatherService {
    provider: Box<dyn WeatherProvider>,
}

impl WeatherService {
    pub fn new(provider: Box<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    pub async fn report(&self, request: &WeatherRequest) -> Result<WeatherReport> {
        let report = self.provider.get_weather(request).await?;

        match (report, request.dimensions) {
            (WeatherReport::Image(payload), Some(dims)) => {
                let decoded = render::decode(&payload.bytes)?;
                let jpeg = render::encode_jpeg(&render::resize_exact(&decoded, dims))?;
                tracing::debug!(zipcode = %request.zipcode, size = %dims, "scaled weather image");
                Ok(WeatherReport::Image(ImagePayload::jpeg(jpeg)))
            }
            (report, _) => Ok(report),
        }
    }
}
