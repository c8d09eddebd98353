use std::{fmt, str::FromStr};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Largest width or height accepted for a rendered image.
pub const MAX_DIMENSION: u32 = 4096;

/// Metadata for a single published comic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comic {
    pub number: u32,
    pub title: String,
    pub alt_text: String,
    pub page_url: String,
    pub image_url: String,
}

/// Output size of a rendered image, written as `{width}x{height}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Result<Self, Error> {
        if width == 0 || height == 0 {
            return Err(Error::validation(format!(
                "dimensions must be positive, got {width}x{height}"
            )));
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            return Err(Error::validation(format!(
                "dimensions must not exceed {MAX_DIMENSION}x{MAX_DIMENSION}, got {width}x{height}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Builds dimensions from an optional width/height pair where either both
    /// or neither must be present.
    pub fn from_pair(width: Option<u32>, height: Option<u32>) -> Result<Option<Self>, Error> {
        match (width, height) {
            (Some(w), Some(h)) => Self::new(w, h).map(Some),
            (None, None) => Ok(None),
            _ => Err(Error::validation("width and height must be given together")),
        }
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Dimensions {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed =
            || Error::validation(format!("invalid dimensions '{s}', expected WIDTHxHEIGHT (e.g. 800x600)"));

        let (w, h) = s.split_once(['x', 'X']).ok_or_else(malformed)?;
        let parse = |part: &str| -> Result<u32, Error> {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(malformed());
            }
            part.parse().map_err(|_| malformed())
        };

        Self::new(parse(w)?, parse(h)?)
    }
}

/// A syntactically valid US zipcode (`NNNNN` or `NNNNN-NNNN`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Zipcode(String);

impl Zipcode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Zipcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Zipcode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = |part: &str, len: usize| part.len() == len && part.bytes().all(|b| b.is_ascii_digit());

        let valid = match s.split_once('-') {
            Some((base, plus4)) => digits(base, 5) && digits(plus4, 4),
            None => digits(s, 5),
        };

        if valid {
            Ok(Self(s.to_owned()))
        } else {
            Err(Error::validation(format!(
                "invalid zipcode '{s}', expected 5 digits (e.g. 94110)"
            )))
        }
    }
}

/// Which slice of the forecast to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherView {
    #[default]
    Current,
    Today,
    Forecast,
}

impl WeatherView {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherView::Current => "current",
            WeatherView::Today => "today",
            WeatherView::Forecast => "forecast",
        }
    }

    /// The wttr.in view digit for this view.
    pub fn digit(&self) -> char {
        match self {
            WeatherView::Current => '0',
            WeatherView::Today => '1',
            WeatherView::Forecast => '2',
        }
    }
}

impl fmt::Display for WeatherView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherView {
    type Err = Error;

    /// Accepts either the view name or its digit (`0`, `1`, `2`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "0" | "current" => Ok(WeatherView::Current),
            "1" | "today" => Ok(WeatherView::Today),
            "2" | "forecast" => Ok(WeatherView::Forecast),
            _ => Err(Error::validation(
                "invalid view option, use 0, 1 or 2 (current, today, forecast)",
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WeatherRequest {
    pub zipcode: Zipcode,
    pub view: WeatherView,
    pub frame: bool,
    pub dimensions: Option<Dimensions>,
}

impl WeatherRequest {
    pub fn new(zipcode: Zipcode) -> Self {
        Self {
            zipcode,
            view: WeatherView::default(),
            frame: true,
            dimensions: None,
        }
    }
}

/// Textual weather observation for a location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub provider: String,
    pub location_name: String,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub condition: String,
    pub humidity_pct: u8,
    pub wind_speed_mps: f64,
    pub observation_time: DateTime<Utc>,
}

/// Encoded image bytes together with their MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub bytes: Bytes,
    pub content_type: String,
}

impl ImagePayload {
    pub fn new(bytes: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: content_type.into(),
        }
    }

    pub fn jpeg(bytes: impl Into<Bytes>) -> Self {
        Self::new(bytes, "image/jpeg")
    }

    /// File extension matching the content type, used for download names.
    pub fn extension(&self) -> &'static str {
        match self.content_type.as_str() {
            "image/jpeg" | "image/jpg" => "jpg",
            "image/gif" => "gif",
            _ => "png",
        }
    }
}

/// What a weather provider hands back: a rendered image or a summary.
#[derive(Debug, Clone)]
pub enum WeatherReport {
    Image(ImagePayload),
    Summary(WeatherSummary),
}

/// Builds the suffix used when saving a rendered comic to disk: `-{W}x{H}`
/// when the size differs from `default`, followed by `-{number}`.
pub fn output_file_suffix(number: u32, dims: Dimensions, default: Dimensions) -> String {
    let dimension_suffix = if dims == default {
        String::new()
    } else {
        format!("-{dims}")
    };
    format!("{dimension_suffix}-{number}")
}
