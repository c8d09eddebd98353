//! Core library for the `comicwx` service.
//!
//! This crate defines:
//! - Configuration handling
//! - The comic source and weather provider abstractions
//! - Image composition for comics and weather renderings
//! - Shared domain models and the error taxonomy
//!
//! It is used by `comicwx-server`, which exposes it over HTTP and as a CLI.

pub mod comic;
pub mod config;
pub mod error;
pub mod model;
pub mod render;
pub mod service;
pub mod upstream;
pub mod weather;

pub use comic::{ComicSource, SofterWorldSource};
pub use config::{ComicConfig, Config, ProviderConfig, ServerConfig};
pub use error::{Error, ErrorKind, Result};
pub use model::{
    Comic, Dimensions, ImagePayload, WeatherReport, WeatherRequest, WeatherSummary, WeatherView,
    Zipcode,
};
pub use service::{ComicService, WeatherService};
pub use weather::{ProviderId, WeatherProvider};
