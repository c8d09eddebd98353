use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comicwx_core::{
    Config, Dimensions, ProviderId, WeatherReport, WeatherRequest, WeatherSummary, WeatherView,
    Zipcode, model::output_file_suffix,
};

use crate::{routes, state};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "comicwx", version, about = "Comic and weather image service")]
pub struct Cli {
    /// Config file to use instead of the platform default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the HTTP server.
    Serve {
        /// Address to bind, overriding config and COMICWX_HOST.
        #[arg(long)]
        host: Option<String>,

        /// Port to bind, overriding config and COMICWX_PORT.
        #[arg(long)]
        port: Option<u16>,
    },

    /// Configure credentials for a weather provider.
    Configure {
        /// Provider short name, e.g. "wttr" or "openweather".
        provider: String,
    },

    /// Render a comic to a JPEG file.
    Comic {
        /// Comic number; a random one when omitted.
        number: Option<u32>,

        /// Canvas size as WIDTHxHEIGHT; the configured default when omitted.
        #[arg(long)]
        size: Option<Dimensions>,

        /// Output directory.
        #[arg(long, default_value = "build")]
        out: PathBuf,
    },

    /// Fetch the weather for a zipcode.
    Weather {
        zipcode: Zipcode,

        /// current, today or forecast.
        #[arg(long, default_value = "current")]
        view: WeatherView,

        /// Scale the image to WIDTHxHEIGHT.
        #[arg(long)]
        size: Option<Dimensions>,

        /// Leave out the frame around the rendering.
        #[arg(long)]
        no_frame: bool,

        /// Output directory for images.
        #[arg(long, default_value = "build")]
        out: PathBuf,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => Config::config_file_path()?,
        };

        match self.command {
            Command::Serve { host, port } => {
                let mut config = load_config(&config_path)?;
                if let Some(host) = host {
                    config.server.host = host;
                }
                if let Some(port) = port {
                    config.server.port = port;
                }
                serve(config).await
            }
            Command::Configure { provider } => configure(&config_path, &provider),
            Command::Comic { number, size, out } => {
                let config = load_config(&config_path)?;
                render_comic(&config, number, size, out).await
            }
            Command::Weather {
                zipcode,
                view,
                size,
                no_frame,
                out,
            } => {
                let config = load_config(&config_path)?;
                let request = WeatherRequest {
                    zipcode,
                    view,
                    frame: !no_frame,
                    dimensions: size,
                };
                show_weather(&config, request, out).await
            }
        }
    }
}

fn load_config(path: &std::path::Path) -> Result<Config> {
    let mut config = Config::load_from(path)?;
    config.apply_env()?;
    tracing::debug!(path = %path.display(), "loaded configuration");
    Ok(config)
}

async fn serve(config: Config) -> Result<()> {
    let state = state::AppState::from_config(&config)?;
    let app = routes::router(state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}

fn configure(path: &std::path::Path, provider: &str) -> Result<()> {
    let id: ProviderId = provider.parse()?;
    let mut config = Config::load_from(path)?;

    if id.requires_api_key() {
        let key = inquire::Password::new(&format!("{id} API key:"))
            .without_confirmation()
            .prompt()
            .context("Failed to read API key")?;
        config.upsert_provider_api_key(id, key.trim().to_string());
    }

    let question = format!("Use {id} as the default weather provider?");
    let make_default = inquire::Confirm::new(&question)
        .with_default(true)
        .prompt()
        .context("Failed to read answer")?;
    if make_default {
        config.set_default_provider(id);
    }

    config.save_to(path)?;
    println!("Saved configuration to {}", path.display());
    Ok(())
}

async fn render_comic(
    config: &Config,
    number: Option<u32>,
    size: Option<Dimensions>,
    out: PathBuf,
) -> Result<()> {
    let default_size = config.comic.default_dimensions()?;
    let size = size.unwrap_or(default_size);

    let comics = state::comic_service(config, state::http_client(config)?)?;
    let (comic, image) = comics.comic_image(number, Some(size)).await?;
    println!("Processing comic #{}: {}", comic.number, comic.title);

    let path = out.join(format!(
        "softer_world{}.jpg",
        output_file_suffix(comic.number, size, default_size)
    ));
    write_file(&path, &image.bytes).await?;

    println!("Generated image saved as: {}", path.display());
    Ok(())
}

async fn show_weather(config: &Config, request: WeatherRequest, out: PathBuf) -> Result<()> {
    let weather = state::weather_service(config, state::http_client(config)?)?;

    match weather.report(&request).await? {
        WeatherReport::Image(image) => {
            let path = out.join(format!(
                "weather_{}_{}.{}",
                request.zipcode,
                request.view,
                image.extension()
            ));
            write_file(&path, &image.bytes).await?;
            println!("Weather image saved as: {}", path.display());
        }
        WeatherReport::Summary(summary) => print_summary(&summary),
    }
    Ok(())
}

fn print_summary(summary: &WeatherSummary) {
    println!("{} ({})", summary.location_name, summary.provider);
    println!("  {}", summary.condition);
    println!(
        "  {:.1}°C, feels like {:.1}°C",
        summary.temperature_c, summary.feels_like_c
    );
    println!(
        "  humidity {}%, wind {:.1} m/s",
        summary.humidity_pct, summary.wind_speed_mps
    );
    println!(
        "  observed {}",
        summary.observation_time.format("%Y-%m-%d %H:%M UTC")
    );
}

async fn write_file(path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
