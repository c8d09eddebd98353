//! HTTP endpoints.

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, Query, State},
    http::{
        HeaderValue, StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use comicwx_core::{
    Comic, Dimensions, Error, ImagePayload, WeatherReport, WeatherRequest, WeatherView, Zipcode,
};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::{error::ApiError, state::AppState};

type ApiResult<T> = Result<T, ApiError>;

/// Bytes escaped in `X-Comic-Title`; non-ASCII is always escaped.
const TITLE_ESCAPES: &AsciiSet = &CONTROLS.add(b'%');

/// The route table. Built once at startup.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/comic", get(random_comic))
        .route("/comic/info/{number}", get(comic_info))
        .route("/comic/{number}", get(specific_comic))
        .route("/comic/{number}/{dimensions}", get(sized_comic))
        .route("/weather/{zipcode}", get(weather))
        .route("/weather/{zipcode}/current", get(current_weather))
        .route("/weather/{zipcode}/today", get(today_weather))
        .route("/weather/{zipcode}/forecast", get(forecast_weather))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Optional `?width=&height=` on comic routes.
#[derive(Debug, Default, Deserialize)]
struct SizeQuery {
    width: Option<String>,
    height: Option<String>,
}

impl SizeQuery {
    fn dimensions(&self) -> Result<Option<Dimensions>, Error> {
        Dimensions::from_pair(
            parse_dimension(self.width.as_deref(), "width")?,
            parse_dimension(self.height.as_deref(), "height")?,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
struct WeatherQuery {
    view: Option<String>,
    frame: Option<String>,
    #[serde(flatten)]
    size: SizeQuery,
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "comicwx",
        "endpoints": {
            "/": "Health check",
            "/comic": "Random comic",
            "/comic/{number}": "Specific comic",
            "/comic/{number}/{width}x{height}": "Specific comic at a custom size",
            "/comic/info/{number}": "Comic metadata",
            "/weather/{zipcode}": "Weather image for a zipcode",
            "/weather/{zipcode}/current": "Current weather only",
            "/weather/{zipcode}/today": "Today's forecast",
            "/weather/{zipcode}/forecast": "Two-day forecast"
        }
    }))
}

async fn random_comic(
    State(state): State<AppState>,
    Query(query): Query<SizeQuery>,
) -> ApiResult<Response> {
    serve_comic(&state, None, query.dimensions()?).await
}

async fn specific_comic(
    State(state): State<AppState>,
    Path(number): Path<String>,
    Query(query): Query<SizeQuery>,
) -> ApiResult<Response> {
    let number = parse_comic_number(&number)?;
    serve_comic(&state, Some(number), query.dimensions()?).await
}

async fn sized_comic(
    State(state): State<AppState>,
    Path((number, dimensions)): Path<(String, String)>,
) -> ApiResult<Response> {
    let number = parse_comic_number(&number)?;
    let dimensions: Dimensions = dimensions.parse()?;
    serve_comic(&state, Some(number), Some(dimensions)).await
}

async fn comic_info(
    State(state): State<AppState>,
    Path(number): Path<String>,
) -> ApiResult<Json<Comic>> {
    let number = parse_comic_number(&number)?;
    let comic = state.comics.comic(Some(number)).await?;
    Ok(Json(comic))
}

async fn weather(
    State(state): State<AppState>,
    Path(zipcode): Path<String>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<Response> {
    let view = match query.view.as_deref() {
        Some(view) => view.parse()?,
        None => WeatherView::default(),
    };
    serve_weather(&state, &zipcode, view, &query).await
}

async fn current_weather(
    State(state): State<AppState>,
    Path(zipcode): Path<String>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<Response> {
    serve_weather(&state, &zipcode, WeatherView::Current, &query).await
}

async fn today_weather(
    State(state): State<AppState>,
    Path(zipcode): Path<String>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<Response> {
    serve_weather(&state, &zipcode, WeatherView::Today, &query).await
}

async fn forecast_weather(
    State(state): State<AppState>,
    Path(zipcode): Path<String>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<Response> {
    serve_weather(&state, &zipcode, WeatherView::Forecast, &query).await
}

async fn serve_comic(
    state: &AppState,
    number: Option<u32>,
    dimensions: Option<Dimensions>,
) -> ApiResult<Response> {
    let (comic, payload) = state.comics.comic_image(number, dimensions).await?;

    let filename = format!("softer_world_{}.{}", comic.number, payload.extension());
    let mut response = image_response(payload, &filename);

    let headers = response.headers_mut();
    headers.insert("x-comic-number", HeaderValue::from(comic.number));
    let title = utf8_percent_encode(&comic.title, TITLE_ESCAPES).to_string();
    if let Ok(title) = HeaderValue::from_str(&title) {
        headers.insert("x-comic-title", title);
    }

    Ok(response)
}

/// Validates everything before the provider is called.
async fn serve_weather(
    state: &AppState,
    zipcode: &str,
    view: WeatherView,
    query: &WeatherQuery,
) -> ApiResult<Response> {
    let zipcode: Zipcode = zipcode.parse()?;
    let frame = match query.frame.as_deref() {
        None => true,
        Some(v) => v.eq_ignore_ascii_case("true"),
    };

    let request = WeatherRequest {
        zipcode,
        view,
        frame,
        dimensions: query.size.dimensions()?,
    };

    match state.weather.report(&request).await? {
        WeatherReport::Image(payload) => {
            let filename = format!("weather_{}_{}.{}", request.zipcode, view, payload.extension());
            Ok(image_response(payload, &filename))
        }
        WeatherReport::Summary(summary) => Ok(Json(summary).into_response()),
    }
}

fn image_response(payload: ImagePayload, filename: &str) -> Response {
    let content_type = HeaderValue::from_str(&payload.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response = (StatusCode::OK, Body::from(payload.bytes)).into_response();
    let headers = response.headers_mut();
    headers.insert(CONTENT_TYPE, content_type);
    if let Ok(disposition) = HeaderValue::from_str(&format!("inline; filename=\"{filename}\"")) {
        headers.insert(CONTENT_DISPOSITION, disposition);
    }
    response
}

/// Non-numeric ids are malformed input; numeric ids that cannot be a
/// published comic (zero, negative, any size) are simply not found.
fn parse_comic_number(raw: &str) -> Result<u32, Error> {
    let digits = raw.strip_prefix('-').unwrap_or(raw);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::validation(format!("invalid comic number '{raw}'")));
    }

    raw.parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| Error::not_found(format!("comic {raw} does not exist")))
}

fn parse_dimension(raw: Option<&str>, name: &str) -> Result<Option<u32>, Error> {
    raw.map(|v| {
        v.parse::<u32>()
            .map_err(|_| Error::validation(format!("{name} must be a positive integer, got '{v}'")))
    })
    .transpose()
}
