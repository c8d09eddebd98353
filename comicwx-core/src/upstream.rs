//! Outbound HTTP plumbing shared by the comic source and weather providers.

use std::time::Duration;

use bytes::Bytes;
use reqwest::{RequestBuilder, Response, StatusCode, header::CONTENT_TYPE};

pub use reqwest::Client;

use crate::error::{Error, Result};

const USER_AGENT: &str = concat!("comicwx/", env!("CARGO_PKG_VERSION"));

/// Builds the HTTP client used for every upstream call.
pub fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| Error::internal(format!("failed to build HTTP client: {e}")))
}

/// Sends `request` and fails unless the upstream answered with a success status.
///
/// A 404 from upstream becomes whatever `on_missing` builds; the caller
/// decides whether a missing resource is the client's problem or ours.
pub(crate) async fn send(
    upstream: &'static str,
    request: RequestBuilder,
    on_missing: impl FnOnce() -> Error,
) -> Result<Response> {
    let res = request.send().await.map_err(|e| classify(upstream, e))?;

    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(on_missing());
    }

    let body = res.text().await.unwrap_or_default();
    Err(Error::upstream(
        upstream,
        format!("status {}: {}", status, truncate_body(&body)),
    ))
}

pub(crate) async fn read_text(upstream: &'static str, res: Response) -> Result<String> {
    res.text().await.map_err(|e| classify(upstream, e))
}

/// Reads an image body and its media type.
///
/// A declared non-image content type is a bad payload. Without the header
/// the bytes themselves must look like a known image format.
pub(crate) async fn read_image(upstream: &'static str, res: Response) -> Result<(Bytes, String)> {
    let declared = res
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.split(';').next().unwrap_or(v).trim().to_ascii_lowercase());

    let bytes = res.bytes().await.map_err(|e| classify(upstream, e))?;
    let content_type = image_media_type(declared.as_deref(), &bytes)
        .map_err(|message| Error::upstream(upstream, message))?;
    Ok((bytes, content_type))
}

fn image_media_type(declared: Option<&str>, bytes: &[u8]) -> Result<String, String> {
    match declared {
        Some(ct) if ct.starts_with("image/") => Ok(ct.to_string()),
        Some(ct) if !ct.is_empty() => Err(format!("unexpected content type '{ct}' for an image")),
        _ => image::guess_format(bytes)
            .map(|format| format.to_mime_type().to_string())
            .map_err(|_| "payload is not a recognisable image".to_string()),
    }
}

pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    upstream: &'static str,
    res: Response,
) -> Result<T> {
    let body = read_text(upstream, res).await?;
    serde_json::from_str(&body)
        .map_err(|e| Error::upstream(upstream, format!("malformed JSON payload: {e}")))
}

fn classify(upstream: &'static str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        tracing::warn!(upstream, "upstream request timed out");
        Error::Timeout(upstream)
    } else {
        tracing::warn!(upstream, error = %err, "upstream request failed");
        Error::upstream(upstream, err.to_string())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}
