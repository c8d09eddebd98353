use std::ops::RangeInclusive;

use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{Html, Selector};

use crate::{
    config::ComicConfig,
    error::{Error, Result},
    model::{Comic, ImagePayload},
    upstream,
};

use super::ComicSource;

const UPSTREAM: &str = "comic source";

/// A Softer World, scraped from its `index.php?id=N` pages.
#[derive(Debug, Clone)]
pub struct SofterWorldSource {
    base_url: String,
    range: RangeInclusive<u32>,
    http: Client,
}

impl SofterWorldSource {
    pub fn new(config: &ComicConfig, http: Client) -> Result<Self> {
        if config.first == 0 || config.first > config.last {
            return Err(Error::Config(format!(
                "Invalid comic range {}..={}: numbers start at 1 and first must not exceed last",
                config.first, config.last
            )));
        }

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            range: config.first..=config.last,
            http,
        })
    }

    pub fn page_url(&self, number: u32) -> String {
        format!("{}/index.php?id={}", self.base_url, number)
    }
}

#[async_trait]
impl ComicSource for SofterWorldSource {
    fn range(&self) -> RangeInclusive<u32> {
        self.range.clone()
    }

    async fn fetch_comic(&self, number: u32) -> Result<Comic> {
        if !self.range.contains(&number) {
            return Err(Error::not_found(format!(
                "comic {number} does not exist (valid range {}-{})",
                self.range.start(),
                self.range.end()
            )));
        }

        let page_url = self.page_url(number);
        tracing::debug!(number, url = %page_url, "fetching comic page");

        let res = upstream::send(UPSTREAM, self.http.get(&page_url), || {
            Error::not_found(format!("comic {number} not found"))
        })
        .await?;
        let html = upstream::read_text(UPSTREAM, res).await?;

        let comic = parse_comic_page(number, &page_url, &html)?;
        tracing::debug!(number, title = %comic.title, "resolved comic");
        Ok(comic)
    }

    async fn fetch_image(&self, comic: &Comic) -> Result<ImagePayload> {
        tracing::debug!(number = comic.number, url = %comic.image_url, "downloading comic image");

        // The page exists, so a missing image is a broken link upstream.
        let res = upstream::send(UPSTREAM, self.http.get(&comic.image_url), || {
            Error::upstream(UPSTREAM, format!("image for comic {} is missing", comic.number))
        })
        .await?;
        let (bytes, content_type) = upstream::read_image(UPSTREAM, res).await?;

        Ok(ImagePayload::new(bytes, content_type))
    }
}

/// Extracts the comic image (`#comicimg > img`) from a comic page. The image
/// `title` attribute doubles as the caption.
fn parse_comic_page(number: u32, page_url: &str, html: &str) -> Result<Comic> {
    let selector = Selector::parse("#comicimg > img")
        .map_err(|e| Error::internal(format!("invalid comic selector: {e}")))?;

    let document = Html::parse_document(html);
    let img = document
        .select(&selector)
        .next()
        .ok_or_else(|| Error::upstream(UPSTREAM, "could not find comic image element"))?;

    let src = img
        .value()
        .attr("src")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| Error::upstream(UPSTREAM, "comic image element has no src"))?;

    let image_url = Url::parse(page_url)
        .and_then(|base| base.join(src))
        .map_err(|e| Error::upstream(UPSTREAM, format!("invalid image URL '{src}': {e}")))?;

    let title = img.value().attr("title").unwrap_or_default().trim().to_string();

    Ok(Comic {
        number,
        alt_text: title.clone(),
        title,
        page_url: page_url.to_string(),
        image_url: image_url.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div id="comicimg">
            <img src="clean/sadness.jpg" title="we were young and we were happy" />
          </div>
        </body></html>
    "#;

    #[test]
    fn parses_relative_image_and_caption() {
        let comic = parse_comic_page(12, "https://example.com/index.php?id=12", PAGE).unwrap();

        assert_eq!(comic.number, 12);
        assert_eq!(comic.image_url, "https://example.com/clean/sadness.jpg");
        assert_eq!(comic.title, "we were young and we were happy");
        assert_eq!(comic.alt_text, comic.title);
    }

    #[test]
    fn keeps_absolute_image_urls() {
        let html = r#"<div id="comicimg"><img src="https://cdn.example.org/a.png"></div>"#;
        let comic = parse_comic_page(1, "https://example.com/index.php?id=1", html).unwrap();

        assert_eq!(comic.image_url, "https://cdn.example.org/a.png");
        assert!(comic.title.is_empty());
    }

    #[test]
    fn missing_image_is_an_upstream_error() {
        let err = parse_comic_page(1, "https://example.com/index.php?id=1", "<p>nothing</p>")
            .unwrap_err();
        assert!(matches!(err, Error::Upstream { .. }));
    }

    #[test]
    fn rejects_inverted_range() {
        let cfg = ComicConfig {
            first: 10,
            last: 2,
            ..ComicConfig::default()
        };
        let err = SofterWorldSource::new(&cfg, Client::new()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn page_url_ignores_trailing_slash() {
        let cfg = ComicConfig {
            base_url: "https://example.com/".into(),
            ..ComicConfig::default()
        };
        let source = SofterWorldSource::new(&cfg, Client::new()).unwrap();
        assert_eq!(source.page_url(7), "https://example.com/index.php?id=7");
    }
}
