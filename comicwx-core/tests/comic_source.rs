//! Integration tests for SofterWorldSource against a mock comic site.

use std::time::Duration;

use comicwx_core::{ComicConfig, ComicSource, Error, SofterWorldSource, upstream::build_client};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn page(src: &str, title: &str) -> String {
    format!(
        r#"<html><body><div id="comicimg"><img src="{src}" title="{title}"></div></body></html>"#
    )
}

fn source(server: &MockServer, timeout: Duration) -> SofterWorldSource {
    let cfg = ComicConfig {
        base_url: server.uri(),
        first: 1,
        last: 100,
        ..ComicConfig::default()
    };
    SofterWorldSource::new(&cfg, build_client(timeout).unwrap()).unwrap()
}

#[tokio::test]
async fn test_fetch_comic_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .and(query_param("id", "42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(page("/clean/anger.jpg", "i kept it all")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let comic = source(&mock_server, Duration::from_secs(5))
        .fetch_comic(42)
        .await
        .unwrap();

    assert_eq!(comic.number, 42);
    assert_eq!(comic.title, "i kept it all");
    assert_eq!(comic.image_url, format!("{}/clean/anger.jpg", mock_server.uri()));
    assert_eq!(comic.page_url, format!("{}/index.php?id=42", mock_server.uri()));
}

#[tokio::test]
async fn test_repeated_fetches_are_identical() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("a.png", "same")))
        .mount(&mock_server)
        .await;

    let src = source(&mock_server, Duration::from_secs(5));
    let first = src.fetch_comic(3).await.unwrap();
    let second = src.fetch_comic(3).await.unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_out_of_range_is_not_found_without_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let src = source(&mock_server, Duration::from_secs(5));
    for number in [0, 101, u32::MAX] {
        let err = src.fetch_comic(number).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)), "{number}: {err}");
    }
}

#[tokio::test]
async fn test_upstream_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let err = source(&mock_server, Duration::from_secs(5))
        .fetch_comic(5)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Upstream { .. }));
    assert!(err.to_string().contains("503"), "Error should mention status: {err}");
}

#[tokio::test]
async fn test_upstream_404_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let err = source(&mock_server, Duration::from_secs(5))
        .fetch_comic(5)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_slow_upstream_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(page("a.png", "late"))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let err = source(&mock_server, Duration::from_millis(200))
        .fetch_comic(5)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Timeout(_)), "expected timeout, got {err}");
}

#[tokio::test]
async fn test_fetch_image_keeps_content_type() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page("/img/7.gif", "gif")))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/img/7.gif"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "image/gif")
                .set_body_bytes(b"GIF89a".to_vec()),
        )
        .mount(&mock_server)
        .await;

    let src = source(&mock_server, Duration::from_secs(5));
    let comic = src.fetch_comic(7).await.unwrap();
    let image = src.fetch_image(&comic).await.unwrap();

    assert_eq!(image.content_type, "image/gif");
    assert_eq!(&image.bytes[..], b"GIF89a");
}

async fn mount_page(mock_server: &MockServer, src: &str) {
    Mock::given(method("GET"))
        .and(path("/index.php"))
        .respond_with(ResponseTemplate::new(200).set_body_string(page(src, "broken")))
        .mount(mock_server)
        .await;
}

#[tokio::test]
async fn test_fetch_image_rejects_html_body() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/img/5.png").await;

    Mock::given(method("GET"))
        .and(path("/img/5.png"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>Moved</html>", "text/html"),
        )
        .mount(&mock_server)
        .await;

    let src = source(&mock_server, Duration::from_secs(5));
    let comic = src.fetch_comic(5).await.unwrap();
    let err = src.fetch_image(&comic).await.unwrap_err();

    assert!(matches!(err, Error::Upstream { .. }), "expected upstream error, got {err}");
    assert!(err.to_string().contains("text/html"));
}

#[tokio::test]
async fn test_missing_image_for_existing_comic_is_upstream() {
    let mock_server = MockServer::start().await;
    mount_page(&mock_server, "/gone.png").await;

    Mock::given(method("GET"))
        .and(path("/gone.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let src = source(&mock_server, Duration::from_secs(5));
    let comic = src.fetch_comic(5).await.unwrap();
    let err = src.fetch_image(&comic).await.unwrap_err();

    assert!(matches!(err, Error::Upstream { .. }), "expected upstream error, got {err}");
}
