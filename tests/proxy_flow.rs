//! End-to-end tests: client → proxy → mock upstream.

use axum::http::StatusCode;
use funky_proxy::config::ProxyConfig;
use image::ImageFormat;
use std::collections::HashMap;
use std::time::Duration;

mod common;
use common::{
    client, closed_addr, cookie_pair, solid_image, start_proxy, start_upstream, MockResponse,
};

fn png_red() -> Vec<u8> {
    solid_image(ImageFormat::Png, 2, 2, [255, 0, 0, 255])
}

fn decode_first_pixel(bytes: &[u8]) -> [u8; 4] {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .unwrap()
        .to_rgba8()
        .get_pixel(0, 0)
        .0
}

#[tokio::test]
async fn test_explicit_base_binds_and_transforms() {
    let upstream = start_upstream(HashMap::from([(
        "/img/red.png",
        MockResponse::ok("image/png", png_red()),
    )]))
    .await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let res = client()
        .get(format!("http://{proxy}/img/red.png"))
        .query(&[("__base", upstream.base())])
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    let cookie = cookie_pair(&res).expect("binding sets a cookie");
    assert!(cookie.starts_with("proxy-base-url="));

    let body = res.bytes().await.unwrap();
    assert_eq!(decode_first_pixel(&body), [0, 255, 255, 255]);

    // The reserved parameter never reaches the upstream.
    assert_eq!(upstream.requests(), vec!["/img/red.png".to_string()]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_relative_request_uses_session() {
    let upstream = start_upstream(HashMap::from([
        ("/", MockResponse::ok("text/html", "<img src=\"/a.png\">")),
        ("/a.png", MockResponse::ok("image/png", png_red())),
    ]))
    .await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;
    let client = client();

    let first = client
        .get(format!("http://{proxy}/"))
        .query(&[("__base", upstream.base())])
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(first.headers()["content-type"], "text/html");
    let cookie = cookie_pair(&first).unwrap();
    assert_eq!(first.text().await.unwrap(), "<img src=\"/a.png\">");

    let second = client
        .get(format!("http://{proxy}/a.png"))
        .header("cookie", cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    assert!(cookie_pair(&second).is_none());
    let body = second.bytes().await.unwrap();
    assert_eq!(decode_first_pixel(&body), [0, 255, 255, 255]);

    assert_eq!(upstream.requests(), vec!["/".to_string(), "/a.png".to_string()]);
    shutdown.trigger();
}

#[tokio::test]
async fn test_query_preserved_without_base_param() {
    let upstream = start_upstream(HashMap::from([(
        "/search",
        MockResponse::ok("text/plain", "results"),
    )]))
    .await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let url = format!("http://{proxy}/search?q=cats&page=2&__base={}", upstream.base());
    let res = client().get(url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "results");
    assert_eq!(upstream.requests(), vec!["/search?q=cats&page=2".to_string()]);

    shutdown.trigger();
}

#[tokio::test]
async fn test_no_session_is_500() {
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let res = client()
        .get(format!("http://{proxy}/img/red.png"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(cookie_pair(&res).is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_404_forwarded() {
    let upstream = start_upstream(HashMap::new()).await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let res = client()
        .get(format!("http://{proxy}/missing.png"))
        .query(&[("__base", upstream.base())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert!(cookie_pair(&res).is_some());

    shutdown.trigger();
}

#[tokio::test]
async fn test_upstream_error_body_untouched() {
    let upstream = start_upstream(HashMap::from([(
        "/broken",
        MockResponse::status(503, "text/plain", "try later"),
    )]))
    .await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let res = client()
        .get(format!("http://{proxy}/broken"))
        .query(&[("__base", upstream.base())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.text().await.unwrap(), "try later");

    shutdown.trigger();
}

#[tokio::test]
async fn test_unsupported_image_passes_through() {
    let bmp = solid_image(ImageFormat::Bmp, 2, 2, [10, 20, 30, 255]);
    let upstream = start_upstream(HashMap::from([(
        "/pic.bmp",
        MockResponse::ok("image/bmp", bmp.clone()),
    )]))
    .await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let res = client()
        .get(format!("http://{proxy}/pic.bmp"))
        .query(&[("__base", upstream.base())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/bmp");
    assert_eq!(res.bytes().await.unwrap().as_ref(), bmp.as_slice());

    shutdown.trigger();
}

#[tokio::test]
async fn test_corrupt_image_falls_back() {
    let upstream = start_upstream(HashMap::from([(
        "/bad.png",
        MockResponse::ok("image/png", b"not a png".to_vec()),
    )]))
    .await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let res = client()
        .get(format!("http://{proxy}/bad.png"))
        .query(&[("__base", upstream.base())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.headers()["content-type"], "image/png");
    assert_eq!(res.bytes().await.unwrap().as_ref(), b"not a png");

    shutdown.trigger();
}

#[tokio::test]
async fn test_jpeg_becomes_png() {
    let jpeg = solid_image(ImageFormat::Jpeg, 8, 8, [255, 255, 255, 255]);
    let upstream = start_upstream(HashMap::from([(
        "/white.jpg",
        MockResponse::ok("image/jpeg", jpeg),
    )]))
    .await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let res = client()
        .get(format!("http://{proxy}/white.jpg"))
        .query(&[("__base", upstream.base())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers()["content-type"], "image/png");
    let [r, g, b, a] = decode_first_pixel(&res.bytes().await.unwrap());
    assert!(r < 8 && g < 8 && b < 8, "expected near black, got {r},{g},{b}");
    assert_eq!(a, 255);

    shutdown.trigger();
}

#[tokio::test]
async fn test_transform_disabled() {
    let png = png_red();
    let upstream = start_upstream(HashMap::from([(
        "/red.png",
        MockResponse::ok("image/png", png.clone()),
    )]))
    .await;
    let mut config = ProxyConfig::default();
    config.transform.enabled = false;
    let (proxy, shutdown) = start_proxy(config).await;

    let res = client()
        .get(format!("http://{proxy}/red.png"))
        .query(&[("__base", upstream.base())])
        .send()
        .await
        .unwrap();
    assert_eq!(res.bytes().await.unwrap().as_ref(), png.as_slice());

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_upstream_is_500() {
    let dead = closed_addr().await;
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let res = client()
        .get(format!("http://{proxy}/x.png"))
        .query(&[("__base", format!("http://{dead}/"))])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = res.text().await.unwrap();
    assert!(body.contains("Error fetching"), "{body}");
    assert!(body.contains(&dead.to_string()), "{body}");

    shutdown.trigger();
}

#[tokio::test]
async fn test_invalid_base_is_500_without_cookie() {
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let res = client()
        .get(format!("http://{proxy}/x"))
        .query(&[("__base", "ftp://example.com/")])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(cookie_pair(&res).is_none());

    shutdown.trigger();
}

#[tokio::test]
async fn test_session_expires() {
    let upstream =
        start_upstream(HashMap::from([("/", MockResponse::ok("text/plain", "hi"))])).await;
    let mut config = ProxyConfig::default();
    config.session.ttl_secs = 1;
    let (proxy, shutdown) = start_proxy(config).await;
    let client = client();

    let first = client
        .get(format!("http://{proxy}/"))
        .query(&[("__base", upstream.base())])
        .send()
        .await
        .unwrap();
    let cookie = cookie_pair(&first).unwrap();

    tokio::time::sleep(Duration::from_millis(1500)).await;

    let res = client
        .get(format!("http://{proxy}/again"))
        .header("cookie", cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);

    shutdown.trigger();
}

#[tokio::test]
async fn test_landing_page() {
    let (proxy, shutdown) = start_proxy(ProxyConfig::default()).await;

    let res = client().get(format!("http://{proxy}/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("text/html"));
    assert!(res.text().await.unwrap().contains("__base"));

    shutdown.trigger();
}
