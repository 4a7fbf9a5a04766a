// Application wiring: import fixtures from a local HTTP server, then serve

use placecreature::app::App;
use placecreature::config::Config;
use placecreature::router::Route;
use std::io::Cursor;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

fn photo() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(320, 240, image::Rgb([90, 140, 60]));
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, image::ImageOutputFormat::Jpeg(85))
        .unwrap();
    buffer.into_inner()
}

/// Serves `/photo.jpg`; every other path is 404
async fn spawn_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = photo();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let mut buf = [0u8; 4096];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request = String::from_utf8_lossy(&buf[..n]).to_string();

            let (status, payload): (u16, &[u8]) = if request.starts_with("GET /photo.jpg ") {
                (200, body.as_slice())
            } else {
                (404, &b""[..])
            };
            let head = format!(
                "HTTP/1.1 {} X\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                status,
                payload.len()
            );
            let _ = socket.write_all(head.as_bytes()).await;
            let _ = socket.write_all(payload).await;
            let _ = socket.shutdown().await;
        }
    });

    format!("http://{}", addr)
}

async fn app_with_fixtures() -> App {
    let origin = spawn_origin().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixtures.json");
    let fixtures = serde_json::json!([
        {
            "name": "frog",
            "is_public": true,
            "aliases": ["toad"],
            "images": [{
                "source": format!("{}/photo.jpg", origin),
                "license": "CC0",
                "author_name": "Sam",
                "author_url": "https://example.com/sam",
                "original_url": "https://example.com/frog"
            }]
        },
        {
            "name": "yeti",
            "is_public": true,
            "images": [{ "source": format!("{}/gone.jpg", origin) }]
        }
    ]);
    std::fs::write(&path, fixtures.to_string()).unwrap();

    let app = App::build(Config::default()).await.unwrap();
    let report = app.import_file(&path).await.unwrap();
    assert_eq!(report.imported, vec!["frog".to_string()]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "yeti");
    app
}

#[tokio::test]
async fn test_imported_creature_is_served() {
    let app = app_with_fixtures().await;
    let service = app.service();

    let reply = service
        .handle(
            &Route::Image {
                identifier: "toad".to_string(),
                width: 200,
                height: 100,
            },
            "req-1",
        )
        .await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.content_type, "image/jpeg");

    let img = image::load_from_memory(&reply.body).unwrap();
    assert_eq!((img.width(), img.height()), (200, 100));
}

#[tokio::test]
async fn test_cache_state_is_reported() {
    let app = app_with_fixtures().await;
    let service = app.service();
    let route = Route::Image {
        identifier: "frog".to_string(),
        width: 90,
        height: 60,
    };
    assert_eq!(service.handle(&route, "req-6").await.status, 200);
    assert_eq!(service.handle(&route, "req-7").await.status, 200);

    let health = service.handle(&Route::Health, "req-8").await;
    let body: serde_json::Value = serde_json::from_slice(&health.body).unwrap();
    assert_eq!(body["cache"]["entries"], 1);
    assert_eq!(body["cache"]["hit_rate"], 0.5);

    let metrics = service.handle(&Route::Metrics, "req-9").await;
    let text = String::from_utf8(metrics.body.to_vec()).unwrap();
    assert!(text.contains("placecreature_cache_entries 1"));
    assert!(text.contains("placecreature_cache_evictions 0"));
}

#[tokio::test]
async fn test_listings_reflect_import() {
    let app = app_with_fixtures().await;
    let service = app.service();

    let creatures = service.handle(&Route::Creatures, "req-2").await;
    let body: serde_json::Value = serde_json::from_slice(&creatures.body).unwrap();
    assert_eq!(body["creatures"][0]["name"], "frog");
    assert_eq!(body["creatures"][0]["aliases"][0], "toad");
    assert_eq!(body["creatures"].as_array().unwrap().len(), 1);

    let attribution = service.handle(&Route::Attribution, "req-3").await;
    let body: serde_json::Value = serde_json::from_slice(&attribution.body).unwrap();
    assert_eq!(body["creatures"][0]["license"], "CC0");
    assert_eq!(body["creatures"][0]["author_name"], "Sam");
}

#[tokio::test]
async fn test_failed_import_and_unknown_routes_are_404() {
    let app = app_with_fixtures().await;
    let service = app.service();

    let yeti = service
        .handle(
            &Route::Image {
                identifier: "yeti".to_string(),
                width: 100,
                height: 100,
            },
            "req-4",
        )
        .await;
    assert_eq!(yeti.status, 404);

    let missing = service.handle(&Route::NotFound, "req-5").await;
    assert_eq!(missing.status, 404);
}

#[tokio::test]
async fn test_reimport_skips_existing_names() {
    let app = app_with_fixtures().await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("again.json");
    std::fs::write(&path, r#"[{"name": "frog", "images": []}]"#).unwrap();

    let report = app.import_file(&path).await.unwrap();
    assert_eq!(report.skipped, vec!["frog".to_string()]);
    assert!(report.imported.is_empty());
}
