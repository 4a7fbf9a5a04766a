// Server module - Pingora HTTP service
//
// The service never proxies: `request_filter` answers every request itself
// and returns `Ok(true)`, so `upstream_peer` is unreachable.

pub mod context;

use async_trait::async_trait;
use bytes::Bytes;
use pingora_core::upstreams::peer::HttpPeer;
use pingora_core::Result;
use pingora_http::ResponseHeader;
use pingora_proxy::{ProxyHttp, Session};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::creature::Creature;
use crate::metrics::Metrics;
use crate::pipeline::DeliveryPipeline;
use crate::router::Route;

pub use context::RequestContext;

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// Fully buffered response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub content_type: String,
    pub body: Bytes,
}

impl Reply {
    fn new(status: u16, content_type: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            content_type: content_type.into(),
            body: body.into(),
        }
    }

    fn json(status: u16, value: &serde_json::Value) -> Self {
        Self::new(status, JSON_CONTENT_TYPE, value.to_string())
    }

    fn not_found() -> Self {
        Self::new(404, TEXT_CONTENT_TYPE, "Not Found")
    }

    fn method_not_allowed() -> Self {
        Self::new(405, TEXT_CONTENT_TYPE, "Method Not Allowed")
    }

    fn internal_error() -> Self {
        Self::new(500, TEXT_CONTENT_TYPE, "Internal Server Error")
    }
}

#[derive(Serialize)]
struct CreatureSummary<'a> {
    name: &'a str,
    aliases: &'a [String],
}

#[derive(Serialize)]
struct Attribution<'a> {
    name: &'a str,
    source: &'a str,
    license: &'a str,
    author_name: &'a str,
    author_url: &'a str,
    original_url: &'a str,
}

impl<'a> From<&'a Creature> for Attribution<'a> {
    fn from(creature: &'a Creature) -> Self {
        let provenance = creature.provenance();
        Self {
            name: creature.name(),
            source: &provenance.source,
            license: &provenance.license,
            author_name: &provenance.author_name,
            author_url: &provenance.author_url,
            original_url: &provenance.original_url,
        }
    }
}

pub struct PlaceCreatureService {
    pipeline: Arc<DeliveryPipeline>,
    metrics: Arc<Metrics>,
    request_timeout: Duration,
    start_time: Instant,
}

impl PlaceCreatureService {
    pub fn new(
        pipeline: Arc<DeliveryPipeline>,
        metrics: Arc<Metrics>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            pipeline,
            metrics,
            request_timeout,
            start_time: Instant::now(),
        }
    }

    /// Build the reply for a parsed route
    pub async fn handle(&self, route: &Route, request_id: &str) -> Reply {
        match route {
            Route::Health => {
                let cache = self.pipeline.cache_stats().await;
                Reply::json(
                    200,
                    &serde_json::json!({
                        "status": "healthy",
                        "uptime_seconds": self.start_time.elapsed().as_secs(),
                        "version": env!("CARGO_PKG_VERSION"),
                        "cache": {
                            "entries": cache.current_item_count,
                            "size_bytes": cache.current_size_bytes,
                            "max_size_bytes": cache.max_size_bytes,
                            "hit_rate": cache.hit_rate(),
                        },
                    }),
                )
            }
            Route::Metrics => {
                self.metrics
                    .record_cache_stats(&self.pipeline.cache_stats().await);
                match self.metrics.export_prometheus() {
                    Ok(output) => Reply::new(200, PROMETHEUS_CONTENT_TYPE, output),
                    Err(e) => {
                        tracing::error!(request_id = %request_id, error = %e, "Failed to export metrics");
                        Reply::internal_error()
                    }
                }
            }
            Route::Creatures => self.list(request_id, |creatures| {
                let summaries: Vec<CreatureSummary> = creatures
                    .iter()
                    .map(|c| CreatureSummary {
                        name: c.name(),
                        aliases: c.aliases(),
                    })
                    .collect();
                serde_json::json!({ "creatures": summaries })
            })
            .await,
            Route::Attribution => self.list(request_id, |creatures| {
                let attributions: Vec<Attribution> = creatures.iter().map(Attribution::from).collect();
                serde_json::json!({ "creatures": attributions })
            })
            .await,
            Route::Image {
                identifier,
                width,
                height,
            } => self.image(identifier, *width, *height, request_id).await,
            Route::NotFound => Reply::not_found(),
            Route::MethodNotAllowed => Reply::method_not_allowed(),
        }
    }

    async fn list<F>(&self, request_id: &str, render: F) -> Reply
    where
        F: FnOnce(&[Creature]) -> serde_json::Value,
    {
        match self.pipeline.registry().list_public().await {
            Ok(creatures) => Reply::json(200, &render(&creatures)),
            Err(e) => {
                tracing::error!(request_id = %request_id, error = %e, "Failed to list creatures");
                Reply::internal_error()
            }
        }
    }

    async fn image(&self, identifier: &str, width: u32, height: u32, request_id: &str) -> Reply {
        let served = tokio::time::timeout(
            self.request_timeout,
            self.pipeline.serve(identifier, width, height),
        )
        .await;

        match served {
            Ok(Ok(image)) => Reply::new(200, image.content_type, image.data),
            Ok(Err(err)) => {
                tracing::debug!(
                    request_id = %request_id,
                    identifier = %identifier,
                    error = %err,
                    "Image request answered with not found"
                );
                Reply::new(err.http_status(), TEXT_CONTENT_TYPE, "Not Found")
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %request_id,
                    identifier = %identifier,
                    timeout_ms = self.request_timeout.as_millis() as u64,
                    "Image request timed out"
                );
                self.metrics.record_failure("timeout");
                Reply::not_found()
            }
        }
    }
}

#[async_trait]
impl ProxyHttp for PlaceCreatureService {
    type CTX = RequestContext;

    fn new_ctx(&self) -> Self::CTX {
        RequestContext::new()
    }

    async fn upstream_peer(
        &self,
        _session: &mut Session,
        ctx: &mut Self::CTX,
    ) -> Result<Box<HttpPeer>> {
        Err(pingora_core::Error::explain(
            pingora_core::ErrorType::InternalError,
            format!("request {} reached upstream_peer", ctx.request_id()),
        ))
    }

    async fn request_filter(&self, session: &mut Session, ctx: &mut Self::CTX) -> Result<bool> {
        let req = session.req_header();
        let method = req.method.as_str().to_string();
        let route = Route::parse(&method, req.uri.path());

        let reply = self.handle(&route, ctx.request_id()).await;
        ctx.set_route(route);

        let mut header = ResponseHeader::build(reply.status, None)?;
        header.insert_header("Content-Type", reply.content_type.as_str())?;
        header.insert_header("Content-Length", reply.body.len().to_string())?;
        header.insert_header("X-Request-Id", ctx.request_id().to_string())?;
        if reply.status == 405 {
            header.insert_header("Allow", "GET, HEAD")?;
        }

        let head_only = method == "HEAD";
        session
            .write_response_header(Box::new(header), head_only)
            .await?;
        if !head_only {
            session.write_response_body(Some(reply.body), true).await?;
        }

        Ok(true)
    }

    async fn logging(
        &self,
        session: &mut Session,
        _e: Option<&pingora_core::Error>,
        ctx: &mut Self::CTX,
    ) {
        let status = session
            .response_written()
            .map(|resp| resp.status.as_u16())
            .unwrap_or(500);

        self.metrics.record_request(ctx.route().label(), status);
        tracing::info!(
            request_id = %ctx.request_id(),
            route = ctx.route().label(),
            status = status,
            duration_ms = ctx.elapsed().as_millis() as u64,
            "Request completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::BlobRef;
    use crate::cache::NullCache;
    use crate::creature::Provenance;
    use crate::image_processor::ImageProcessor;
    use crate::registry::{CreatureRegistry, MemoryCreatureStore};
    use crate::source::{ImageSource, SourceError};

    struct FixedSource;

    #[async_trait]
    impl ImageSource for FixedSource {
        async fn fetch_square(&self, _blob_ref: &BlobRef, _side: u32) -> std::result::Result<Bytes, SourceError> {
            Ok(Bytes::from_static(b"square"))
        }
    }

    struct SlowSource;

    #[async_trait]
    impl ImageSource for SlowSource {
        async fn fetch_square(&self, _blob_ref: &BlobRef, _side: u32) -> std::result::Result<Bytes, SourceError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Bytes::from_static(b"late"))
        }
    }

    async fn service_with(source: Arc<dyn ImageSource>, timeout: Duration) -> PlaceCreatureService {
        let registry = CreatureRegistry::new(Arc::new(MemoryCreatureStore::new()), "creatures");
        registry
            .register(
                Creature::new("zebra", Vec::new(), true)
                    .unwrap()
                    .with_blob_ref(BlobRef::new("z")),
            )
            .await
            .unwrap();
        registry
            .register(
                Creature::new("cat", vec!["kitty".to_string()], true)
                    .unwrap()
                    .with_provenance(Provenance {
                        source: "https://example.com/cat.jpg".to_string(),
                        license: "CC-BY".to_string(),
                        author_name: "Jo".to_string(),
                        author_url: "https://example.com/jo".to_string(),
                        original_url: "https://example.com/photo".to_string(),
                    })
                    .with_blob_ref(BlobRef::new("c")),
            )
            .await
            .unwrap();
        registry
            .register(Creature::new("secret", Vec::new(), false).unwrap())
            .await
            .unwrap();

        let metrics = Arc::new(Metrics::new().unwrap());
        let pipeline = DeliveryPipeline::new(
            registry,
            source,
            ImageProcessor::default(),
            Arc::new(NullCache),
            1000,
        )
        .with_metrics(metrics.clone());
        PlaceCreatureService::new(Arc::new(pipeline), metrics, timeout)
    }

    async fn service() -> PlaceCreatureService {
        service_with(Arc::new(FixedSource), Duration::from_secs(5)).await
    }

    fn json(reply: &Reply) -> serde_json::Value {
        serde_json::from_slice(&reply.body).unwrap()
    }

    #[tokio::test]
    async fn test_square_image() {
        let service = service().await;
        let reply = service
            .handle(&Route::parse("GET", "/kitty/10/10"), "req")
            .await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, "image/jpeg");
        assert_eq!(reply.body, Bytes::from_static(b"square"));
    }

    #[tokio::test]
    async fn test_pipeline_failures_are_404() {
        let service = service().await;
        for path in ["/dragon/10/10", "/cat/0/10", "/secret/10/10", "/cat/abc/10"] {
            let reply = service.handle(&Route::parse("GET", path), "req").await;
            assert_eq!(reply.status, 404, "{path}");
        }
        // "square" is not a decodable image, so a crop fails too
        let reply = service.handle(&Route::parse("GET", "/cat/20/10"), "req").await;
        assert_eq!(reply.status, 404);
    }

    #[tokio::test]
    async fn test_slow_source_times_out_as_404() {
        let service = service_with(Arc::new(SlowSource), Duration::from_millis(50)).await;
        let reply = service.handle(&Route::parse("GET", "/cat/10/10"), "req").await;
        assert_eq!(reply.status, 404);
    }

    #[tokio::test]
    async fn test_creatures_listing_is_public_and_sorted() {
        let service = service().await;
        let reply = service.handle(&Route::Creatures, "req").await;
        assert_eq!(reply.status, 200);
        assert_eq!(reply.content_type, JSON_CONTENT_TYPE);

        let body = json(&reply);
        let names: Vec<&str> = body["creatures"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["cat", "zebra"]);
        assert_eq!(body["creatures"][0]["aliases"][0], "kitty");
    }

    #[tokio::test]
    async fn test_attribution_listing() {
        let service = service().await;
        let reply = service.handle(&Route::Attribution, "req").await;
        let body = json(&reply);
        let cat = &body["creatures"][0];
        assert_eq!(cat["name"], "cat");
        assert_eq!(cat["license"], "CC-BY");
        assert_eq!(cat["author_name"], "Jo");
        assert_eq!(cat["original_url"], "https://example.com/photo");
    }

    #[tokio::test]
    async fn test_health() {
        let service = service().await;
        let reply = service.handle(&Route::Health, "req").await;
        assert_eq!(reply.status, 200);
        let body = json(&reply);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let service = service().await;
        service.handle(&Route::parse("GET", "/cat/10/10"), "req").await;
        let reply = service.handle(&Route::Metrics, "req").await;
        assert_eq!(reply.status, 200);
        let text = String::from_utf8(reply.body.to_vec()).unwrap();
        assert!(text.contains("placecreature_upstream_fetches_total"));
    }

    #[tokio::test]
    async fn test_not_found_and_method_not_allowed() {
        let service = service().await;
        assert_eq!(service.handle(&Route::NotFound, "req").await.status, 404);
        assert_eq!(
            service
                .handle(&Route::parse("POST", "/cat/1/1"), "req")
                .await
                .status,
            405
        );
    }
}
