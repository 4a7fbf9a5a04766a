// End-to-end delivery through stored blobs and in-process cropping

use bytes::Bytes;
use placecreature::blob::{BlobStore, MemoryBlobStore};
use placecreature::cache::{CacheConfig, MemoryResponseCache, ResponseCache};
use placecreature::creature::Creature;
use placecreature::error::{NotFoundCause, ServeError};
use placecreature::image_processor::ImageProcessor;
use placecreature::pipeline::DeliveryPipeline;
use placecreature::registry::{CreatureRegistry, MemoryCreatureStore};
use placecreature::source::BlobCropSource;
use std::io::Cursor;
use std::sync::Arc;

fn landscape_png() -> Bytes {
    let img = image::RgbImage::from_fn(400, 300, |x, _| {
        if x < 200 {
            image::Rgb([250, 10, 10])
        } else {
            image::Rgb([10, 10, 250])
        }
    });
    let mut buffer = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, image::ImageOutputFormat::Png)
        .unwrap();
    Bytes::from(buffer.into_inner())
}

async fn pipeline() -> (DeliveryPipeline, Arc<MemoryResponseCache>) {
    let blobs = Arc::new(MemoryBlobStore::new());
    let blob_ref = blobs.put(landscape_png(), "image/png").await.unwrap();

    let registry = CreatureRegistry::new(Arc::new(MemoryCreatureStore::new()), "creatures");
    registry
        .register(
            Creature::new("fox", vec!["vulpes".to_string()], true)
                .unwrap()
                .with_blob_ref(blob_ref),
        )
        .await
        .unwrap();

    let cache = Arc::new(MemoryResponseCache::new(&CacheConfig::default()));
    let processor = ImageProcessor::default();
    let pipeline = DeliveryPipeline::new(
        registry,
        Arc::new(BlobCropSource::new(blobs, processor.clone())),
        processor,
        cache.clone(),
        1000,
    );
    (pipeline, cache)
}

fn dimensions(data: &[u8]) -> (u32, u32) {
    let img = image::load_from_memory(data).unwrap();
    (img.width(), img.height())
}

#[tokio::test]
async fn test_square_and_fill_sizes() {
    let (pipeline, _) = pipeline().await;

    let square = pipeline.serve("fox", 150, 150).await.unwrap();
    assert_eq!(square.content_type, "image/jpeg");
    assert_eq!(dimensions(&square.data), (150, 150));

    let wide = pipeline.serve("fox", 240, 80).await.unwrap();
    assert_eq!(dimensions(&wide.data), (240, 80));

    let tall = pipeline.serve("vulpes", 60, 180).await.unwrap();
    assert_eq!(dimensions(&tall.data), (60, 180));
}

#[tokio::test]
async fn test_repeat_request_is_served_from_cache() {
    let (pipeline, cache) = pipeline().await;

    let first = pipeline.serve("fox", 120, 90).await.unwrap();
    assert!(!first.cache_hit);

    let second = pipeline.serve("fox", 120, 90).await.unwrap();
    assert!(second.cache_hit);
    assert_eq!(first.data, second.data);

    let stats = cache.stats().await;
    assert_eq!(stats.current_item_count, 1);
    assert_eq!(stats.hits, 1);
}

#[tokio::test]
async fn test_unknown_creature_is_not_found() {
    let (pipeline, _) = pipeline().await;
    let err = pipeline.serve("unicorn", 100, 100).await.unwrap_err();
    assert!(matches!(
        err,
        ServeError::NotFound(NotFoundCause::UnknownCreature(ref id)) if id == "unicorn"
    ));
    assert_eq!(err.http_status(), 404);
}
