// Configuration loading tests

use placecreature::config::*;
use placecreature::retry::RetryPolicy;

#[test]
fn test_full_config_round_trip() {
    let yaml = r#"
server:
  address: "127.0.0.1"
  port: 9090
  threads: 2
  request_timeout: 15
registry:
  namespace: zoo
  path: /tmp/creatures.json
blob_store:
  type: s3
  bucket: creature-images
  region: eu-west-1
  prefix: originals
image_source:
  type: serving_url
  base_url: https://images.example.com
  url_template: "{base}/img/{blob}?size={side}&crop=1"
  timeout_seconds: 3
  retry:
    max_attempts: 2
image:
  quality: 90
  max_dimension: 2000
cache:
  enabled: true
  max_cache_size_mb: 64
  max_item_size_mb: 4
  ttl_seconds: 600
fixtures: fixtures/creatures.json
"#;
    let config = Config::from_yaml_with_env(yaml).expect("config should parse");
    config.validate().expect("config should be valid");

    assert_eq!(config.server.listen_addr(), "127.0.0.1:9090");
    assert_eq!(config.server.threads, 2);
    assert_eq!(config.registry.namespace, "zoo");
    assert_eq!(config.registry.path.as_deref(), Some("/tmp/creatures.json"));

    match &config.blob_store {
        BlobStoreConfig::S3(s3) => {
            assert_eq!(s3.bucket, "creature-images");
            assert_eq!(s3.prefix, "originals");
            assert!(s3.endpoint.is_none());
        }
        other => panic!("expected s3 blob store, got {:?}", other),
    }

    match &config.image_source {
        ImageSourceConfig::ServingUrl(serving) => {
            assert_eq!(serving.timeout_seconds, 3);
            assert_eq!(serving.retry, RetryPolicy::new(2, 100, 1000));
        }
        other => panic!("expected serving_url source, got {:?}", other),
    }

    assert_eq!(config.image.quality, 90);
    assert_eq!(config.image.max_dimension, 2000);
    assert_eq!(config.cache.max_cache_size_mb, 64);
    assert_eq!(config.fixtures.as_deref(), Some("fixtures/creatures.json"));
}

#[test]
fn test_unknown_blob_store_type_is_rejected() {
    let yaml = "blob_store:\n  type: gcs\n";
    assert!(matches!(
        Config::from_yaml_with_env(yaml),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_s3_requires_bucket_and_region() {
    let yaml = "blob_store:\n  type: s3\n  region: us-east-1\n";
    assert!(Config::from_yaml_with_env(yaml).is_err());
}

#[test]
fn test_oversized_item_limit_fails_validation() {
    let yaml = r#"
cache:
  max_cache_size_mb: 1
  max_item_size_mb: 2
"#;
    let config = Config::from_yaml_with_env(yaml).unwrap();
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn test_env_var_in_nested_field() {
    std::env::set_var("PLACECREATURE_IT_BUCKET", "from-env");
    let yaml =
        "blob_store:\n  type: s3\n  bucket: ${PLACECREATURE_IT_BUCKET}\n  region: us-east-1\n";
    let config = Config::from_yaml_with_env(yaml).unwrap();
    match config.blob_store {
        BlobStoreConfig::S3(s3) => assert_eq!(s3.bucket, "from-env"),
        other => panic!("expected s3 blob store, got {:?}", other),
    }
}
