// Constants module - centralized default values for configuration
//
// This module defines all default values used throughout the codebase.
// Using constants instead of magic numbers keeps defaults in one place.

// =============================================================================
// Server defaults
// =============================================================================

/// Default bind address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default number of worker threads
pub const DEFAULT_THREADS: usize = 4;

// =============================================================================
// Registry defaults
// =============================================================================

/// Namespace every creature is stored under unless configured otherwise
pub const DEFAULT_NAMESPACE: &str = "creatures";

// =============================================================================
// Image source defaults
// =============================================================================

/// Default upstream fetch timeout in seconds
pub const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 10;

/// Default serving URL template (`{base}`, `{blob}` and `{side}` are substituted)
pub const DEFAULT_URL_TEMPLATE: &str = "{base}/{blob}=s{side}-c";

/// Default key prefix for blobs written to S3
pub const DEFAULT_BLOB_PREFIX: &str = "creatures";

// =============================================================================
// Image defaults
// =============================================================================

/// Default JPEG quality
pub const DEFAULT_JPEG_QUALITY: u8 = 80;

/// Largest width or height a request may ask for
pub const DEFAULT_MAX_DIMENSION: u32 = 4096;

/// Largest decoded source image (pixels) accepted
pub const DEFAULT_MAX_SOURCE_PIXELS: u64 = 100_000_000;

/// Largest source file accepted by the importer (bytes)
pub const DEFAULT_MAX_SOURCE_BYTES: usize = 50 * 1024 * 1024;

/// Delivery content type
pub const JPEG_CONTENT_TYPE: &str = "image/jpeg";

// =============================================================================
// Cache defaults
// =============================================================================

/// Default maximum item size in megabytes
pub const DEFAULT_MAX_ITEM_SIZE_MB: u64 = 10;

/// Default maximum cache size in megabytes
pub const DEFAULT_MAX_CACHE_SIZE_MB: u64 = 256;

/// Default TTL in seconds
pub const DEFAULT_TTL_SECONDS: u64 = 3600;
