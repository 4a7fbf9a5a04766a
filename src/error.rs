//! Errors surfaced by image delivery
//!
//! Every failure maps to HTTP 404 at the edge; the variants keep the cause
//! for logging and metrics.

use thiserror::Error;

use crate::image_processor::ImageError;
use crate::registry::RegistryError;
use crate::source::SourceError;

/// Why a request could not be matched to an image
#[derive(Debug, Error)]
pub enum NotFoundCause {
    #[error("invalid dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("no creature named '{0}'")]
    UnknownCreature(String),

    #[error("creature '{0}' has no stored image")]
    MissingBlob(String),

    #[error("registry unavailable: {0}")]
    Registry(RegistryError),

    #[error("upstream fetch failed: {0}")]
    Upstream(#[source] SourceError),
}

#[derive(Debug, Error)]
pub enum ServeError {
    #[error("not found: {0}")]
    NotFound(#[from] NotFoundCause),

    #[error("failed to decode source image: {0}")]
    Decode(ImageError),

    #[error("failed to produce output image: {0}")]
    Encode(ImageError),
}

impl ServeError {
    /// Status code reported to clients
    pub fn http_status(&self) -> u16 {
        404
    }

    /// Short label used as a metrics dimension
    pub fn kind(&self) -> &'static str {
        match self {
            ServeError::NotFound(NotFoundCause::InvalidDimensions { .. }) => "invalid_dimensions",
            ServeError::NotFound(NotFoundCause::UnknownCreature(_)) => "unknown_creature",
            ServeError::NotFound(NotFoundCause::MissingBlob(_)) => "missing_blob",
            ServeError::NotFound(NotFoundCause::Registry(_)) => "registry",
            ServeError::NotFound(NotFoundCause::Upstream(_)) => "upstream",
            ServeError::Decode(_) => "decode",
            ServeError::Encode(_) => "encode",
        }
    }
}
