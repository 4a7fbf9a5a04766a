// placecreature: placeholder creature images cropped to any size

pub mod app;
pub mod blob;
pub mod cache;
pub mod config;
pub mod constants;
pub mod creature;
pub mod error;
pub mod image_processor;
pub mod importer;
pub mod logging;
pub mod metrics;
pub mod pipeline;
pub mod registry;
pub mod retry;
pub mod router;
pub mod server;
pub mod source;
