//! End-to-end workflows: read inputs, call the service, persist results

pub mod background_removal;
pub mod color_transform;

pub use background_removal::{BackgroundRemovalPipeline, RemovalJob};
pub use color_transform::{ColorTransformPipeline, ItemFailure, RecolorReport};
