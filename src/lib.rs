#![allow(clippy::missing_errors_doc)]
#![allow(clippy::uninlined_format_args)]

//! # imgedit
//!
//! Thin, well-behaved glue around two hosted image-editing APIs:
//!
//! - **Color transform**: send a set of images that share one object to an image
//!   edit endpoint (OpenAI `gpt-image-1`) with an instruction to recolor that
//!   object, then decode the base64 results into `<stem>_modified.png` files.
//! - **Background removal**: upload one image to the Picsart `removebg` tool,
//!   follow the returned result URL and stream the cutout to disk.
//!
//! Each external service is reached through a trait ([`ImageEditService`],
//! [`BackgroundRemovalService`]) configured by an injected [`ServiceConfig`], so the
//! pipelines run against stub services in tests. Every request is bounded by the
//! configured timeout.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imgedit::{
//!     BackgroundRemovalConfig, BackgroundRemovalPipeline, PicsartClient, RemovalJob,
//!     ServiceConfig,
//! };
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = BackgroundRemovalConfig::builder()
//!     .service(ServiceConfig::picsart().with_api_key("..."))
//!     .build()?;
//! let pipeline = BackgroundRemovalPipeline::new(PicsartClient::new(config)?);
//!
//! let job = RemovalJob::new("photo.png", "out", "photo_cutout.png");
//! if let Some(path) = pipeline.run(&job).await {
//!     println!("saved {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Feature Flags
//!
//! - `cli` (default): the `imgedit` binary, argument parsing and subscriber setup

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod pipelines;
pub mod prompt;
pub mod response;
pub mod services;
#[cfg(feature = "cli")]
pub mod tracing_config;

pub use config::{
    BackgroundRemovalConfig, ColorTransformConfig, FailurePolicy, ServiceConfig, Settings,
};
pub use error::{ImageEditError, Result};
pub use pipelines::{
    BackgroundRemovalPipeline, ColorTransformPipeline, ItemFailure, RecolorReport, RemovalJob,
};
pub use response::{RawResponse, RemovalOutcome};
pub use services::{
    BackgroundRemovalService, DownloadResponse, EditRequest, EditedImage, ImageEditService,
    InputImage, OpenAiImageClient, PicsartClient,
};

#[cfg(feature = "cli")]
pub use tracing_config::{init_cli_tracing, TracingConfig, TracingFormat};
