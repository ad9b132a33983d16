//! Configuration conversion utilities for CLI arguments

use crate::cli::main_impl::{Cli, RecolorArgs, RemoveBgArgs};
use crate::config::{
    BackgroundRemovalConfig, ColorTransformConfig, FailurePolicy, ServiceConfig, Settings,
    DEFAULT_EDIT_MODEL,
};
use anyhow::{Context, Result};
use std::time::Duration;

/// Merge CLI arguments, settings file and defaults into pipeline configurations
///
/// Precedence: command line / environment, then settings file, then defaults.
pub(crate) struct CliConfigBuilder;

impl CliConfigBuilder {
    pub(crate) fn color_transform(
        cli: &Cli,
        args: &RecolorArgs,
        settings: &Settings,
    ) -> Result<ColorTransformConfig> {
        let service = Self::layer(
            settings.openai.apply(ServiceConfig::openai()),
            cli.openai_api_key.as_deref(),
            cli.timeout,
        );

        let model = args
            .model
            .clone()
            .or_else(|| settings.openai.model.clone())
            .unwrap_or_else(|| DEFAULT_EDIT_MODEL.to_string());

        let failure_policy = if args.abort_on_item_failure {
            FailurePolicy::Abort
        } else {
            FailurePolicy::Isolate
        };

        ColorTransformConfig::builder()
            .service(service)
            .model(model)
            .output_dir(args.output_dir.clone())
            .failure_policy(failure_policy)
            .build()
            .context("Invalid configuration")
    }

    pub(crate) fn background_removal(
        cli: &Cli,
        args: &RemoveBgArgs,
        settings: &Settings,
    ) -> Result<BackgroundRemovalConfig> {
        let service = Self::layer(
            settings.picsart.apply(ServiceConfig::picsart()),
            cli.picsart_api_key.as_deref(),
            cli.timeout,
        );

        BackgroundRemovalConfig::builder()
            .service(service)
            .chunk_size(args.chunk_size)
            .build()
            .context("Invalid configuration")
    }

    fn layer(mut service: ServiceConfig, api_key: Option<&str>, timeout: Option<u64>) -> ServiceConfig {
        if let Some(key) = api_key {
            service.api_key = Some(key.to_string());
        }
        if let Some(secs) = timeout {
            service.timeout = Duration::from_secs(secs);
        }
        service
    }
}
