//! Recolor the object shared by a set of images with one edit request

use crate::config::{ColorTransformConfig, FailurePolicy};
use crate::error::{ImageEditError, Result};
use crate::prompt::recolor_instruction;
use crate::services::{io, EditRequest, EditedImage, ImageEditService};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::{Path, PathBuf};
use tracing::Instrument;

/// A result that could not be saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    /// Position of the result in the service response
    pub index: usize,
    /// Input the result belongs to (`None` when the service returned extra results)
    pub input: Option<PathBuf>,
    pub error: String,
}

/// Summary of one recolor run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecolorReport {
    /// Written output files, in result order
    pub saved: Vec<PathBuf>,
    /// Results that could not be decoded, written or matched to an input
    pub failures: Vec<ItemFailure>,
    /// Inputs for which the service returned no result
    pub missing: Vec<PathBuf>,
}

impl RecolorReport {
    /// Every input produced an output
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.missing.is_empty()
    }
}

/// Color-transform pipeline bound to one edit service
pub struct ColorTransformPipeline<S> {
    service: S,
    config: ColorTransformConfig,
}

impl<S: ImageEditService> ColorTransformPipeline<S> {
    pub fn new(service: S, config: ColorTransformConfig) -> Self {
        Self { service, config }
    }

    pub fn config(&self) -> &ColorTransformConfig {
        &self.config
    }

    /// Recolor the common object in `image_paths` to `colour`
    ///
    /// Every input is read before the request is sent, so an unreadable input
    /// aborts the batch without any network traffic. Result `i` is written to
    /// `<output_dir>/<stem of input i>_modified.png`.
    ///
    /// # Errors
    /// - Empty input list or blank colour
    /// - Two inputs mapping to the same output file
    /// - Missing or unreadable input file
    /// - Edit request failure (nothing is written)
    /// - Output directory creation failure
    /// - A result failure under [`FailurePolicy::Abort`]
    pub async fn run<P: AsRef<Path>>(&self, image_paths: &[P], colour: &str) -> Result<RecolorReport> {
        let span = tracing::info_span!(
            "recolor",
            colour = %colour,
            image_count = image_paths.len(),
            output_dir = %self.config.output_dir.display()
        );
        self.run_inner(image_paths, colour).instrument(span).await
    }

    async fn run_inner<P: AsRef<Path>>(
        &self,
        image_paths: &[P],
        colour: &str,
    ) -> Result<RecolorReport> {
        if image_paths.is_empty() {
            return Err(ImageEditError::invalid_config("at least one input image is required"));
        }
        if colour.trim().is_empty() {
            return Err(ImageEditError::invalid_config("target colour must not be empty"));
        }

        let mut images = Vec::with_capacity(image_paths.len());
        let mut outputs = Vec::with_capacity(image_paths.len());
        for path in image_paths {
            let path = path.as_ref();
            let output = io::recolor_output_path(&self.config.output_dir, path)?;
            if outputs.contains(&output) {
                return Err(ImageEditError::invalid_config(format!(
                    "'{}' would overwrite the output of an earlier input ({})",
                    path.display(),
                    output.display()
                )));
            }
            outputs.push(output);
            images.push(io::read_input(path).await?);
        }
        let inputs: Vec<PathBuf> = images.iter().map(|image| image.path.clone()).collect();

        let request = EditRequest {
            model: self.config.model.clone(),
            prompt: recolor_instruction(colour),
            images,
        };

        tracing::info!(model = %request.model, "Requesting recolor of {} image(s)", inputs.len());
        let results = self.service.edit(request).await?;

        if results.len() != inputs.len() {
            tracing::warn!(
                expected = inputs.len(),
                received = results.len(),
                "Result count does not match input count"
            );
        }

        io::ensure_dir(&self.config.output_dir).await?;

        let mut report = RecolorReport::default();
        for (index, result) in results.iter().enumerate() {
            let Some(output) = outputs.get(index) else {
                tracing::warn!(index, "Result has no matching input; skipping");
                report.failures.push(ItemFailure {
                    index,
                    input: None,
                    error: "no matching input image".to_string(),
                });
                continue;
            };

            match save_result(result, output).await {
                Ok(()) => {
                    tracing::info!("Modified image saved to: {}", output.display());
                    report.saved.push(output.clone());
                },
                Err(e) if self.config.failure_policy == FailurePolicy::Abort => {
                    tracing::error!(index, error = %e, "Failed to save result; aborting batch");
                    return Err(e);
                },
                Err(e) => {
                    tracing::warn!(index, error = %e, "Failed to save result; continuing");
                    report.failures.push(ItemFailure {
                        index,
                        input: inputs.get(index).cloned(),
                        error: e.to_string(),
                    });
                },
            }
        }

        report.missing = inputs.iter().skip(results.len()).cloned().collect();
        for input in &report.missing {
            tracing::warn!(input = %input.display(), "No result returned for input");
        }

        Ok(report)
    }
}

/// Decode one base64 result and write it to `output`
async fn save_result(result: &EditedImage, output: &Path) -> Result<()> {
    if result.b64_json.is_empty() {
        return Err(ImageEditError::unexpected_response(
            "result carries no base64 image payload",
        ));
    }

    let bytes = STANDARD.decode(result.b64_json.trim())?;
    if image::guess_format(&bytes).is_err() {
        tracing::debug!(path = %output.display(), "Decoded result is not a recognized image format");
    }

    io::write_file(output, &bytes).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_result_decodes_base64() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("a_modified.png");
        let result = EditedImage {
            b64_json: STANDARD.encode(b"PNGDATA"),
        };

        save_result(&result, &output).await.unwrap();
        assert_eq!(std::fs::read(&output).unwrap(), b"PNGDATA");
    }

    #[tokio::test]
    async fn test_save_result_rejects_bad_payloads() {
        let temp = TempDir::new().unwrap();
        let output = temp.path().join("a_modified.png");

        let empty = EditedImage {
            b64_json: String::new(),
        };
        assert!(matches!(
            save_result(&empty, &output).await,
            Err(ImageEditError::UnexpectedResponse(_))
        ));

        let invalid = EditedImage {
            b64_json: "***not base64***".to_string(),
        };
        assert!(matches!(
            save_result(&invalid, &output).await,
            Err(ImageEditError::Decode(_))
        ));
        assert!(!output.exists());
    }

    #[test]
    fn test_report_completeness() {
        let mut report = RecolorReport::default();
        assert!(report.is_complete());

        report.missing.push(PathBuf::from("jeans.png"));
        assert!(!report.is_complete());
    }
}
