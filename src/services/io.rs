//! File I/O for the pipelines
//!
//! Keeps path derivation, directory creation and writes out of the pipeline
//! logic so both pipelines share the same behavior.

use crate::error::{ImageEditError, Result};
use crate::services::InputImage;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// Suffix appended to the input stem for recolored outputs
pub const RECOLOR_SUFFIX: &str = "_modified";

/// Derive `<output_dir>/<stem>_modified.png` for an input image
///
/// The stem drops only the final extension, so `a.b.png` becomes
/// `a.b_modified.png` rather than being cut at the first dot.
///
/// # Errors
/// - The input path has no file name
pub fn recolor_output_path(output_dir: &Path, input: &Path) -> Result<PathBuf> {
    let stem = input.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
        ImageEditError::invalid_config(format!(
            "Cannot derive output name from '{}'",
            input.display()
        ))
    })?;

    Ok(output_dir.join(format!("{}{}.png", stem, RECOLOR_SUFFIX)))
}

/// Create a directory and its parents if missing (succeeds if it already exists)
///
/// # Errors
/// - The directory cannot be created
pub async fn ensure_dir(dir: &Path) -> Result<()> {
    if dir.as_os_str().is_empty() {
        return Ok(());
    }

    if !dir.is_dir() {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| ImageEditError::file_io_error("create output directory", dir, &e))?;
        tracing::info!(path = %dir.display(), "Created output directory");
    }

    Ok(())
}

/// Detect the MIME type of an image from its content, then its extension
pub fn sniff_mime(bytes: &[u8], path: &Path) -> &'static str {
    image::guess_format(bytes)
        .or_else(|_| image::ImageFormat::from_path(path))
        .map_or("application/octet-stream", |format| format.to_mime_type())
}

/// Read an input image fully into memory
///
/// The file handle is dropped before this returns, on success and on failure.
///
/// # Errors
/// - The file does not exist
/// - The file cannot be read
pub async fn read_input(path: &Path) -> Result<InputImage> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ImageEditError::InputNotFound(path.to_path_buf()));
        },
        Err(e) => return Err(ImageEditError::file_io_error("read input image", path, &e)),
    };

    let file_name = path
        .file_name()
        .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
    let mime = sniff_mime(&bytes, path);

    tracing::debug!(
        path = %path.display(),
        size = bytes.len(),
        mime = %mime,
        "Loaded input image"
    );

    Ok(InputImage {
        path: path.to_path_buf(),
        file_name,
        mime,
        bytes: Bytes::from(bytes),
    })
}

/// Write a whole buffer to `path`, replacing any existing file
///
/// # Errors
/// - The file cannot be created or written
pub async fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| ImageEditError::file_io_error("write output file", path, &e))
}

/// Sibling file a download is streamed into before it replaces `path`
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(std::ffi::OsStr::to_os_string).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Stream chunks into `path` in order, returning the number of bytes written
///
/// Data lands in a `.part` sibling that is renamed over `path` only once the
/// stream completes, so a failed download leaves any earlier file untouched.
///
/// # Errors
/// - The file cannot be created, written or renamed
/// - The stream yields an error
pub async fn write_stream<S>(path: &Path, stream: S, buffer_size: usize) -> Result<u64>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let partial = partial_path(path);
    let file = tokio::fs::File::create(&partial)
        .await
        .map_err(|e| ImageEditError::file_io_error("create output file", &partial, &e))?;

    let result = match copy_chunks(&partial, file, stream, buffer_size).await {
        Ok(written) => tokio::fs::rename(&partial, path)
            .await
            .map(|()| written)
            .map_err(|e| ImageEditError::file_io_error("move output file into place", path, &e)),
        Err(e) => Err(e),
    };

    if result.is_err() {
        if let Err(cleanup_err) = tokio::fs::remove_file(&partial).await {
            tracing::warn!(
                path = %partial.display(),
                error = %cleanup_err,
                "Failed to remove partial output file"
            );
        }
    }
    result
}

async fn copy_chunks<S>(
    path: &Path,
    file: tokio::fs::File,
    mut stream: S,
    buffer_size: usize,
) -> Result<u64>
where
    S: Stream<Item = Result<Bytes>> + Unpin,
{
    let mut writer = tokio::io::BufWriter::with_capacity(buffer_size.max(1), file);
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        writer
            .write_all(&chunk)
            .await
            .map_err(|e| ImageEditError::file_io_error("write output file", path, &e))?;
        written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| ImageEditError::file_io_error("flush output file", path, &e))?;

    Ok(written)
}
