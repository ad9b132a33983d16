//! imgedit CLI tool
//!
//! Recolors images and removes backgrounds through hosted image-editing APIs.

use imgedit::cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}
