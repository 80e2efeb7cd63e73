//! Placeholder asset generation.
//!
//! The manifest references four logo sizes; this module renders solid-color
//! placeholder PNGs for each so the packager accepts the staging tree.

use crate::pipeline::error::{Error, Result};
use std::path::{Path, PathBuf};

/// Logo files the manifest references, with their pixel dimensions.
const ASSET_SPECS: &[(&str, u32, u32)] = &[
    ("StoreLogo.png", 50, 50),
    ("Square150x150Logo.png", 150, 150),
    ("Square44x44Logo.png", 44, 44),
    ("Wide310x150Logo.png", 310, 150),
];

/// Placeholder fill color (opaque slate blue).
const FILL: image::Rgba<u8> = image::Rgba([58, 74, 96, 255]);

/// Generates the placeholder logos into the assets directory.
pub async fn generate_assets(assets_dir: &Path) -> Result<()> {
    let dir: PathBuf = assets_dir.to_path_buf();

    // Image encoding is synchronous; keep it off the async executor.
    tokio::task::spawn_blocking(move || -> Result<()> {
        for (name, width, height) in ASSET_SPECS {
            let path = dir.join(name);
            let buffer = image::ImageBuffer::from_pixel(*width, *height, FILL);
            if let Err(e) = image::DynamicImage::ImageRgba8(buffer).save(&path) {
                crate::bail!("failed to write asset {}: {}", name, e);
            }
        }
        Ok(())
    })
    .await
    .map_err(|e| Error::GenericError(format!("asset generation task panicked: {}", e)))?
}
