//! Image encoding: rendered page → PNG bytes or file.
//!
//! PNG keeps rendered text crisp; pages are what the user reads along with
//! the audio, so lossy formats are not offered.

use crate::error::PipelineError;
use crate::output::RenderedPage;
use image::DynamicImage;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Encode a rendered surface as PNG.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    debug!("Encoded {}x{} image → {} bytes PNG", img.width(), img.height(), buf.len());
    Ok(buf)
}

/// File name used for a page: `page-007.png`.
pub fn page_file_name(page_num: usize) -> String {
    format!("page-{:03}.png", page_num)
}

/// Write every page as `page-NNN.png` under `dir`, returning the paths in
/// page order.
pub fn write_pages(pages: &[RenderedPage], dir: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    std::fs::create_dir_all(dir).map_err(|e| PipelineError::Internal(format!(
        "cannot create '{}': {}",
        dir.display(),
        e
    )))?;

    pages
        .iter()
        .map(|page| {
            let png = encode_png(&page.image).map_err(|e| {
                PipelineError::Internal(format!("PNG encoding failed for page {}: {}", page.page_num, e))
            })?;
            let path = dir.join(page_file_name(page.page_num));
            std::fs::write(&path, png).map_err(|e| {
                PipelineError::Internal(format!("cannot write '{}': {}", path.display(), e))
            })?;
            Ok(path)
        })
        .collect()
}
