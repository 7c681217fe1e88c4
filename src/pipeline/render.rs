//! Page rasterisation at a fixed magnification.
//!
//! The surface size is the page's native box (in points) times `scale`, the
//! same convention as a 72-dpi viewport. A render either completes and
//! yields a whole bitmap or fails; no partially drawn surface is returned.

use crate::document::Document;
use crate::error::RenderError;
use crate::output::RenderedPage;
use tracing::debug;

/// Default magnification applied to every page.
pub const DEFAULT_SCALE: f32 = 1.5;

/// Rasterise `page_num` into the slot at `index`.
pub fn render_page(
    document: &dyn Document,
    page_num: usize,
    index: usize,
    scale: f32,
) -> Result<RenderedPage, RenderError> {
    let image = document.render(page_num, scale)?;

    if image.width() == 0 || image.height() == 0 {
        return Err(RenderError {
            page: page_num,
            detail: format!("empty surface ({}x{})", image.width(), image.height()),
        });
    }

    debug!(
        "Rendered page {} → {}x{} px (slot {})",
        page_num,
        image.width(),
        image.height(),
        index
    );

    Ok(RenderedPage {
        index,
        page_num,
        image,
    })
}
