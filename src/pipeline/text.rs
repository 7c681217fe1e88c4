//! Per-page text extraction.
//!
//! Fragments are joined in the order the parser reports them. For
//! multi-column or rotated layouts that order can differ from reading order;
//! it is passed through unchanged.

use crate::document::Document;
use crate::error::ExtractError;
use tracing::debug;

/// The text of `page_num`: every fragment, joined by single spaces.
pub fn extract_text(document: &dyn Document, page_num: usize) -> Result<String, ExtractError> {
    let fragments = document.text_fragments(page_num)?;
    let text = fragments.join(" ");
    debug!(
        "Page {}: {} fragments, {} chars",
        page_num,
        fragments.len(),
        text.len()
    );
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use image::DynamicImage;

    struct Fragments(Vec<&'static str>);

    impl Document for Fragments {
        fn page_count(&self) -> usize {
            1
        }

        fn render(&self, page: usize, _scale: f32) -> Result<DynamicImage, RenderError> {
            Err(RenderError {
                page,
                detail: "not used".into(),
            })
        }

        fn text_fragments(&self, _page: usize) -> Result<Vec<String>, ExtractError> {
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    #[test]
    fn fragments_join_with_single_spaces_in_parser_order() {
        let doc = Fragments(vec!["right column", "left column", "footer"]);
        assert_eq!(
            extract_text(&doc, 1).unwrap(),
            "right column left column footer"
        );
    }

    #[test]
    fn fragment_whitespace_is_preserved() {
        let doc = Fragments(vec!["Hello,", " world ", ""]);
        assert_eq!(extract_text(&doc, 1).unwrap(), "Hello,  world  ");
    }

    #[test]
    fn page_without_text_yields_empty_string() {
        let doc = Fragments(vec![]);
        assert_eq!(extract_text(&doc, 1).unwrap(), "");
    }
}
