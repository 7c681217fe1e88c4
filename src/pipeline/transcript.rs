//! The labeled, page-ordered text that is sent for synthesis.

use crate::output::PageText;
use serde::Serialize;
use std::fmt;

/// Separator between page blocks: one blank line.
pub const BLOCK_SEPARATOR: &str = "\n\n";

/// Ordered `Page {n}: {text}` blocks for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pages: Vec<PageText>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append the text of one page.
    ///
    /// Entries are kept sorted by page number, so out-of-order completion
    /// (if pages were ever processed in parallel) still yields an ascending
    /// transcript.
    pub fn push(&mut self, page: PageText) {
        let pos = self
            .pages
            .partition_point(|p| p.page_num <= page.page_num);
        self.pages.insert(pos, page);
    }

    pub fn pages(&self) -> &[PageText] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Page labels in transcript order, e.g. `["Page 2:", "Page 3:"]`.
    pub fn labels(&self) -> Vec<String> {
        self.pages.iter().map(|p| label(p.page_num)).collect()
    }

    /// The request payload: blocks joined by a blank line.
    pub fn render(&self) -> String {
        self.pages
            .iter()
            .map(|p| format!("{} {}", label(p.page_num), p.text))
            .collect::<Vec<_>>()
            .join(BLOCK_SEPARATOR)
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

fn label(page_num: usize) -> String {
    format!("Page {}:", page_num)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(n: usize, text: &str) -> PageText {
        PageText {
            page_num: n,
            text: text.to_string(),
        }
    }

    #[test]
    fn blocks_are_labeled_and_separated_by_blank_line() {
        let mut t = Transcript::new();
        t.push(page(2, "alpha"));
        t.push(page(3, "beta"));
        assert_eq!(t.render(), "Page 2: alpha\n\nPage 3: beta");
        assert_eq!(t.to_string(), t.render());
    }

    #[test]
    fn single_page_has_no_separator() {
        let mut t = Transcript::new();
        t.push(page(7, "only"));
        assert_eq!(t.render(), "Page 7: only");
    }

    #[test]
    fn empty_page_text_keeps_its_label() {
        let mut t = Transcript::new();
        t.push(page(1, ""));
        t.push(page(2, "x"));
        assert_eq!(t.render(), "Page 1: \n\nPage 2: x");
    }

    #[test]
    fn out_of_order_pushes_are_sorted() {
        let mut t = Transcript::new();
        t.push(page(4, "d"));
        t.push(page(2, "b"));
        t.push(page(3, "c"));
        assert_eq!(t.labels(), vec!["Page 2:", "Page 3:", "Page 4:"]);
    }

    #[test]
    fn empty_transcript_renders_empty() {
        let t = Transcript::new();
        assert!(t.is_empty());
        assert_eq!(t.render(), "");
    }
}
