//! Pipeline stages for PDF-to-speech conversion.
//!
//! Each submodule implements exactly one step; [`crate::reader::Reader`]
//! sequences them.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ range ──▶ render ─┬─▶ transcript ──▶ speech
//! (bytes)   (bounds)  (pdfium) │    (labels)       (HTTP)
//!                      text ───┘
//! ```
//!
//! 1. [`input`]      — read a path or URL and check the `%PDF` signature
//! 2. [`range`]      — parse, bounds-check and clamp the page range
//! 3. [`render`]     — rasterise one page at a fixed scale
//! 4. [`text`]       — join one page's text fragments
//! 5. [`transcript`] — assemble `Page N:` blocks in page order
//! 6. [`speech`]     — single POST to the text-to-speech endpoint
//! 7. [`encode`]     — PNG output of rendered pages

pub mod encode;
pub mod input;
pub mod range;
pub mod render;
pub mod speech;
pub mod text;
pub mod transcript;
