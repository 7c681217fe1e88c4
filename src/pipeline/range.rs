//! Page-range validation: turn two raw user values into a [`PageRange`].
//!
//! The upper bound is forgiving (it is clamped to the last page), the lower
//! bound is not: a start page past the end of the document is an error
//! because there would be nothing to read.

use crate::error::ValidationError;
use serde::Serialize;
use std::num::IntErrorKind;
use std::ops::RangeInclusive;

/// A validated, inclusive, 1-based page interval.
///
/// Invariant: `1 <= start <= end <= page_count` of the document it was
/// validated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageRange {
    start: usize,
    end: usize,
}

impl PageRange {
    /// Validate already-parsed page numbers against `page_count`.
    pub fn new(start: i64, end: i64, page_count: usize) -> Result<Self, ValidationError> {
        if start < 1 || end < start {
            return Err(ValidationError::InvalidOrder { start, end });
        }
        // start >= 1 here, so the cast is lossless.
        let start_u = start as u64;
        if start_u > page_count as u64 {
            return Err(ValidationError::StartBeyondDocument {
                start,
                total: page_count,
            });
        }
        let end_u = (end as u64).min(page_count as u64);

        Ok(Self {
            start: start_u as usize,
            end: end_u as usize,
        })
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    /// Number of pages in the range. Never zero.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Page numbers in ascending order.
    pub fn pages(&self) -> RangeInclusive<usize> {
        self.start..=self.end
    }

    /// 0-based slot index of `page` within the range.
    pub fn index_of(&self, page: usize) -> Option<usize> {
        self.pages().contains(&page).then(|| page - self.start)
    }
}

/// Parse and validate a raw `[start, end]` pair against `page_count`.
///
/// Both values are trimmed and must parse as integers. `end` is silently
/// clamped to `page_count`.
pub fn validate(
    raw_start: &str,
    raw_end: &str,
    page_count: usize,
) -> Result<PageRange, ValidationError> {
    let start = parse_page(raw_start)?;
    let end = parse_page(raw_end)?;
    PageRange::new(start, end, page_count)
}

/// Digit strings beyond `i64` saturate instead of failing, so a huge end is
/// clamped and a huge start is reported as past the document.
fn parse_page(raw: &str) -> Result<i64, ValidationError> {
    match raw.trim().parse::<i64>() {
        Ok(n) => Ok(n),
        Err(e) => match e.kind() {
            IntErrorKind::PosOverflow => Ok(i64::MAX),
            IntErrorKind::NegOverflow => Ok(i64::MIN),
            _ => Err(ValidationError::NotANumber {
                input: raw.to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_document_is_accepted() {
        for count in 1..=40 {
            let r = validate("1", &count.to_string(), count).unwrap();
            assert_eq!((r.start(), r.end()), (1, count));
            assert_eq!(r.len(), count);
        }
    }

    #[test]
    fn end_past_document_is_clamped() {
        for end in [6, 7, 100, i64::MAX] {
            let r = PageRange::new(1, end, 5).unwrap();
            assert_eq!((r.start(), r.end()), (1, 5));
        }
        let r = validate("3", "10", 5).unwrap();
        assert_eq!((r.start(), r.end()), (3, 5));
        assert_eq!(r.pages().collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn oversized_numbers_saturate() {
        let r = validate("1", "100000000000000000000", 5).unwrap();
        assert_eq!((r.start(), r.end()), (1, 5));

        assert_eq!(
            validate("100000000000000000000", "100000000000000000001", 5).unwrap_err(),
            ValidationError::StartBeyondDocument {
                start: i64::MAX,
                total: 5
            }
        );
        assert_eq!(
            validate("-100000000000000000000", "3", 5).unwrap_err(),
            ValidationError::InvalidOrder {
                start: i64::MIN,
                end: 3
            }
        );
        assert!(matches!(
            validate("1", "99999999999999999999x", 5),
            Err(ValidationError::NotANumber { .. })
        ));
    }

    #[test]
    fn start_past_document_is_rejected() {
        for start in 6..12 {
            let err = PageRange::new(start, start + 3, 5).unwrap_err();
            assert_eq!(err, ValidationError::StartBeyondDocument { start, total: 5 });
        }
    }

    #[test]
    fn reversed_range_is_rejected() {
        assert_eq!(
            validate("4", "2", 10).unwrap_err(),
            ValidationError::InvalidOrder { start: 4, end: 2 }
        );
        // Order is checked before bounds, as with the form prompt.
        assert!(matches!(
            validate("9", "8", 5),
            Err(ValidationError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn start_below_one_is_rejected() {
        assert!(matches!(
            validate("0", "3", 10),
            Err(ValidationError::InvalidOrder { start: 0, end: 3 })
        ));
        assert!(matches!(
            validate("-2", "3", 10),
            Err(ValidationError::InvalidOrder { .. })
        ));
    }

    #[test]
    fn non_numeric_input_is_rejected() {
        assert_eq!(
            validate("one", "3", 10).unwrap_err(),
            ValidationError::NotANumber { input: "one".into() }
        );
        assert!(matches!(
            validate("1", "", 10),
            Err(ValidationError::NotANumber { .. })
        ));
        assert!(matches!(
            validate("1.5", "3", 10),
            Err(ValidationError::NotANumber { .. })
        ));
    }

    #[test]
    fn whitespace_is_trimmed() {
        let r = validate(" 2 ", "\t4\n", 10).unwrap();
        assert_eq!((r.start(), r.end()), (2, 4));
    }

    #[test]
    fn empty_document_rejects_every_start() {
        assert!(matches!(
            validate("1", "1", 0),
            Err(ValidationError::StartBeyondDocument { total: 0, .. })
        ));
    }

    #[test]
    fn index_of_maps_pages_to_slots() {
        let r = PageRange::new(2, 4, 10).unwrap();
        assert_eq!(r.index_of(2), Some(0));
        assert_eq!(r.index_of(4), Some(2));
        assert_eq!(r.index_of(1), None);
        assert_eq!(r.index_of(5), None);
    }
}
