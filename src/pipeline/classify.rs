//! Decide whether a page is a flashcard.
//!
//! Enabled predicates are evaluated in a fixed order: dimensions first, then
//! markers. The first failing predicate short-circuits so text extraction,
//! which is the slow part, only runs for pages of the right size.

use crate::config::{PageDimensions, ProcessingOptions};
use crate::error::PageError;
use crate::pipeline::{dimensions, markers};
use tracing::trace;

/// What the classifier needs from a page.
///
/// Accessor failures are reported as [`PageError`]s, so the caller can skip
/// that page and keep going.
pub trait ClassifiablePage {
    /// 1-based page number, for error messages.
    fn page_number(&self) -> usize;

    fn bounds(&self) -> Result<PageDimensions, PageError>;

    fn text(&self) -> Result<String, PageError>;
}

/// Applies [`ProcessingOptions`] against a target page size.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    options: ProcessingOptions,
    target: PageDimensions,
}

impl Classifier {
    pub fn new(options: ProcessingOptions, target: PageDimensions) -> Self {
        Self { options, target }
    }

    pub fn options(&self) -> ProcessingOptions {
        self.options
    }

    /// `Ok(true)` when every enabled predicate holds. With both predicates
    /// disabled the page is not inspected at all.
    pub fn should_process<P: ClassifiablePage + ?Sized>(&self, page: &P) -> Result<bool, PageError> {
        if self.options.check_dimensions {
            let bounds = page.bounds()?;
            if !dimensions::matches(bounds.width, bounds.height, &self.target) {
                trace!(
                    "Page {}: {:.2} x {:.2} pt does not match {:.2} x {:.2}",
                    page.page_number(),
                    bounds.width,
                    bounds.height,
                    self.target.width,
                    self.target.height
                );
                return Ok(false);
            }
        }

        if self.options.check_markers {
            let text = page.text()?;
            if !markers::contains_markers(&text) {
                trace!("Page {}: markers not found", page.page_number());
                return Ok(false);
            }
        }

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct StubPage {
        bounds: Option<PageDimensions>,
        text: Option<&'static str>,
        bounds_calls: Cell<usize>,
        text_calls: Cell<usize>,
    }

    impl StubPage {
        fn new(bounds: Option<PageDimensions>, text: Option<&'static str>) -> Self {
            Self {
                bounds,
                text,
                bounds_calls: Cell::new(0),
                text_calls: Cell::new(0),
            }
        }
    }

    impl ClassifiablePage for StubPage {
        fn page_number(&self) -> usize {
            7
        }

        fn bounds(&self) -> Result<PageDimensions, PageError> {
            self.bounds_calls.set(self.bounds_calls.get() + 1);
            self.bounds.ok_or(PageError::BoundsUnavailable {
                page: 7,
                detail: "stub".into(),
            })
        }

        fn text(&self) -> Result<String, PageError> {
            self.text_calls.set(self.text_calls.get() + 1);
            self.text
                .map(str::to_string)
                .ok_or(PageError::TextUnavailable {
                    page: 7,
                    detail: "stub".into(),
                })
        }
    }

    const STD: PageDimensions = PageDimensions::STANDARD_FLASHCARD;
    const A4: PageDimensions = PageDimensions::new(595.0, 842.0);

    fn classifier(check_dimensions: bool, check_markers: bool) -> Classifier {
        Classifier::new(
            ProcessingOptions {
                check_dimensions,
                check_markers,
            },
            STD,
        )
    }

    #[test]
    fn strict_requires_both() {
        let c = classifier(true, true);
        assert!(c.should_process(&StubPage::new(Some(STD), Some("QUESTION ANSWER"))).unwrap());
        assert!(!c.should_process(&StubPage::new(Some(A4), Some("QUESTION ANSWER"))).unwrap());
        assert!(!c.should_process(&StubPage::new(Some(STD), Some("notes"))).unwrap());
    }

    #[test]
    fn dimension_mismatch_skips_text_extraction() {
        let page = StubPage::new(Some(A4), Some("QUESTION ANSWER"));
        assert!(!classifier(true, true).should_process(&page).unwrap());
        assert_eq!(page.text_calls.get(), 0);
    }

    #[test]
    fn markers_only_ignores_size() {
        let page = StubPage::new(None, Some("QUESTION ANSWER"));
        assert!(classifier(false, true).should_process(&page).unwrap());
        assert_eq!(page.bounds_calls.get(), 0);
    }

    #[test]
    fn dimensions_only_ignores_text() {
        let page = StubPage::new(Some(STD), None);
        assert!(classifier(true, false).should_process(&page).unwrap());
        assert_eq!(page.text_calls.get(), 0);
    }

    #[test]
    fn neither_accepts_without_touching_page() {
        let page = StubPage::new(None, None);
        assert!(classifier(false, false).should_process(&page).unwrap());
        assert_eq!(page.bounds_calls.get() + page.text_calls.get(), 0);
    }

    #[test]
    fn retrieval_failures_surface_as_page_errors() {
        let err = classifier(true, false)
            .should_process(&StubPage::new(None, None))
            .unwrap_err();
        assert!(matches!(err, PageError::BoundsUnavailable { page: 7, .. }));

        let err = classifier(true, true)
            .should_process(&StubPage::new(Some(STD), None))
            .unwrap_err();
        assert!(matches!(err, PageError::TextUnavailable { page: 7, .. }));
    }
}
