//! QUESTION/ANSWER keyword predicate.

pub const QUESTION_MARKER: &str = "QUESTION";
pub const ANSWER_MARKER: &str = "ANSWER";

/// True iff `text` contains both markers, exact case, anywhere, in any order.
pub fn contains_markers(text: &str) -> bool {
    text.contains(QUESTION_MARKER) && text.contains(ANSWER_MARKER)
}
