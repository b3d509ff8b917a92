//! Page-size predicate.
//!
//! Pages exported from note-taking apps carry the template's exact point
//! size, but PDF producers round differently, so the comparison allows a
//! fixed 1-point slack. Rotated pages (width and height swapped) also match.

use crate::config::PageDimensions;

/// Allowed deviation, in points, on each axis. Fixed for every comparison.
pub const DIMENSION_TOLERANCE: f64 = 1.0;

/// Does a `width × height` page match `target`, either upright or rotated 90°?
///
/// NaN or negative sizes never match a positive target.
pub fn matches(width: f64, height: f64, target: &PageDimensions) -> bool {
    let close = |a: f64, b: f64| (a - b).abs() <= DIMENSION_TOLERANCE;

    (close(width, target.width) && close(height, target.height))
        || (close(width, target.height) && close(height, target.width))
}
