//! Deck names mirror the source directory tree.
//!
//! `biology/cells/mitosis.pdf` under root prefix `School` becomes
//! `School::biology::cells::mitosis`.

use std::path::{Component, Path};

pub const DECK_SEPARATOR: &str = "::";

/// Tag carried by every note this tool creates.
pub const APP_TAG: &str = "pdf2anki";

/// Deck name for a PDF at `relative` (relative to the scanned root).
///
/// An empty or whitespace-only prefix counts as no prefix.
pub fn deck_name_from_path(root_prefix: Option<&str>, relative: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(prefix) = root_prefix.map(str::trim).filter(|p| !p.is_empty()) {
        parts.push(prefix.to_string());
    }

    if let Some(parent) = relative.parent() {
        parts.extend(parent.components().filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        }));
    }

    if let Some(stem) = relative.file_stem() {
        parts.push(stem.to_string_lossy().into_owned());
    }

    parts.join(DECK_SEPARATOR)
}

/// Deck name usable as a tag: trimmed, spaces replaced by underscores.
pub fn deck_tag(deck_name: &str) -> String {
    deck_name.trim().replace(' ', "_")
}

/// `[APP_TAG, deck_tag(deck_name)]`
pub fn note_tags(deck_name: &str) -> Vec<String> {
    vec![APP_TAG.to_string(), deck_tag(deck_name)]
}
