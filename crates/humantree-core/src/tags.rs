//! Tag normalization for skill trees.
//!
//! Tags are free-form user input; before they reach a tree they are
//! lowercased, stripped of a leading `#`, trimmed, de-duplicated (keeping
//! first occurrence order), and bounded in count and length.

use indexmap::IndexSet;

use crate::error::TreeError;

/// Maximum number of tags per tree.
pub const MAX_TAGS: usize = 10;

/// Maximum length of a single tag, in characters.
pub const MAX_TAG_LEN: usize = 30;

/// Normalizes raw tag input into the canonical stored form.
///
/// Empty entries (after trimming) are dropped silently; limit violations
/// are errors so the caller can surface them.
pub fn normalize(raw: &[String]) -> Result<Vec<String>, TreeError> {
    let mut seen: IndexSet<String> = IndexSet::new();
    for tag in raw {
        let cleaned = tag.trim().to_lowercase();
        let cleaned = cleaned.strip_prefix('#').unwrap_or(&cleaned).trim().to_string();
        if cleaned.is_empty() {
            continue;
        }
        if cleaned.chars().count() > MAX_TAG_LEN {
            return Err(TreeError::TagTooLong {
                tag: cleaned,
                max: MAX_TAG_LEN,
            });
        }
        seen.insert(cleaned);
    }
    if seen.len() > MAX_TAGS {
        return Err(TreeError::TooManyTags {
            count: seen.len(),
            max: MAX_TAGS,
        });
    }
    Ok(seen.into_iter().collect())
}
