//! Hashtag parsing over the denormalized `post.tags` column.

use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};

pub const TAG_DELIMITER: char = '#';

/// Split a tag string such as `"#go #rust"` into its bare tokens (`go`, `rust`).
/// Whitespace is dropped and the empty leading segment is discarded.
pub fn split_tags(raw: &str) -> Vec<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    compact
        .split(TAG_DELIMITER)
        .skip(1)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

/// Distinct tags across every post's tag string, `#`-prefixed and sorted.
pub fn extract_tags<I, S>(tag_fields: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let joined: String = tag_fields
        .into_iter()
        .map(|field| field.as_ref().to_string())
        .collect();

    split_tags(&joined)
        .into_iter()
        .map(|token| format!("{}{}", TAG_DELIMITER, token))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// A non-empty tag string must be a run of `#token` segments.
pub fn validate_tags(raw: &str) -> AppResult<()> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    if !trimmed.starts_with(TAG_DELIMITER) {
        return Err(AppError::Validation(
            "Tags must start with '#', e.g. \"#rust #web\".".to_string(),
        ));
    }
    for segment in trimmed.split(TAG_DELIMITER).skip(1) {
        let token = segment.trim();
        if token.is_empty() {
            return Err(AppError::Validation("Tags cannot be empty.".to_string()));
        }
        if token.chars().any(char::is_whitespace) {
            return Err(AppError::Validation(format!(
                "Tag '#{}' cannot contain spaces.",
                token
            )));
        }
    }
    Ok(())
}
