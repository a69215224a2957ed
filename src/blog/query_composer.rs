use sqlx::{QueryBuilder, Sqlite};

use crate::blog::tags::{split_tags, TAG_DELIMITER};

/// Filter applied to the post listing. Every variant renders to a fixed
/// predicate template with bound arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    /// Posts whose tag field contains any of the tokens
    AnyTag(Vec<String>),
    /// Case-insensitive title substring
    TitleContains(String),
}

impl PostFilter {
    /// Build from `?multiple_tags=#a#b`. `None` means the caller should fall
    /// back to the unfiltered listing.
    pub fn from_tag_query(raw: Option<&str>) -> Option<Self> {
        let raw = raw?;
        if raw.is_empty() || !raw.contains(TAG_DELIMITER) {
            return None;
        }
        let tags = split_tags(raw);
        if tags.is_empty() {
            return None;
        }
        Some(PostFilter::AnyTag(tags))
    }

    /// Build from `?title_to_find=`. `None` for a missing or empty term.
    pub fn from_title_query(raw: Option<&str>) -> Option<Self> {
        match raw {
            Some(term) if !term.is_empty() => Some(PostFilter::TitleContains(term.to_string())),
            _ => None,
        }
    }

    /// Append the WHERE clause for this filter, if any.
    pub fn push_predicate(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            PostFilter::All => {}
            PostFilter::AnyTag(tags) => {
                qb.push(" WHERE (");
                let mut separated = qb.separated(" OR ");
                for tag in tags {
                    separated.push("instr(p.tags, ");
                    separated.push_bind_unseparated(tag.clone());
                    separated.push_unseparated(") > 0");
                }
                qb.push(")");
            }
            PostFilter::TitleContains(term) => {
                qb.push(" WHERE p.title LIKE ");
                qb.push_bind(format!("%{}%", term));
            }
        }
    }
}
