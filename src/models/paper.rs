//! Paper record shared by every source.

use serde::{Deserialize, Serialize};

/// Placeholder used when a feed entry carries no parseable publication date.
pub const UNKNOWN_DATE: &str = "Unknown date";

/// A paper announced by a source.
///
/// Fields a source cannot supply take the documented defaults: empty strings
/// for `title`, `link` and `summary`, an empty author list, and
/// [`UNKNOWN_DATE`] for `published`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Paper {
    /// Dedup key, unique per source
    pub id: String,

    /// Paper title
    pub title: String,

    /// Full URL to the paper
    pub link: String,

    /// Abstract or feed description
    pub summary: String,

    /// Author names in source order
    pub authors: Vec<String>,

    /// Publication date as reported by the source, never parsed
    pub published: String,
}

impl Default for Paper {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            link: String::new(),
            summary: String::new(),
            authors: Vec::new(),
            published: UNKNOWN_DATE.to_string(),
        }
    }
}

impl Paper {
    /// Comma-joined author line.
    pub fn author_line(&self) -> String {
        self.authors.join(", ")
    }

    /// True if any author equals one of `filter`, ignoring case.
    pub fn has_author_in(&self, filter: &[String]) -> bool {
        filter.iter().any(|wanted| {
            let wanted = wanted.trim().to_lowercase();
            self.authors
                .iter()
                .any(|author| author.trim().to_lowercase() == wanted)
        })
    }
}
