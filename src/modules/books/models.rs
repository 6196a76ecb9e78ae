use serde::Deserialize;

pub use shelf_db::{Book, BookFields, BookId};

use super::covers::Cover;

/// Listing order requested through `?sort=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Highest rating first
    Rating,
    /// Title ascending
    Alphabetical,
}

impl SortKey {
    /// Unknown values mean "storage order".
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "rating" => Some(SortKey::Rating),
            "alphabetical" => Some(SortKey::Alphabetical),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Rating => "rating",
            SortKey::Alphabetical => "alphabetical",
        }
    }
}

/// Query string of the listing page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub sort: Option<String>,
    pub search: Option<String>,
}

impl ListQuery {
    pub fn sort_key(&self) -> Option<SortKey> {
        self.sort.as_deref().and_then(SortKey::parse)
    }

    /// Trimmed search text, or `None` when absent or blank.
    pub fn search_text(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

/// Raw add/edit form submission. Every field is kept as text so that bad
/// input can be reported instead of rejected by the extractor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub rating: String,
    #[serde(default)]
    pub isbn: String,
    #[serde(default)]
    pub notes: String,
}

impl From<&Book> for BookForm {
    fn from(book: &Book) -> Self {
        Self {
            title: book.title.clone(),
            author: book.author.clone(),
            rating: book.rating.to_string(),
            isbn: book.cover_id.clone().unwrap_or_default(),
            notes: book.notes.clone().unwrap_or_default(),
        }
    }
}

/// A stored book paired with its resolved cover.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedBook {
    pub book: Book,
    pub cover: Cover,
}
