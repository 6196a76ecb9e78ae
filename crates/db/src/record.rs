use serde::{Deserialize, Serialize};

/// Store-assigned book identifier.
pub type BookId = i64;

/// Lowest accepted rating.
pub const MIN_RATING: i64 = 1;
/// Highest accepted rating.
pub const MAX_RATING: i64 = 5;

/// A persisted book entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub rating: i64,
    /// External catalog code (usually an ISBN) used for cover lookup
    #[serde(default)]
    pub cover_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Writable fields of a book, used for both insert and in-place update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub rating: i64,
    pub cover_id: Option<String>,
    pub notes: Option<String>,
}

impl BookFields {
    pub(crate) fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            rating: self.rating,
            cover_id: self.cover_id,
            notes: self.notes,
        }
    }
}

pub fn rating_in_range(rating: i64) -> bool {
    (MIN_RATING..=MAX_RATING).contains(&rating)
}
