//! Add/edit form validation. Every problem is reported, not just the first.

use shelf_db::rating_in_range;

use super::models::{BookFields, BookForm};
use crate::utils::non_blank;

pub const TITLE_REQUIRED: &str = "Title is required.";
pub const AUTHOR_REQUIRED: &str = "Author is required.";
pub const RATING_REQUIRED: &str = "Rating is required.";
pub const RATING_INVALID: &str = "Rating must be a whole number between 1 and 5.";

/// Check a submitted form and turn it into storable fields.
pub fn validate(form: &BookForm) -> Result<BookFields, Vec<String>> {
    let mut errors = Vec::new();

    let title = non_blank(&form.title);
    if title.is_none() {
        errors.push(TITLE_REQUIRED.to_string());
    }

    let author = non_blank(&form.author);
    if author.is_none() {
        errors.push(AUTHOR_REQUIRED.to_string());
    }

    let rating = match form.rating.trim() {
        "" => {
            errors.push(RATING_REQUIRED.to_string());
            None
        }
        raw => match raw.parse::<i64>() {
            Ok(rating) if rating_in_range(rating) => Some(rating),
            _ => {
                errors.push(RATING_INVALID.to_string());
                None
            }
        },
    };

    match (title, author, rating) {
        (Some(title), Some(author), Some(rating)) => Ok(BookFields {
            title,
            author,
            rating,
            cover_id: non_blank(&form.isbn),
            notes: non_blank(&form.notes),
        }),
        _ => Err(errors),
    }
}
