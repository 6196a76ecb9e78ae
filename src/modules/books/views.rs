//! Askama views for the book pages.

use askama::Template;
use axum::response::Html;
use shelf_db::MAX_RATING;
use shelf_http::error::AppError;

use super::models::{BookForm, BookId, ListQuery, ListedBook};

pub fn render<T: Template>(template: T) -> Result<Html<String>, AppError> {
    template
        .render()
        .map(Html)
        .map_err(|e| AppError::Internal(anyhow::Error::new(e).context("template rendering failed")))
}

/// One row of the listing page.
pub struct BookView {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub rating: i64,
    pub stars: String,
    pub cover_url: String,
    pub isbn: String,
    pub notes: String,
}

impl BookView {
    pub fn new(listed: &ListedBook, fallback_cover_url: &str) -> Self {
        let book = &listed.book;
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            rating: book.rating,
            stars: stars(book.rating),
            cover_url: listed.cover.url(fallback_cover_url).to_string(),
            isbn: book.cover_id.clone().unwrap_or_default(),
            notes: book.notes.clone().unwrap_or_default(),
        }
    }
}

fn stars(rating: i64) -> String {
    let filled = rating.clamp(0, MAX_RATING) as usize;
    let empty = MAX_RATING as usize - filled;
    format!("{}{}", "★".repeat(filled), "☆".repeat(empty))
}

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub books: Vec<BookView>,
    pub search: String,
    pub sort: &'static str,
}

impl IndexTemplate {
    pub fn new(listed: &[ListedBook], query: &ListQuery, fallback_cover_url: &str) -> Self {
        Self {
            books: listed
                .iter()
                .map(|l| BookView::new(l, fallback_cover_url))
                .collect(),
            search: query.search_text().unwrap_or_default().to_string(),
            sort: query.sort_key().map(|key| key.as_str()).unwrap_or_default(),
        }
    }
}

#[derive(Template)]
#[template(path = "add.html")]
pub struct AddTemplate {
    pub form: BookForm,
}

#[derive(Template)]
#[template(path = "edit.html")]
pub struct EditTemplate {
    pub id: BookId,
    pub form: BookForm,
}
