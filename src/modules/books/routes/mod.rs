//! HTTP handlers for the book pages.

use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, Redirect},
    routing::{get, post},
    Router,
};
use shelf_db::BookStore;
use shelf_http::error::AppError;
use shelf_http::extract::{Form, Path, Query};

use super::covers::{self, CoverLookup};
use super::listing;
use super::models::{BookForm, BookId, ListQuery};
use super::validation;
use super::views::{render, AddTemplate, EditTemplate, IndexTemplate};

/// Shared state for the book handlers.
#[derive(Clone)]
pub struct BooksState {
    pub store: Arc<dyn BookStore>,
    pub covers: Arc<dyn CoverLookup>,
    pub fallback_cover_url: Arc<str>,
}

/// Build the books router.
pub fn router(state: BooksState) -> Router {
    Router::new()
        .route("/", get(list_books))
        .route("/books", post(create_book))
        .route("/books/add", get(add_form))
        .route("/books/edit/{id}", get(edit_form).post(update_book))
        .route("/books/delete/{id}", post(delete_book))
        .with_state(state)
}

pub async fn list_books(
    State(state): State<BooksState>,
    Query(query): Query<ListQuery>,
) -> Result<Html<String>, AppError> {
    let books = listing::apply(state.store.list().await?, &query);
    let listed = covers::resolve_covers(state.covers.as_ref(), books).await;

    render(IndexTemplate::new(&listed, &query, &state.fallback_cover_url))
}

pub async fn add_form() -> Result<Html<String>, AppError> {
    render(AddTemplate {
        form: BookForm::default(),
    })
}

pub async fn create_book(
    State(state): State<BooksState>,
    Form(form): Form<BookForm>,
) -> Result<Redirect, AppError> {
    let fields = validation::validate(&form).map_err(AppError::validation)?;
    let book = state.store.insert(fields).await?;

    tracing::info!(book_id = book.id, title = %book.title, "book added");
    Ok(Redirect::to("/"))
}

pub async fn edit_form(
    State(state): State<BooksState>,
    Path(id): Path<BookId>,
) -> Result<Html<String>, AppError> {
    let form = match state.store.get(id).await? {
        Some(book) => BookForm::from(&book),
        None => {
            tracing::debug!(book_id = id, "edit requested for unknown book; rendering empty form");
            BookForm::default()
        }
    };

    render(EditTemplate { id, form })
}

pub async fn update_book(
    State(state): State<BooksState>,
    Path(id): Path<BookId>,
    Form(form): Form<BookForm>,
) -> Result<Redirect, AppError> {
    let fields = validation::validate(&form).map_err(AppError::validation)?;

    if state.store.update(id, fields).await? {
        tracing::info!(book_id = id, "book updated");
    } else {
        tracing::debug!(book_id = id, "update target no longer exists");
    }
    Ok(Redirect::to("/"))
}

pub async fn delete_book(
    State(state): State<BooksState>,
    Path(id): Path<BookId>,
) -> Result<Redirect, AppError> {
    let removed = state.store.delete(id).await?;

    tracing::info!(book_id = id, removed, "book delete requested");
    Ok(Redirect::to("/"))
}
