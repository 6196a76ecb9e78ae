//! Search and ordering of the listing page.

use super::models::{Book, ListQuery, SortKey};
use crate::utils::contains_ignore_case;

/// Filter `books` by the query's search text (title or author, case
/// insensitive), then order them by the requested sort key. Without a sort
/// key the storage order is kept.
pub fn apply(mut books: Vec<Book>, query: &ListQuery) -> Vec<Book> {
    if let Some(needle) = query.search_text() {
        let needle = needle.to_lowercase();
        books.retain(|book| {
            contains_ignore_case(&book.title, &needle) || contains_ignore_case(&book.author, &needle)
        });
    }

    match query.sort_key() {
        Some(SortKey::Rating) => books.sort_by(|a, b| b.rating.cmp(&a.rating)),
        Some(SortKey::Alphabetical) => books.sort_by(|a, b| a.title.cmp(&b.title)),
        None => {}
    }

    books
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(id: i64, title: &str, author: &str, rating: i64) -> Book {
        Book {
            id,
            title: title.to_string(),
            author: author.to_string(),
            rating,
            cover_id: None,
            notes: None,
        }
    }

    fn shelf() -> Vec<Book> {
        vec![
            book(1, "Emma", "Jane Austen", 3),
            book(2, "Dune", "Frank Herbert", 5),
            book(3, "Persuasion", "Jane Austen", 4),
            book(4, "Children of Dune", "Frank Herbert", 2),
            book(5, "Anathem", "Neal Stephenson", 5),
        ]
    }

    fn query(sort: Option<&str>, search: Option<&str>) -> ListQuery {
        ListQuery {
            sort: sort.map(str::to_string),
            search: search.map(str::to_string),
        }
    }

    fn ids(books: &[Book]) -> Vec<i64> {
        books.iter().map(|b| b.id).collect()
    }

    #[test]
    fn rating_sort_is_non_increasing_and_stable() {
        let sorted = apply(shelf(), &query(Some("rating"), None));
        assert!(sorted.windows(2).all(|w| w[0].rating >= w[1].rating));
        // Ties keep storage order.
        assert_eq!(ids(&sorted), vec![2, 5, 3, 1, 4]);
    }

    #[test]
    fn alphabetical_sort_is_non_decreasing_by_title() {
        let sorted = apply(shelf(), &query(Some("alphabetical"), None));
        assert!(sorted.windows(2).all(|w| w[0].title <= w[1].title));
        assert_eq!(sorted[0].title, "Anathem");
    }

    #[test]
    fn missing_or_unknown_sort_keeps_storage_order() {
        assert_eq!(ids(&apply(shelf(), &query(None, None))), vec![1, 2, 3, 4, 5]);
        assert_eq!(
            ids(&apply(shelf(), &query(Some("newest"), None))),
            vec![1, 2, 3, 4, 5]
        );
    }

    #[test]
    fn search_matches_title_or_author_case_insensitively() {
        assert_eq!(ids(&apply(shelf(), &query(None, Some("DUNE")))), vec![2, 4]);
        assert_eq!(ids(&apply(shelf(), &query(None, Some("austen")))), vec![1, 3]);
        assert!(apply(shelf(), &query(None, Some("tolkien"))).is_empty());
    }

    #[test]
    fn blank_search_returns_everything() {
        assert_eq!(apply(shelf(), &query(None, Some(""))).len(), 5);
        assert_eq!(apply(shelf(), &query(None, Some("   "))).len(), 5);
    }

    #[test]
    fn search_then_sort() {
        let result = apply(shelf(), &query(Some("rating"), Some("herbert")));
        assert_eq!(ids(&result), vec![2, 4]);
    }

    #[test]
    fn newly_added_top_rated_book_leads_rating_sort() {
        let mut books = shelf();
        books.push(book(6, "Dune Messiah", "Herbert", 5));
        books[1].rating = 4;
        books[4].rating = 4;

        let sorted = apply(books, &query(Some("rating"), None));
        assert_eq!(sorted[0].title, "Dune Messiah");
    }
}
