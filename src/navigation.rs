//! Routes between the library, book and topic screens

use std::fmt;

/// A screen in the reader
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Route {
    Library,
    Book { textbook_id: String },
    Topic { textbook_id: String, index: usize },
}

impl Route {
    pub fn book(textbook_id: impl Into<String>) -> Self {
        Route::Book {
            textbook_id: textbook_id.into(),
        }
    }

    pub fn topic(textbook_id: impl Into<String>, index: usize) -> Self {
        Route::Topic {
            textbook_id: textbook_id.into(),
            index,
        }
    }

    /// Textbook this route belongs to
    pub fn textbook_id(&self) -> Option<&str> {
        match self {
            Route::Library => None,
            Route::Book { textbook_id } | Route::Topic { textbook_id, .. } => Some(textbook_id),
        }
    }

    /// Where "back" leads from this route
    pub fn parent(&self) -> Route {
        match self {
            Route::Library | Route::Book { .. } => Route::Library,
            Route::Topic { textbook_id, .. } => Route::book(textbook_id.clone()),
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Library => write!(f, "/textbooks"),
            Route::Book { textbook_id } => write!(f, "/book/{textbook_id}"),
            Route::Topic { textbook_id, index } => {
                write!(f, "/textbooks/books/{textbook_id}/topics/{index}")
            }
        }
    }
}

/// Previous topic, or the book page when already at the first topic
pub fn prev_route(textbook_id: &str, index: usize) -> Route {
    match index.checked_sub(1) {
        Some(prev) => Route::topic(textbook_id, prev),
        None => Route::book(textbook_id),
    }
}

/// Next topic, or the book page past the last topic
///
/// When the topic count is not known yet the book page is the target.
pub fn next_route(textbook_id: &str, index: usize, total: Option<usize>) -> Route {
    let next = index + 1;
    match total {
        Some(total) if next < total => Route::topic(textbook_id, next),
        _ => Route::book(textbook_id),
    }
}
