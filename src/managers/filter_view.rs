//! Filter View: live title search over the store snapshot.

use crate::types::bookmark::Bookmark;

/// Bookmarks whose title contains `query`, ignoring case, in their original order.
///
/// The url is not searched. An empty query keeps every bookmark.
pub fn filter_bookmarks<'a>(bookmarks: &'a [Bookmark], query: &str) -> Vec<&'a Bookmark> {
    let needle = query.to_lowercase();
    bookmarks
        .iter()
        .filter(|b| b.title.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Default, Clone)]
pub struct FilterView {
    query: String,
}

impl FilterView {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn apply<'a>(&self, bookmarks: &'a [Bookmark]) -> Vec<&'a Bookmark> {
        filter_bookmarks(bookmarks, &self.query)
    }
}
