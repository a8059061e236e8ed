use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored bookmark as returned by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bookmark {
    pub id: String,
    pub title: String,
    pub url: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a new bookmark. The backend assigns `id` and `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub user_id: String,
}

/// The title/url input fields of the add form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BookmarkDraft {
    pub title: String,
    pub url: String,
}

impl BookmarkDraft {
    pub fn clear(&mut self) {
        self.title.clear();
        self.url.clear();
    }
}
