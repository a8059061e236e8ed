//! Mutation Controller: validation and in-flight guards for add/delete.
//!
//! The network round trips themselves are driven by [`crate::app::App`]; this
//! type decides whether a submission may go out at all.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::bookmark::{Bookmark, NewBookmark};

/// Result of an add request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "bookmark", rename_all = "snake_case")]
pub enum AddOutcome {
    Added(Bookmark),
    /// Title or url was empty; nothing was sent.
    Skipped,
    /// Another add is still in flight.
    Busy,
}

/// Result of a delete request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted,
    /// Confirmation is required by settings and was not given.
    NeedsConfirmation,
    /// A delete of the same id is still in flight.
    Busy,
}

#[derive(Debug, Default)]
pub struct MutationController {
    add_in_flight: bool,
    deleting: HashSet<String>,
}

impl MutationController {
    /// Builds the insert payload, or `None` when title or url is empty.
    ///
    /// Whitespace-only values are accepted; duplicates are not checked.
    pub fn validate(title: &str, url: &str, owner_id: &str) -> Option<NewBookmark> {
        if title.is_empty() || url.is_empty() {
            return None;
        }
        Some(NewBookmark {
            title: title.to_string(),
            url: url.to_string(),
            user_id: owner_id.to_string(),
        })
    }

    pub fn try_begin_add(&mut self) -> bool {
        if self.add_in_flight {
            return false;
        }
        self.add_in_flight = true;
        true
    }

    pub fn finish_add(&mut self) {
        self.add_in_flight = false;
    }

    pub fn try_begin_delete(&mut self, id: &str) -> bool {
        self.deleting.insert(id.to_string())
    }

    pub fn finish_delete(&mut self, id: &str) {
        self.deleting.remove(id);
    }
}
