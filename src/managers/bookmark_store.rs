//! Bookmark Store: the client-side mirror of the owner's bookmarks.
//!
//! The list is only ever replaced wholesale by a refresh. Each refresh takes a
//! [`RefreshTicket`]; a response is applied only when its ticket is the most
//! recent one issued by this store, so an older response that arrives late is
//! dropped instead of overwriting newer data.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::backend::{Backend, ListQuery};
use crate::types::bookmark::Bookmark;
use crate::types::errors::BookmarkError;

/// Ticket values are unique process-wide, so a ticket from a discarded store
/// can never match a fresh one.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

/// Identifies one refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket(u64);

#[derive(Debug, Default)]
pub struct BookmarkStore {
    bookmarks: Vec<Bookmark>,
    latest: Option<RefreshTicket>,
}

impl BookmarkStore {
    /// The current snapshot, most recent first.
    pub fn bookmarks(&self) -> &[Bookmark] {
        &self.bookmarks
    }

    /// Issues a ticket for a new refresh, superseding any earlier one.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        let ticket = RefreshTicket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed));
        self.latest = Some(ticket);
        ticket
    }

    pub fn is_current(&self, ticket: RefreshTicket) -> bool {
        self.latest == Some(ticket)
    }

    /// Replaces the snapshot if `ticket` is still current. Returns whether it was applied.
    pub fn apply(&mut self, ticket: RefreshTicket, bookmarks: Vec<Bookmark>) -> bool {
        if !self.is_current(ticket) {
            debug!(ticket = ticket.0, "discarding stale refresh");
            return false;
        }
        self.bookmarks = bookmarks;
        true
    }
}

/// Fetches the full, recency-ordered list for `owner_id`.
pub async fn fetch_snapshot(backend: &dyn Backend, owner_id: &str) -> Result<Vec<Bookmark>, BookmarkError> {
    let bookmarks = backend.list_records(&ListQuery::owned_by(owner_id)).await?;
    Ok(bookmarks)
}
