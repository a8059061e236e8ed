//! App Core for Smartmark.
//!
//! [`App`] owns the backend handle, the settings and one [`AppState`]. Every
//! user action is a method on `App`. The state lock is never held across a
//! backend round trip.

use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::backend::DynBackend;
use crate::managers::bookmark_store::{fetch_snapshot, BookmarkStore};
use crate::managers::filter_view::FilterView;
use crate::managers::mutation_controller::{AddOutcome, DeleteOutcome, MutationController};
use crate::managers::notice_board::NoticeBoard;
use crate::managers::session_manager::{SessionManager, SessionManagerTrait};
use crate::types::bookmark::{Bookmark, BookmarkDraft};
use crate::types::errors::{BookmarkError, SessionError};
use crate::types::notice::Notice;
use crate::types::session::{AuthCallback, Session, SignInFlow};
use crate::types::settings::{AppSettings, ThemeMode};

/// Everything the user sees, in one place.
#[derive(Debug, Default)]
pub struct AppState {
    pub session: Option<Session>,
    pub store: BookmarkStore,
    pub mutations: MutationController,
    pub filter: FilterView,
    pub draft: BookmarkDraft,
    pub notices: NoticeBoard,
    pub theme: ThemeMode,
}

/// Clears an add or delete in-flight mark when dropped, including when the
/// mutation future is cancelled mid round trip.
struct InFlight<'a> {
    state: &'a RwLock<AppState>,
    delete_id: Option<String>,
}

impl<'a> InFlight<'a> {
    fn add(state: &'a RwLock<AppState>) -> Self {
        Self {
            state,
            delete_id: None,
        }
    }

    fn delete(state: &'a RwLock<AppState>, id: &str) -> Self {
        Self {
            state,
            delete_id: Some(id.to_string()),
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut state = self.state.write();
        match &self.delete_id {
            Some(id) => state.mutations.finish_delete(id),
            None => state.mutations.finish_add(),
        }
    }
}

/// Result of a refresh request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RefreshOutcome {
    /// The snapshot was replaced with `count` bookmarks.
    Applied { count: usize },
    /// A newer refresh was issued while this one was in flight.
    Discarded,
    /// Nobody is signed in; no request was made.
    NoSession,
}

/// Central application struct.
pub struct App {
    backend: DynBackend,
    sessions: SessionManager,
    settings: AppSettings,
    state: RwLock<AppState>,
}

impl App {
    pub fn new(backend: DynBackend, settings: AppSettings) -> Self {
        Self {
            sessions: SessionManager::new(backend.clone()),
            backend,
            settings,
            state: RwLock::new(AppState::default()),
        }
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Startup sequence: restore the session, then load bookmarks if one exists.
    pub async fn startup(&self) -> Result<Option<Session>, SessionError> {
        self.resolve_session().await
    }

    // ─── Session ───

    /// Re-reads the current identity and refreshes the store when a session
    /// becomes available. A vanished or different identity resets all state.
    pub async fn resolve_session(&self) -> Result<Option<Session>, SessionError> {
        let resolved = match self.sessions.resolve_session().await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(error = %e, "session lookup failed");
                self.state
                    .write()
                    .notices
                    .error(format!("Could not check sign-in: {}", e));
                return Err(e);
            }
        };
        self.install_session(resolved.clone()).await;
        Ok(resolved)
    }

    async fn install_session(&self, resolved: Option<Session>) {
        let became_available = {
            let mut state = self.state.write();
            let previous = state.session.as_ref().map(|s| s.identity.id.clone());
            let next = resolved.as_ref().map(|s| s.identity.id.clone());
            if previous.is_some() && previous != next {
                info!("identity changed, resetting state");
                *state = AppState::default();
            }
            let became_available = next.is_some() && previous != next;
            state.session = resolved;
            became_available
        };
        if became_available {
            if let Err(e) = self.refresh().await {
                debug!(error = %e, "initial refresh failed");
            }
        }
    }

    /// Starts an external sign-in; `None` uses the configured default provider.
    pub async fn sign_in(&self, provider: Option<&str>) -> Result<SignInFlow, SessionError> {
        let provider = provider.unwrap_or(self.settings.default_provider.as_str());
        self.sessions.sign_in(provider).await.map_err(|e| {
            self.state
                .write()
                .notices
                .error(format!("Could not start sign-in: {}", e));
            e
        })
    }

    /// Resumes the workflow after the provider called back.
    pub async fn complete_sign_in(&self, callback: AuthCallback) -> Result<Option<Session>, SessionError> {
        let resolved = match self.sessions.complete_sign_in(callback).await {
            Ok(resolved) => resolved,
            Err(e) => {
                self.state
                    .write()
                    .notices
                    .error(format!("Sign-in failed: {}", e));
                return Err(e);
            }
        };
        self.install_session(resolved.clone()).await;
        Ok(resolved)
    }

    /// Ends the session and resets all state to its initial value.
    ///
    /// The reset happens even if the backend call fails. The fresh state
    /// carries a single notice reporting how sign-out went.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        let result = self.sessions.sign_out().await;
        let mut state = self.state.write();
        *state = AppState::default();
        match &result {
            Ok(()) => state.notices.info("Signed out"),
            Err(e) => state.notices.error(format!("Sign-out failed: {}", e)),
        };
        result
    }

    pub fn session(&self) -> Option<Session> {
        self.state.read().session.clone()
    }

    // ─── Bookmark store ───

    /// Replaces the snapshot with the owner's bookmarks, most recent first.
    ///
    /// On failure the previous snapshot is kept and a notice is raised.
    pub async fn refresh(&self) -> Result<RefreshOutcome, BookmarkError> {
        let (owner, ticket) = {
            let mut state = self.state.write();
            let owner = match &state.session {
                Some(session) => session.owner_id().to_string(),
                None => {
                    debug!("refresh skipped, no session");
                    return Ok(RefreshOutcome::NoSession);
                }
            };
            (owner, state.store.begin_refresh())
        };

        match fetch_snapshot(self.backend.as_ref(), &owner).await {
            Ok(bookmarks) => {
                let count = bookmarks.len();
                let mut state = self.state.write();
                if state.store.apply(ticket, bookmarks) {
                    debug!(count, "bookmarks refreshed");
                    Ok(RefreshOutcome::Applied { count })
                } else {
                    Ok(RefreshOutcome::Discarded)
                }
            }
            Err(e) => {
                warn!(error = %e, "bookmark refresh failed");
                let mut state = self.state.write();
                if state.store.is_current(ticket) {
                    state
                        .notices
                        .error(format!("Could not load bookmarks: {}", e));
                }
                Err(e)
            }
        }
    }

    /// The full snapshot, ignoring the search query.
    pub fn bookmarks(&self) -> Vec<Bookmark> {
        self.state.read().store.bookmarks().to_vec()
    }

    // ─── Mutations ───

    /// Adds a bookmark for the signed-in identity, then refreshes.
    ///
    /// Empty title or url is skipped without contacting the backend. On success
    /// the input draft is cleared.
    pub async fn add_bookmark(&self, title: &str, url: &str) -> Result<AddOutcome, BookmarkError> {
        let record = {
            let mut state = self.state.write();
            let owner = match &state.session {
                Some(session) => session.owner_id().to_string(),
                None => return Err(BookmarkError::NoSession),
            };
            let record = match MutationController::validate(title, url, &owner) {
                Some(record) => record,
                None => {
                    debug!("add skipped, empty title or url");
                    return Ok(AddOutcome::Skipped);
                }
            };
            if !state.mutations.try_begin_add() {
                debug!("add rejected, another add in flight");
                return Ok(AddOutcome::Busy);
            }
            record
        };

        let in_flight = InFlight::add(&self.state);
        let result = self.backend.insert_record(&record).await;
        drop(in_flight);

        match result {
            Ok(bookmark) => {
                info!(id = %bookmark.id, "bookmark added");
                self.state.write().draft.clear();
                let _ = self.refresh().await;
                Ok(AddOutcome::Added(bookmark))
            }
            Err(e) => {
                warn!(error = %e, "bookmark insert failed");
                self.state
                    .write()
                    .notices
                    .error(format!("Could not add bookmark: {}", e));
                Err(e.into())
            }
        }
    }

    pub fn set_draft_title(&self, title: impl Into<String>) {
        self.state.write().draft.title = title.into();
    }

    pub fn set_draft_url(&self, url: impl Into<String>) {
        self.state.write().draft.url = url.into();
    }

    pub fn draft(&self) -> BookmarkDraft {
        self.state.read().draft.clone()
    }

    /// Adds the bookmark currently typed into the draft fields.
    pub async fn submit_draft(&self) -> Result<AddOutcome, BookmarkError> {
        let draft = self.draft();
        self.add_bookmark(&draft.title, &draft.url).await
    }

    /// Deletes a bookmark by id, then refreshes whether or not the backend
    /// accepted the deletion. Ownership is left to the backend.
    pub async fn delete_bookmark(&self, id: &str, confirmed: bool) -> Result<DeleteOutcome, BookmarkError> {
        {
            let mut state = self.state.write();
            if state.session.is_none() {
                return Err(BookmarkError::NoSession);
            }
            if self.settings.confirm_delete && !confirmed {
                return Ok(DeleteOutcome::NeedsConfirmation);
            }
            if !state.mutations.try_begin_delete(id) {
                debug!(id, "delete rejected, already in flight");
                return Ok(DeleteOutcome::Busy);
            }
        }

        let in_flight = InFlight::delete(&self.state, id);
        let result = self.backend.delete_record(id).await;
        drop(in_flight);

        match &result {
            Ok(()) => info!(id, "bookmark deleted"),
            Err(e) => {
                warn!(id, error = %e, "bookmark delete failed");
                self.state
                    .write()
                    .notices
                    .error(format!("Could not delete bookmark: {}", e));
            }
        }
        let _ = self.refresh().await;
        result.map(|()| DeleteOutcome::Deleted).map_err(Into::into)
    }

    // ─── Filter view ───

    pub fn set_query(&self, query: impl Into<String>) {
        self.state.write().filter.set_query(query);
    }

    pub fn query(&self) -> String {
        self.state.read().filter.query().to_string()
    }

    /// The snapshot filtered by the current query.
    pub fn visible_bookmarks(&self) -> Vec<Bookmark> {
        let state = self.state.read();
        state
            .filter
            .apply(state.store.bookmarks())
            .into_iter()
            .cloned()
            .collect()
    }

    // ─── Notices & theme ───

    pub fn notices(&self) -> Vec<Notice> {
        self.state.read().notices.notices().to_vec()
    }

    pub fn dismiss_notice(&self, id: u64) -> bool {
        self.state.write().notices.dismiss(id)
    }

    pub fn toggle_theme(&self) -> ThemeMode {
        let mut state = self.state.write();
        state.theme = state.theme.toggled();
        state.theme
    }

    pub fn theme(&self) -> ThemeMode {
        self.state.read().theme
    }
}
