//! In-process backend on SQLite.
//!
//! Plays the role of the hosted platform for offline use and tests. The
//! signed-in identity is persisted, so reopening the same database file
//! restores the session. Row ownership is enforced here, not by callers.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{debug, info};
use uuid::Uuid;

use super::{Backend, ListQuery, RecordOrder};
use crate::database::Database;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::BackendError;
use crate::types::session::{AuthCallback, Identity, SignInFlow};

/// Identity providers this backend accepts sign-ins from.
pub const SUPPORTED_PROVIDERS: &[&str] = &["google", "github"];

/// Backend storing identities and bookmarks in a local SQLite database.
pub struct LocalBackend {
    db: Mutex<Database>,
    pending_provider: Mutex<Option<String>>,
}

impl LocalBackend {
    /// Opens (or creates) the store at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, BackendError> {
        let db = Database::open(path).map_err(|e| BackendError::Storage(e.to_string()))?;
        Ok(Self::with_database(db))
    }

    /// Opens a throwaway in-memory store.
    pub fn open_in_memory() -> Result<Self, BackendError> {
        let db = Database::open_in_memory().map_err(|e| BackendError::Storage(e.to_string()))?;
        Ok(Self::with_database(db))
    }

    pub fn with_database(db: Database) -> Self {
        Self {
            db: Mutex::new(db),
            pending_provider: Mutex::new(None),
        }
    }

    /// Current time in milliseconds; `created_at` resolution.
    fn now_millis() -> i64 {
        Utc::now().timestamp_millis()
    }

    fn signed_in(conn: &Connection) -> Result<Option<Identity>, BackendError> {
        conn.query_row(
            "SELECT i.id, i.email, i.display_name FROM auth_session s \
             JOIN identities i ON i.id = s.identity_id WHERE s.slot = 'current'",
            [],
            |row| {
                Ok(Identity {
                    id: row.get(0)?,
                    email: row.get(1)?,
                    display_name: row.get(2)?,
                })
            },
        )
        .optional()
        .map_err(|e| BackendError::Storage(e.to_string()))
    }

    fn require_identity(conn: &Connection) -> Result<Identity, BackendError> {
        Self::signed_in(conn)?.ok_or(BackendError::Unauthorized)
    }

    /// Reads a single `Bookmark` row into a struct.
    fn row_to_bookmark(row: &rusqlite::Row) -> rusqlite::Result<Bookmark> {
        let millis: i64 = row.get(4)?;
        let created_at = DateTime::<Utc>::from_timestamp_millis(millis)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(4, millis))?;
        Ok(Bookmark {
            id: row.get(0)?,
            title: row.get(1)?,
            url: row.get(2)?,
            user_id: row.get(3)?,
            created_at,
        })
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        let db = self.db.lock();
        Self::signed_in(db.connection())
    }

    async fn sign_in_with_provider(&self, provider: &str) -> Result<SignInFlow, BackendError> {
        if !SUPPORTED_PROVIDERS.contains(&provider) {
            return Err(BackendError::UnsupportedProvider(provider.to_string()));
        }
        *self.pending_provider.lock() = Some(provider.to_string());
        debug!(provider, "local sign-in started, awaiting callback");
        Ok(SignInFlow {
            provider: provider.to_string(),
            redirect_url: None,
        })
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        let db = self.db.lock();
        db.connection()
            .execute("DELETE FROM auth_session", [])
            .map_err(|e| BackendError::Storage(e.to_string()))?;
        *self.pending_provider.lock() = None;
        info!("local session cleared");
        Ok(())
    }

    async fn list_records(&self, query: &ListQuery) -> Result<Vec<Bookmark>, BackendError> {
        let db = self.db.lock();
        let conn = db.connection();
        let identity = Self::require_identity(conn)?;

        // Rows of other owners are invisible, not an error.
        if identity.id != query.owner_id {
            return Ok(Vec::new());
        }

        let sql = match query.order {
            RecordOrder::CreatedAtDesc => {
                "SELECT id, title, url, user_id, created_at FROM bookmarks \
                 WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC"
            }
            RecordOrder::CreatedAtAsc => {
                "SELECT id, title, url, user_id, created_at FROM bookmarks \
                 WHERE user_id = ?1 ORDER BY created_at ASC, rowid ASC"
            }
        };
        let mut stmt = conn
            .prepare(sql)
            .map_err(|e| BackendError::Storage(e.to_string()))?;
        let rows = stmt
            .query_map(params![query.owner_id], Self::row_to_bookmark)
            .map_err(|e| BackendError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row.map_err(|e| BackendError::Storage(e.to_string()))?);
        }
        Ok(results)
    }

    async fn insert_record(&self, record: &NewBookmark) -> Result<Bookmark, BackendError> {
        let db = self.db.lock();
        let conn = db.connection();
        let identity = Self::require_identity(conn)?;
        if identity.id != record.user_id {
            return Err(BackendError::Rejected(format!(
                "cannot insert bookmark for owner {}",
                record.user_id
            )));
        }

        let id = Uuid::new_v4().to_string();
        let millis = Self::now_millis();
        conn.execute(
            "INSERT INTO bookmarks (id, title, url, user_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, record.title, record.url, record.user_id, millis],
        )
        .map_err(|e| BackendError::Storage(e.to_string()))?;

        conn.query_row(
            "SELECT id, title, url, user_id, created_at FROM bookmarks WHERE id = ?1",
            params![id],
            Self::row_to_bookmark,
        )
        .map_err(|e| BackendError::Storage(e.to_string()))
    }

    async fn delete_record(&self, id: &str) -> Result<(), BackendError> {
        let db = self.db.lock();
        let conn = db.connection();
        let identity = Self::require_identity(conn)?;

        let owner: Option<String> = conn
            .query_row(
                "SELECT user_id FROM bookmarks WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| BackendError::Storage(e.to_string()))?;

        match owner {
            None => Err(BackendError::NotFound(id.to_string())),
            Some(owner) if owner != identity.id => Err(BackendError::Rejected(format!(
                "bookmark {} belongs to another owner",
                id
            ))),
            Some(_) => {
                conn.execute("DELETE FROM bookmarks WHERE id = ?1", params![id])
                    .map_err(|e| BackendError::Storage(e.to_string()))?;
                Ok(())
            }
        }
    }

    /// Completes a pending sign-in with the identity the provider asserted.
    async fn accept_callback(&self, callback: AuthCallback) -> Result<(), BackendError> {
        let identity = match callback {
            AuthCallback::Identity(identity) => identity,
            AuthCallback::Token { .. } => {
                return Err(BackendError::UnsupportedCallback("token".to_string()))
            }
        };
        let provider = self
            .pending_provider
            .lock()
            .take()
            .ok_or_else(|| BackendError::Rejected("no sign-in in progress".to_string()))?;

        let db = self.db.lock();
        let conn = db.connection();
        let now = Self::now_millis();
        conn.execute(
            "INSERT INTO identities (id, email, display_name, provider, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5) \
             ON CONFLICT(id) DO UPDATE SET email = excluded.email, display_name = excluded.display_name",
            params![identity.id, identity.email, identity.display_name, provider, now],
        )
        .map_err(|e| BackendError::Storage(e.to_string()))?;
        conn.execute(
            "INSERT OR REPLACE INTO auth_session (slot, identity_id, signed_in_at) VALUES ('current', ?1, ?2)",
            params![identity.id, now],
        )
        .map_err(|e| BackendError::Storage(e.to_string()))?;

        info!(identity = %identity.id, provider = %provider, "local sign-in completed");
        Ok(())
    }
}
