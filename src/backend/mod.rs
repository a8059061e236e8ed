//! Collaborator contract for identity and record storage.
//!
//! The client workflow only ever talks to a [`Backend`]. Two implementations
//! ship with the crate: [`local::LocalBackend`], an in-process SQLite store,
//! and `rest::RestBackend` (feature `network`), which speaks the hosted
//! platform's REST dialect.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::platform;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::BackendError;
use crate::types::settings::BackendSettings;
use crate::types::session::{AuthCallback, Identity, SignInFlow};

pub mod local;
#[cfg(feature = "network")]
pub mod rest;

/// Sort order for listed records.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecordOrder {
    #[default]
    CreatedAtDesc,
    CreatedAtAsc,
}

/// Filter + ordering for a record listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListQuery {
    pub owner_id: String,
    pub order: RecordOrder,
}

impl ListQuery {
    /// All records of one owner, most recent first.
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            order: RecordOrder::CreatedAtDesc,
        }
    }
}

/// Identity + record store operations consumed by the client.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Backend: Send + Sync {
    /// The identity of the current session, if any.
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError>;

    /// Starts an external sign-in with the named provider.
    async fn sign_in_with_provider(&self, provider: &str) -> Result<SignInFlow, BackendError>;

    /// Ends the current session.
    async fn sign_out(&self) -> Result<(), BackendError>;

    async fn list_records(&self, query: &ListQuery) -> Result<Vec<Bookmark>, BackendError>;

    async fn insert_record(&self, record: &NewBookmark) -> Result<Bookmark, BackendError>;

    async fn delete_record(&self, id: &str) -> Result<(), BackendError>;

    /// Hands the provider's callback payload to the backend.
    async fn accept_callback(&self, callback: AuthCallback) -> Result<(), BackendError> {
        let kind = match callback {
            AuthCallback::Token { .. } => "token",
            AuthCallback::Identity(_) => "identity",
        };
        Err(BackendError::UnsupportedCallback(kind.to_string()))
    }
}

pub type DynBackend = Arc<dyn Backend>;

/// File name of the local store inside the data directory.
pub const LOCAL_DATABASE_FILE: &str = "smartmark.db";

/// Builds the backend described by `settings`.
///
/// A local store without an explicit path lives in the platform data directory.
pub fn from_settings(settings: &BackendSettings) -> Result<DynBackend, BackendError> {
    match settings {
        BackendSettings::Local { database_path } => {
            let path = match database_path {
                Some(path) => PathBuf::from(path),
                None => platform::get_data_dir().join(LOCAL_DATABASE_FILE),
            };
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).map_err(|e| {
                    BackendError::Storage(format!("Failed to create data directory: {}", e))
                })?;
            }
            info!(path = %path.display(), "using local backend");
            Ok(Arc::new(local::LocalBackend::open(&path)?))
        }
        #[cfg(feature = "network")]
        BackendSettings::Rest {
            base_url,
            anon_key,
            table,
            redirect_to,
        } => {
            info!(base_url = %base_url, "using hosted backend");
            let config = rest::RestConfig {
                base_url: base_url.clone(),
                anon_key: anon_key.clone(),
                table: table.clone(),
                redirect_to: redirect_to.clone(),
                session_file: Some(platform::get_data_dir().join(rest::SESSION_FILE)),
            };
            Ok(Arc::new(rest::RestBackend::new(config)?))
        }
        #[cfg(not(feature = "network"))]
        BackendSettings::Rest { .. } => Err(BackendError::Network(
            "built without the `network` feature".to_string(),
        )),
    }
}
