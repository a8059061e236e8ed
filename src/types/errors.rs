use thiserror::Error;

// === BackendError ===

/// Errors reported by a backend collaborator.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request never reached the backend or the response was lost.
    #[error("Backend network error: {0}")]
    Network(String),
    /// The caller has no valid session with the backend.
    #[error("Not authorized by backend")]
    Unauthorized,
    /// The backend refused the operation (ownership or policy).
    #[error("Backend rejected request: {0}")]
    Rejected(String),
    /// The addressed record does not exist for this caller.
    #[error("Record not found: {0}")]
    NotFound(String),
    /// The backend's storage layer failed.
    #[error("Backend storage error: {0}")]
    Storage(String),
    /// A payload could not be encoded or decoded.
    #[error("Backend serialization error: {0}")]
    Serialization(String),
    /// The identity provider is not known to this backend.
    #[error("Unsupported identity provider: {0}")]
    UnsupportedProvider(String),
    /// The sign-in callback carries a payload this backend cannot use.
    #[error("Unsupported sign-in callback: {0}")]
    UnsupportedCallback(String),
}

// === SessionError ===

/// Errors related to session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Backend(#[from] BackendError),
}

// === BookmarkError ===

/// Errors related to bookmark store and mutation operations.
#[derive(Debug, Error)]
pub enum BookmarkError {
    /// No session is available to scope the operation.
    #[error("No active session")]
    NoSession,
    #[error(transparent)]
    Backend(#[from] BackendError),
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    #[error("Settings I/O error: {0}")]
    IoError(String),
    /// Failed to serialize or deserialize settings.
    #[error("Settings serialization error: {0}")]
    SerializationError(String),
    /// The provided settings key is invalid.
    #[error("Invalid settings key: {0}")]
    InvalidKey(String),
    /// The provided settings value is invalid.
    #[error("Invalid settings value: {0}")]
    InvalidValue(String),
}
