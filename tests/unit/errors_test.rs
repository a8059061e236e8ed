use smartmark::types::errors::*;

// === BackendError Tests ===

#[test]
fn backend_error_display_variants() {
    assert_eq!(
        BackendError::Network("connection refused".to_string()).to_string(),
        "Backend network error: connection refused"
    );
    assert_eq!(BackendError::Unauthorized.to_string(), "Not authorized by backend");
    assert_eq!(
        BackendError::Rejected("not yours".to_string()).to_string(),
        "Backend rejected request: not yours"
    );
    assert_eq!(
        BackendError::NotFound("bm-1".to_string()).to_string(),
        "Record not found: bm-1"
    );
    assert_eq!(
        BackendError::Storage("disk full".to_string()).to_string(),
        "Backend storage error: disk full"
    );
    assert_eq!(
        BackendError::Serialization("eof".to_string()).to_string(),
        "Backend serialization error: eof"
    );
    assert_eq!(
        BackendError::UnsupportedProvider("myspace".to_string()).to_string(),
        "Unsupported identity provider: myspace"
    );
    assert_eq!(
        BackendError::UnsupportedCallback("token".to_string()).to_string(),
        "Unsupported sign-in callback: token"
    );
}

#[test]
fn backend_error_implements_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(BackendError::Unauthorized);
    assert!(err.source().is_none());
}

// === SessionError Tests ===

#[test]
fn session_error_is_transparent_over_backend() {
    let err: SessionError = BackendError::Unauthorized.into();
    assert_eq!(err.to_string(), "Not authorized by backend");
}

// === BookmarkError Tests ===

#[test]
fn bookmark_error_display_variants() {
    assert_eq!(BookmarkError::NoSession.to_string(), "No active session");
    let err: BookmarkError = BackendError::NotFound("bm-9".to_string()).into();
    assert_eq!(err.to_string(), "Record not found: bm-9");
    assert!(matches!(err, BookmarkError::Backend(BackendError::NotFound(_))));
}

// === SettingsError Tests ===

#[test]
fn settings_error_display_variants() {
    assert_eq!(
        SettingsError::IoError("denied".to_string()).to_string(),
        "Settings I/O error: denied"
    );
    assert_eq!(
        SettingsError::SerializationError("bad json".to_string()).to_string(),
        "Settings serialization error: bad json"
    );
    assert_eq!(
        SettingsError::InvalidKey("nope".to_string()).to_string(),
        "Invalid settings key: nope"
    );
    assert_eq!(
        SettingsError::InvalidValue("42".to_string()).to_string(),
        "Invalid settings value: 42"
    );
}
