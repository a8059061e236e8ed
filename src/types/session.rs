use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user principal reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl Identity {
    /// Name to show in the header: display name, then email, then the raw id.
    pub fn label(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// A resolved session for one identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    pub identity: Identity,
    pub established_at: DateTime<Utc>,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            established_at: Utc::now(),
        }
    }

    pub fn owner_id(&self) -> &str {
        &self.identity.id
    }
}

/// Result of starting an external sign-in.
///
/// `redirect_url` is where the user agent must be sent; backends that complete
/// sign-in out of band leave it empty.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignInFlow {
    pub provider: String,
    pub redirect_url: Option<String>,
}

/// Payload the identity provider hands back once the external flow finishes.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthCallback {
    /// Bearer token issued by the hosted auth service.
    Token { access_token: String },
    /// Identity asserted directly, as the in-process backend does.
    Identity(Identity),
}
