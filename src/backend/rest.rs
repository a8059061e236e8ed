//! Backend for the hosted auth + REST record store.
//!
//! Endpoints: `/auth/v1/user`, `/auth/v1/logout`, `/auth/v1/authorize` and
//! `/rest/v1/<table>` with `column=eq.value` filters. Every request carries the
//! project's anonymous key; authenticated ones add the session's bearer token.
//!
//! The bearer token is kept in a session file so a restart restores the
//! session. The file is written when a sign-in callback is accepted and
//! removed on sign-out or when the backend no longer accepts the token.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use reqwest::{header, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use url::Url;
use zeroize::Zeroizing;

use super::{Backend, ListQuery, RecordOrder};
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::BackendError;
use crate::types::session::{AuthCallback, Identity, SignInFlow};

/// File name of the persisted session inside the data directory.
pub const SESSION_FILE: &str = "rest_session.json";

/// Connection parameters for a hosted project.
#[derive(Debug, Clone, PartialEq)]
pub struct RestConfig {
    pub base_url: String,
    pub anon_key: String,
    pub table: String,
    pub redirect_to: Option<String>,
    /// Where the access token is persisted; `None` keeps it in memory only.
    pub session_file: Option<PathBuf>,
}

/// On-disk form of the session file.
#[derive(Serialize)]
struct StoredSessionRef<'a> {
    access_token: &'a str,
}

#[derive(Deserialize)]
struct StoredSession {
    access_token: String,
}

/// User object returned by `/auth/v1/user`.
#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    user_metadata: RemoteUserMetadata,
}

#[derive(Debug, Default, Deserialize)]
struct RemoteUserMetadata {
    full_name: Option<String>,
    name: Option<String>,
}

impl From<RemoteUser> for Identity {
    fn from(user: RemoteUser) -> Self {
        Identity {
            id: user.id,
            email: user.email,
            display_name: user.user_metadata.full_name.or(user.user_metadata.name),
        }
    }
}

pub struct RestBackend {
    http: Client,
    config: RestConfig,
    access_token: RwLock<Option<Zeroizing<String>>>,
}

impl RestBackend {
    pub fn new(config: RestConfig) -> Result<Self, BackendError> {
        Url::parse(&config.base_url)
            .map_err(|e| BackendError::Network(format!("invalid base url: {}", e)))?;
        let restored = config.session_file.as_deref().and_then(load_session);
        if restored.is_some() {
            debug!("restored hosted session token");
        }
        Ok(Self {
            http: Client::new(),
            config,
            access_token: RwLock::new(restored),
        })
    }

    /// Installs a bearer token obtained out of band and persists it.
    pub fn set_access_token(&self, token: impl Into<String>) -> Result<(), BackendError> {
        let token = Zeroizing::new(token.into());
        if let Some(path) = &self.config.session_file {
            store_session(path, &token)?;
        }
        *self.access_token.write() = Some(token);
        Ok(())
    }

    /// Drops the token from memory and from the session file.
    fn forget_access_token(&self) {
        self.access_token.write().take();
        if let Some(path) = &self.config.session_file {
            if let Err(e) = fs::remove_file(path) {
                if e.kind() != ErrorKind::NotFound {
                    warn!(error = %e, path = %path.display(), "failed to remove session file");
                }
            }
        }
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.read().is_some()
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        let base = self.config.base_url.trim_end_matches('/');
        Url::parse(&format!("{}/{}", base, path.trim_start_matches('/')))
            .map_err(|e| BackendError::Network(format!("invalid endpoint: {}", e)))
    }

    /// URL the user agent is sent to for a provider sign-in.
    pub fn authorize_url(&self, provider: &str) -> Result<Url, BackendError> {
        let mut url = self.endpoint("auth/v1/authorize")?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("provider", provider);
            if let Some(redirect) = &self.config.redirect_to {
                pairs.append_pair("redirect_to", redirect);
            }
        }
        Ok(url)
    }

    /// Table URL filtered to one owner and ordered by creation time.
    pub fn list_url(&self, query: &ListQuery) -> Result<Url, BackendError> {
        let mut url = self.endpoint(&format!("rest/v1/{}", self.config.table))?;
        let order = match query.order {
            RecordOrder::CreatedAtDesc => "created_at.desc",
            RecordOrder::CreatedAtAsc => "created_at.asc",
        };
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("user_id", &format!("eq.{}", query.owner_id))
            .append_pair("order", order);
        Ok(url)
    }

    /// Table URL addressing a single row by id.
    pub fn record_url(&self, id: &str) -> Result<Url, BackendError> {
        let mut url = self.endpoint(&format!("rest/v1/{}", self.config.table))?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{}", id));
        Ok(url)
    }

    fn bearer(&self) -> Option<String> {
        self.access_token
            .read()
            .as_ref()
            .map(|token| format!("Bearer {}", token.as_str()))
    }

    /// Adds the project key and, when signed in, the session token.
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request.header("apikey", &self.config.anon_key);
        match self.bearer() {
            Some(bearer) => request.header(header::AUTHORIZATION, bearer),
            None => request.header(
                header::AUTHORIZATION,
                format!("Bearer {}", self.config.anon_key),
            ),
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|e| BackendError::Network(e.to_string()))?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(%status, "backend request failed");
        Err(match status {
            StatusCode::UNAUTHORIZED => BackendError::Unauthorized,
            StatusCode::NOT_FOUND => BackendError::NotFound(body),
            s if s.is_client_error() => BackendError::Rejected(format!("{}: {}", s, body)),
            s => BackendError::Network(format!("{}: {}", s, body)),
        })
    }

    async fn rows(response: Response) -> Result<Vec<Bookmark>, BackendError> {
        response
            .json::<Vec<Bookmark>>()
            .await
            .map_err(|e| BackendError::Serialization(e.to_string()))
    }
}

/// Reads a persisted token. A missing or unreadable file means no session.
fn load_session(path: &Path) -> Option<Zeroizing<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => Zeroizing::new(content),
        Err(e) if e.kind() == ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "failed to read session file");
            return None;
        }
    };
    match serde_json::from_str::<StoredSession>(&content) {
        Ok(stored) if !stored.access_token.is_empty() => Some(Zeroizing::new(stored.access_token)),
        Ok(_) => None,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "ignoring malformed session file");
            None
        }
    }
}

fn store_session(path: &Path, token: &str) -> Result<(), BackendError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            BackendError::Storage(format!("Failed to create session directory: {}", e))
        })?;
    }
    let json = Zeroizing::new(
        serde_json::to_string(&StoredSessionRef {
            access_token: token,
        })
        .map_err(|e| BackendError::Serialization(e.to_string()))?,
    );
    fs::write(path, json.as_bytes())
        .map_err(|e| BackendError::Storage(format!("Failed to write session file: {}", e)))
}

/// Key/value pairs after the last `#` or `?` of a redirect URL, or of the
/// whole input when it has neither.
fn redirect_params(input: &str) -> Vec<(String, String)> {
    let params = match input.rfind(|c: char| c == '#' || c == '?') {
        Some(at) => &input[at + 1..],
        None => input,
    };
    url::form_urlencoded::parse(params.as_bytes())
        .into_owned()
        .collect()
}

/// Extracts the access token from a redirect URL or its `#fragment`.
pub fn parse_callback_fragment(input: &str) -> Option<String> {
    redirect_params(input)
        .into_iter()
        .find(|(key, _)| key == "access_token")
        .map(|(_, value)| value)
        .filter(|token| !token.is_empty())
}

/// The provider's reason when the redirect reports a failed sign-in
/// (`error_description`, else `error`).
pub fn parse_callback_error(input: &str) -> Option<String> {
    let params = redirect_params(input);
    let lookup = |name: &str| {
        params
            .iter()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.clone())
    };
    lookup("error_description").or_else(|| lookup("error"))
}

/// Turns a token callback payload into a bearer token.
///
/// A bare token is used as is. Anything shaped like a redirect must carry
/// `access_token`; a provider error is reported as rejected.
fn token_from_callback(input: &str) -> Result<String, BackendError> {
    if let Some(token) = parse_callback_fragment(input) {
        return Ok(token);
    }
    if let Some(reason) = parse_callback_error(input) {
        return Err(BackendError::Rejected(format!("sign-in failed: {}", reason)));
    }
    let bare = input.trim();
    if bare.is_empty() || bare.contains(|c: char| matches!(c, '#' | '?' | '=' | '&')) {
        return Err(BackendError::UnsupportedCallback(
            "token callback without access_token".to_string(),
        ));
    }
    Ok(bare.to_string())
}

#[async_trait]
impl Backend for RestBackend {
    async fn current_identity(&self) -> Result<Option<Identity>, BackendError> {
        if !self.has_access_token() {
            return Ok(None);
        }
        let url = self.endpoint("auth/v1/user")?;
        match self.send(self.http.get(url)).await {
            Ok(response) => {
                let user = response
                    .json::<RemoteUser>()
                    .await
                    .map_err(|e| BackendError::Serialization(e.to_string()))?;
                Ok(Some(user.into()))
            }
            // An expired or revoked token simply means nobody is signed in.
            Err(BackendError::Unauthorized) => {
                info!("stored session no longer accepted, forgetting token");
                self.forget_access_token();
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in_with_provider(&self, provider: &str) -> Result<SignInFlow, BackendError> {
        if provider.trim().is_empty() {
            return Err(BackendError::UnsupportedProvider(provider.to_string()));
        }
        let url = self.authorize_url(provider)?;
        debug!(provider, "redirecting to hosted sign-in");
        Ok(SignInFlow {
            provider: provider.to_string(),
            redirect_url: Some(url.to_string()),
        })
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        if !self.has_access_token() {
            return Ok(());
        }
        let url = self.endpoint("auth/v1/logout")?;
        let result = self.send(self.http.post(url)).await.map(|_| ());
        // The local token is dropped even if the server call failed.
        self.forget_access_token();
        match result {
            Err(BackendError::Unauthorized) => Ok(()),
            other => other,
        }
    }

    async fn list_records(&self, query: &ListQuery) -> Result<Vec<Bookmark>, BackendError> {
        let url = self.list_url(query)?;
        let response = self.send(self.http.get(url)).await?;
        Self::rows(response).await
    }

    async fn insert_record(&self, record: &NewBookmark) -> Result<Bookmark, BackendError> {
        let url = self.endpoint(&format!("rest/v1/{}", self.config.table))?;
        let request = self
            .http
            .post(url)
            .header("Prefer", "return=representation")
            .json(record);
        let response = self.send(request).await?;
        Self::rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::Rejected("insert returned no row".to_string()))
    }

    async fn delete_record(&self, id: &str) -> Result<(), BackendError> {
        let url = self.record_url(id)?;
        let request = self
            .http
            .delete(url)
            .header("Prefer", "return=representation");
        let response = self.send(request).await?;
        // Rows hidden by ownership policy come back as an empty result.
        if Self::rows(response).await?.is_empty() {
            return Err(BackendError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn accept_callback(&self, callback: AuthCallback) -> Result<(), BackendError> {
        match callback {
            AuthCallback::Token { access_token } => {
                let token = Zeroizing::new(token_from_callback(&access_token)?);
                self.set_access_token(token.as_str())
            }
            AuthCallback::Identity(_) => Err(BackendError::UnsupportedCallback("identity".to_string())),
        }
    }
}
