//! Session Manager for Smartmark.
//!
//! Resolves, starts and ends the authenticated session against the backend.
//! Holds no session itself: the resolved [`Session`] lives in the application
//! state, so resetting that state is enough to forget it.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::backend::DynBackend;
use crate::types::errors::SessionError;
use crate::types::session::{AuthCallback, Session, SignInFlow};

/// Trait defining session operations.
#[async_trait]
pub trait SessionManagerTrait {
    /// Asks the backend once for an already established session.
    async fn resolve_session(&self) -> Result<Option<Session>, SessionError>;
    async fn sign_in(&self, provider: &str) -> Result<SignInFlow, SessionError>;
    /// Hands the provider callback to the backend and re-resolves.
    async fn complete_sign_in(&self, callback: AuthCallback) -> Result<Option<Session>, SessionError>;
    async fn sign_out(&self) -> Result<(), SessionError>;
}

pub struct SessionManager {
    backend: DynBackend,
}

impl SessionManager {
    pub fn new(backend: DynBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl SessionManagerTrait for SessionManager {
    async fn resolve_session(&self) -> Result<Option<Session>, SessionError> {
        let identity = self.backend.current_identity().await?;
        match &identity {
            Some(identity) => info!(identity = %identity.id, "session resolved"),
            None => debug!("no session to restore"),
        }
        Ok(identity.map(Session::new))
    }

    async fn sign_in(&self, provider: &str) -> Result<SignInFlow, SessionError> {
        let flow = self.backend.sign_in_with_provider(provider).await?;
        info!(provider, redirect = flow.redirect_url.is_some(), "sign-in started");
        Ok(flow)
    }

    async fn complete_sign_in(&self, callback: AuthCallback) -> Result<Option<Session>, SessionError> {
        self.backend.accept_callback(callback).await?;
        self.resolve_session().await
    }

    async fn sign_out(&self) -> Result<(), SessionError> {
        self.backend.sign_out().await?;
        info!("signed out");
        Ok(())
    }
}
