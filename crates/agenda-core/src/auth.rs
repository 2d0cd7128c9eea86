//! Current user and session, kept in step with the backend's auth events.

use tokio::sync::broadcast::error::TryRecvError;
use tracing::{debug, error, info, warn};

use crate::backend::rows::{NewUser, UserPatch, UserRow};
use crate::backend::{AuthEvent, AuthSubscription, BackendClient, Session};
use crate::error::{BackendError, BackendResult};
use crate::i18n::Language;
use crate::model::UserId;

#[derive(Debug)]
pub struct AuthSession {
    user: Option<UserRow>,
    session: Option<Session>,
    loading: bool,
    subscription: Option<AuthSubscription>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    /// Starts in the loading state until [`AuthSession::init`] runs.
    pub fn new() -> Self {
        Self {
            user: None,
            session: None,
            loading: true,
            subscription: None,
        }
    }

    pub fn user(&self) -> Option<&UserRow> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Subscribes to auth changes, then loads the current session and profile.
    #[tracing::instrument(skip_all)]
    pub async fn init(&mut self, client: &BackendClient) -> BackendResult<()> {
        self.subscription = Some(client.subscribe());
        self.session = client.session().await?;
        self.refresh_profile(client).await;
        Ok(())
    }

    /// Drops the subscription; later auth events are no longer observed.
    pub fn teardown(&mut self) {
        if self.subscription.take().is_some() {
            debug!("auth subscription dropped");
        }
    }

    /// Applies every queued auth event and returns how many were seen.
    pub async fn pump(&mut self, client: &BackendClient) -> usize {
        let mut events: Vec<AuthEvent> = Vec::new();
        let mut lagged = false;
        if let Some(rx) = self.subscription.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(event) => events.push(event),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Lagged(skipped)) => {
                        warn!(skipped, "auth events lagged");
                        lagged = true;
                    }
                    Err(TryRecvError::Closed) => {
                        self.subscription = None;
                        break;
                    }
                }
            }
        }

        let seen = events.len();
        if lagged && events.is_empty() {
            match client.session().await {
                Ok(session) => self.session = session,
                Err(err) => error!(error = %err, "failed to reload session"),
            }
            self.refresh_profile(client).await;
        }
        for event in events {
            debug!(change = ?event.change, "auth state changed");
            self.session = event.session;
            self.refresh_profile(client).await;
        }
        seen
    }

    async fn refresh_profile(&mut self, client: &BackendClient) {
        let Some(user_id) = self.session.as_ref().map(|s| s.user.id) else {
            self.user = None;
            self.loading = false;
            return;
        };

        match client.fetch_user(user_id).await {
            Ok(user) => self.user = Some(user),
            Err(err) => error!(user = %user_id, error = %err, "error fetching user profile"),
        }
        self.loading = false;
    }

    /// Creates the account and its profile row (Spanish, tutorial pending).
    #[tracing::instrument(skip(self, client, password))]
    pub async fn sign_up(
        &mut self,
        client: &BackendClient,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> BackendResult<()> {
        let account = client.sign_up(email, password).await?;
        client
            .insert_user(&NewUser {
                id: account.id,
                email: account.email.clone(),
                full_name: full_name.trim().to_string(),
                language: Language::Es.as_str().to_string(),
                tutorial_completed: false,
            })
            .await?;
        info!(user = %account.id, "profile created");
        self.pump(client).await;
        Ok(())
    }

    #[tracing::instrument(skip(self, client, password))]
    pub async fn sign_in(
        &mut self,
        client: &BackendClient,
        email: &str,
        password: &str,
    ) -> BackendResult<()> {
        client.sign_in(email, password).await?;
        self.pump(client).await;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    pub async fn sign_out(&mut self, client: &BackendClient) -> BackendResult<()> {
        client.sign_out().await?;
        self.pump(client).await;
        // no subscriber: clear locally
        self.session = None;
        self.user = None;
        Ok(())
    }

    /// Persists `patch` and merges it into the cached profile.
    #[tracing::instrument(skip(self, client))]
    pub async fn update_profile(
        &mut self,
        client: &BackendClient,
        patch: &UserPatch,
    ) -> BackendResult<&UserRow> {
        let Some(id) = self.user_id() else {
            return Err(BackendError::NotAuthenticated);
        };
        let updated = client.update_user(id, patch).await?;
        Ok(self.user.insert(updated))
    }
}
