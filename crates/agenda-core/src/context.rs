//! Everything a command needs, built once at startup and torn down on exit.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use chrono::{Local, NaiveDate};
use tracing::{debug, info};

use crate::auth::AuthSession;
use crate::backend::{Backend, BackendClient};
use crate::config::Config;
use crate::i18n::{I18n, Language};
use crate::prefs::Preferences;

#[derive(Debug)]
pub struct AppContext {
    pub config: Config,
    pub prefs: Preferences,
    pub i18n: I18n,
    pub client: BackendClient,
    pub auth: AuthSession,
    data_dir: PathBuf,
    today: NaiveDate,
}

impl AppContext {
    /// Language comes from the stored preference, then the config file,
    /// then the system locale.
    #[tracing::instrument(skip(config, backend))]
    pub fn new(config: Config, data_dir: &Path, backend: Arc<dyn Backend>) -> anyhow::Result<Self> {
        let prefs = Preferences::open(data_dir)
            .with_context(|| format!("failed to open preferences in {}", data_dir.display()))?;

        let language = prefs
            .language()
            .or(config.language)
            .unwrap_or_else(Language::detect_system);
        debug!(%language, "resolved language");

        Ok(Self {
            config,
            prefs,
            i18n: I18n::new(language),
            client: BackendClient::new(backend),
            auth: AuthSession::new(),
            data_dir: data_dir.to_path_buf(),
            today: Local::now().date_naive(),
        })
    }

    /// Pins "today"; row defaults and the upcoming panel use it.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn language(&self) -> Language {
        self.i18n.language()
    }

    #[tracing::instrument(skip(self))]
    pub async fn init(&mut self) -> anyhow::Result<()> {
        self.auth
            .init(&self.client)
            .await
            .context("failed to restore session")?;
        info!(signed_in = self.auth.user().is_some(), "context ready");
        Ok(())
    }

    pub fn teardown(&mut self) {
        self.auth.teardown();
        debug!("context torn down");
    }

    /// Switches the lookup language and stores the choice.
    pub fn set_language(&mut self, language: Language) -> anyhow::Result<()> {
        self.prefs.set_language(language)?;
        self.i18n.set_language(language);
        info!(%language, "language changed");
        Ok(())
    }
}
