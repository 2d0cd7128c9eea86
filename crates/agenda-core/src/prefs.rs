//! Small client-side state kept next to the local data: the language choice,
//! the last selected calendar and how far the walkthrough got.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::i18n::Language;
use crate::model::CalendarId;

const LANGUAGE_FILE: &str = "language";
const SELECTION_FILE: &str = "selection";
const TUTORIAL_FILE: &str = "tutorial-step";

#[derive(Debug, Clone)]
pub struct Preferences {
    language_path: PathBuf,
    selection_path: PathBuf,
    tutorial_path: PathBuf,
}

impl Preferences {
    #[tracing::instrument(skip(data_dir))]
    pub fn open(data_dir: &Path) -> anyhow::Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("failed to create {}", data_dir.display()))?;
        Ok(Self {
            language_path: data_dir.join(LANGUAGE_FILE),
            selection_path: data_dir.join(SELECTION_FILE),
            tutorial_path: data_dir.join(TUTORIAL_FILE),
        })
    }

    /// Stored language, if any. Unreadable or unknown values count as unset.
    pub fn language(&self) -> Option<Language> {
        let raw = read_trimmed(&self.language_path)?;
        match raw.parse() {
            Ok(language) => Some(language),
            Err(err) => {
                warn!(value = %raw, error = %err, "ignoring stored language");
                None
            }
        }
    }

    #[tracing::instrument(skip(self))]
    pub fn set_language(&self, language: Language) -> anyhow::Result<()> {
        fs::write(&self.language_path, language.as_str())
            .with_context(|| format!("failed writing {}", self.language_path.display()))?;
        debug!(%language, "stored language preference");
        Ok(())
    }

    pub fn selected_calendar(&self) -> Option<CalendarId> {
        let raw = read_trimmed(&self.selection_path)?;
        Uuid::parse_str(&raw).ok()
    }

    #[tracing::instrument(skip(self))]
    pub fn set_selected_calendar(&self, calendar: Option<CalendarId>) -> anyhow::Result<()> {
        let payload = calendar.map(|id| id.to_string()).unwrap_or_default();
        fs::write(&self.selection_path, payload)
            .with_context(|| format!("failed writing {}", self.selection_path.display()))?;
        Ok(())
    }

    pub fn tutorial_step(&self) -> usize {
        read_trimmed(&self.tutorial_path)
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(0)
    }

    pub fn set_tutorial_step(&self, index: usize) -> anyhow::Result<()> {
        fs::write(&self.tutorial_path, index.to_string())
            .with_context(|| format!("failed writing {}", self.tutorial_path.display()))?;
        Ok(())
    }
}

fn read_trimmed(path: &Path) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn language_round_trips_through_file() {
        let temp = tempfile::tempdir().expect("tempdir");
        let prefs = Preferences::open(temp.path()).expect("open prefs");
        assert_eq!(prefs.language(), None);

        prefs.set_language(Language::En).expect("store language");
        let reopened = Preferences::open(temp.path()).expect("reopen prefs");
        assert_eq!(reopened.language(), Some(Language::En));
    }

    #[test]
    fn garbage_language_is_ignored() {
        let temp = tempfile::tempdir().expect("tempdir");
        fs::write(temp.path().join(LANGUAGE_FILE), "klingon").expect("write");
        let prefs = Preferences::open(temp.path()).expect("open prefs");
        assert_eq!(prefs.language(), None);
    }

    #[test]
    fn selection_can_be_cleared() {
        let temp = tempfile::tempdir().expect("tempdir");
        let prefs = Preferences::open(temp.path()).expect("open prefs");
        let id = Uuid::new_v4();
        prefs.set_selected_calendar(Some(id)).expect("store");
        assert_eq!(prefs.selected_calendar(), Some(id));
        prefs.set_selected_calendar(None).expect("clear");
        assert_eq!(prefs.selected_calendar(), None);
    }

    #[test]
    fn tutorial_step_defaults_to_start() {
        let temp = tempfile::tempdir().expect("tempdir");
        let prefs = Preferences::open(temp.path()).expect("open prefs");
        assert_eq!(prefs.tutorial_step(), 0);
        prefs.set_tutorial_step(4).expect("store");
        assert_eq!(prefs.tutorial_step(), 4);
    }
}
