use anyhow::{Context, Result};
use log::warn;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::PathBuf,
    sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::models::NotificationWindow;

pub const FALLBACK_QUESTION: &str = "What are you doing right now?";

fn default_questions() -> Vec<String> {
    [
        FALLBACK_QUESTION,
        "Is this work planned, or are you escaping something?",
        "Are you able to focus?",
        "Explain what you are doing in ten seconds.",
        "Are you zoning out?",
        "Is this really the highest priority task?",
    ]
    .iter()
    .map(|q| q.to_string())
    .collect()
}

/// Picks a random prompt, falling back to a fixed question when the bank is empty.
pub fn pick_question(questions: &[String]) -> String {
    questions
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| FALLBACK_QUESTION.to_string())
}

/// Read/write contract the scheduler and the check-in service depend on.
pub trait SettingsRepository: Send + Sync {
    fn notification_window(&self) -> NotificationWindow;
    fn set_notification_window(&self, window: NotificationWindow) -> Result<()>;
    fn questions(&self) -> Vec<String>;
    fn set_questions(&self, questions: Vec<String>) -> Result<()>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AiSettings {
    pub enabled: bool,
    pub base_url: String,
    pub token: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub notification_window: NotificationWindow,
    pub questions: Vec<String>,
    pub image_files: Vec<String>,
    pub ai: AiSettings,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notification_window: NotificationWindow::default(),
            questions: default_questions(),
            image_files: Vec::new(),
            ai: AiSettings::default(),
        }
    }
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Settings at {} are unreadable ({err}); using defaults",
                    path.display()
                );
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn snapshot(&self) -> UserSettings {
        self.read().clone()
    }

    pub fn image_files(&self) -> Vec<String> {
        self.read().image_files.clone()
    }

    pub fn set_image_files(&self, files: Vec<String>) -> Result<()> {
        self.update(|data| data.image_files = files)
    }

    pub fn ai_settings(&self) -> AiSettings {
        self.read().ai.clone()
    }

    pub fn set_ai_settings(&self, settings: AiSettings) -> Result<()> {
        self.update(|data| data.ai = settings)
    }

    pub fn reload(&self) -> Result<()> {
        let contents = fs::read_to_string(&self.path)?;
        let data: UserSettings = serde_json::from_str(&contents)?;
        *self.write() = data;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut UserSettings)) -> Result<()> {
        let mut guard = self.write();
        apply(&mut guard);
        self.persist(&guard)
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory {}", parent.display())
            })?;
        }
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }

    fn read(&self) -> RwLockReadGuard<'_, UserSettings> {
        self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, UserSettings> {
        self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SettingsRepository for SettingsStore {
    fn notification_window(&self) -> NotificationWindow {
        self.read().notification_window
    }

    fn set_notification_window(&self, window: NotificationWindow) -> Result<()> {
        self.update(|data| data.notification_window = window)
    }

    fn questions(&self) -> Vec<String> {
        self.read().questions.clone()
    }

    fn set_questions(&self, questions: Vec<String>) -> Result<()> {
        self.update(|data| data.questions = questions)
    }
}

/// Non-persistent settings, for embedding without a data directory and for tests.
#[derive(Default)]
pub struct InMemorySettings {
    data: RwLock<UserSettings>,
}

impl InMemorySettings {
    pub fn with_window(window: NotificationWindow) -> Self {
        Self {
            data: RwLock::new(UserSettings {
                notification_window: window,
                ..UserSettings::default()
            }),
        }
    }
}

impl SettingsRepository for InMemorySettings {
    fn notification_window(&self) -> NotificationWindow {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .notification_window
    }

    fn set_notification_window(&self, window: NotificationWindow) -> Result<()> {
        self.data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .notification_window = window;
        Ok(())
    }

    fn questions(&self) -> Vec<String> {
        self.data
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .questions
            .clone()
    }

    fn set_questions(&self, questions: Vec<String>) -> Result<()> {
        self.data
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .questions = questions;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().expect("tempdir");
        let store = SettingsStore::new(dir.path().join("settings.json")).expect("store");
        assert_eq!(store.notification_window(), NotificationWindow::default());
        assert_eq!(store.questions().len(), 6);
        assert!(store.image_files().is_empty());
    }

    #[test]
    fn updates_persist_across_instances() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("settings.json");
        let window = NotificationWindow::new(22, 6).expect("window");

        {
            let store = SettingsStore::new(path.clone()).expect("store");
            store.set_notification_window(window).expect("save window");
            store
                .set_questions(vec!["Still on track?".into()])
                .expect("save questions");
            store
                .set_ai_settings(AiSettings {
                    enabled: true,
                    model: "small".into(),
                    ..AiSettings::default()
                })
                .expect("save ai");
        }

        let reopened = SettingsStore::new(path).expect("reopen");
        assert_eq!(reopened.notification_window(), window);
        assert_eq!(reopened.questions(), vec!["Still on track?".to_string()]);
        assert!(reopened.ai_settings().enabled);
        assert_eq!(reopened.ai_settings().model, "small");
    }

    #[test]
    fn corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").expect("write");
        let store = SettingsStore::new(path).expect("store");
        assert_eq!(store.snapshot(), UserSettings::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"notificationWindow":{"startHour":7,"endHour":7}}"#)
            .expect("write");
        let store = SettingsStore::new(path).expect("store");
        assert!(store.notification_window().is_unrestricted());
        assert_eq!(store.questions(), default_questions());
    }

    #[test]
    fn reload_picks_up_external_edits() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        let store = SettingsStore::new(path.clone()).expect("store");
        store
            .set_image_files(vec!["cat.png".into()])
            .expect("save images");

        fs::write(&path, r#"{"imageFiles":["dog.png"]}"#).expect("external edit");
        store.reload().expect("reload");
        assert_eq!(store.image_files(), vec!["dog.png".to_string()]);
    }

    #[test]
    fn empty_bank_uses_fallback_question() {
        assert_eq!(pick_question(&[]), FALLBACK_QUESTION);
        let bank = vec!["only one".to_string()];
        assert_eq!(pick_question(&bank), "only one");
    }
}
