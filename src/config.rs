use std::{env, path::PathBuf};

use tokio::time::Duration;

use crate::scheduling::context::{DEFAULT_WATCH_INTERVAL, DEBUG_WATCH_INTERVAL};

pub const DATA_DIR_ENV: &str = "FOCUS_CHECKIN_DATA_DIR";
pub const DEBUG_ENV: &str = "FOCUS_CHECKIN_DEBUG";

const APP_DIR_NAME: &str = "FocusSupport";
const LOGS_DIR_NAME: &str = "Logs";
const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub debug: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let data_dir = env::var_os(DATA_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .or_else(|| dirs::data_dir().map(|dir| dir.join(APP_DIR_NAME)))
            .unwrap_or_else(|| PathBuf::from(APP_DIR_NAME));

        let debug = env::var(DEBUG_ENV)
            .map(|value| is_truthy(&value))
            .unwrap_or(false);

        Self { data_dir, debug }
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join(LOGS_DIR_NAME)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE_NAME)
    }

    pub fn watch_interval(&self) -> Duration {
        if self.debug {
            DEBUG_WATCH_INTERVAL
        } else {
            DEFAULT_WATCH_INTERVAL
        }
    }
}

fn is_truthy(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}
