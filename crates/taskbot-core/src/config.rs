use std::{
    env, fs,
    path::{Path, PathBuf},
};

use crate::{errors::Error, Result};

const DEFAULT_DATABASE_PATH: &str = "./tasks.db";
const DEFAULT_LOG_LEVEL: &str = "INFO";
const DEFAULT_MESSAGE_LIMIT: usize = 4096;

/// Typed configuration for the bot.
#[derive(Clone, Debug)]
pub struct Config {
    pub bot_token: String,
    pub database_path: PathBuf,
    pub log_level: String,

    // CSV exports are written here and deleted after sending.
    pub export_dir: PathBuf,

    pub telegram_message_limit: usize,
}

impl Config {
    /// Load `.env` (if present) and the process environment.
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let bot_token = lookup("BOT_TOKEN").unwrap_or_default().trim().to_string();
        let database_path = lookup("DATABASE_PATH")
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string())
            .trim()
            .to_string();
        let log_level = lookup("LOG_LEVEL")
            .and_then(non_empty)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
            .trim()
            .to_uppercase();

        // Report every missing required value at once.
        let mut missing = Vec::new();
        if bot_token.is_empty() {
            missing.push("BOT_TOKEN");
        }
        if database_path.is_empty() {
            missing.push("DATABASE_PATH");
        }
        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required configuration: {}",
                missing.join(", ")
            )));
        }

        let export_dir = lookup("EXPORT_DIR")
            .and_then(non_empty)
            .map(|s| PathBuf::from(s.trim()))
            .unwrap_or_else(|| env::temp_dir().join("taskbot"));

        let telegram_message_limit = lookup("TELEGRAM_MESSAGE_LIMIT")
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MESSAGE_LIMIT);

        Ok(Self {
            bot_token,
            database_path: PathBuf::from(database_path),
            log_level,
            export_dir,
            telegram_message_limit,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for (key, val) in parse_dotenv(&contents) {
        if env::var_os(&key).is_some() {
            continue; // do not override existing env
        }
        env::set_var(key, val);
    }
}

fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim().trim_start_matches("export ").trim();
        if key.is_empty() {
            continue;
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        out.push((key.to_string(), val));
    }
    out
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
