use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::domain::ChatRef;
use crate::errors::Error;
use crate::sync::RetryPolicy;
use crate::Result;

/// Chat backend selected at startup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// In-memory backend: scripted chats, no network. Serves tests and
    /// dry-run deployments.
    Memory,
}

/// Typed service configuration, read once at startup and passed by value to
/// the components that need it.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_addr: String,
    pub db_path: PathBuf,
    pub backend: BackendKind,

    // Directory sync. Disabled entirely when no anchor chat is configured.
    pub directory_chat: Option<ChatRef>,
    pub directory_root_id: i32,
    pub sync_retry: RetryPolicy,

    // Placement scan page sizes.
    pub history_limit: usize,
    pub reply_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let bind_addr = env_str("TGC_BIND").unwrap_or_else(|| "0.0.0.0:8000".to_string());
        let db_path = PathBuf::from(
            env_str("TGC_DB_PATH").unwrap_or_else(|| "db/telegram_app.db".to_string()),
        );

        let backend = match env_str("TGC_BACKEND").as_deref().map(str::trim) {
            None | Some("") | Some("memory") => BackendKind::Memory,
            Some(other) => {
                return Err(Error::Config(format!(
                    "unknown TGC_BACKEND: {other} (supported: memory)"
                )));
            }
        };

        let directory_chat = env_str("TGC_DIRECTORY_CHAT")
            .and_then(non_empty)
            .map(|s| ChatRef::parse(&s));
        let directory_root_id = env_i32("TGC_DIRECTORY_ROOT_ID")?.unwrap_or(11);

        let history_limit = env_usize("TGC_HISTORY_LIMIT")?.unwrap_or(30);
        let reply_limit = env_usize("TGC_REPLY_LIMIT")?.unwrap_or(10);

        let backoff = Duration::from_millis(env_u64("TGC_SYNC_BACKOFF_MS")?.unwrap_or(500));
        let sync_retry = RetryPolicy {
            backoff,
            ..RetryPolicy::default()
        };

        Ok(Self {
            bind_addr,
            db_path,
            backend,
            directory_chat,
            directory_root_id,
            sync_retry,
            history_limit,
            reply_limit,
        })
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_u64(key: &str) -> Result<Option<u64>> {
    parse_env(key)
}

fn env_i32(key: &str) -> Result<Option<i32>> {
    parse_env(key)
}

fn env_usize(key: &str) -> Result<Option<usize>> {
    parse_env(key)
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    let Some(raw) = env_str(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|_| Error::Config(format!("{key} must be an integer, got {raw:?}")))
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
