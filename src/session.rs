//! Session store: bearer token + signed-in user.
//!
//! The store is injected into [`crate::api::ApiClient`] as
//! `Arc<dyn SessionStore>`; nothing reads ambient global state.
//!
//! Key properties:
//! - Two fixed keys, `ai_cpa_token` and `ai_cpa_user` (user as a JSON blob)
//! - An empty token counts as no token
//! - A user blob that fails to parse reads as `None`
//! - Token strings are zeroed when replaced, cleared or dropped

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use zeroize::Zeroizing;

use crate::models::User;

pub const TOKEN_KEY: &str = "ai_cpa_token";
pub const USER_KEY: &str = "ai_cpa_user";

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Session lock poisoned")]
    LockPoisoned,
}

/// Token/user persistence used by every authenticated call.
pub trait SessionStore: Send + Sync {
    fn get_token(&self) -> Option<String>;
    fn get_user(&self) -> Option<User>;
    /// Store token and user together, replacing any previous session.
    fn set_auth(&self, token: &str, user: &User) -> Result<(), SessionError>;
    /// Remove both keys.
    fn clear_auth(&self) -> Result<(), SessionError>;

    fn is_authenticated(&self) -> bool {
        self.get_token().is_some()
    }
}

// ═══════════════════════════════════════════════════════════
// Entries: the two raw keys, shared by both stores
// ═══════════════════════════════════════════════════════════

type Entries = HashMap<String, Zeroizing<String>>;

fn token_from(entries: &Entries) -> Option<String> {
    entries
        .get(TOKEN_KEY)
        .filter(|t| !t.is_empty())
        .map(|t| t.as_str().to_string())
}

fn user_from(entries: &Entries) -> Option<User> {
    let raw = entries.get(USER_KEY)?;
    serde_json::from_str(raw).ok()
}

fn write_auth(entries: &mut Entries, token: &str, user: &User) -> Result<(), SessionError> {
    let user_json = serde_json::to_string(user)?;
    entries.insert(TOKEN_KEY.to_string(), Zeroizing::new(token.to_string()));
    entries.insert(USER_KEY.to_string(), Zeroizing::new(user_json));
    Ok(())
}

fn remove_auth(entries: &mut Entries) {
    entries.remove(TOKEN_KEY);
    entries.remove(USER_KEY);
}

// ═══════════════════════════════════════════════════════════
// MemorySessionStore
// ═══════════════════════════════════════════════════════════

/// Process-local store. Nothing touches disk.
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<Entries>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a session.
    pub fn with_auth(token: &str, user: &User) -> Result<Self, SessionError> {
        let store = Self::new();
        store.set_auth(token, user)?;
        Ok(store)
    }

    /// Write a raw key, bypassing validation. Mirrors what a tampered
    /// or partially written storage area can contain.
    pub fn put_raw(&self, key: &str, value: &str) -> Result<(), SessionError> {
        self.entries
            .lock()
            .map_err(|_| SessionError::LockPoisoned)?
            .insert(key.to_string(), Zeroizing::new(value.to_string()));
        Ok(())
    }
}

impl SessionStore for MemorySessionStore {
    fn get_token(&self) -> Option<String> {
        self.entries.lock().ok().and_then(|e| token_from(&e))
    }

    fn get_user(&self) -> Option<User> {
        self.entries.lock().ok().and_then(|e| user_from(&e))
    }

    fn set_auth(&self, token: &str, user: &User) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| SessionError::LockPoisoned)?;
        write_auth(&mut entries, token, user)
    }

    fn clear_auth(&self) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| SessionError::LockPoisoned)?;
        remove_auth(&mut entries);
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════
// FileSessionStore
// ═══════════════════════════════════════════════════════════

/// JSON-file backed store used by the CLI.
///
/// The file is a flat object of the two keys. Writes go to a sibling
/// temp file that is renamed over the original, so a crash never leaves
/// a half-written session behind.
pub struct FileSessionStore {
    path: PathBuf,
    entries: Mutex<Entries>,
}

impl FileSessionStore {
    /// Open (or lazily create) the session file at `path`.
    ///
    /// A missing file is an empty session. An unreadable one is logged
    /// and treated as empty rather than locking the user out.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SessionError> {
        let path = path.into();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map
                    .into_iter()
                    .map(|(k, v)| (k, Zeroizing::new(v)))
                    .collect(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Session file unreadable, starting signed out");
                    Entries::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &Entries) -> Result<(), SessionError> {
        let plain: HashMap<&str, &str> = entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let json = Zeroizing::new(serde_json::to_string_pretty(&plain)?);

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = std::fs::File::create(&tmp)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn get_token(&self) -> Option<String> {
        self.entries.lock().ok().and_then(|e| token_from(&e))
    }

    fn get_user(&self) -> Option<User> {
        self.entries.lock().ok().and_then(|e| user_from(&e))
    }

    fn set_auth(&self, token: &str, user: &User) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| SessionError::LockPoisoned)?;
        let mut next = entries.clone();
        write_auth(&mut next, token, user)?;
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    fn clear_auth(&self) -> Result<(), SessionError> {
        let mut entries = self.entries.lock().map_err(|_| SessionError::LockPoisoned)?;
        let mut next = entries.clone();
        remove_auth(&mut next);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }
}
