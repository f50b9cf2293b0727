//! Cookie-backed session persisted between runs.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Cookie jar file name in the state directory
pub const COOKIE_FILE: &str = "eero_cookies.json";

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "s";

/// A token must be longer than this to count as a session.
/// The remote never hands out shorter tokens; placeholders like `none` are.
const MIN_TOKEN_LENGTH: usize = 16;

/// Value written over the token on logout
const LOGGED_OUT_VALUE: &str = "none";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Failed to access cookie file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse cookie file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<DateTime<Utc>>,
}

impl StoredCookie {
    pub fn is_expired(&self) -> bool {
        self.expires.map(|at| at <= Utc::now()).unwrap_or(false)
    }
}

/// A cookie observed on a response, before it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedCookie {
    pub name: String,
    pub value: String,
    pub expires: Option<DateTime<Utc>>,
}

/// Cookie jar for the API host.
///
/// Only one host is ever contacted, so cookies are keyed by name alone.
#[derive(Debug, Default)]
pub struct Session {
    path: Option<PathBuf>,
    cookies: BTreeMap<String, StoredCookie>,
}

/// Shared handle to the process-wide session.
///
/// The lock guards plain in-memory state and must never be held across an await.
pub type SessionHandle = Arc<Mutex<Session>>;

impl Session {
    /// An empty jar that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the jar from `state_dir`, creating the directory if needed.
    /// A missing or empty file yields an empty jar.
    pub fn load(state_dir: &Path) -> Result<Self, SessionError> {
        std::fs::create_dir_all(state_dir).map_err(|source| SessionError::Io {
            path: state_dir.to_path_buf(),
            source,
        })?;

        let path = state_dir.join(COOKIE_FILE);
        let cookies = if path.exists() {
            let contents = std::fs::read_to_string(&path).map_err(|source| SessionError::Io {
                path: path.clone(),
                source,
            })?;
            if contents.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&contents).map_err(|source| SessionError::Parse {
                    path: path.clone(),
                    source,
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), cookies = cookies.len(), "Loaded cookie jar");
        Ok(Self {
            path: Some(path),
            cookies,
        })
    }

    pub fn into_handle(self) -> SessionHandle {
        Arc::new(Mutex::new(self))
    }

    /// Save the jar to disk (no-op for in-memory sessions)
    pub fn save(&self) -> Result<(), SessionError> {
        let Some(ref path) = self.path else {
            return Ok(());
        };
        let contents = serde_json::to_string_pretty(&self.cookies).map_err(|source| {
            SessionError::Parse {
                path: path.clone(),
                source,
            }
        })?;
        // Write beside the jar and rename over it, so a crash never leaves it truncated
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, contents)
            .and_then(|()| std::fs::rename(&staging, path))
            .map_err(|source| SessionError::Io {
                path: path.clone(),
                source,
            })
    }

    /// The session token, if present and unexpired
    pub fn token(&self) -> Option<&str> {
        self.cookies
            .get(SESSION_COOKIE)
            .filter(|c| !c.is_expired())
            .map(|c| c.value.as_str())
    }

    /// Heuristic: a long enough token means we are logged in.
    /// Never talks to the network.
    pub fn is_authenticated(&self) -> bool {
        self.token()
            .map(|t| t.chars().count() > MIN_TOKEN_LENGTH)
            .unwrap_or(false)
    }

    /// Overwrite the token with an already-expired placeholder and persist.
    pub fn logout(&mut self) -> Result<(), SessionError> {
        self.cookies.insert(
            SESSION_COOKIE.to_string(),
            StoredCookie {
                value: LOGGED_OUT_VALUE.to_string(),
                expires: Some(DateTime::<Utc>::UNIX_EPOCH),
            },
        );
        info!("Session invalidated");
        self.save()
    }

    /// Store cookies from a response. Persists only when something changed.
    pub fn absorb(&mut self, received: &[ReceivedCookie]) -> Result<(), SessionError> {
        let mut changed = false;
        for cookie in received {
            let stored = StoredCookie {
                value: cookie.value.clone(),
                expires: cookie.expires,
            };
            if self.cookies.get(&cookie.name) != Some(&stored) {
                debug!(name = %cookie.name, "Cookie updated");
                self.cookies.insert(cookie.name.clone(), stored);
                changed = true;
            }
        }
        if changed {
            self.save()?;
        }
        Ok(())
    }

    /// Value for a `Cookie` request header, or `None` when the jar has nothing to send
    pub fn cookie_header(&self) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|(_, c)| !c.is_expired())
            .map(|(name, c)| format!("{}={}", name, c.value))
            .collect();
        if pairs.is_empty() {
            None
        } else {
            Some(pairs.join("; "))
        }
    }

    /// Set the token directly. Used when seeding a session, e.g. in tests.
    pub fn set_token(&mut self, token: &str) -> Result<(), SessionError> {
        self.absorb(&[ReceivedCookie {
            name: SESSION_COOKIE.to_string(),
            value: token.to_string(),
            expires: None,
        }])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn cookie(name: &str, value: &str) -> ReceivedCookie {
        ReceivedCookie {
            name: name.to_string(),
            value: value.to_string(),
            expires: None,
        }
    }

    #[test]
    fn test_is_authenticated_length_threshold() {
        let mut session = Session::in_memory();
        assert!(!session.is_authenticated());

        for len in 0..=16 {
            session.set_token(&"a".repeat(len)).unwrap();
            assert!(!session.is_authenticated(), "length {} should not count", len);
        }
        for len in [17, 18, 64] {
            session.set_token(&"a".repeat(len)).unwrap();
            assert!(session.is_authenticated(), "length {} should count", len);
        }
    }

    #[test]
    fn test_other_cookies_do_not_authenticate() {
        let mut session = Session::in_memory();
        session
            .absorb(&[cookie("other", "0123456789abcdef0123456789")])
            .unwrap();
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_expired_token_is_not_authenticated() {
        let mut session = Session::in_memory();
        session
            .absorb(&[ReceivedCookie {
                name: SESSION_COOKIE.to_string(),
                value: "0123456789abcdef0123456789".to_string(),
                expires: Some(Utc::now() - Duration::minutes(1)),
            }])
            .unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.cookie_header(), None);
    }

    #[test]
    fn test_logout_is_idempotent() {
        let mut session = Session::in_memory();
        session.set_token("0123456789abcdef0123456789").unwrap();
        assert!(session.is_authenticated());

        session.logout().unwrap();
        assert!(!session.is_authenticated());
        session.logout().unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.token(), None);
    }

    #[test]
    fn test_cookie_header_joins_live_cookies() {
        let mut session = Session::in_memory();
        assert_eq!(session.cookie_header(), None);
        session
            .absorb(&[cookie("s", "token-value"), cookie("aws", "lb")])
            .unwrap();
        assert_eq!(session.cookie_header().as_deref(), Some("aws=lb; s=token-value"));
    }

    #[test]
    fn test_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let token = "0123456789abcdef0123456789";

        let mut session = Session::load(dir.path()).unwrap();
        assert!(!session.is_authenticated());
        session.set_token(token).unwrap();

        let reloaded = Session::load(dir.path()).unwrap();
        assert!(reloaded.is_authenticated());
        assert_eq!(reloaded.token(), Some(token));
    }

    #[test]
    fn test_save_replaces_jar_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::load(dir.path()).unwrap();
        session.set_token("0123456789abcdef0123456789").unwrap();
        session.set_token("fedcba9876543210fedcba9876").unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files, vec![COOKIE_FILE.to_string()]);
        let reloaded = Session::load(dir.path()).unwrap();
        assert_eq!(reloaded.token(), Some("fedcba9876543210fedcba9876"));
    }

    #[test]
    fn test_interrupted_save_keeps_previous_jar() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::load(dir.path()).unwrap();
        session.set_token("0123456789abcdef0123456789").unwrap();
        // A half-written staging file from a crashed save is ignored
        std::fs::write(dir.path().join("eero_cookies.json.tmp"), "{\"s\": {\"val").unwrap();

        let reloaded = Session::load(dir.path()).unwrap();
        assert!(reloaded.is_authenticated());
    }

    #[test]
    fn test_token_length_counts_characters() {
        let mut session = Session::in_memory();
        // 16 characters, 32 bytes
        session.set_token(&"é".repeat(16)).unwrap();
        assert!(!session.is_authenticated());
        session.set_token(&"é".repeat(17)).unwrap();
        assert!(session.is_authenticated());
    }

    #[test]
    fn test_logout_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = Session::load(dir.path()).unwrap();
        session.set_token("0123456789abcdef0123456789").unwrap();
        session.logout().unwrap();

        let reloaded = Session::load(dir.path()).unwrap();
        assert!(!reloaded.is_authenticated());
    }

    #[test]
    fn test_empty_file_loads_as_empty_jar() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(COOKIE_FILE), "").unwrap();
        let session = Session::load(dir.path()).unwrap();
        assert!(!session.is_authenticated());
        assert_eq!(session.cookie_header(), None);
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(COOKIE_FILE), "{not json").unwrap();
        assert!(matches!(
            Session::load(dir.path()),
            Err(SessionError::Parse { .. })
        ));
    }
}
