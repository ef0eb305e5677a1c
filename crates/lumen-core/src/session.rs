//! Session state and token persistence.
//!
//! The session holds the bearer token and the connectivity flag for one
//! dashboard run. The token is persisted across runs in a fixed file under
//! the user config directory and is validated by a live probe on restore —
//! a stale or revoked token routes back to the login screen rather than to
//! a broken dashboard.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, warn};

/// On-disk storage for the bearer token.
///
/// A best-effort store: a failure to persist is logged and does not fail the
/// login that produced the token. Tests use [`TokenStore::disabled`] to keep
/// sessions off the filesystem.
#[derive(Debug, Clone)]
pub struct TokenStore {
    path: Option<PathBuf>,
}

impl TokenStore {
    /// The default token file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lumen")
            .join("token")
    }

    /// Store backed by the default path.
    pub fn new() -> Self {
        Self {
            path: Some(Self::default_path()),
        }
    }

    /// Store backed by a specific file.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store that never touches the filesystem.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    /// Load a previously persisted token, if any.
    pub fn load(&self) -> Option<String> {
        let path = self.path.as_ref()?;
        match fs::read_to_string(path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read token file");
                None
            }
        }
    }

    /// Persist a token, replacing any previous one.
    pub fn save(&self, token: &str) {
        let Some(path) = self.path.as_ref() else {
            return;
        };
        if let Some(parent) = path.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warn!(path = %parent.display(), error = %e, "failed to create token directory");
            return;
        }
        if let Err(e) = fs::write(path, token) {
            warn!(path = %path.display(), error = %e, "failed to persist token");
        }
    }

    /// Remove the persisted token. Safe to call when none exists.
    pub fn clear(&self) {
        let Some(path) = self.path.as_ref() else {
            return;
        };
        match fs::remove_file(path) {
            Ok(()) => debug!(path = %path.display(), "cleared persisted token"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to clear token"),
        }
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Authentication and connectivity state for one dashboard run.
#[derive(Debug)]
pub struct Session {
    token: Option<String>,
    connected: bool,
    store: TokenStore,
}

impl Session {
    /// Create an unauthenticated session backed by the given token store.
    pub fn new(store: TokenStore) -> Self {
        Self {
            token: None,
            connected: false,
            store,
        }
    }

    /// The active bearer token, if logged in.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether a token is held (polling is allowed).
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Whether the last request reached the server.
    pub fn connected(&self) -> bool {
        self.connected
    }

    /// Update the connectivity flag; returns whether it changed.
    pub fn set_connected(&mut self, connected: bool) -> bool {
        let changed = self.connected != connected;
        self.connected = connected;
        changed
    }

    /// Adopt a freshly issued token and persist it.
    pub fn begin(&mut self, token: String) {
        self.store.save(&token);
        self.token = Some(token);
        self.connected = true;
    }

    /// Adopt a token that is already persisted (validated restore).
    pub fn adopt(&mut self, token: String) {
        self.token = Some(token);
        self.connected = true;
    }

    /// Load the persisted token for a restore probe.
    pub fn stored_token(&self) -> Option<String> {
        self.store.load()
    }

    /// Drop a persisted token that failed validation.
    pub fn discard_stored(&self) {
        self.store.clear();
    }

    /// Tear the session down: forget the token, clear the persisted copy,
    /// mark disconnected. Idempotent.
    pub fn clear(&mut self) {
        self.token = None;
        self.connected = false;
        self.store.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, TokenStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = TokenStore::at(dir.path().join("token"));
        (dir, store)
    }

    #[test]
    fn test_store_round_trip() {
        let (_dir, store) = temp_store();
        assert_eq!(store.load(), None);

        store.save("abc123");
        assert_eq!(store.load(), Some("abc123".to_string()));

        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_store_clear_is_idempotent() {
        let (_dir, store) = temp_store();
        store.clear();
        store.clear();
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_store_ignores_blank_file() {
        let (_dir, store) = temp_store();
        store.save("   \n");
        assert_eq!(store.load(), None);
    }

    #[test]
    fn test_session_begin_persists() {
        let (_dir, store) = temp_store();
        let mut session = Session::new(store);
        assert!(!session.is_authenticated());

        session.begin("abc123".to_string());
        assert!(session.is_authenticated());
        assert!(session.connected());
        assert_eq!(session.token(), Some("abc123"));
        assert_eq!(session.stored_token(), Some("abc123".to_string()));
    }

    #[test]
    fn test_session_clear_cascades_to_store() {
        let (_dir, store) = temp_store();
        let mut session = Session::new(store);
        session.begin("abc123".to_string());

        session.clear();
        assert!(!session.is_authenticated());
        assert!(!session.connected());
        assert_eq!(session.stored_token(), None);

        // Safe to call again
        session.clear();
    }

    #[test]
    fn test_adopt_does_not_rewrite_store() {
        let mut session = Session::new(TokenStore::disabled());
        session.adopt("restored".to_string());
        assert!(session.is_authenticated());
        assert!(session.connected());
    }

    #[test]
    fn test_connectivity_change_detection() {
        let mut session = Session::new(TokenStore::disabled());
        assert!(!session.connected());
        assert!(session.set_connected(true));
        assert!(!session.set_connected(true));
        assert!(session.set_connected(false));
    }
}
