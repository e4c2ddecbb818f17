//! Session credential handling.
//!
//! The backend authenticates with a session cookie. The client keeps it as an
//! opaque [`Credential`] and sends it as a `Cookie` header on every request.
//! [`SessionStore`] optionally persists it between runs.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Opaque session credential (the cookie pairs set by `/auth/login`).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(cookie: impl Into<String>) -> Self {
        Self(cookie.into())
    }

    /// Collect `name=value` pairs from `Set-Cookie` header values.
    ///
    /// Cookie attributes (`Path`, `HttpOnly`, ...) are dropped. Returns `None`
    /// when no cookie was set.
    pub fn from_set_cookie<'a, I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let pairs: Vec<&str> = values
            .into_iter()
            .filter_map(|v| v.split(';').next())
            .map(str::trim)
            .filter(|pair| pair.contains('='))
            .collect();

        if pairs.is_empty() {
            None
        } else {
            Some(Self(pairs.join("; ")))
        }
    }

    /// Value for the `Cookie` request header.
    pub fn header_value(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// File-backed storage for a [`Credential`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    cookie: Credential,
}

impl SessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored credential. A missing file is not an error.
    pub fn load(&self) -> Result<Option<Credential>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)?;
        let file: SessionFile = serde_json::from_str(&content)?;
        Ok(Some(file.cookie))
    }

    pub fn save(&self, credential: &Credential) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&SessionFile {
            cookie: credential.clone(),
        })?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_from_set_cookie_strips_attributes() {
        let cred = Credential::from_set_cookie([
            "session=abc123; HttpOnly; Path=/; SameSite=lax",
            "csrftoken=xyz; Path=/",
        ])
        .unwrap();
        assert_eq!(cred.header_value(), "session=abc123; csrftoken=xyz");
    }

    #[test]
    fn test_from_set_cookie_none() {
        assert!(Credential::from_set_cookie(Vec::<&str>::new()).is_none());
        assert!(Credential::from_set_cookie(["garbage"]).is_none());
    }

    #[test]
    fn test_debug_is_redacted() {
        let cred = Credential::new("session=secret");
        assert!(!format!("{:?}", cred).contains("secret"));
    }

    #[test]
    fn test_store_round_trip_and_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::new(dir.path().join("nested/session.json"));

        assert!(store.load().unwrap().is_none());

        store.save(&Credential::new("session=abc")).unwrap();
        assert_eq!(store.load().unwrap(), Some(Credential::new("session=abc")));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // Clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn test_store_rejects_corrupt_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();
        assert!(SessionStore::new(&path).load().is_err());
    }
}
