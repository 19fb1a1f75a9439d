//! Persisted login state shared by every protected view.
//!
//! All reads and writes go through [`SessionStore`], which owns the key
//! names and converts between the stored strings and [`SessionRecord`].

mod backend;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use backend::{FileBackend, MemoryBackend, SessionBackend};

/// Key names used in the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKey {
    LoggedIn,
    UserId,
    UserEmail,
    UserRole,
}

impl SessionKey {
    pub const ALL: [SessionKey; 4] = [
        SessionKey::LoggedIn,
        SessionKey::UserId,
        SessionKey::UserEmail,
        SessionKey::UserRole,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SessionKey::LoggedIn => "isLoggedIn",
            SessionKey::UserId => "userId",
            SessionKey::UserEmail => "userEmail",
            SessionKey::UserRole => "userRole",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UserRole {
    #[serde(rename = "ADMIN")]
    Admin,
    #[serde(rename = "PROPIETARIO")]
    Owner,
    #[serde(rename = "ARRIENDATARIO", alias = "ARRENDATARIO")]
    Tenant,
}

impl UserRole {
    /// Unknown ids fall back to the tenant role.
    pub fn from_role_id(id: i64) -> Self {
        match id {
            1 => UserRole::Admin,
            2 => UserRole::Owner,
            _ => UserRole::Tenant,
        }
    }

    pub const fn role_id(self) -> i64 {
        match self {
            UserRole::Admin => 1,
            UserRole::Owner => 2,
            UserRole::Tenant => 3,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            UserRole::Admin => "ADMIN",
            UserRole::Owner => "PROPIETARIO",
            UserRole::Tenant => "ARRIENDATARIO",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Some(UserRole::Admin),
            "PROPIETARIO" => Some(UserRole::Owner),
            "ARRIENDATARIO" | "ARRENDATARIO" => Some(UserRole::Tenant),
            _ => None,
        }
    }

    const fn plural_label(self) -> &'static str {
        match self {
            UserRole::Admin => "Administradores",
            UserRole::Owner => "Propietarios",
            UserRole::Tenant => "Arrendatarios",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed view over the four session keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub logged_in: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<UserRole>,
}

impl SessionRecord {
    pub fn is_admin(&self) -> bool {
        self.role == Some(UserRole::Admin)
    }

    pub fn has_role(&self, role: UserRole) -> bool {
        self.role == Some(role)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Debes iniciar sesión para continuar.")]
    NotLoggedIn,
    #[error("Acceso denegado. Solo {}.", .required.plural_label())]
    Forbidden { required: UserRole },
    #[error("session file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session file {path} is not a JSON object: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("session store lock poisoned")]
    Poisoned,
}

/// Cloneable handle to the session backend.
#[derive(Clone)]
pub struct SessionStore {
    backend: Arc<dyn SessionBackend>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackend>) -> Self {
        Self { backend }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::new(Arc::new(FileBackend::new(path)))
    }

    pub fn read(&self) -> Result<SessionRecord, SessionError> {
        let logged_in = self.backend.get(SessionKey::LoggedIn.as_str())?;
        let user_id = self.backend.get(SessionKey::UserId.as_str())?;
        let email = self.backend.get(SessionKey::UserEmail.as_str())?;
        let role = self.backend.get(SessionKey::UserRole.as_str())?;

        Ok(SessionRecord {
            logged_in: logged_in.as_deref() == Some("true"),
            user_id: user_id.and_then(|raw| raw.trim().parse().ok()),
            email: email.filter(|value| !value.is_empty()),
            role: role.as_deref().and_then(UserRole::parse),
        })
    }

    /// Writes every field; `None` fields are removed from the backend.
    pub fn write(&self, record: &SessionRecord) -> Result<(), SessionError> {
        self.backend.set(
            SessionKey::LoggedIn.as_str(),
            if record.logged_in { "true" } else { "false" },
        )?;
        self.put(SessionKey::UserId, record.user_id.map(|id| id.to_string()))?;
        self.put(SessionKey::UserEmail, record.email.clone())?;
        self.put(
            SessionKey::UserRole,
            record.role.map(|role| role.as_str().to_string()),
        )?;
        debug!(
            logged_in = record.logged_in,
            user_id = record.user_id,
            "session updated"
        );
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        for key in SessionKey::ALL {
            self.backend.remove(key.as_str())?;
        }
        info!("session cleared");
        Ok(())
    }

    pub fn require_login(&self) -> Result<SessionRecord, SessionError> {
        let record = self.read()?;
        if record.logged_in {
            Ok(record)
        } else {
            Err(SessionError::NotLoggedIn)
        }
    }

    pub fn require_role(&self, required: UserRole) -> Result<SessionRecord, SessionError> {
        let record = self.require_login()?;
        if record.has_role(required) {
            Ok(record)
        } else {
            Err(SessionError::Forbidden { required })
        }
    }

    fn put(&self, key: SessionKey, value: Option<String>) -> Result<(), SessionError> {
        match value {
            Some(value) => self.backend.set(key.as_str(), &value),
            None => self.backend.remove(key.as_str()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_record() -> SessionRecord {
        SessionRecord {
            logged_in: true,
            user_id: Some(42),
            email: Some("owner@test.cl".to_string()),
            role: Some(UserRole::Owner),
        }
    }

    #[test]
    fn role_ids_map_to_wire_names() {
        assert_eq!(UserRole::from_role_id(1), UserRole::Admin);
        assert_eq!(UserRole::from_role_id(2).as_str(), "PROPIETARIO");
        assert_eq!(UserRole::from_role_id(3), UserRole::Tenant);
        assert_eq!(UserRole::from_role_id(99), UserRole::Tenant);
        assert_eq!(UserRole::parse("admin"), Some(UserRole::Admin));
        assert_eq!(UserRole::parse("GUEST"), None);
    }

    #[test]
    fn tenant_accepts_both_spellings_but_writes_one() {
        assert_eq!(UserRole::parse("arrendatario"), Some(UserRole::Tenant));
        assert_eq!(UserRole::parse("ARRIENDATARIO"), Some(UserRole::Tenant));
        let role: UserRole = serde_json::from_str("\"ARRENDATARIO\"").expect("alias parses");
        assert_eq!(role, UserRole::Tenant);
        assert_eq!(
            serde_json::to_string(&role).expect("serializes"),
            "\"ARRIENDATARIO\""
        );
    }

    #[test]
    fn memory_store_round_trips_and_clears() {
        let store = SessionStore::in_memory();
        store.write(&owner_record()).expect("write");
        assert_eq!(store.read().expect("read"), owner_record());

        store.clear().expect("clear");
        assert_eq!(store.read().expect("read"), SessionRecord::default());
    }

    #[test]
    fn only_literal_true_counts_as_logged_in() {
        let backend = Arc::new(MemoryBackend::new());
        backend.set("isLoggedIn", "TRUE").expect("set");
        backend.set("userId", "not-a-number").expect("set");
        let store = SessionStore::new(backend);

        let record = store.read().expect("read");
        assert!(!record.logged_in);
        assert_eq!(record.user_id, None);
        match store.require_login() {
            Err(SessionError::NotLoggedIn) => {}
            other => panic!("expected not logged in, got {other:?}"),
        }
    }

    #[test]
    fn admin_views_reject_other_roles() {
        let store = SessionStore::in_memory();
        store.write(&owner_record()).expect("write");

        match store.require_role(UserRole::Admin) {
            Err(err @ SessionError::Forbidden { .. }) => {
                assert_eq!(err.to_string(), "Acceso denegado. Solo Administradores.");
            }
            other => panic!("expected forbidden, got {other:?}"),
        }
        let record = store.require_role(UserRole::Owner).expect("owner allowed");
        assert_eq!(record.user_id, Some(42));
    }

    #[test]
    fn file_store_persists_across_handles() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("session.json");

        SessionStore::file(&path)
            .write(&owner_record())
            .expect("write");
        let reopened = SessionStore::file(&path);
        assert_eq!(reopened.read().expect("read"), owner_record());

        let raw = std::fs::read_to_string(&path).expect("file exists");
        let stored: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(stored["userRole"], "PROPIETARIO");
        assert_eq!(stored["isLoggedIn"], "true");
    }

    #[test]
    fn missing_session_file_reads_as_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = SessionStore::file(dir.path().join("absent.json"));
        assert_eq!(store.read().expect("read"), SessionRecord::default());
    }

    #[test]
    fn corrupt_session_file_is_reported() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("session.json");
        std::fs::write(&path, "[1, 2]").expect("write");

        match SessionStore::file(&path).read() {
            Err(SessionError::Format { .. }) => {}
            other => panic!("expected format error, got {other:?}"),
        }
    }
}
