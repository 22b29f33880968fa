use crate::error::{ReportError, Result};
use crate::types::ReporterIdentity;
use log::{error, info, warn};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const TOKEN_KEY: &str = "token";
const USER_KEY: &str = "user";

/// The user profile stored at login.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub apellidos: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub rol: Option<String>,
}

impl From<SessionUser> for ReporterIdentity {
    fn from(user: SessionUser) -> Self {
        ReporterIdentity {
            id: user.id,
            email: user.email,
            given_name: user.nombre,
            surname: user.apellidos,
        }
    }
}

/// Login state persisted on the device: the session token and the user
/// profile, as plain key/value rows.
pub struct SessionStore {
    conn: Connection,
}

impl SessionStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            ReportError::Session(format!("Unable to open {:?}: {}", path.as_ref(), e))
        })?;
        SessionStore::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|e| ReportError::Session(e.to_string()))?;
        SessionStore::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS session (key TEXT NOT NULL PRIMARY KEY, value TEXT NOT NULL) WITHOUT ROWID",
            [],
        )
        .map_err(|e| ReportError::Session(format!("Unable to create session table: {}", e)))?;
        Ok(SessionStore { conn })
    }

    pub fn save_login(&self, token: &str, user: &SessionUser) -> Result<()> {
        let user_json =
            serde_json::to_string(user).map_err(|e| ReportError::Session(e.to_string()))?;
        self.put(TOKEN_KEY, token)
            .and_then(|_| self.put(USER_KEY, &user_json))
            .map_err(|e| ReportError::Session(e.to_string()))?;
        info!("Saved session for {:?}", user.email);
        Ok(())
    }

    /// Session token, if logged in. Read errors are logged and treated as
    /// logged out.
    pub fn token(&self) -> Option<String> {
        match self.get(TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                error!("Error reading session token: {:?}", e);
                None
            }
        }
    }

    /// Stored user profile. A row that fails to parse is ignored rather than
    /// blocking the form.
    pub fn user(&self) -> Option<SessionUser> {
        let raw = match self.get(USER_KEY) {
            Ok(raw) => raw?,
            Err(e) => {
                error!("Error reading session user: {:?}", e);
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(e) => {
                warn!("Ignoring unreadable session user {:?}: {}", raw, e);
                None
            }
        }
    }

    pub fn reporter_identity(&self) -> ReporterIdentity {
        self.user().map(ReporterIdentity::from).unwrap_or_default()
    }

    pub fn logout(&self) -> Result<()> {
        self.conn
            .execute(
                "DELETE FROM session WHERE key IN (?1, ?2)",
                params![TOKEN_KEY, USER_KEY],
            )
            .map_err(|e| ReportError::Session(e.to_string()))?;
        info!("Session cleared");
        Ok(())
    }

    fn put(&self, key: &str, value: &str) -> rusqlite::Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO session(key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    fn get(&self, key: &str) -> rusqlite::Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT value FROM session WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
    }
}

/// What the form needs from the stored session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: ReporterIdentity,
    pub token: Option<String>,
}

/// Reads the reporter and token off the blocking pool, so the form can be
/// shown while the session db is opened. Any failure yields an empty
/// snapshot.
pub async fn load_session(path: PathBuf) -> SessionSnapshot {
    let result = tokio::task::spawn_blocking(move || {
        SessionStore::open(&path).map(|store| SessionSnapshot {
            identity: store.reporter_identity(),
            token: store.token(),
        })
    })
    .await;
    match result {
        Ok(Ok(snapshot)) => snapshot,
        Ok(Err(e)) => {
            warn!("Submitting without session: {}", e);
            SessionSnapshot::default()
        }
        Err(e) => {
            error!("Session read task failed: {}", e);
            SessionSnapshot::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ana() -> SessionUser {
        SessionUser {
            id: Some(7),
            nombre: Some("Ana".into()),
            apellidos: Some("López".into()),
            email: Some("ana@example.com".into()),
            rol: Some("agente".into()),
        }
    }

    #[test]
    fn login_then_logout() {
        let store = SessionStore::open_in_memory().unwrap();
        assert_eq!(store.token(), None);
        assert!(store.reporter_identity().is_empty());

        store.save_login("t0k3n", &ana()).unwrap();
        assert_eq!(store.token().as_deref(), Some("t0k3n"));
        assert_eq!(store.user(), Some(ana()));
        let identity = store.reporter_identity();
        assert_eq!(identity.id, Some(7));
        assert_eq!(identity.given_name.as_deref(), Some("Ana"));
        assert_eq!(identity.surname.as_deref(), Some("López"));

        store.logout().unwrap();
        assert_eq!(store.token(), None);
        assert_eq!(store.user(), None);
    }

    #[test]
    fn second_login_replaces_the_first() {
        let store = SessionStore::open_in_memory().unwrap();
        store.save_login("old", &ana()).unwrap();
        store.save_login("new", &SessionUser::default()).unwrap();
        assert_eq!(store.token().as_deref(), Some("new"));
        assert!(store.reporter_identity().is_empty());
    }

    #[test]
    fn corrupt_user_is_ignored() {
        let store = SessionStore::open_in_memory().unwrap();
        store.put(USER_KEY, "{not json").unwrap();
        assert_eq!(store.user(), None);
        assert!(store.reporter_identity().is_empty());
    }

    #[tokio::test]
    async fn session_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.db");
        SessionStore::open(&path)
            .unwrap()
            .save_login("t0k3n", &ana())
            .unwrap();
        let snapshot = load_session(path).await;
        assert_eq!(snapshot.identity.email.as_deref(), Some("ana@example.com"));
        assert_eq!(snapshot.token.as_deref(), Some("t0k3n"));
    }

    #[tokio::test]
    async fn unreadable_session_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = load_session(dir.path().to_path_buf()).await;
        assert_eq!(snapshot, SessionSnapshot::default());
    }
}
