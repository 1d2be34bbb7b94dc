//! Per-user credential sessions.
//!
//! Each logged-in user supplies their own MySQL credentials; the store maps
//! an opaque bearer token to those credentials plus the UI's
//! current-database/current-table hints. Sessions live in memory only and
//! die with the process. Nothing here touches a connection after login
//! validation: every action opens its own connection from the stored
//! credentials.

use crate::db;
use crate::error::{AdminError, AdminResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// Connection credentials supplied at login.
#[derive(Debug, Clone, Deserialize)]
pub struct Credentials {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: String,
}

fn default_port() -> u16 {
    3306
}

/// One user's session state.
#[derive(Debug, Clone)]
pub struct Session {
    pub credentials: Credentials,
    /// UI convenience hints; actions always receive their database context
    /// explicitly and never read these.
    pub current_database: Option<String>,
    pub current_table: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Token -> session map shared across requests.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate credentials by opening a connection against the target
    /// server, then issue a session token.
    pub async fn login(&self, credentials: Credentials) -> AdminResult<String> {
        let conn = db::connect(&credentials, None).await?;
        // The connection was only needed to prove the credentials work
        drop(conn);

        let token = Uuid::new_v4().to_string();
        let session = Session {
            credentials,
            current_database: None,
            current_table: None,
            created_at: Utc::now(),
        };
        let host = session.credentials.host.clone();
        self.sessions.write().await.insert(token.clone(), session);
        info!(host = %host, "Session created");
        Ok(token)
    }

    /// Look up a session. An unknown or missing token is the distinct
    /// credentials-missing error, not a generic failure.
    pub async fn get(&self, token: &str) -> AdminResult<Session> {
        self.sessions
            .read()
            .await
            .get(token)
            .cloned()
            .ok_or_else(|| {
                AdminError::credentials_missing("No active session; log in with your database credentials")
            })
    }

    /// Remove a session. Returns whether it existed.
    pub async fn logout(&self, token: &str) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Update the current-database hint; clears the table hint, which
    /// belonged to the previous database.
    pub async fn set_current_database(&self, token: &str, database: Option<String>) -> AdminResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(token).ok_or_else(|| {
            AdminError::credentials_missing("No active session; log in with your database credentials")
        })?;
        session.current_database = database;
        session.current_table = None;
        Ok(())
    }

    /// Update the current-table hint.
    pub async fn set_current_table(&self, token: &str, table: Option<String>) -> AdminResult<()> {
        let mut sessions = self.sessions.write().await;
        let session = sessions.get_mut(token).ok_or_else(|| {
            AdminError::credentials_missing("No active session; log in with your database credentials")
        })?;
        session.current_table = table;
        Ok(())
    }

    /// Number of live sessions.
    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }

    #[cfg(test)]
    async fn insert_unchecked(&self, token: &str, credentials: Credentials) {
        let session = Session {
            credentials,
            current_database: None,
            current_table: None,
            created_at: Utc::now(),
        };
        self.sessions
            .write()
            .await
            .insert(token.to_string(), session);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn creds() -> Credentials {
        Credentials {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: "secret".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unknown_token_is_credentials_missing() {
        let store = SessionStore::new();
        let err = store.get("nope").await.unwrap_err();
        assert!(matches!(err, AdminError::CredentialsMissing { .. }));
    }

    #[tokio::test]
    async fn test_get_after_insert() {
        let store = SessionStore::new();
        store.insert_unchecked("tok", creds()).await;

        let session = store.get("tok").await.unwrap();
        assert_eq!(session.credentials.host, "localhost");
        assert_eq!(session.current_database, None);
        assert_eq!(store.count().await, 1);
    }

    #[tokio::test]
    async fn test_logout_removes_session() {
        let store = SessionStore::new();
        store.insert_unchecked("tok", creds()).await;

        assert!(store.logout("tok").await);
        assert!(!store.logout("tok").await);
        assert!(store.get("tok").await.is_err());
    }

    #[tokio::test]
    async fn test_database_hint_clears_table_hint() {
        let store = SessionStore::new();
        store.insert_unchecked("tok", creds()).await;

        store
            .set_current_database("tok", Some("app".to_string()))
            .await
            .unwrap();
        store
            .set_current_table("tok", Some("users".to_string()))
            .await
            .unwrap();
        assert_eq!(
            store.get("tok").await.unwrap().current_table,
            Some("users".to_string())
        );

        store
            .set_current_database("tok", Some("other".to_string()))
            .await
            .unwrap();
        let session = store.get("tok").await.unwrap();
        assert_eq!(session.current_database, Some("other".to_string()));
        assert_eq!(session.current_table, None);
    }

    #[tokio::test]
    async fn test_hint_update_requires_session() {
        let store = SessionStore::new();
        assert!(
            store
                .set_current_database("nope", Some("app".to_string()))
                .await
                .is_err()
        );
    }

    #[test]
    fn test_credentials_default_port() {
        let creds: Credentials =
            serde_json::from_str(r#"{"host": "db.local", "user": "admin"}"#).unwrap();
        assert_eq!(creds.port, 3306);
        assert_eq!(creds.password, "");
    }
}
