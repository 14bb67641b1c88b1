use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqlitePool, Row};
use std::path::Path;

use crate::auth::Credential;

// ─── Session row ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct StoredSession {
    pub credential: Credential,
    /// `password`, `google` or `github`.
    pub provider:   String,
    pub saved_at:   DateTime<Utc>,
}

// ─── Database ─────────────────────────────────────────────────────────────────

/// Local SQLite file holding the signed-in session.
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn connect() -> Result<Self> {
        Self::open(&crate::config::data_dir().join("studylog.db")).await
    }

    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let url = format!("sqlite://{}?mode=rwc", path.display());
        Ok(Self { pool: SqlitePool::connect(&url).await? })
    }

    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS session (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                token TEXT NOT NULL, provider TEXT NOT NULL, saved_at TEXT NOT NULL
            )"
        ).execute(&self.pool).await?;

        tracing::info!("DB migrations complete");
        Ok(())
    }

    // ── Session ───────────────────────────────────────────────────────────────

    pub async fn save_session(&self, cred: &Credential, provider: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO session (id,token,provider,saved_at) VALUES (1,?,?,?)
             ON CONFLICT(id) DO UPDATE SET
                token=excluded.token, provider=excluded.provider, saved_at=excluded.saved_at"
        )
        .bind(cred.token()).bind(provider).bind(Utc::now().to_rfc3339())
        .execute(&self.pool).await?;
        tracing::info!(provider, "session saved");
        Ok(())
    }

    pub async fn load_session(&self) -> Result<Option<StoredSession>> {
        let row = sqlx::query("SELECT token, provider, saved_at FROM session WHERE id=1")
            .fetch_optional(&self.pool).await?;
        row.map(|r| -> Result<StoredSession> {
            let token: String    = r.get("token");
            let provider: String = r.get("provider");
            let saved: String    = r.get("saved_at");
            Ok(StoredSession {
                credential: Credential::new(token),
                provider,
                saved_at: DateTime::parse_from_rfc3339(&saved)?.with_timezone(&Utc),
            })
        }).transpose()
    }

    pub async fn clear_session(&self) -> Result<()> {
        sqlx::query("DELETE FROM session").execute(&self.pool).await?;
        tracing::info!("session cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_db() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().expect("tempdir");
        let db  = Database::open(&dir.path().join("nested").join("test.db")).await.expect("open");
        db.migrate().await.expect("migrate");
        (dir, db)
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let (_dir, db) = temp_db().await;
        assert!(db.load_session().await.unwrap().is_none());

        db.save_session(&Credential::new("first-token-123"), "password").await.unwrap();
        db.save_session(&Credential::new("second-token-456"), "google").await.unwrap();
        let s = db.load_session().await.unwrap().expect("stored");
        assert_eq!(s.credential.token(), "second-token-456");
        assert_eq!(s.provider, "google");

        db.clear_session().await.unwrap();
        assert!(db.load_session().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn migrate_is_idempotent() {
        let (_dir, db) = temp_db().await;
        db.migrate().await.unwrap();
    }
}
