//! Health reporting.
//!
//! `/healthz` is a bare liveness probe. `/api/health` additionally
//! opens the local SQLite database and runs a trivial query; the
//! endpoint reports degraded (500) when the database is unreachable.
//! A missing sample table only annotates the report, it does not
//! fail the check.

use std::path::{Path, PathBuf};

use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use tracing::warn;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub timestamp: String,
    pub db: DbHealth,
    pub items: ItemsHealth,
}

#[derive(Debug, Serialize)]
pub struct DbHealth {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ItemsHealth {
    pub count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

fn failed(err: impl ToString) -> (DbHealth, ItemsHealth) {
    (
        DbHealth {
            ok: false,
            error: Some(err.to_string()),
        },
        ItemsHealth {
            count: 0,
            error: None,
        },
    )
}

fn probe_db(path: &Path) -> (DbHealth, ItemsHealth) {
    let conn = match Connection::open(path) {
        Ok(conn) => conn,
        Err(err) => return failed(err),
    };
    if let Err(err) = conn.query_row("SELECT 1", [], |_| Ok(())) {
        return failed(err);
    }
    // A fresh database has no tables yet; that is healthy, the count
    // just carries a note.
    let items = match conn.query_row("SELECT COUNT(*) FROM items", [], |row| row.get(0)) {
        Ok(count) => ItemsHealth { count, error: None },
        Err(err) => ItemsHealth {
            count: 0,
            error: Some(err.to_string()),
        },
    };
    (DbHealth { ok: true, error: None }, items)
}

pub async fn report(db_path: PathBuf) -> (StatusCode, Json<HealthReport>) {
    let (db, items) = tokio::task::spawn_blocking(move || probe_db(&db_path))
        .await
        .unwrap_or_else(|err| {
            warn!("health probe task failed: {err}");
            failed(err)
        });

    let status = if db.ok {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    let report = HealthReport {
        status: if db.ok { "ok" } else { "degraded" },
        timestamp: Utc::now().to_rfc3339(),
        db,
        items,
    };
    (status, Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_database_is_healthy_with_a_note() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = report(dir.path().join("health.db")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.0.db.ok);
        assert_eq!(body.0.items.count, 0);
        // No table yet, so the count carries its error note.
        assert!(body.0.items.error.is_some());
    }

    #[tokio::test]
    async fn counts_rows_when_the_table_exists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("health.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(
                "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT);
                 INSERT INTO items (name) VALUES ('a'), ('b'), ('c');",
            )
            .unwrap();
        }
        let (status, body) = report(path).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.0.items.count, 3);
        assert!(body.0.items.error.is_none());
    }

    #[tokio::test]
    async fn unreachable_database_degrades() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the database path makes open fail.
        let path = dir.path().join("not-a-file");
        std::fs::create_dir(&path).unwrap();
        let (status, body) = report(path).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.0.db.ok);
        assert!(body.0.db.error.is_some());
    }
}
