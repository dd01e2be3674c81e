// SqliteDatabase — rusqlite backend implementing the Database trait.
//
// The Connection is wrapped in tokio::sync::Mutex because Connection is !Sync.
// Trait methods lock the mutex, do synchronous rusqlite work, and return.
// Every strike increment is a single UPSERT ... RETURNING under that lock.

use anyhow::Result;
use async_trait::async_trait;
use rusqlite::Connection;
use tokio::sync::Mutex;

use super::models::{AuditLogEntry, StoreStats, ViolationKind};
use super::traits::Database;

pub struct SqliteDatabase {
    conn: Mutex<Connection>,
}

impl SqliteDatabase {
    /// Wrap an already-opened rusqlite Connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    pub async fn table_count(&self) -> Result<i64> {
        let conn = self.conn.lock().await;
        super::schema::table_count(&conn)
    }
}

#[async_trait]
impl Database for SqliteDatabase {
    async fn record_violation(
        &self,
        group_id: &str,
        user_id: &str,
        kind: ViolationKind,
    ) -> Result<u32> {
        let conn = self.conn.lock().await;
        super::queries::record_violation(&conn, group_id, user_id, kind)
    }

    async fn strike_count(
        &self,
        group_id: &str,
        user_id: &str,
        kind: ViolationKind,
    ) -> Result<u32> {
        let conn = self.conn.lock().await;
        super::queries::strike_count(&conn, group_id, user_id, kind)
    }

    async fn reset_strikes(&self, group_id: &str, user_id: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        super::queries::reset_strikes(&conn, group_id, user_id)
    }

    async fn append_action(&self, entry: &AuditLogEntry) -> Result<()> {
        let conn = self.conn.lock().await;
        super::queries::append_action(&conn, entry)
    }

    async fn actions(&self) -> Result<Vec<AuditLogEntry>> {
        let conn = self.conn.lock().await;
        super::queries::actions(&conn)
    }

    async fn recent_actions(&self, limit: usize) -> Result<Vec<AuditLogEntry>> {
        let conn = self.conn.lock().await;
        super::queries::recent_actions(&conn, limit)
    }

    async fn stats(&self) -> Result<StoreStats> {
        let conn = self.conn.lock().await;
        super::queries::stats(&conn)
    }
}
