// Database trait — backend-agnostic async interface for the moderation store.
//
// Implementors: JsonDatabase (whole-document JSON file) and SqliteDatabase
// (rusqlite, behind the `sqlite` feature). Both hold a single lock across
// every read-modify-write, so concurrent handlers never lose a strike.

use anyhow::Result;
use async_trait::async_trait;

use super::models::{AuditLogEntry, StoreStats, ViolationKind};

#[async_trait]
pub trait Database: Send + Sync {
    // --- Strikes ---

    /// Increment the (group, user, kind) counter, persist it, and return the
    /// new value. The group's state is created on first use.
    async fn record_violation(
        &self,
        group_id: &str,
        user_id: &str,
        kind: ViolationKind,
    ) -> Result<u32>;

    /// Current strike count (0 when nothing was ever recorded).
    async fn strike_count(&self, group_id: &str, user_id: &str, kind: ViolationKind)
        -> Result<u32>;

    /// Clear every counter for a user in a group. Returns whether anything was cleared.
    async fn reset_strikes(&self, group_id: &str, user_id: &str) -> Result<bool>;

    // --- Audit log ---

    /// Append an entry to the audit log.
    async fn append_action(&self, entry: &AuditLogEntry) -> Result<()>;

    /// All audit entries in insertion order (oldest first).
    async fn actions(&self) -> Result<Vec<AuditLogEntry>>;

    /// The most recent `limit` entries, newest first.
    async fn recent_actions(&self, limit: usize) -> Result<Vec<AuditLogEntry>> {
        let mut all = self.actions().await?;
        all.reverse();
        all.truncate(limit);
        Ok(all)
    }

    // --- Lifecycle ---

    /// Pick up writes made by another process. No-op for backends that read
    /// through to disk on every query.
    async fn refresh(&self) -> Result<()> {
        Ok(())
    }

    /// Aggregate counts for the status command.
    async fn stats(&self) -> Result<StoreStats>;
}
