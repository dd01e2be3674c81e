// JsonDatabase — whole-document JSON file backend implementing the Database trait.
//
// Every mutation re-reads the file, applies the change to that fresh copy,
// writes it to a sibling temp file and renames it over the original. The
// cached document is only replaced once the write succeeded. The lock is
// held across read, mutation and write, so two handlers touching the same
// counter are serialized; separate processes (bot, `pardon`, dashboard)
// get last-writer-wins on a fresh read.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use super::models::{AuditKind, AuditLogEntry, Document, StoreStats, ViolationKind};
use super::traits::Database;

pub struct JsonDatabase {
    /// None for a purely in-memory store (tests, dry runs).
    path: Option<PathBuf>,
    doc: Mutex<Document>,
}

impl JsonDatabase {
    /// Open the document at `path`, creating it (and parent directories) if
    /// it doesn't exist yet.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.with_context(|| {
                    format!("Failed to create directory for store: {}", path.display())
                })?;
            }
        }

        let existing = read_document(&path).await?;
        let created = existing.is_none();

        let db = Self {
            path: Some(path),
            doc: Mutex::new(existing.unwrap_or_default()),
        };

        // Materialize the default document so the dashboard process can read it.
        // An existing file is left untouched.
        if created {
            let doc = db.doc.lock().await;
            db.persist(&doc).await?;
        }

        Ok(db)
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            doc: Mutex::new(Document::default()),
        }
    }

    /// Re-read the file from disk, replacing the in-memory document.
    ///
    /// The dashboard companion process calls this before every page render,
    /// since the bot process is the one writing.
    pub async fn reload(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let fresh = read_document(path).await?.unwrap_or_default();
        *self.doc.lock().await = fresh;
        Ok(())
    }

    /// Read-modify-write under the lock. `apply` returns its result and
    /// whether the document changed; the cache is only updated after a
    /// successful write.
    async fn update<T, F>(&self, apply: F) -> Result<T>
    where
        T: Send,
        F: FnOnce(&mut Document) -> (T, bool) + Send,
    {
        let mut doc = self.doc.lock().await;
        let mut next = match &self.path {
            Some(path) => read_document(path).await?.unwrap_or_default(),
            None => doc.clone(),
        };
        let (out, changed) = apply(&mut next);
        if changed {
            self.persist(&next).await?;
        }
        *doc = next;
        Ok(out)
    }

    /// Write the whole document. Callers hold the document lock.
    async fn persist(&self, doc: &Document) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(doc).context("Failed to serialize store")?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        tokio::fs::rename(&tmp, path)
            .await
            .with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!(path = %path.display(), bytes = json.len(), "Store written");
        Ok(())
    }
}

/// Read and parse the document at `path`. A missing file is `None`; an empty
/// one is the default document.
async fn read_document(path: &Path) -> Result<Option<Document>> {
    match tokio::fs::read_to_string(path).await {
        Ok(raw) if raw.trim().is_empty() => Ok(Some(Document::default())),
        Ok(raw) => serde_json::from_str(&raw)
            .map(Some)
            .with_context(|| format!("Failed to parse store at {}", path.display())),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("Failed to read store at {}", path.display())),
    }
}

#[async_trait]
impl Database for JsonDatabase {
    async fn record_violation(
        &self,
        group_id: &str,
        user_id: &str,
        kind: ViolationKind,
    ) -> Result<u32> {
        self.update(|doc| {
            let counter = doc
                .groups
                .entry(group_id.to_string())
                .or_default()
                .counters_mut(kind)
                .entry(user_id.to_string())
                .or_insert(0);
            *counter += 1;
            (*counter, true)
        })
        .await
    }

    async fn strike_count(
        &self,
        group_id: &str,
        user_id: &str,
        kind: ViolationKind,
    ) -> Result<u32> {
        let doc = self.doc.lock().await;
        Ok(doc
            .groups
            .get(group_id)
            .and_then(|g| g.counters(kind).get(user_id).copied())
            .unwrap_or(0))
    }

    async fn reset_strikes(&self, group_id: &str, user_id: &str) -> Result<bool> {
        self.update(|doc| {
            let Some(group) = doc.groups.get_mut(group_id) else {
                return (false, false);
            };
            let cleared_message = group.strikes.remove(user_id).is_some();
            let cleared_sticker = group.sticker_strikes.remove(user_id).is_some();
            let cleared = cleared_message || cleared_sticker;
            (cleared, cleared)
        })
        .await
    }

    async fn append_action(&self, entry: &AuditLogEntry) -> Result<()> {
        self.update(|doc| {
            doc.actions.push(entry.clone());
            ((), true)
        })
        .await
    }

    async fn actions(&self) -> Result<Vec<AuditLogEntry>> {
        Ok(self.doc.lock().await.actions.clone())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let doc = self.doc.lock().await;
        let count = |kind: AuditKind| doc.actions.iter().filter(|a| a.kind == kind).count() as u64;

        let users_with_strikes = doc
            .groups
            .values()
            .map(|g| {
                g.strikes
                    .keys()
                    .chain(g.sticker_strikes.keys())
                    .collect::<std::collections::HashSet<_>>()
                    .len() as u64
            })
            .sum();

        Ok(StoreStats {
            actions: doc.actions.len() as u64,
            violations: count(AuditKind::Violation),
            sticker_violations: count(AuditKind::StickerViolation),
            blocks: count(AuditKind::Blocked),
            groups: doc.groups.len() as u64,
            users_with_strikes,
        })
    }

    async fn refresh(&self) -> Result<()> {
        self.reload().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(kind: AuditKind, strikes: Option<u32>) -> AuditLogEntry {
        AuditLogEntry {
            kind,
            time: Utc::now(),
            user: "Ali".to_string(),
            number: "923001234567".to_string(),
            chat: Some("Study Group".to_string()),
            message: Some("bad words".to_string()),
            strikes,
        }
    }

    #[tokio::test]
    async fn test_counters_start_at_one_and_have_no_gaps() {
        let db = JsonDatabase::in_memory();
        for expected in 1..=5 {
            let got = db
                .record_violation("g1", "u1", ViolationKind::Message)
                .await
                .unwrap();
            assert_eq!(got, expected);
        }
    }

    #[tokio::test]
    async fn test_kinds_use_separate_counters() {
        let db = JsonDatabase::in_memory();
        db.record_violation("g1", "u1", ViolationKind::Sticker)
            .await
            .unwrap();
        db.record_violation("g1", "u1", ViolationKind::Sticker)
            .await
            .unwrap();
        let msg = db
            .record_violation("g1", "u1", ViolationKind::Message)
            .await
            .unwrap();
        assert_eq!(msg, 1);
        assert_eq!(
            db.strike_count("g1", "u1", ViolationKind::Sticker)
                .await
                .unwrap(),
            2
        );
    }

    #[tokio::test]
    async fn test_groups_are_isolated() {
        let db = JsonDatabase::in_memory();
        db.record_violation("g1", "u1", ViolationKind::Message)
            .await
            .unwrap();
        assert_eq!(
            db.strike_count("g2", "u1", ViolationKind::Message)
                .await
                .unwrap(),
            0
        );
    }

    #[tokio::test]
    async fn test_reset_strikes() {
        let db = JsonDatabase::in_memory();
        assert!(!db.reset_strikes("g1", "u1").await.unwrap());
        db.record_violation("g1", "u1", ViolationKind::Message)
            .await
            .unwrap();
        db.record_violation("g1", "u1", ViolationKind::Sticker)
            .await
            .unwrap();
        assert!(db.reset_strikes("g1", "u1").await.unwrap());
        assert_eq!(
            db.record_violation("g1", "u1", ViolationKind::Message)
                .await
                .unwrap(),
            1
        );
    }

    #[tokio::test]
    async fn test_stats_counts_by_type() {
        let db = JsonDatabase::in_memory();
        db.append_action(&entry(AuditKind::Violation, Some(1)))
            .await
            .unwrap();
        db.append_action(&entry(AuditKind::Blocked, None))
            .await
            .unwrap();
        db.record_violation("g1", "u1", ViolationKind::Message)
            .await
            .unwrap();
        db.record_violation("g1", "u1", ViolationKind::Sticker)
            .await
            .unwrap();
        db.record_violation("g1", "u2", ViolationKind::Sticker)
            .await
            .unwrap();

        let stats = db.stats().await.unwrap();
        assert_eq!(stats.actions, 2);
        assert_eq!(stats.violations, 1);
        assert_eq!(stats.blocks, 1);
        assert_eq!(stats.sticker_violations, 0);
        assert_eq!(stats.groups, 1);
        assert_eq!(stats.users_with_strikes, 2);
    }

    #[tokio::test]
    async fn test_recent_actions_newest_first() {
        let db = JsonDatabase::in_memory();
        for n in 1..=3 {
            db.append_action(&entry(AuditKind::Violation, Some(n)))
                .await
                .unwrap();
        }
        let recent = db.recent_actions(2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].strikes, Some(3));
        assert_eq!(recent[1].strikes, Some(2));
    }
}
