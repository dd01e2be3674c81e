// Database queries — every SQL statement the SQLite backend runs.
//
// Keeping SQL in one place gives SqliteDatabase a thin, lock-and-delegate
// shape and lets these functions be tested against an in-memory Connection.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::models::{AuditKind, AuditLogEntry, StoreStats, ViolationKind};

// --- Strikes ---

/// Increment a strike counter and return the new value in one statement.
pub fn record_violation(
    conn: &Connection,
    group_id: &str,
    user_id: &str,
    kind: ViolationKind,
) -> Result<u32> {
    let count: i64 = conn.query_row(
        "INSERT INTO strikes (group_id, user_id, kind, count, updated_at)
         VALUES (?1, ?2, ?3, 1, datetime('now'))
         ON CONFLICT(group_id, user_id, kind) DO UPDATE SET
            count = count + 1,
            updated_at = datetime('now')
         RETURNING count",
        params![group_id, user_id, kind.as_str()],
        |row| row.get(0),
    )?;
    Ok(count as u32)
}

pub fn strike_count(
    conn: &Connection,
    group_id: &str,
    user_id: &str,
    kind: ViolationKind,
) -> Result<u32> {
    let count: Option<i64> = conn
        .query_row(
            "SELECT count FROM strikes WHERE group_id = ?1 AND user_id = ?2 AND kind = ?3",
            params![group_id, user_id, kind.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(count.unwrap_or(0) as u32)
}

pub fn reset_strikes(conn: &Connection, group_id: &str, user_id: &str) -> Result<bool> {
    let deleted = conn.execute(
        "DELETE FROM strikes WHERE group_id = ?1 AND user_id = ?2",
        params![group_id, user_id],
    )?;
    Ok(deleted > 0)
}

// --- Audit log ---

pub fn append_action(conn: &Connection, entry: &AuditLogEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO actions (kind, time, user, number, chat_name, message, strikes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            entry.kind.as_str(),
            entry.time.to_rfc3339_opts(SecondsFormat::Nanos, true),
            entry.user,
            entry.number,
            entry.chat,
            entry.message,
            entry.strikes,
        ],
    )?;
    Ok(())
}

/// All audit entries, oldest first.
pub fn actions(conn: &Connection) -> Result<Vec<AuditLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT kind, time, user, number, chat_name, message, strikes
         FROM actions ORDER BY id ASC",
    )?;
    collect_actions(&mut stmt, params![])
}

/// The newest `limit` audit entries, newest first.
pub fn recent_actions(conn: &Connection, limit: usize) -> Result<Vec<AuditLogEntry>> {
    let mut stmt = conn.prepare(
        "SELECT kind, time, user, number, chat_name, message, strikes
         FROM actions ORDER BY id DESC LIMIT ?1",
    )?;
    collect_actions(&mut stmt, [limit as i64])
}

fn collect_actions<P: rusqlite::Params>(
    stmt: &mut rusqlite::Statement<'_>,
    params: P,
) -> Result<Vec<AuditLogEntry>> {
    let rows = stmt.query_map(params, |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, Option<u32>>(6)?,
        ))
    })?;

    let mut entries = Vec::new();
    for row in rows {
        let (kind, time, user, number, chat, message, strikes) = row?;
        let time = DateTime::parse_from_rfc3339(&time)
            .with_context(|| format!("Bad timestamp in actions table: {time}"))?
            .with_timezone(&Utc);
        entries.push(AuditLogEntry {
            kind: kind.parse::<AuditKind>()?,
            time,
            user,
            number,
            chat,
            message,
            strikes,
        });
    }
    Ok(entries)
}

// --- Stats ---

pub fn stats(conn: &Connection) -> Result<StoreStats> {
    let count_kind = |kind: AuditKind| -> Result<u64> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM actions WHERE kind = ?1",
            params![kind.as_str()],
            |row| row.get(0),
        )?;
        Ok(n as u64)
    };

    let actions: i64 = conn.query_row("SELECT COUNT(*) FROM actions", [], |row| row.get(0))?;
    let groups: i64 = conn.query_row(
        "SELECT COUNT(DISTINCT group_id) FROM strikes",
        [],
        |row| row.get(0),
    )?;
    let users: i64 = conn.query_row(
        "SELECT COUNT(*) FROM (SELECT DISTINCT group_id, user_id FROM strikes)",
        [],
        |row| row.get(0),
    )?;

    Ok(StoreStats {
        actions: actions as u64,
        violations: count_kind(AuditKind::Violation)?,
        sticker_violations: count_kind(AuditKind::StickerViolation)?,
        blocks: count_kind(AuditKind::Blocked)?,
        groups: groups as u64,
        users_with_strikes: users as u64,
    })
}
