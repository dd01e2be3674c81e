// Data models — the types persisted by the store and shown on the dashboard.
//
// These are separate from the backends so the moderation engine and the
// web layer can use them without depending on rusqlite or the JSON file.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which class of rule a strike was recorded under.
///
/// Each kind has its own counter per (group, user) and its own removal
/// threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Profanity or content flagged by the safety classifier.
    Message,
    /// Any sticker posted in a group.
    Sticker,
}

impl ViolationKind {
    /// Strike count at which the user is removed from the group.
    pub fn removal_threshold(&self) -> u32 {
        match self {
            ViolationKind::Message => 2,
            ViolationKind::Sticker => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ViolationKind::Message => "message",
            ViolationKind::Sticker => "sticker",
        }
    }

    /// The audit entry type written when this kind of violation is recorded.
    pub fn audit_kind(&self) -> AuditKind {
        match self {
            ViolationKind::Message => AuditKind::Violation,
            ViolationKind::Sticker => AuditKind::StickerViolation,
        }
    }
}

impl std::str::FromStr for ViolationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "message" => Ok(ViolationKind::Message),
            "sticker" => Ok(ViolationKind::Sticker),
            other => anyhow::bail!("Unknown violation kind: {other}"),
        }
    }
}

impl std::fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Type tag of an audit log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Violation,
    StickerViolation,
    Blocked,
}

impl AuditKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditKind::Violation => "violation",
            AuditKind::StickerViolation => "sticker_violation",
            AuditKind::Blocked => "blocked",
        }
    }
}

impl std::str::FromStr for AuditKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "violation" => Ok(AuditKind::Violation),
            "sticker_violation" => Ok(AuditKind::StickerViolation),
            "blocked" => Ok(AuditKind::Blocked),
            other => anyhow::bail!("Unknown audit entry type: {other}"),
        }
    }
}

impl std::fmt::Display for AuditKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One append-only moderation record.
///
/// `chat` is absent for private-chat blocks, `message` for sticker
/// violations, and `strikes` for blocks (no counter is used in private chats).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    #[serde(rename = "type")]
    pub kind: AuditKind,
    pub time: DateTime<Utc>,
    /// Display name of the offender (push name, falling back to number).
    pub user: String,
    pub number: String,
    #[serde(default, rename = "chatName", skip_serializing_if = "Option::is_none")]
    pub chat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strikes: Option<u32>,
}

/// Strike counters for one group, one map per violation kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupState {
    /// Message-class strikes, keyed by user id.
    #[serde(default)]
    pub strikes: HashMap<String, u32>,
    /// Sticker-class strikes, keyed by user id.
    #[serde(default)]
    pub sticker_strikes: HashMap<String, u32>,
}

impl GroupState {
    pub fn counters(&self, kind: ViolationKind) -> &HashMap<String, u32> {
        match kind {
            ViolationKind::Message => &self.strikes,
            ViolationKind::Sticker => &self.sticker_strikes,
        }
    }

    pub fn counters_mut(&mut self, kind: ViolationKind) -> &mut HashMap<String, u32> {
        match kind {
            ViolationKind::Message => &mut self.strikes,
            ViolationKind::Sticker => &mut self.sticker_strikes,
        }
    }
}

/// The whole persisted document used by the JSON backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub actions: Vec<AuditLogEntry>,
    /// Reserved for per-user metadata; never written by the bot itself.
    #[serde(default)]
    pub users: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub groups: HashMap<String, GroupState>,
}

/// Aggregate counts shown by `groupguard status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StoreStats {
    pub actions: u64,
    pub violations: u64,
    pub sticker_violations: u64,
    pub blocks: u64,
    pub groups: u64,
    pub users_with_strikes: u64,
}
