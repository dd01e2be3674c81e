// Moderation decision engine — one inbound message in, one Verdict out.
//
// Decision order:
//   1. Own messages are ignored.
//   2. A sticker in a group is a sticker violation (threshold 4).
//   3. Otherwise the text is flagged if the profanity list matches, or if
//      the remote safety screen blocks it (only consulted for bodies longer
//      than five characters that passed the list).
//   4. Flagged in a group: message violation (threshold 2).
//      Flagged in private: block the sender.
//      Clean in a group: command dispatch.
//      Clean in private: nothing.
//
// A violation always follows the same sequence: record the strike, delete
// the message, warn the sender, append the audit entry, and attempt removal
// once the kind's threshold is reached. Everything after the strike is
// best-effort: a failed delete, send, or removal is logged and never rolls
// back the strike or the audit entry.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::classifier::ClassificationClient;
use crate::db::models::{AuditKind, AuditLogEntry, ViolationKind};
use crate::db::Database;
use crate::filter::ProfanityFilter;
use crate::transport::{ChatInfo, ChatTransport, ContactInfo, InboundMessage, MessageKind};

use super::commands::{Command, CommandContext};

/// Bodies at or below this many characters skip the remote safety screen.
pub const SAFETY_SCREEN_MIN_CHARS: usize = 5;

pub const BLOCKED_REPLY: &str = "Blocked for abusive language.";

/// Terminal state of one handled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Sent by the bot itself.
    Ignored,
    /// Clean message that wasn't a command.
    Allowed,
    /// Clean group message that dispatched a command.
    Command,
    /// Strike recorded, below the removal threshold.
    Warned { kind: ViolationKind, strikes: u32 },
    /// Threshold reached and the sender was removed.
    Removed { kind: ViolationKind, strikes: u32 },
    /// Threshold reached but the transport refused the removal.
    RemovalFailed { kind: ViolationKind, strikes: u32 },
    /// Private-chat sender blocked.
    Blocked,
}

pub struct Moderator {
    transport: Arc<dyn ChatTransport>,
    db: Arc<dyn Database>,
    filter: ProfanityFilter,
    classifier: Arc<ClassificationClient>,
    commands: CommandContext,
}

impl Moderator {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        db: Arc<dyn Database>,
        filter: ProfanityFilter,
        commands: CommandContext,
    ) -> Self {
        let classifier = Arc::clone(&commands.classifier);
        Self {
            transport,
            db,
            filter,
            classifier,
            commands,
        }
    }

    pub fn db(&self) -> &Arc<dyn Database> {
        &self.db
    }

    /// Handle one message, logging any error instead of returning it.
    ///
    /// This is the per-message entry point: a failure here abandons that
    /// message only.
    pub async fn handle(&self, message: InboundMessage) -> Option<Verdict> {
        match self.process(&message).await {
            Ok(verdict) => {
                debug!(id = message.id, ?verdict, "Message handled");
                Some(verdict)
            }
            Err(e) => {
                error!(
                    id = message.id,
                    chat = message.chat_id,
                    error = %format!("{e:#}"),
                    "Message handler error"
                );
                None
            }
        }
    }

    /// Run the decision flow for one message.
    pub async fn process(&self, message: &InboundMessage) -> Result<Verdict> {
        if message.from_me {
            return Ok(Verdict::Ignored);
        }

        let chat = self
            .transport
            .chat_info(&message.chat_id)
            .await
            .context("Failed to resolve chat")?;
        let contact = self
            .transport
            .contact_info(&message.sender_id)
            .await
            .context("Failed to resolve sender")?;

        if chat.is_group && message.kind == MessageKind::Sticker {
            return self
                .punish(message, &chat, &contact, ViolationKind::Sticker)
                .await;
        }

        let text = message.body.trim();
        if !self.is_flagged(text).await {
            if !chat.is_group {
                return Ok(Verdict::Allowed);
            }
            return match Command::parse(text) {
                Some(command) => {
                    self.commands
                        .execute(self.transport.as_ref(), message, &command)
                        .await?;
                    Ok(Verdict::Command)
                }
                None => Ok(Verdict::Allowed),
            };
        }

        if chat.is_group {
            self.punish(message, &chat, &contact, ViolationKind::Message)
                .await
        } else {
            self.block(message, &contact).await
        }
    }

    /// Profanity list first; the remote screen only for longer text that passed it.
    async fn is_flagged(&self, text: &str) -> bool {
        if self.filter.is_flagged(text) {
            debug!("Profanity list match");
            return true;
        }
        if text.chars().count() <= SAFETY_SCREEN_MIN_CHARS {
            return false;
        }
        self.classifier.classify(text, None).await.is_blocked()
    }

    async fn punish(
        &self,
        message: &InboundMessage,
        chat: &ChatInfo,
        contact: &ContactInfo,
        kind: ViolationKind,
    ) -> Result<Verdict> {
        let strikes = self
            .db
            .record_violation(&chat.id, &contact.id, kind)
            .await
            .context("Failed to record strike")?;

        info!(
            chat = chat.name,
            user = contact.display_name(),
            kind = kind.as_str(),
            strikes,
            "Violation recorded"
        );

        if let Err(e) = self.transport.delete_message(message, true).await {
            warn!(id = message.id, error = %e, "Failed to delete message");
        }

        let mentions = [contact.id.clone()];
        let warning = match kind {
            ViolationKind::Sticker => format!(
                "Warning @{}, stickers are not allowed. Strike: {}",
                contact.number, strikes
            ),
            ViolationKind::Message => format!(
                "Warning @{}: message removed. Strike: {}",
                contact.number, strikes
            ),
        };
        self.send_best_effort(&chat.id, &warning, &mentions).await;

        let entry = AuditLogEntry {
            kind: kind.audit_kind(),
            time: Utc::now(),
            user: contact.display_name().to_string(),
            number: contact.number.clone(),
            chat: Some(chat.name.clone()),
            message: match kind {
                ViolationKind::Message => Some(message.body.trim().to_string()),
                ViolationKind::Sticker => None,
            },
            strikes: Some(strikes),
        };
        self.db
            .append_action(&entry)
            .await
            .context("Failed to append audit entry")?;

        if strikes < kind.removal_threshold() {
            return Ok(Verdict::Warned { kind, strikes });
        }

        match self
            .transport
            .remove_participant(&chat.id, &contact.id)
            .await
        {
            Ok(()) => {
                info!(chat = chat.name, user = contact.display_name(), strikes, "Participant removed");
                let notice = match kind {
                    ViolationKind::Sticker => format!(
                        "Removed @{} for repeated sticker violations.",
                        contact.number
                    ),
                    ViolationKind::Message => {
                        format!("Removed @{} for repeated violations.", contact.number)
                    }
                };
                self.send_best_effort(&chat.id, &notice, &mentions).await;
                Ok(Verdict::Removed { kind, strikes })
            }
            Err(e) => {
                warn!(chat = chat.name, error = %e, "Removal failed");
                let notice = format!("Cannot remove @{}. Bot must be admin.", contact.number);
                self.send_best_effort(&chat.id, &notice, &mentions).await;
                Ok(Verdict::RemovalFailed { kind, strikes })
            }
        }
    }

    async fn block(&self, message: &InboundMessage, contact: &ContactInfo) -> Result<Verdict> {
        if let Err(e) = self.transport.block_contact(&contact.id).await {
            warn!(user = contact.display_name(), error = %e, "Failed to block contact");
        }
        if let Err(e) = self.transport.reply(message, BLOCKED_REPLY).await {
            warn!(user = contact.display_name(), error = %e, "Failed to send block notice");
        }

        let entry = AuditLogEntry {
            kind: AuditKind::Blocked,
            time: Utc::now(),
            user: contact.display_name().to_string(),
            number: contact.number.clone(),
            chat: None,
            message: Some(message.body.trim().to_string()),
            strikes: None,
        };
        self.db
            .append_action(&entry)
            .await
            .context("Failed to append audit entry")?;

        info!(user = contact.display_name(), "Private sender blocked");
        Ok(Verdict::Blocked)
    }

    async fn send_best_effort(&self, chat_id: &str, text: &str, mentions: &[String]) {
        if let Err(e) = self.transport.send_message(chat_id, text, mentions).await {
            warn!(chat = chat_id, error = %e, "Failed to send message");
        }
    }
}
