// Chat transport trait — everything the bot needs from a WhatsApp session.
//
// Every write operation returns a Result and is treated as best-effort by
// the moderation engine: a failed delete or removal never undoes a strike.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Content type of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[serde(alias = "chat")]
    Text,
    Sticker,
    /// Images, audio, polls, … — moderated on their caption text only.
    #[serde(other)]
    Other,
}

/// One inbound message event as delivered by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundMessage {
    pub id: String,
    pub chat_id: String,
    pub sender_id: String,
    #[serde(default)]
    pub body: String,
    #[serde(rename = "type")]
    pub kind: MessageKind,
    pub timestamp: DateTime<Utc>,
    /// Sent by the bot's own account.
    #[serde(default)]
    pub from_me: bool,
}

/// What the transport knows about a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatInfo {
    pub id: String,
    pub is_group: bool,
    #[serde(default)]
    pub name: String,
}

/// What the transport knows about a contact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub id: String,
    /// Phone number without the `@c.us` suffix; used in @-mentions.
    pub number: String,
    #[serde(default, rename = "pushname")]
    pub push_name: Option<String>,
}

impl ContactInfo {
    /// Push name if the contact set one, otherwise the number.
    pub fn display_name(&self) -> &str {
        self.push_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.number)
    }
}

#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn chat_info(&self, chat_id: &str) -> Result<ChatInfo>;

    async fn contact_info(&self, user_id: &str) -> Result<ContactInfo>;

    /// Send `text` to a chat, @-mentioning the given user ids.
    async fn send_message(&self, chat_id: &str, text: &str, mentions: &[String]) -> Result<()>;

    /// Send `text` as a quoted reply to `message`.
    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<()>;

    /// Delete a message; `for_everyone` also removes it from other members' devices.
    async fn delete_message(&self, message: &InboundMessage, for_everyone: bool) -> Result<()>;

    /// Remove a participant from a group. Fails when the bot isn't an admin.
    async fn remove_participant(&self, chat_id: &str, user_id: &str) -> Result<()>;

    async fn block_contact(&self, user_id: &str) -> Result<()>;
}
