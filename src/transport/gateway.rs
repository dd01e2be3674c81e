// HTTP client for a WhatsApp Web gateway sidecar.
//
// The gateway owns the browser session (login, QR, restore) and exposes a
// small JSON API. Inbound traffic flows the other way: the gateway POSTs
// message and session events to this bot's /webhook routes.
//
//   GET  /chat?id=…            → ChatInfo
//   GET  /contact?id=…         → ContactInfo
//   POST /send                 {chatId, text, mentions, quotedMessageId?}
//   POST /delete               {chatId, messageId, everyone}
//   POST /remove-participant   {chatId, userId}
//   POST /block                {userId}
//
// Chat and user ids contain '@', so they travel in query strings and bodies
// rather than in paths.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use super::traits::{ChatInfo, ChatTransport, ContactInfo, InboundMessage};

pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:3001";

pub struct GatewayTransport {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GatewayTransport {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent("groupguard/0.1")
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        })
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, id: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .authorize(self.client.get(&url).query(&[("id", id)]))
            .send()
            .await
            .with_context(|| format!("Gateway request {path} failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gateway {} returned {}: {}", path, status, body);
        }

        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse gateway {path} response"))
    }

    async fn post_json<B: Serialize + Sync>(&self, path: &str, body: &B) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .authorize(self.client.post(&url).json(body))
            .send()
            .await
            .with_context(|| format!("Gateway request {path} failed"))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Gateway {} returned {}: {}", path, status, body);
        }

        debug!(path, "Gateway call succeeded");
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    mentions: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    quoted_message_id: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DeleteRequest<'a> {
    chat_id: &'a str,
    message_id: &'a str,
    everyone: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ParticipantRequest<'a> {
    chat_id: &'a str,
    user_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockRequest<'a> {
    user_id: &'a str,
}

#[async_trait]
impl ChatTransport for GatewayTransport {
    async fn chat_info(&self, chat_id: &str) -> Result<ChatInfo> {
        self.get_json("/chat", chat_id).await
    }

    async fn contact_info(&self, user_id: &str) -> Result<ContactInfo> {
        self.get_json("/contact", user_id).await
    }

    async fn send_message(&self, chat_id: &str, text: &str, mentions: &[String]) -> Result<()> {
        self.post_json(
            "/send",
            &SendRequest {
                chat_id,
                text,
                mentions,
                quoted_message_id: None,
            },
        )
        .await
    }

    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<()> {
        self.post_json(
            "/send",
            &SendRequest {
                chat_id: &message.chat_id,
                text,
                mentions: &[],
                quoted_message_id: Some(&message.id),
            },
        )
        .await
    }

    async fn delete_message(&self, message: &InboundMessage, for_everyone: bool) -> Result<()> {
        self.post_json(
            "/delete",
            &DeleteRequest {
                chat_id: &message.chat_id,
                message_id: &message.id,
                everyone: for_everyone,
            },
        )
        .await
    }

    async fn remove_participant(&self, chat_id: &str, user_id: &str) -> Result<()> {
        self.post_json("/remove-participant", &ParticipantRequest { chat_id, user_id })
            .await
    }

    async fn block_contact(&self, user_id: &str) -> Result<()> {
        self.post_json("/block", &BlockRequest { user_id }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_shape() {
        let mentions = vec!["923001234567@c.us".to_string()];
        let json = serde_json::to_value(SendRequest {
            chat_id: "g@g.us",
            text: "hi",
            mentions: &mentions,
            quoted_message_id: None,
        })
        .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "chatId": "g@g.us",
                "text": "hi",
                "mentions": ["923001234567@c.us"]
            })
        );
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let gw = GatewayTransport::new(
            "http://localhost:3001/",
            Some(String::new()),
            Duration::from_secs(5),
        )
        .unwrap();
        assert!(gw.token.is_none());
        assert_eq!(gw.base_url, "http://localhost:3001");
    }
}
