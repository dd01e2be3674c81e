// In-process fakes shared by the integration tests.
//
// FakeTransport records every outbound call instead of talking to a
// gateway; FakeGenerator replays a script of replies and errors.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;

use groupguard::classifier::{ClassificationClient, CooldownTracker, TextGenerator};
use groupguard::db::json::JsonDatabase;
use groupguard::db::Database;
use groupguard::filter::ProfanityFilter;
use groupguard::knowledge::{QaDocument, QaPair};
use groupguard::moderation::{CommandContext, Moderator};
use groupguard::transport::{ChatInfo, ChatTransport, ContactInfo, InboundMessage, MessageKind};

pub const GROUP_ID: &str = "120363000000000000@g.us";
pub const PRIVATE_ID: &str = "923001234567@c.us";
pub const USER_ID: &str = "923001234567@c.us";
pub const USER_NUMBER: &str = "923001234567";

// ============================================================
// Transport
// ============================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Send {
        chat: String,
        text: String,
        mentions: Vec<String>,
    },
    Reply {
        chat: String,
        text: String,
    },
    Delete {
        message_id: String,
        for_everyone: bool,
    },
    Remove {
        chat: String,
        user: String,
    },
    Block {
        user: String,
    },
}

#[derive(Default)]
pub struct FakeTransport {
    pub calls: Mutex<Vec<Call>>,
    pub fail_remove: AtomicBool,
    pub fail_delete: AtomicBool,
}

impl FakeTransport {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Send { text, .. } | Call::Reply { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub fn removals(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Remove { .. }))
            .count()
    }

    pub fn blocks(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Block { .. }))
            .count()
    }

    pub fn replies(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Reply { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn chat_info(&self, chat_id: &str) -> Result<ChatInfo> {
        if chat_id == "unknown@g.us" {
            anyhow::bail!("Gateway /chat returned 404 Not Found: no such chat");
        }
        Ok(ChatInfo {
            id: chat_id.to_string(),
            is_group: chat_id.ends_with("@g.us"),
            name: if chat_id.ends_with("@g.us") {
                "Study Group".to_string()
            } else {
                String::new()
            },
        })
    }

    async fn contact_info(&self, user_id: &str) -> Result<ContactInfo> {
        Ok(ContactInfo {
            id: user_id.to_string(),
            number: user_id.trim_end_matches("@c.us").to_string(),
            push_name: Some("Ali".to_string()),
        })
    }

    async fn send_message(&self, chat_id: &str, text: &str, mentions: &[String]) -> Result<()> {
        self.push(Call::Send {
            chat: chat_id.to_string(),
            text: text.to_string(),
            mentions: mentions.to_vec(),
        });
        Ok(())
    }

    async fn reply(&self, message: &InboundMessage, text: &str) -> Result<()> {
        self.push(Call::Reply {
            chat: message.chat_id.clone(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, message: &InboundMessage, for_everyone: bool) -> Result<()> {
        if self.fail_delete.load(Ordering::SeqCst) {
            anyhow::bail!("Gateway /delete returned 403 Forbidden: not admin");
        }
        self.push(Call::Delete {
            message_id: message.id.clone(),
            for_everyone,
        });
        Ok(())
    }

    async fn remove_participant(&self, chat_id: &str, user_id: &str) -> Result<()> {
        if self.fail_remove.load(Ordering::SeqCst) {
            anyhow::bail!("Gateway /remove-participant returned 403 Forbidden: not admin");
        }
        self.push(Call::Remove {
            chat: chat_id.to_string(),
            user: user_id.to_string(),
        });
        Ok(())
    }

    async fn block_contact(&self, user_id: &str) -> Result<()> {
        self.push(Call::Block {
            user: user_id.to_string(),
        });
        Ok(())
    }
}

// ============================================================
// Generator
// ============================================================

/// Replays scripted results in order, then answers `fallback` forever.
pub struct FakeGenerator {
    script: Mutex<VecDeque<Result<String, String>>>,
    fallback: String,
    pub calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new(script: Vec<Result<&str, &str>>) -> Self {
        Self {
            script: Mutex::new(
                script
                    .into_iter()
                    .map(|r| r.map(String::from).map_err(String::from))
                    .collect(),
            ),
            fallback: "ok".to_string(),
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn always(reply: &str) -> Self {
        let mut g = Self::new(Vec::new());
        g.fallback = reply.to_string();
        g
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(msg)) => Err(anyhow::anyhow!(msg)),
            None => Ok(self.fallback.clone()),
        }
    }
}

// ============================================================
// Harness
// ============================================================

pub struct Harness {
    pub transport: Arc<FakeTransport>,
    pub generator: Arc<FakeGenerator>,
    pub db: Arc<dyn Database>,
    pub moderator: Moderator,
}

pub fn admissions_document() -> QaDocument {
    QaDocument::new(vec![
        QaPair {
            question: "What are the admission deadlines?".to_string(),
            answer: "Applications close on 31 July; late applications until 15 August."
                .to_string(),
        },
        QaPair {
            question: "What is the fee structure?".to_string(),
            answer: "Tuition is 45,000 per semester.".to_string(),
        },
    ])
}

pub fn harness(generator: FakeGenerator) -> Harness {
    let transport = Arc::new(FakeTransport::default());
    let generator = Arc::new(generator);
    let db: Arc<dyn Database> = Arc::new(JsonDatabase::in_memory());

    let classifier = Arc::new(ClassificationClient::new(
        generator.clone(),
        Arc::new(CooldownTracker::default()),
    ));
    let commands = CommandContext::new(classifier, Arc::new(admissions_document()));

    let moderator = Moderator::new(
        transport.clone(),
        db.clone(),
        ProfanityFilter::default(),
        commands,
    );

    Harness {
        transport,
        generator,
        db,
        moderator,
    }
}

pub fn group_text(id: &str, body: &str) -> InboundMessage {
    message(id, GROUP_ID, body, MessageKind::Text)
}

pub fn group_sticker(id: &str) -> InboundMessage {
    message(id, GROUP_ID, "", MessageKind::Sticker)
}

pub fn private_text(id: &str, body: &str) -> InboundMessage {
    message(id, PRIVATE_ID, body, MessageKind::Text)
}

pub fn message(id: &str, chat_id: &str, body: &str, kind: MessageKind) -> InboundMessage {
    InboundMessage {
        id: id.to_string(),
        chat_id: chat_id.to_string(),
        sender_id: USER_ID.to_string(),
        body: body.to_string(),
        kind,
        timestamp: Utc::now(),
        from_me: false,
    }
}
