// Group chat commands.
//
// Commands are only dispatched for clean group messages. Each prefix maps to
// one Command variant; everything that isn't a command is ignored.
//
//   !bot <q> / @bot <q>  ask the model (per-user cooldown applies)
//   !google <q>          top web results, model summary as fallback
//   !yt <q>              top videos
//   !info <q>            answer from the Q&A document
//   !owner               owner contact text
//   !help                command list
//   !ping                liveness and send latency

use std::sync::{Arc, LazyLock};

use anyhow::Result;
use regex_lite::Regex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::classifier::{ClassificationClient, Outcome};
use crate::knowledge::{QaDocument, NOT_FOUND_REPLY};
use crate::search::{SearchHit, SearchProvider};
use crate::transport::{ChatTransport, InboundMessage};

/// Results shown for `!google` and `!yt`.
pub const SEARCH_RESULT_LIMIT: usize = 3;

pub const DEFAULT_OWNER_INFO: &str = "*Bot Owner*\nThis group is moderated by GroupGuard.\nContact a group admin for help.";

pub const HELP_TEXT: &str = "*GroupGuard Commands*\n\n\
• `!bot <question>` or `@bot <question>` – ask the AI\n\
• `!google <query>` – top web results\n\
• `!yt <query>` – top YouTube videos\n\
• `!info <question>` – answer from the group document\n\
• `!owner` – who runs this bot\n\
• `!ping` – check the bot is alive\n\
• `!help` – this list\n\n\
Profanity & stickers are auto-punished.";

pub const EMPTY_QUESTION_REPLY: &str = "Please ask a question after `!bot`";
pub const THINKING_REPLY: &str = "Thinking...";
pub const COOLDOWN_REPLY: &str = "Please wait a few seconds before asking again.";
pub const BUSY_REPLY: &str = "Gemini is busy right now. Try again in a minute.";
pub const REFUSAL_REPLY: &str = "I can’t answer that — it violates safety rules.";
pub const EMPTY_ANSWER_REPLY: &str = "No answer.";
pub const NO_RESULTS_REPLY: &str = "_No results found._";
pub const SEARCH_FAILED_REPLY: &str = "Search failed.";
pub const SEARCH_UNAVAILABLE_REPLY: &str = "Search is not configured on this bot.";

static BOT_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(!bot|@bot)\s*").expect("valid regex"));

/// A parsed group command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask { question: String },
    Google { query: String },
    YouTube { query: String },
    Info { query: String },
    Owner,
    Help,
    Ping,
}

impl Command {
    /// Parse a message body. Returns None for ordinary chat.
    ///
    /// Prefixes are case-sensitive except `!ping`.
    pub fn parse(body: &str) -> Option<Self> {
        if body.starts_with("!bot") || body.starts_with("@bot") {
            let question = BOT_PREFIX.replace(body, "").trim().to_string();
            return Some(Command::Ask { question });
        }
        if let Some(query) = body.strip_prefix("!google ") {
            return Some(Command::Google {
                query: query.trim().to_string(),
            });
        }
        if let Some(query) = body.strip_prefix("!yt ") {
            return Some(Command::YouTube {
                query: query.trim().to_string(),
            });
        }
        if let Some(query) = body.strip_prefix("!info ") {
            return Some(Command::Info {
                query: query.trim().to_string(),
            });
        }
        match body.trim() {
            "!owner" => Some(Command::Owner),
            "!help" => Some(Command::Help),
            other if other.to_lowercase() == "!ping" => Some(Command::Ping),
            _ => None,
        }
    }
}

/// Everything the command handlers need besides the transport.
pub struct CommandContext {
    pub classifier: Arc<ClassificationClient>,
    pub knowledge: Arc<QaDocument>,
    pub web_search: Option<Arc<dyn SearchProvider>>,
    pub video_search: Option<Arc<dyn SearchProvider>>,
    pub owner_info: String,
}

impl CommandContext {
    pub fn new(classifier: Arc<ClassificationClient>, knowledge: Arc<QaDocument>) -> Self {
        Self {
            classifier,
            knowledge,
            web_search: None,
            video_search: None,
            owner_info: DEFAULT_OWNER_INFO.to_string(),
        }
    }

    /// Run one command, sending its replies through `transport`.
    pub async fn execute(
        &self,
        transport: &dyn ChatTransport,
        message: &InboundMessage,
        command: &Command,
    ) -> Result<()> {
        debug!(chat = message.chat_id, ?command, "Dispatching command");

        match command {
            Command::Ask { question } => self.ask(transport, message, question).await,
            Command::Google { query } => {
                let reply = self.google(query).await;
                say(transport, message, &reply).await
            }
            Command::YouTube { query } => {
                let reply = self.youtube(query).await;
                say(transport, message, &reply).await
            }
            Command::Info { query } => {
                let answer = self.info(query).await;
                say(transport, message, &format!("*Answer*\n{answer}")).await
            }
            Command::Owner => say(transport, message, &self.owner_info).await,
            Command::Help => say(transport, message, HELP_TEXT).await,
            Command::Ping => {
                let started = Instant::now();
                transport.send_message(&message.chat_id, "Pong!", &[]).await?;
                let elapsed = started.elapsed().as_millis();
                transport
                    .send_message(
                        &message.chat_id,
                        &format!("Alive! Response time: {elapsed} ms"),
                        &[],
                    )
                    .await
            }
        }
    }

    async fn ask(
        &self,
        transport: &dyn ChatTransport,
        message: &InboundMessage,
        question: &str,
    ) -> Result<()> {
        if question.is_empty() {
            return say(transport, message, EMPTY_QUESTION_REPLY).await;
        }

        say(transport, message, THINKING_REPLY).await?;

        let outcome = self
            .classifier
            .classify(question, Some(&message.sender_id))
            .await;
        say(transport, message, &ask_reply(&outcome)).await
    }

    /// Build the `!google` reply. Never fails; errors become reply text.
    pub async fn google(&self, query: &str) -> String {
        let Some(search) = &self.web_search else {
            return SEARCH_UNAVAILABLE_REPLY.to_string();
        };

        match search.search(query, SEARCH_RESULT_LIMIT).await {
            Ok(hits) => {
                let body = if hits.is_empty() {
                    NO_RESULTS_REPLY.to_string()
                } else {
                    format_hits(&hits, "• ")
                };
                format!("*Google Search – _{query}_*\n\n{body}")
            }
            Err(e) => {
                warn!(query, error = %e, "Web search failed, falling back to model summary");
                let prompt = format!("Summarize top info about \"{query}\"");
                match self.classifier.classify(&prompt, None).await {
                    Outcome::Success { text } if !text.trim().is_empty() => text,
                    _ => SEARCH_FAILED_REPLY.to_string(),
                }
            }
        }
    }

    /// Build the `!yt` reply.
    pub async fn youtube(&self, query: &str) -> String {
        let Some(search) = &self.video_search else {
            return SEARCH_UNAVAILABLE_REPLY.to_string();
        };

        match search.search(query, SEARCH_RESULT_LIMIT).await {
            Ok(hits) if hits.is_empty() => {
                format!("YouTube – _{query}_\n\n{NO_RESULTS_REPLY}")
            }
            Ok(hits) => format!("YouTube – _{query}_\n\n{}", format_hits(&hits, "")),
            Err(e) => {
                warn!(query, error = %e, "Video search failed");
                SEARCH_FAILED_REPLY.to_string()
            }
        }
    }

    /// Answer from the Q&A document.
    ///
    /// No match returns the fixed not-found sentence without calling the
    /// model. A match is rephrased by the model; if that fails the stored
    /// answer is returned as-is.
    pub async fn info(&self, query: &str) -> String {
        let Some(found) = self.knowledge.find_best_match(query) else {
            debug!(query, "No document entry above threshold");
            return NOT_FOUND_REPLY.to_string();
        };

        debug!(query, rating = found.rating, "Document match");

        let prompt = format!(
            "You are a university-help assistant. Answer **only** using the supplied document.\n\n\
             Relevant Q/A:\nQ: {}\nA: {}\n\n\
             User asked: \"{}\"\n\n\
             Rephrase the answer naturally, keep it short, and do NOT add external info. \
             If unsure, say: \"I only know what is in the document.\"",
            found.pair.question, found.pair.answer, query
        );

        match self.classifier.classify(&prompt, None).await {
            Outcome::Success { text } if !text.trim().is_empty() => text.trim().to_string(),
            _ => found.pair.answer.clone(),
        }
    }
}

/// Reply text for a `!bot` outcome.
pub fn ask_reply(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Success { text } if text.trim().is_empty() => EMPTY_ANSWER_REPLY.to_string(),
        Outcome::Success { text } => text.trim().to_string(),
        Outcome::CooldownSkipped => COOLDOWN_REPLY.to_string(),
        Outcome::Blocked => REFUSAL_REPLY.to_string(),
        Outcome::TransientFailure => BUSY_REPLY.to_string(),
    }
}

/// Command replies go to the chat, not as quoted replies.
async fn say(transport: &dyn ChatTransport, message: &InboundMessage, text: &str) -> Result<()> {
    transport.send_message(&message.chat_id, text, &[]).await
}

fn format_hits(hits: &[SearchHit], bullet: &str) -> String {
    hits.iter()
        .map(|h| format!("{bullet}*{}*\n{}", h.title, h.url))
        .collect::<Vec<_>>()
        .join("\n\n")
}
