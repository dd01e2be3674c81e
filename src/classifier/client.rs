// Classification client — cooldown, bounded retry, and error classification
// around a TextGenerator.
//
// Every call resolves to an Outcome instead of an error: callers only ever
// need to choose a reply or a moderation action, never propagate.
//
// Retry policy: transient errors (503 / overloaded / rate limit) are retried
// up to `max_retries` extra times, sleeping `base_delay * attempt` before
// attempt number `attempt` (1500 ms, then 3000 ms with the defaults).
// Safety blocks are terminal and never retried. Anything else is a generic
// skip.

use std::sync::{Arc, LazyLock};

use regex_lite::Regex;
use tokio::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::cooldown::CooldownTracker;
use super::traits::TextGenerator;

/// Extra attempts after the first one.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Multiplied by the attempt number to get the sleep before a retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(1500);

/// Result of one classification request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The model replied.
    Success { text: String },
    /// The user called within the cooldown window; nothing was sent.
    CooldownSkipped,
    /// The remote safety layer rejected the content.
    Blocked,
    /// Retries exhausted, or a non-retryable error.
    TransientFailure,
}

impl Outcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, Outcome::Blocked)
    }

    pub fn text(&self) -> Option<&str> {
        match self {
            Outcome::Success { text } => Some(text),
            _ => None,
        }
    }
}

/// How a remote failure should be handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    SafetyBlocked,
    Fatal,
}

/// An HTTP status the generator reported, not any digits in a response body.
static TRANSIENT_STATUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:returned|status:?) (?:429|503)\b").expect("valid regex"));

/// Classify a generator error by inspecting its message chain.
///
/// The transient check runs first: an "overloaded" error that happens to
/// mention a block reason is still worth retrying.
pub fn classify_error(err: &anyhow::Error) -> ErrorClass {
    let msg = format!("{err:#}");
    let lower = msg.to_lowercase();

    if TRANSIENT_STATUS.is_match(&msg)
        || lower.contains("overloaded")
        || lower.contains("rate_limit")
        || lower.contains("rate limit")
        || lower.contains("resource_exhausted")
    {
        ErrorClass::Transient
    } else if lower.contains("safety") || lower.contains("blocked") {
        ErrorClass::SafetyBlocked
    } else {
        ErrorClass::Fatal
    }
}

pub struct ClassificationClient {
    generator: Arc<dyn TextGenerator>,
    cooldown: Arc<CooldownTracker>,
    base_delay: Duration,
}

impl ClassificationClient {
    pub fn new(generator: Arc<dyn TextGenerator>, cooldown: Arc<CooldownTracker>) -> Self {
        Self {
            generator,
            cooldown,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }

    /// Override the retry base delay (the sleep before retry `n` is `base * n`).
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn cooldown(&self) -> &CooldownTracker {
        &self.cooldown
    }

    /// Sleep applied before retry number `attempt` (1-based).
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt)
    }

    /// Classify with the default retry budget.
    pub async fn classify(&self, text: &str, user_id: Option<&str>) -> Outcome {
        self.classify_with_retries(text, user_id, DEFAULT_MAX_RETRIES)
            .await
    }

    /// Send `text` to the generator, honoring the per-user cooldown when a
    /// `user_id` is given.
    pub async fn classify_with_retries(
        &self,
        text: &str,
        user_id: Option<&str>,
        max_retries: u32,
    ) -> Outcome {
        let started = Instant::now();

        if let Some(user) = user_id {
            if self.cooldown.is_cooling(user, started) {
                debug!(user, "Classification skipped: user in cooldown");
                return Outcome::CooldownSkipped;
            }
        }

        let mut attempt = 0u32;
        loop {
            match self.generator.generate(text).await {
                Ok(reply) => {
                    if let Some(user) = user_id {
                        self.cooldown.record(user, started);
                    }
                    return Outcome::Success { text: reply };
                }
                Err(err) => match classify_error(&err) {
                    ErrorClass::Transient => {
                        if attempt >= max_retries {
                            warn!(
                                attempts = attempt + 1,
                                error = %err,
                                "Generator still unavailable, giving up"
                            );
                            return Outcome::TransientFailure;
                        }
                        attempt += 1;
                        let delay = self.backoff_delay(attempt);
                        warn!(
                            attempt,
                            max_retries,
                            delay_ms = delay.as_millis() as u64,
                            "Generator unavailable, retrying in {}ms",
                            delay.as_millis()
                        );
                        tokio::time::sleep(delay).await;
                    }
                    ErrorClass::SafetyBlocked => {
                        info!(error = %err, "Content blocked by safety filter");
                        return Outcome::Blocked;
                    }
                    ErrorClass::Fatal => {
                        warn!(error = %err, "Generator error");
                        return Outcome::TransientFailure;
                    }
                },
            }
        }
    }
}
