// Text generator trait — the seam in front of the remote completion service.
//
// The remote service's own safety layer is what flags unsafe content, so a
// "classification" is simply a generate call whose failure mode we inspect.
// Implementations report failures as anyhow errors; ClassificationClient
// decides transient vs. blocked vs. fatal from the error text.

use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send `prompt` to the model and return its text reply.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Generator used when no API key is configured.
/// Every call fails with a non-retryable error, so classification degrades
/// to "not blocked" and `!bot` replies that the model is busy.
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("Text generation disabled: GEMINI_API_KEY not set")
    }
}
