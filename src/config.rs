use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::classifier::gemini::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::transport::gateway::DEFAULT_GATEWAY_URL;

/// Central configuration loaded from environment variables.
///
/// All secrets come from env vars (never hardcoded). The .env file
/// is loaded automatically at startup via dotenvy.
pub struct Config {
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_url: String,
    /// `.json` selects the JSON document store, anything else SQLite.
    pub db_path: String,
    /// WhatsApp Web gateway sidecar base URL.
    pub gateway_url: String,
    /// Bearer token sent to the gateway, if it requires one.
    pub gateway_token: Option<String>,
    pub google_api_key: String,
    pub google_cse_id: String,
    pub youtube_api_key: String,
    /// Q&A document used by `!info`.
    pub qa_path: PathBuf,
    /// Replaces the default `!owner` text when set.
    pub owner_info: Option<String>,
    /// Comma-separated terms appended to the built-in profanity list.
    pub extra_terms: Vec<String>,
    pub cooldown: Duration,
    pub retry_base_delay: Duration,
    /// Timeout applied to every outbound HTTP request.
    pub http_timeout: Duration,
    /// Bot process: webhooks, QR page, dashboard.
    pub port: u16,
    /// Standalone `groupguard dashboard` process.
    pub dashboard_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default except the API keys; the `require_*`
    /// checks below decide which keys a subcommand actually needs.
    pub fn load() -> Result<Self> {
        let extra_terms = env::var("GROUPGUARD_EXTRA_TERMS")
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            gemini_api_key: env::var("GEMINI_API_KEY").unwrap_or_default(),
            gemini_model: env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            gemini_api_url: env::var("GEMINI_API_URL")
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            db_path: env::var("GROUPGUARD_DB_PATH")
                .unwrap_or_else(|_| "./groupguard.db".to_string()),
            gateway_url: env::var("GATEWAY_URL")
                .unwrap_or_else(|_| DEFAULT_GATEWAY_URL.to_string()),
            gateway_token: env::var("GATEWAY_TOKEN").ok().filter(|t| !t.is_empty()),
            google_api_key: env::var("GOOGLE_API_KEY").unwrap_or_default(),
            google_cse_id: env::var("GOOGLE_CSE_ID").unwrap_or_default(),
            youtube_api_key: env::var("YOUTUBE_API_KEY").unwrap_or_default(),
            qa_path: env::var("GROUPGUARD_QA_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("qa_pairs.json")),
            owner_info: env::var("GROUPGUARD_OWNER_INFO")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|s| s.replace("\\n", "\n")),
            extra_terms,
            cooldown: Duration::from_secs(parse_env("GROUPGUARD_COOLDOWN_SECS", 8)?),
            retry_base_delay: Duration::from_millis(parse_env("GROUPGUARD_RETRY_BASE_MS", 1500)?),
            http_timeout: Duration::from_secs(parse_env("GROUPGUARD_HTTP_TIMEOUT_SECS", 30)?),
            port: parse_env("PORT", 3000)?,
            dashboard_port: parse_env("DASHBOARD_PORT", 4000)?,
        })
    }

    /// Check that the Gemini API key is configured.
    /// Call this before anything that talks to the model.
    pub fn require_gemini(&self) -> Result<()> {
        if self.gemini_api_key.is_empty() {
            anyhow::bail!(
                "GEMINI_API_KEY not set. Add it to your .env file.\n\
                 See .env.example for the required variables."
            );
        }
        Ok(())
    }

    /// Web search needs both the API key and the search engine id.
    pub fn has_web_search(&self) -> bool {
        !self.google_api_key.is_empty() && !self.google_cse_id.is_empty()
    }

    pub fn has_video_search(&self) -> bool {
        !self.youtube_api_key.is_empty()
    }
}

/// Read a numeric env var, falling back to `default` when unset.
/// A set-but-unparseable value is an error rather than a silent default.
fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{name} must be a number, got {raw:?}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_default_when_unset() {
        let value: u64 = parse_env("GROUPGUARD_TEST_UNSET_VARIABLE", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_require_gemini_fails_without_key() {
        let config = Config {
            gemini_api_key: String::new(),
            gemini_model: DEFAULT_MODEL.to_string(),
            gemini_api_url: DEFAULT_API_URL.to_string(),
            db_path: "./groupguard.db".to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            gateway_token: None,
            google_api_key: "key".to_string(),
            google_cse_id: String::new(),
            youtube_api_key: String::new(),
            qa_path: PathBuf::from("qa_pairs.json"),
            owner_info: None,
            extra_terms: Vec::new(),
            cooldown: Duration::from_secs(8),
            retry_base_delay: Duration::from_millis(1500),
            http_timeout: Duration::from_secs(30),
            port: 3000,
            dashboard_port: 4000,
        };
        assert!(config.require_gemini().is_err());
        assert!(!config.has_web_search());
        assert!(!config.has_video_search());
    }
}
