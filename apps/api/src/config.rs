use anyhow::{Context, Result};

/// Default chat-completions endpoint base. Overridable via OPENAI_BASE_URL
/// for gateways and self-hosted OpenAI-compatible backends.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier used when OPENAI_MODEL is unset.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Application configuration loaded once from environment variables.
///
/// The API key is deliberately optional at startup: a missing credential is
/// reported per request as stream events so the client sees a well-formed
/// event sequence instead of a dead server.
#[derive(Debug, Clone)]
pub struct Config {
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openai_api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            openai_base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            openai_model: std::env::var("OPENAI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    /// Plain constructor for tests, no environment involved.
    pub(crate) fn for_tests(api_key: Option<&str>) -> Self {
        Config {
            openai_api_key: api_key.map(String::from),
            openai_base_url: DEFAULT_BASE_URL.to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            port: 8080,
            rust_log: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = Config::for_tests(None);
        assert_eq!(config.openai_model, "gpt-4o-mini");
        assert!(config.openai_api_key.is_none());
    }
}
