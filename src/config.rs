use std::env;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};

/// Runtime configuration, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub bot_token: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    /// The bot owner's Telegram user id. Parsed when present; the message
    /// pipeline does not consult it.
    pub owner_id: Option<i64>,
    pub db_path: PathBuf,
    /// Port for the health endpoint (service binary only).
    pub port: u16,
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("users_data.db")
}

fn default_port() -> u16 {
    8000
}

impl Config {
    /// Load configuration from the environment. `BOT_TOKEN` and
    /// `GEMINI_API_KEY` are required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let bot_token = env::var("BOT_TOKEN").context("BOT_TOKEN must be set")?;
        if bot_token.is_empty() {
            bail!("BOT_TOKEN must not be empty");
        }

        let gemini_api_key = env::var("GEMINI_API_KEY").context("GEMINI_API_KEY must be set")?;
        if gemini_api_key.is_empty() {
            bail!("GEMINI_API_KEY must not be empty");
        }

        let gemini_model = env::var("GEMINI_MODEL").unwrap_or_else(|_| default_model());

        let owner_id = env::var("OWNER_ID").ok().and_then(|v| v.parse().ok());

        let db_path = env::var("DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_db_path());

        let port = env::var("PORT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_else(default_port);

        Ok(Self {
            bot_token,
            gemini_api_key,
            gemini_model,
            owner_id,
            db_path,
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        env::remove_var("BOT_TOKEN");
        env::remove_var("GEMINI_API_KEY");
        env::remove_var("GEMINI_MODEL");
        env::remove_var("OWNER_ID");
        env::remove_var("DB_PATH");
        env::remove_var("PORT");
    }

    #[test]
    #[serial]
    fn test_missing_bot_token_is_fatal() {
        clear_env();
        env::set_var("GEMINI_API_KEY", "AIza-test");

        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_missing_api_key_is_fatal() {
        clear_env();
        env::set_var("BOT_TOKEN", "123:abc");

        assert!(Config::from_env().is_err());
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        env::set_var("BOT_TOKEN", "123:abc");
        env::set_var("GEMINI_API_KEY", "AIza-test");

        let config = Config::from_env().unwrap();

        assert_eq!(config.bot_token, "123:abc");
        assert_eq!(config.gemini_api_key, "AIza-test");
        assert_eq!(config.gemini_model, "gemini-2.0-flash");
        assert!(config.owner_id.is_none());
        assert_eq!(config.db_path, PathBuf::from("users_data.db"));
        assert_eq!(config.port, 8000);
    }

    #[test]
    #[serial]
    fn test_custom_values() {
        clear_env();
        env::set_var("BOT_TOKEN", "123:abc");
        env::set_var("GEMINI_API_KEY", "AIza-test");
        env::set_var("GEMINI_MODEL", "gemini-2.5-pro");
        env::set_var("OWNER_ID", "42");
        env::set_var("DB_PATH", "/tmp/bot.db");
        env::set_var("PORT", "9090");

        let config = Config::from_env().unwrap();

        assert_eq!(config.gemini_model, "gemini-2.5-pro");
        assert_eq!(config.owner_id, Some(42));
        assert_eq!(config.db_path, PathBuf::from("/tmp/bot.db"));
        assert_eq!(config.port, 9090);
    }

    #[test]
    #[serial]
    fn test_malformed_port_falls_back_to_default() {
        clear_env();
        env::set_var("BOT_TOKEN", "123:abc");
        env::set_var("GEMINI_API_KEY", "AIza-test");
        env::set_var("PORT", "not-a-port");

        let config = Config::from_env().unwrap();
        assert_eq!(config.port, 8000);
    }
}
