use std::env;

use thiserror::Error;
use uuid::Uuid;

use crate::session::Session;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub access_token: Option<String>,
    pub user_id: Option<Uuid>,
    pub log_format: LogFormat,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok(); // Load .env file
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let supabase_url =
            non_blank(lookup("SUPABASE_URL")).ok_or(ConfigError::Missing("SUPABASE_URL"))?;
        if !supabase_url.starts_with("http://") && !supabase_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                name: "SUPABASE_URL",
                reason: "expected an http(s) URL".into(),
            });
        }

        let supabase_anon_key = non_blank(lookup("SUPABASE_ANON_KEY"))
            .ok_or(ConfigError::Missing("SUPABASE_ANON_KEY"))?;

        let user_id = match non_blank(lookup("REPORTBOARD_USER_ID")) {
            Some(raw) => Some(Uuid::parse_str(&raw).map_err(|err| ConfigError::Invalid {
                name: "REPORTBOARD_USER_ID",
                reason: err.to_string(),
            })?),
            None => None,
        };

        Ok(Config {
            supabase_url,
            supabase_anon_key,
            access_token: non_blank(lookup("SUPABASE_ACCESS_TOKEN")),
            user_id,
            log_format: log_format_from(lookup("LOG_FORMAT")),
        })
    }

    pub fn session(&self) -> Session {
        let session = Session {
            user_id: self.user_id,
            access_token: None,
        };
        match &self.access_token {
            Some(token) => session.with_access_token(token.clone()),
            None => session,
        }
    }
}

pub fn log_format_from(value: Option<String>) -> LogFormat {
    match non_blank(value).as_deref() {
        Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
        _ => LogFormat::Text,
    }
}
