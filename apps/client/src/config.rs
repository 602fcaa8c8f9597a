//! Client configuration from environment variables.

use thiserror::Error;

const DEFAULT_PAGE_SIZE: usize = 10;
const DEFAULT_PRACTICE_SIZE: usize = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be a positive integer, got {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

/// Runtime settings of the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Remote catalog base URL. `None` runs against the in-memory demo data.
    pub api_base_url: Option<String>,
    pub api_token: Option<String>,
    pub user_id: Option<String>,
    pub page_size: usize,
    pub practice_size: usize,
    /// Category to open at startup instead of the first one.
    pub category: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            user_id: None,
            page_size: DEFAULT_PAGE_SIZE,
            practice_size: DEFAULT_PRACTICE_SIZE,
            category: None,
        }
    }
}

impl ClientConfig {
    /// Read `WORDS_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let number = |name: &'static str, default: usize| -> Result<usize, ConfigError> {
            match text(name) {
                None => Ok(default),
                Some(value) => match value.trim().parse::<usize>() {
                    Ok(n) if n > 0 => Ok(n),
                    _ => Err(ConfigError::InvalidNumber { name, value }),
                },
            }
        };

        Ok(Self {
            api_base_url: text("WORDS_API_URL").map(|url| url.trim_end_matches('/').to_string()),
            api_token: text("WORDS_API_TOKEN"),
            user_id: text("WORDS_USER_ID"),
            page_size: number("WORDS_PAGE_SIZE", DEFAULT_PAGE_SIZE)?,
            practice_size: number("WORDS_PRACTICE_SIZE", DEFAULT_PRACTICE_SIZE)?,
            category: text("WORDS_CATEGORY"),
        })
    }
}
