// ABOUTME: Environment configuration management for the support relay
// ABOUTME: Parses assistant credentials, polling bounds, ticket store, and HTTP settings from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration
//!
//! Configuration is built once per process in `main` and handed to the relay and the
//! router as plain values. Nothing reads the environment after startup.

use crate::constants::{defaults, env_config};
use crate::errors::{AppError, AppResult};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;
use url::Url;

/// Environment type for logging and deployment decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development
    #[default]
    Development,
    /// Production deployment
    Production,
    /// Automated tests
    Testing,
}

impl Environment {
    /// Parse from string with fallback
    #[must_use]
    pub fn from_str_or_default(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "testing" | "test" => Self::Testing,
            _ => Self::Development,
        }
    }

    /// Check if this is a production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
            Self::Testing => write!(f, "testing"),
        }
    }
}

/// Type-safe `SQLite` location for the ticket table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseUrl {
    /// `SQLite` database file
    SQLite {
        /// Path of the database file
        path: PathBuf,
    },
    /// In-memory `SQLite` database (tests and throwaway deployments)
    Memory,
}

impl DatabaseUrl {
    /// Parse a database URL; bare paths are treated as `SQLite` files
    #[must_use]
    pub fn parse_url(s: &str) -> Self {
        let path_str = s.strip_prefix("sqlite:").unwrap_or(s);
        let path_str = path_str.strip_prefix("//").unwrap_or(path_str);
        if path_str == ":memory:" {
            Self::Memory
        } else {
            Self::SQLite {
                path: PathBuf::from(path_str),
            }
        }
    }

    /// Convert to a sqlx connection string
    #[must_use]
    pub fn to_connection_string(&self) -> String {
        match self {
            Self::SQLite { path } => format!("sqlite:{}", path.display()),
            Self::Memory => "sqlite::memory:".to_owned(),
        }
    }

    /// Check if this is an in-memory database
    #[must_use]
    pub const fn is_memory(&self) -> bool {
        matches!(self, Self::Memory)
    }
}

impl Default for DatabaseUrl {
    fn default() -> Self {
        Self::parse_url(defaults::DATABASE_URL)
    }
}

impl fmt::Display for DatabaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_connection_string())
    }
}

/// Assistant service connection settings
#[derive(Clone)]
pub struct AssistantConfig {
    /// API key sent as a bearer token
    pub api_key: String,
    /// Assistant that runs against every conversation
    pub assistant_id: String,
    /// API root, e.g. `https://api.openai.com/v1`
    pub base_url: Url,
    /// Optional organisation header
    pub organization: Option<String>,
    /// Timeout for a single HTTP call
    pub request_timeout: Duration,
}

impl fmt::Debug for AssistantConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssistantConfig")
            .field("api_key", &"[REDACTED]")
            .field("assistant_id", &self.assistant_id)
            .field("base_url", &self.base_url.as_str())
            .field("organization", &self.organization)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// Run polling bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingConfig {
    /// Delay between two status checks
    pub interval: Duration,
    /// Maximum number of status checks for one run
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(defaults::POLL_INTERVAL_MS),
            max_attempts: defaults::MAX_POLL_ATTEMPTS,
        }
    }
}

/// Where support tickets are persisted
#[derive(Clone)]
pub enum TicketStoreConfig {
    /// Local `SQLite` table through sqlx
    Sqlite {
        /// Database location
        url: DatabaseUrl,
    },
    /// Supabase `PostgREST` table
    Supabase {
        /// Project URL, e.g. `https://xyz.supabase.co`
        url: Url,
        /// Anon or service key
        api_key: String,
    },
}

impl TicketStoreConfig {
    /// Short backend name for logs
    #[must_use]
    pub const fn backend_name(&self) -> &'static str {
        match self {
            Self::Sqlite { .. } => "sqlite",
            Self::Supabase { .. } => "supabase",
        }
    }
}

impl fmt::Debug for TicketStoreConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite { url } => f.debug_struct("Sqlite").field("url", url).finish(),
            Self::Supabase { url, .. } => f
                .debug_struct("Supabase")
                .field("url", &url.as_str())
                .field("api_key", &"[REDACTED]")
                .finish(),
        }
    }
}

/// CORS settings for the widget origin(s)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// `*` or a comma-separated origin list
    pub allowed_origins: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: defaults::CORS_ALLOWED_ORIGINS.to_owned(),
        }
    }
}

/// Complete relay configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// HTTP bind address
    pub host: String,
    /// Deployment environment
    pub environment: Environment,
    /// Assistant service settings
    pub assistant: AssistantConfig,
    /// Run polling bounds
    pub polling: PollingConfig,
    /// Ticket persistence backend
    pub tickets: TicketStoreConfig,
    /// CORS settings
    pub cors: CorsConfig,
}

impl ServerConfig {
    /// Load configuration from process environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value cannot be parsed
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value cannot be parsed
    pub fn from_vars<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| var(key).ok_or_else(|| AppError::config_missing(key));

        let assistant = AssistantConfig {
            api_key: required(env_config::OPENAI_API_KEY)?,
            assistant_id: required(env_config::OPENAI_ASSISTANT_ID)?,
            base_url: parse_url_var(
                env_config::OPENAI_BASE_URL,
                &var(env_config::OPENAI_BASE_URL)
                    .unwrap_or_else(|| defaults::OPENAI_BASE_URL.to_owned()),
            )?,
            organization: var(env_config::OPENAI_ORGANIZATION),
            request_timeout: Duration::from_secs(parse_or(
                env_config::ASSISTANT_REQUEST_TIMEOUT_SECS,
                var(env_config::ASSISTANT_REQUEST_TIMEOUT_SECS),
                defaults::REQUEST_TIMEOUT_SECS,
            )?),
        };

        let polling = PollingConfig {
            interval: Duration::from_millis(parse_or(
                env_config::ASSISTANT_POLL_INTERVAL_MS,
                var(env_config::ASSISTANT_POLL_INTERVAL_MS),
                defaults::POLL_INTERVAL_MS,
            )?),
            max_attempts: parse_or(
                env_config::ASSISTANT_MAX_POLL_ATTEMPTS,
                var(env_config::ASSISTANT_MAX_POLL_ATTEMPTS),
                defaults::MAX_POLL_ATTEMPTS,
            )?,
        };
        if polling.max_attempts == 0 {
            return Err(AppError::config_invalid(
                env_config::ASSISTANT_MAX_POLL_ATTEMPTS,
                "must be at least 1",
            ));
        }

        let tickets = match var(env_config::TICKET_STORE_BACKEND)
            .map(|backend| backend.to_lowercase())
            .as_deref()
        {
            None | Some("sqlite") => TicketStoreConfig::Sqlite {
                url: var(env_config::DATABASE_URL)
                    .map_or_else(DatabaseUrl::default, |url| DatabaseUrl::parse_url(&url)),
            },
            Some("supabase") => TicketStoreConfig::Supabase {
                url: parse_url_var(
                    env_config::SUPABASE_URL,
                    &required(env_config::SUPABASE_URL)?,
                )?,
                api_key: required(env_config::SUPABASE_ANON_KEY)?,
            },
            Some(other) => {
                return Err(AppError::config_invalid(
                    env_config::TICKET_STORE_BACKEND,
                    format!("unknown backend '{other}' (expected 'sqlite' or 'supabase')"),
                ))
            }
        };

        Ok(Self {
            http_port: parse_or(
                env_config::HTTP_PORT,
                var(env_config::HTTP_PORT),
                defaults::HTTP_PORT,
            )?,
            host: var(env_config::HOST).unwrap_or_else(|| defaults::HOST.to_owned()),
            environment: var(env_config::ENVIRONMENT)
                .map_or_else(Environment::default, |env| {
                    Environment::from_str_or_default(&env)
                }),
            assistant,
            polling,
            tickets,
            cors: CorsConfig {
                allowed_origins: var(env_config::CORS_ALLOWED_ORIGINS)
                    .unwrap_or_else(|| defaults::CORS_ALLOWED_ORIGINS.to_owned()),
            },
        })
    }

    /// Get a secret-free configuration summary for the startup log
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Support Relay Configuration:\n\
             - Listen: {}:{}\n\
             - Environment: {}\n\
             - Assistant API: {}\n\
             - Assistant ID: {}\n\
             - Poll Interval: {}ms\n\
             - Max Poll Attempts: {}\n\
             - Ticket Store: {}\n\
             - CORS Origins: {}",
            self.host,
            self.http_port,
            self.environment,
            self.assistant.base_url,
            self.assistant.assistant_id,
            self.polling.interval.as_millis(),
            self.polling.max_attempts,
            self.tickets.backend_name(),
            self.cors.allowed_origins,
        )
    }
}

/// Parse an optional variable, falling back to a default when unset
fn parse_or<T>(key: &str, value: Option<String>, default: T) -> AppResult<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e| AppError::config_invalid(key, e))
    })
}

/// Parse a base URL, dropping any trailing slash
fn parse_url_var(key: &str, raw: &str) -> AppResult<Url> {
    Url::parse(raw.trim().trim_end_matches('/')).map_err(|e| AppError::config_invalid(key, e))
}
