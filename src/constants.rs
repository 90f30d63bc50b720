// ABOUTME: System-wide constants for the support relay
// ABOUTME: Environment variable names, defaults, wire constants, and tool names
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Constants Module
//!
//! Hardcoded defaults and the names of the environment variables that override them.

/// Service identification for structured logging
pub mod service_names {
    /// Name of the relay service
    pub const SUPPORT_RELAY: &str = "support-relay";
}

/// Environment variable names read by [`crate::config::environment::ServerConfig`]
pub mod env_config {
    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";
    /// HTTP bind address
    pub const HOST: &str = "HOST";
    /// Deployment environment
    pub const ENVIRONMENT: &str = "ENVIRONMENT";
    /// Assistant service API key
    pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
    /// Assistant to run against each conversation
    pub const OPENAI_ASSISTANT_ID: &str = "OPENAI_ASSISTANT_ID";
    /// Assistant service base URL
    pub const OPENAI_BASE_URL: &str = "OPENAI_BASE_URL";
    /// Optional organisation header
    pub const OPENAI_ORGANIZATION: &str = "OPENAI_ORGANIZATION";
    /// Delay between run status checks
    pub const ASSISTANT_POLL_INTERVAL_MS: &str = "ASSISTANT_POLL_INTERVAL_MS";
    /// Maximum run status checks per request
    pub const ASSISTANT_MAX_POLL_ATTEMPTS: &str = "ASSISTANT_MAX_POLL_ATTEMPTS";
    /// Timeout for a single assistant service call
    pub const ASSISTANT_REQUEST_TIMEOUT_SECS: &str = "ASSISTANT_REQUEST_TIMEOUT_SECS";
    /// Ticket store backend selector
    pub const TICKET_STORE_BACKEND: &str = "TICKET_STORE_BACKEND";
    /// `SQLite` ticket database URL
    pub const DATABASE_URL: &str = "DATABASE_URL";
    /// Supabase project URL
    pub const SUPABASE_URL: &str = "SUPABASE_URL";
    /// Supabase anon/service key
    pub const SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
    /// Comma-separated list of allowed CORS origins
    pub const CORS_ALLOWED_ORIGINS: &str = "CORS_ALLOWED_ORIGINS";
}

/// Default configuration values
pub mod defaults {
    /// Default HTTP port
    pub const HTTP_PORT: u16 = 8081;
    /// Default bind address
    pub const HOST: &str = "0.0.0.0";
    /// Default assistant service base URL
    pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
    /// Default delay between run status checks
    pub const POLL_INTERVAL_MS: u64 = 1000;
    /// Default poll budget (about one minute at the default interval)
    pub const MAX_POLL_ATTEMPTS: u32 = 60;
    /// Default timeout for one assistant service call
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;
    /// Connection timeout for the assistant service
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
    /// Default `SQLite` database for tickets
    pub const DATABASE_URL: &str = "sqlite:./data/support_tickets.db";
    /// Default CORS policy
    pub const CORS_ALLOWED_ORIGINS: &str = "*";
}

/// Wire constants for the widget-facing API
pub mod chat {
    /// Path of the relay endpoint
    pub const CHAT_PATH: &str = "/api/chat";
    /// Rejection message for a missing or empty user message
    pub const MESSAGE_REQUIRED: &str = "Message is required";
    /// Reply used when the completed run produced no assistant text
    pub const FALLBACK_REPLY: &str = "An error occurred while fetching the response.";
}

/// Functions the assistant may call
pub mod tools {
    /// Files a support ticket for the current conversation
    pub const CREATE_SUPPORT_TICKET: &str = "create_support_ticket";
}
