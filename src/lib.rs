// ABOUTME: Main library entry point for the support chat relay
// ABOUTME: Relays widget messages to a thread/run assistant service and files support tickets
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Support Relay
//!
//! Server side of an embedded customer-support chat widget. The widget posts the
//! user's text to `POST /api/chat`; the relay forwards it to a hosted assistant,
//! polls the resulting run, answers the assistant's tool calls, and returns the reply
//! together with the conversation id the widget keeps for the next turn.
//!
//! ## Architecture
//!
//! - **Assistant**: the [`assistant::AssistantService`] trait and its `OpenAI`
//!   Assistants v2 client
//! - **Relay**: the per-turn poll loop and tool dispatch
//! - **Tickets**: `SQLite` or Supabase persistence for `create_support_ticket`
//! - **Routes**: the widget endpoint and health checks
//! - **Config**: environment-only configuration
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use support_relay::config::ServerConfig;
//! use support_relay::errors::AppResult;
//!
//! fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("{}", config.summary());
//!     Ok(())
//! }
//! ```

/// Thread/run assistant service interface and `OpenAI` client
pub mod assistant;

/// Environment configuration
pub mod config;

/// Environment variable names, defaults, and wire constants
pub mod constants;

/// Unified error handling
pub mod errors;

/// Structured logging setup and relay log events
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// Per-turn assistant run relay
pub mod relay;

/// HTTP routes
pub mod routes;

/// Router assembly and serving
pub mod server;

/// Support ticket persistence
pub mod tickets;
