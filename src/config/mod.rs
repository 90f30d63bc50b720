// ABOUTME: Configuration module for the support relay
// ABOUTME: Groups environment-driven server, assistant, polling, and ticket store settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Environment and server configuration
pub mod environment;

pub use environment::{
    AssistantConfig, CorsConfig, DatabaseUrl, Environment, PollingConfig, ServerConfig,
    TicketStoreConfig,
};
