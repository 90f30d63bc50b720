// ABOUTME: Support ticket persistence abstraction used by the create_support_ticket tool
// ABOUTME: Defines ticket records, the TicketStore trait, and backend selection from config
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Support Tickets
//!
//! Tickets are written when the assistant calls `create_support_ticket`. The relay
//! never lets a store failure escape as a request failure; see
//! [`crate::relay::tools`] for how results become tool outputs.

mod sqlite;
mod supabase;

pub use sqlite::SqliteTicketStore;
pub use supabase::SupabaseTicketStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::TicketStoreConfig;
use crate::errors::AppResult;

/// Ticket to persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTicket {
    /// Conversation the ticket was raised from
    #[serde(rename = "user_thread_id")]
    pub thread_id: String,
    /// Summary of the user's issue
    pub issue_summary: String,
    /// Contact address, when the user gave one
    pub user_email: Option<String>,
}

/// A persisted support ticket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct SupportTicket {
    /// Store-generated identifier
    pub id: String,
    /// Conversation the ticket was raised from
    #[serde(rename = "user_thread_id")]
    #[sqlx(rename = "user_thread_id")]
    pub thread_id: String,
    /// Summary of the user's issue
    pub issue_summary: String,
    /// Contact address, when the user gave one
    pub user_email: Option<String>,
    /// When the ticket was stored
    pub created_at: DateTime<Utc>,
}

/// Ticket persistence backend
#[async_trait]
pub trait TicketStore: Send + Sync {
    /// Short backend name for logs
    fn backend_name(&self) -> &'static str;

    /// Persist a ticket and return the stored record
    async fn create_ticket(&self, ticket: NewTicket) -> AppResult<SupportTicket>;
}

/// Create the configured ticket store
///
/// # Errors
///
/// Returns an error if the database cannot be opened or the HTTP client cannot be built
pub async fn create_ticket_store(config: &TicketStoreConfig) -> AppResult<Arc<dyn TicketStore>> {
    let store: Arc<dyn TicketStore> = match config {
        TicketStoreConfig::Sqlite { url } => Arc::new(SqliteTicketStore::connect(url).await?),
        TicketStoreConfig::Supabase { url, api_key } => {
            Arc::new(SupabaseTicketStore::new(url.clone(), api_key.clone())?)
        }
    };
    info!("Ticket store initialized: {}", store.backend_name());
    Ok(store)
}
