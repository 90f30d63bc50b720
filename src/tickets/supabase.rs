// ABOUTME: Supabase PostgREST-backed support ticket store
// ABOUTME: Inserts rows into the support_tickets table and returns the stored representation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{error, instrument};
use url::Url;

use super::{NewTicket, SupportTicket, TicketStore};
use crate::constants::defaults;
use crate::errors::{AppError, AppResult};

const SERVICE_NAME: &str = "Supabase";
const TABLE: &str = "support_tickets";

/// Row returned by `Prefer: return=representation`
#[derive(Debug, Deserialize)]
struct TicketRow {
    id: Value,
    user_thread_id: String,
    issue_summary: String,
    user_email: Option<String>,
    created_at: Option<DateTime<Utc>>,
}

impl From<TicketRow> for SupportTicket {
    fn from(row: TicketRow) -> Self {
        // Tables may key on bigint identity or uuid
        let id = match row.id {
            Value::String(id) => id,
            other => other.to_string(),
        };
        Self {
            id,
            thread_id: row.user_thread_id,
            issue_summary: row.issue_summary,
            user_email: row.user_email,
            created_at: row.created_at.unwrap_or_else(Utc::now),
        }
    }
}

/// Ticket store on a Supabase project's REST interface
pub struct SupabaseTicketStore {
    client: Client,
    table_url: Url,
    api_key: String,
}

impl SupabaseTicketStore {
    /// Create a store for the project at `project_url`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created or the URL cannot hold a path
    pub fn new(project_url: Url, api_key: String) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(defaults::REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        let mut table_url = project_url.clone();
        table_url
            .path_segments_mut()
            .map_err(|()| AppError::config(format!("Invalid Supabase URL: {project_url}")))?
            .pop_if_empty()
            .extend(["rest", "v1", TABLE]);

        Ok(Self {
            client,
            table_url,
            api_key,
        })
    }
}

#[async_trait]
impl TicketStore for SupabaseTicketStore {
    fn backend_name(&self) -> &'static str {
        "supabase"
    }

    #[instrument(skip(self, ticket), fields(thread_id = %ticket.thread_id))]
    async fn create_ticket(&self, ticket: NewTicket) -> AppResult<SupportTicket> {
        let response = self
            .client
            .post(self.table_url.clone())
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=representation")
            .json(&[&ticket])
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send ticket insert: {e}");
                AppError::external_unavailable(SERVICE_NAME, format!("Failed to connect: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            let detail = body.chars().take(200).collect::<String>();
            error!("Ticket insert rejected ({status}): {detail}");
            return Err(AppError::external_service(
                SERVICE_NAME,
                format!("Ticket insert failed ({status}): {detail}"),
            ));
        }

        let rows: Vec<TicketRow> = serde_json::from_str(&body).map_err(|e| {
            AppError::external_service(SERVICE_NAME, format!("Failed to parse inserted row: {e}"))
        })?;

        rows.into_iter().next().map(SupportTicket::from).ok_or_else(|| {
            AppError::external_service(SERVICE_NAME, "Insert returned no rows".to_owned())
        })
    }
}
