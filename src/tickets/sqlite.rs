// ABOUTME: SQLite-backed support ticket store using sqlx
// ABOUTME: Creates the support_tickets table on startup and inserts tickets with UUID ids
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use super::{NewTicket, SupportTicket, TicketStore};
use crate::config::DatabaseUrl;
use crate::errors::{AppError, AppResult};

/// Ticket store on a local `SQLite` database
#[derive(Clone)]
pub struct SqliteTicketStore {
    pool: SqlitePool,
}

impl SqliteTicketStore {
    /// Open (creating if needed) the database and ensure the ticket table exists
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated
    pub async fn connect(url: &DatabaseUrl) -> AppResult<Self> {
        let options = match url {
            // Every connection to :memory: is a separate database, so keep exactly one
            DatabaseUrl::Memory => SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>),
            DatabaseUrl::SQLite { path } => {
                ensure_parent_dir(path)?;
                SqlitePoolOptions::new()
            }
        };

        // Ensure SQLite creates the database file if it doesn't exist
        let connection_string = match url {
            DatabaseUrl::Memory => url.to_connection_string(),
            DatabaseUrl::SQLite { .. } => format!("{}?mode=rwc", url.to_connection_string()),
        };

        let pool = options
            .connect(&connection_string)
            .await
            .map_err(|e| AppError::database(format!("Failed to open {url}: {e}")).with_source(e))?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Wrap an existing pool; call [`Self::migrate`] before use
    #[must_use]
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the ticket table and index
    ///
    /// # Errors
    ///
    /// Returns an error if the DDL fails
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS support_tickets (
                id TEXT PRIMARY KEY,
                user_thread_id TEXT NOT NULL,
                issue_summary TEXT NOT NULL,
                user_email TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create support_tickets: {e}")))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_support_tickets_thread ON support_tickets(user_thread_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create ticket index: {e}")))?;

        Ok(())
    }

    /// Tickets raised from one conversation, oldest first
    ///
    /// Inspection helper for operators and tests; the relay itself only writes.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails
    pub async fn tickets_for_thread(&self, thread_id: &str) -> AppResult<Vec<SupportTicket>> {
        sqlx::query_as::<_, SupportTicket>(
            r"
            SELECT id, user_thread_id, issue_summary, user_email, created_at
            FROM support_tickets
            WHERE user_thread_id = $1
            ORDER BY created_at ASC
            ",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list tickets: {e}")))
    }
}

#[async_trait]
impl TicketStore for SqliteTicketStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn create_ticket(&self, ticket: NewTicket) -> AppResult<SupportTicket> {
        let record = SupportTicket {
            id: Uuid::new_v4().to_string(),
            thread_id: ticket.thread_id,
            issue_summary: ticket.issue_summary,
            user_email: ticket.user_email,
            created_at: Utc::now(),
        };

        sqlx::query(
            r"
            INSERT INTO support_tickets (id, user_thread_id, issue_summary, user_email, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(&record.id)
        .bind(&record.thread_id)
        .bind(&record.issue_summary)
        .bind(&record.user_email)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create support ticket: {e}")))?;

        Ok(record)
    }
}

/// Create the directory holding a database file
fn ensure_parent_dir(path: &Path) -> AppResult<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|e| {
                AppError::database(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            }),
        _ => Ok(()),
    }
}
