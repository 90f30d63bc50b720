// ABOUTME: Answers tool calls raised by assistant runs on behalf of the assistant
// ABOUTME: Files support tickets and turns every outcome, including failures, into a tool output
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

use crate::assistant::{ToolCall, ToolOutput};
use crate::constants::tools::CREATE_SUPPORT_TICKET;
use crate::errors::{AppError, AppResult};
use crate::logging::RelayLogger;
use crate::tickets::{NewTicket, TicketStore};

/// Arguments of `create_support_ticket`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreateTicketArgs {
    /// What the user needs help with
    pub issue_summary: String,
    /// Contact address, when given
    #[serde(default)]
    pub user_email: Option<String>,
}

impl CreateTicketArgs {
    /// Parse and validate the JSON argument string of a tool call
    ///
    /// # Errors
    ///
    /// Returns an error if the arguments are not valid JSON or the summary is blank
    pub fn parse(arguments: &str) -> AppResult<Self> {
        let args: Self = serde_json::from_str(arguments).map_err(|e| {
            AppError::invalid_input(format!("Invalid {CREATE_SUPPORT_TICKET} arguments: {e}"))
        })?;
        if args.issue_summary.trim().is_empty() {
            return Err(AppError::missing_field("issue_summary is required"));
        }
        Ok(Self {
            issue_summary: args.issue_summary,
            user_email: args.user_email.filter(|email| !email.trim().is_empty()),
        })
    }
}

/// JSON payload carried in [`ToolOutput::output`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolResultPayload {
    /// Whether the tool did its job
    pub success: bool,
    /// Id of the filed ticket
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    /// Failure description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResultPayload {
    fn ticket_created(ticket_id: String) -> Self {
        Self {
            success: true,
            ticket_id: Some(ticket_id),
            error: None,
        }
    }

    fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            ticket_id: None,
            error: Some(error.into()),
        }
    }

    fn into_output(self, tool_call_id: &str) -> ToolOutput {
        // Serializing a struct of strings and a bool cannot fail
        let output = serde_json::to_string(&self)
            .unwrap_or_else(|_| r#"{"success":false,"error":"serialization failed"}"#.to_owned());
        ToolOutput {
            tool_call_id: tool_call_id.to_owned(),
            output,
        }
    }
}

/// Executes the functions the assistant may call
#[derive(Clone)]
pub struct ToolDispatcher {
    tickets: Arc<dyn TicketStore>,
}

impl ToolDispatcher {
    /// Create a dispatcher writing tickets to `tickets`
    #[must_use]
    pub fn new(tickets: Arc<dyn TicketStore>) -> Self {
        Self { tickets }
    }

    /// Answer every pending call, in call order
    pub async fn answer_all(&self, thread_id: &str, calls: &[ToolCall]) -> Vec<ToolOutput> {
        let mut outputs = Vec::with_capacity(calls.len());
        for call in calls {
            outputs.push(self.answer(thread_id, call).await);
        }
        outputs
    }

    /// Answer one call; never fails
    pub async fn answer(&self, thread_id: &str, call: &ToolCall) -> ToolOutput {
        let start = Instant::now();
        let name = call.function.name.as_str();

        let payload = match name {
            CREATE_SUPPORT_TICKET => {
                self.create_support_ticket(thread_id, &call.function.arguments)
                    .await
            }
            other => ToolResultPayload::failed(format!("Unknown tool: {other}")),
        };

        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        RelayLogger::log_tool_call(thread_id, name, payload.success, duration_ms);
        payload.into_output(&call.id)
    }

    async fn create_support_ticket(&self, thread_id: &str, arguments: &str) -> ToolResultPayload {
        let args = match CreateTicketArgs::parse(arguments) {
            Ok(args) => args,
            Err(e) => return ToolResultPayload::failed(e.message),
        };

        let ticket = NewTicket {
            thread_id: thread_id.to_owned(),
            issue_summary: args.issue_summary,
            user_email: args.user_email,
        };

        match self.tickets.create_ticket(ticket).await {
            Ok(stored) => {
                info!(
                    ticket.id = %stored.id,
                    ticket.backend = self.tickets.backend_name(),
                    "Support ticket created"
                );
                ToolResultPayload::ticket_created(stored.id)
            }
            Err(e) => {
                error!(
                    ticket.backend = self.tickets.backend_name(),
                    "Failed to create support ticket: {e}"
                );
                ToolResultPayload::failed(e.message)
            }
        }
    }
}
