// ABOUTME: Assistant relay driving one widget turn through the thread/run lifecycle
// ABOUTME: Creates or reuses the thread, polls the run, answers tool calls, and extracts the reply
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Assistant Relay
//!
//! One call to [`AssistantRelay::handle`] performs a full turn:
//!
//! 1. create a thread unless the caller supplied one
//! 2. append the user message
//! 3. start a run and poll it until it completes, fails, or exhausts the poll budget
//! 4. answer `requires_action` states with one batched tool output submission
//! 5. read the newest assistant text produced by the run
//!
//! The relay holds no per-conversation state; the thread id is the only handle the
//! widget keeps between turns.

pub mod tools;

pub use tools::{CreateTicketArgs, ToolDispatcher, ToolResultPayload};

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument, warn};

use crate::assistant::{
    AssistantService, ListMessagesQuery, MessageRole, NewMessage, Run, RunStatus,
};
use crate::config::PollingConfig;
use crate::constants::chat::{FALLBACK_REPLY, MESSAGE_REQUIRED};
use crate::errors::{AppError, AppResult};
use crate::logging::RelayLogger;
use crate::tickets::TicketStore;

/// Per-deployment relay settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Assistant started on every run
    pub assistant_id: String,
    /// Poll interval and budget
    pub polling: PollingConfig,
}

/// One widget turn
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatTurn {
    /// User text
    pub message: String,
    /// Conversation to continue, if any
    pub thread_id: Option<String>,
}

/// Result of a turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    /// Assistant text, or the fallback reply
    pub reply: String,
    /// Conversation the reply belongs to
    pub thread_id: String,
}

/// Drives assistant runs for the chat endpoint
pub struct AssistantRelay {
    assistant: Arc<dyn AssistantService>,
    tools: ToolDispatcher,
    settings: RelaySettings,
}

impl AssistantRelay {
    /// Create a relay over an assistant service and a ticket store
    #[must_use]
    pub fn new(
        assistant: Arc<dyn AssistantService>,
        tickets: Arc<dyn TicketStore>,
        settings: RelaySettings,
    ) -> Self {
        Self {
            assistant,
            tools: ToolDispatcher::new(tickets),
            settings,
        }
    }

    /// Run one turn to completion
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank message (before any upstream call),
    /// `RunFailed` for a terminal run failure, `RunTimedOut` when the poll budget is
    /// spent, and upstream errors from the assistant service unchanged
    #[instrument(skip(self, turn), fields(new_thread = turn.thread_id.is_none()))]
    pub async fn handle(&self, turn: ChatTurn) -> AppResult<ChatReply> {
        if turn.message.trim().is_empty() {
            return Err(AppError::missing_field(MESSAGE_REQUIRED));
        }

        let start = Instant::now();
        let existing = turn.thread_id.filter(|id| !id.trim().is_empty());
        let new_thread = existing.is_none();

        let thread_id = match existing {
            Some(id) => id,
            None => {
                let thread = self.assistant.create_thread().await?;
                debug!(thread_id = %thread.id, "Created thread");
                thread.id
            }
        };

        let result = self.run_turn(&thread_id, turn.message).await;
        let duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        RelayLogger::log_chat_turn(&thread_id, new_thread, result.is_ok(), duration_ms);

        Ok(ChatReply {
            reply: result?,
            thread_id,
        })
    }

    async fn run_turn(&self, thread_id: &str, message: String) -> AppResult<String> {
        self.assistant
            .add_message(thread_id, NewMessage::user(message))
            .await?;

        let run = self
            .assistant
            .create_run(thread_id, &self.settings.assistant_id)
            .await?;
        debug!(run_id = %run.id, status = %run.status, "Created run");

        let run = self.await_completion(thread_id, &run.id).await?;
        self.latest_reply(thread_id, &run.id).await
    }

    /// Poll a run until it completes, answering tool calls along the way
    async fn await_completion(&self, thread_id: &str, run_id: &str) -> AppResult<Run> {
        let mut poller = Poller::new(self.settings.polling);
        let mut run = poller.check(self.assistant.as_ref(), thread_id, run_id).await?;

        loop {
            debug!(run_id, status = %run.status, attempt = poller.attempts, "Run status");
            match run.status {
                RunStatus::Completed => return Ok(run),
                status if status.is_failure() => {
                    let detail = run.last_error.as_ref().map(|e| e.message.as_str());
                    warn!(run_id, %status, detail, "Run ended without completing");
                    return Err(AppError::run_failed(status, detail.filter(|d| !d.is_empty())));
                }
                RunStatus::RequiresAction if !run.pending_tool_calls().is_empty() => {
                    let outputs = self
                        .tools
                        .answer_all(thread_id, run.pending_tool_calls())
                        .await;
                    self.assistant
                        .submit_tool_outputs(thread_id, run_id, outputs)
                        .await?;
                    run = poller.check(self.assistant.as_ref(), thread_id, run_id).await?;
                }
                _ => {
                    tokio::time::sleep(self.settings.polling.interval).await;
                    run = poller.check(self.assistant.as_ref(), thread_id, run_id).await?;
                }
            }
        }
    }

    /// Newest assistant text produced by the run
    async fn latest_reply(&self, thread_id: &str, run_id: &str) -> AppResult<String> {
        let messages = self
            .assistant
            .list_messages(thread_id, &ListMessagesQuery::latest(Some(run_id.to_owned())))
            .await?;

        let reply = messages
            .iter()
            .filter(|message| message.role == MessageRole::Assistant)
            .find_map(|message| message.first_text())
            .map_or_else(
                || {
                    warn!(thread_id, run_id, "Completed run produced no assistant text");
                    FALLBACK_REPLY.to_owned()
                },
                str::to_owned,
            );
        Ok(reply)
    }
}

/// Counts status checks against the poll budget
struct Poller {
    attempts: u32,
    max_attempts: u32,
}

impl Poller {
    const fn new(polling: PollingConfig) -> Self {
        Self {
            attempts: 0,
            max_attempts: polling.max_attempts,
        }
    }

    async fn check(
        &mut self,
        assistant: &dyn AssistantService,
        thread_id: &str,
        run_id: &str,
    ) -> AppResult<Run> {
        if self.attempts >= self.max_attempts {
            warn!(run_id, attempts = self.attempts, "Run poll budget exhausted");
            return Err(AppError::run_timed_out(run_id, self.attempts));
        }
        self.attempts += 1;
        assistant.retrieve_run(thread_id, run_id).await
    }
}
