// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides a scripted assistant service, a recording ticket store, and relay builders
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::too_many_lines,
    clippy::unwrap_used
)]
//! Shared test utilities for `support_relay`
//!
//! [`ScriptedAssistant`] plays back a list of run states and records every upstream
//! call, so tests can assert both the relay's answer and what it asked the service.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;
use support_relay::{
    assistant::{
        AssistantService, ListMessagesQuery, MessageContent, MessageRole, NewMessage,
        RequiredAction, Run, RunError, RunStatus, SortOrder, SubmitToolOutputsAction, Thread,
        ThreadMessage, ToolCall, ToolOutput,
    },
    config::PollingConfig,
    errors::{AppError, AppResult},
    relay::{AssistantRelay, RelaySettings},
    tickets::{NewTicket, SupportTicket, TicketStore},
};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        // Check for TEST_LOG environment variable to control test logging level
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            Ok("WARN" | "ERROR") | _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

pub const TEST_ASSISTANT_ID: &str = "asst_test";

// ============================================================================
// Scripted assistant service
// ============================================================================

/// One scripted answer to `retrieve_run`
#[derive(Debug, Clone)]
pub enum Step {
    /// Report a plain status
    Status(RunStatus),
    /// Report `requires_action` with these calls
    ToolCalls(Vec<ToolCall>),
    /// Report `failed` with an optional `last_error` message
    Failed(Option<String>),
}

/// What the assistant writes into the thread when a run completes
#[derive(Debug, Clone)]
pub enum Reply {
    /// This exact text
    Fixed(String),
    /// "seen N user messages", counted over the whole thread
    CountUserMessages,
    /// Only a non-text block
    NoText,
}

/// Upstream call as observed by the stub
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamCall {
    CreateThread,
    AddMessage { thread_id: String, content: String },
    CreateRun { thread_id: String, assistant_id: String },
    RetrieveRun { thread_id: String, run_id: String },
    SubmitToolOutputs { thread_id: String, run_id: String },
    ListMessages { thread_id: String },
}

#[derive(Default)]
struct ScriptState {
    next_id: u32,
    steps: VecDeque<Step>,
    calls: Vec<UpstreamCall>,
    submissions: Vec<Vec<ToolOutput>>,
    threads: HashMap<String, Vec<ThreadMessage>>,
}

impl ScriptState {
    fn next_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}_{}", self.next_id)
    }
}

/// In-memory assistant service replaying scripted run states
pub struct ScriptedAssistant {
    state: Mutex<ScriptState>,
    reply: Reply,
    fail_create_run: bool,
}

impl ScriptedAssistant {
    /// Completes every run on the first status check with `reply`
    pub fn completing_with(reply: &str) -> Self {
        Self::new(Reply::Fixed(reply.to_owned()), Vec::new())
    }

    /// Replays `steps`, then completes with `reply`
    pub fn new(reply: Reply, steps: Vec<Step>) -> Self {
        Self {
            state: Mutex::new(ScriptState {
                steps: steps.into(),
                ..ScriptState::default()
            }),
            reply,
            fail_create_run: false,
        }
    }

    /// Every `create_run` fails as an upstream outage
    pub fn failing_run_creation() -> Self {
        Self {
            fail_create_run: true,
            ..Self::completing_with("unused")
        }
    }

    /// Register a thread that already exists upstream
    pub fn with_existing_thread(self, thread_id: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .threads
            .insert(thread_id.to_owned(), Vec::new());
        self
    }

    pub fn calls(&self) -> Vec<UpstreamCall> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn submissions(&self) -> Vec<Vec<ToolOutput>> {
        self.state.lock().unwrap().submissions.clone()
    }

    pub fn messages(&self, thread_id: &str) -> Vec<ThreadMessage> {
        self.state
            .lock()
            .unwrap()
            .threads
            .get(thread_id)
            .cloned()
            .unwrap_or_default()
    }

    pub fn retrieve_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, UpstreamCall::RetrieveRun { .. }))
            .count()
    }

    fn reply_text(&self, history: &[ThreadMessage]) -> Option<String> {
        match &self.reply {
            Reply::Fixed(text) => Some(text.clone()),
            Reply::CountUserMessages => {
                let seen = history
                    .iter()
                    .filter(|message| message.role == MessageRole::User)
                    .count();
                Some(format!("seen {seen} user messages"))
            }
            Reply::NoText => None,
        }
    }
}

fn run(thread_id: &str, run_id: &str, status: RunStatus) -> Run {
    Run {
        id: run_id.to_owned(),
        thread_id: thread_id.to_owned(),
        status,
        required_action: None,
        last_error: None,
    }
}

fn not_found(what: &str, id: &str) -> AppError {
    AppError::external_service("AssistantService", format!("No {what} found with id '{id}'"))
}

#[async_trait]
impl AssistantService for ScriptedAssistant {
    async fn create_thread(&self) -> AppResult<Thread> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UpstreamCall::CreateThread);
        let id = state.next_id("thread");
        state.threads.insert(id.clone(), Vec::new());
        Ok(Thread {
            id,
            created_at: Utc::now().timestamp(),
        })
    }

    async fn add_message(&self, thread_id: &str, message: NewMessage) -> AppResult<ThreadMessage> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UpstreamCall::AddMessage {
            thread_id: thread_id.to_owned(),
            content: message.content.clone(),
        });
        let id = state.next_id("msg");
        let stored = ThreadMessage {
            id,
            thread_id: thread_id.to_owned(),
            role: message.role,
            content: vec![MessageContent::text(message.content)],
            run_id: None,
            created_at: Utc::now().timestamp(),
        };
        state
            .threads
            .get_mut(thread_id)
            .ok_or_else(|| not_found("thread", thread_id))?
            .push(stored.clone());
        Ok(stored)
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> AppResult<Run> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UpstreamCall::CreateRun {
            thread_id: thread_id.to_owned(),
            assistant_id: assistant_id.to_owned(),
        });
        if self.fail_create_run {
            return Err(AppError::external_unavailable(
                "AssistantService",
                "connection refused",
            ));
        }
        let run_id = state.next_id("run");
        Ok(run(thread_id, &run_id, RunStatus::Queued))
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> AppResult<Run> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UpstreamCall::RetrieveRun {
            thread_id: thread_id.to_owned(),
            run_id: run_id.to_owned(),
        });

        let step = state.steps.pop_front().unwrap_or(Step::Status(RunStatus::Completed));
        let mut current = run(thread_id, run_id, RunStatus::Queued);
        match step {
            Step::Status(status) => current.status = status,
            Step::ToolCalls(tool_calls) => {
                current.status = RunStatus::RequiresAction;
                current.required_action = Some(RequiredAction {
                    kind: "submit_tool_outputs".to_owned(),
                    submit_tool_outputs: SubmitToolOutputsAction { tool_calls },
                });
            }
            Step::Failed(message) => {
                current.status = RunStatus::Failed;
                current.last_error = message.map(|message| RunError {
                    code: "server_error".to_owned(),
                    message,
                });
            }
        }

        if current.status == RunStatus::Completed {
            let history = state.threads.get(thread_id).cloned().unwrap_or_default();
            let content = self
                .reply_text(&history)
                .map_or(MessageContent::Unsupported, MessageContent::text);
            let id = state.next_id("msg");
            state
                .threads
                .get_mut(thread_id)
                .ok_or_else(|| not_found("thread", thread_id))?
                .push(ThreadMessage {
                    id,
                    thread_id: thread_id.to_owned(),
                    role: MessageRole::Assistant,
                    content: vec![content],
                    run_id: Some(run_id.to_owned()),
                    created_at: Utc::now().timestamp(),
                });
        }
        Ok(current)
    }

    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> AppResult<Run> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UpstreamCall::SubmitToolOutputs {
            thread_id: thread_id.to_owned(),
            run_id: run_id.to_owned(),
        });
        state.submissions.push(outputs);
        Ok(run(thread_id, run_id, RunStatus::Queued))
    }

    async fn list_messages(
        &self,
        thread_id: &str,
        query: &ListMessagesQuery,
    ) -> AppResult<Vec<ThreadMessage>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(UpstreamCall::ListMessages {
            thread_id: thread_id.to_owned(),
        });
        let mut messages: Vec<ThreadMessage> = state
            .threads
            .get(thread_id)
            .ok_or_else(|| not_found("thread", thread_id))?
            .iter()
            .filter(|message| query.run_id.is_none() || message.run_id == query.run_id)
            .cloned()
            .collect();
        if query.order == SortOrder::Desc {
            messages.reverse();
        }
        messages.truncate(query.limit as usize);
        Ok(messages)
    }
}

// ============================================================================
// Ticket store
// ============================================================================

/// Ticket store keeping tickets in memory, optionally failing every insert
#[derive(Default)]
pub struct RecordingTicketStore {
    tickets: Mutex<Vec<NewTicket>>,
    fail: bool,
}

impl RecordingTicketStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn tickets(&self) -> Vec<NewTicket> {
        self.tickets.lock().unwrap().clone()
    }
}

#[async_trait]
impl TicketStore for RecordingTicketStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create_ticket(&self, ticket: NewTicket) -> AppResult<SupportTicket> {
        if self.fail {
            return Err(AppError::database("Failed to create support ticket: disk I/O error"));
        }
        let mut tickets = self.tickets.lock().unwrap();
        tickets.push(ticket.clone());
        Ok(SupportTicket {
            id: format!("ticket-{}", tickets.len()),
            thread_id: ticket.thread_id,
            issue_summary: ticket.issue_summary,
            user_email: ticket.user_email,
            created_at: Utc::now(),
        })
    }
}

// ============================================================================
// Relay builders
// ============================================================================

/// Polling fast enough for tests, with a small budget
pub fn fast_polling(max_attempts: u32) -> PollingConfig {
    PollingConfig {
        interval: Duration::from_millis(1),
        max_attempts,
    }
}

pub fn create_test_relay(
    assistant: Arc<ScriptedAssistant>,
    tickets: Arc<RecordingTicketStore>,
    polling: PollingConfig,
) -> Arc<AssistantRelay> {
    init_test_logging();
    Arc::new(AssistantRelay::new(
        assistant,
        tickets,
        RelaySettings {
            assistant_id: TEST_ASSISTANT_ID.to_owned(),
            polling,
        },
    ))
}

pub fn ticket_call(id: &str, issue_summary: &str, user_email: Option<&str>) -> ToolCall {
    let arguments = serde_json::json!({
        "issue_summary": issue_summary,
        "user_email": user_email,
    });
    ToolCall::function(id, "create_support_ticket", arguments.to_string())
}
