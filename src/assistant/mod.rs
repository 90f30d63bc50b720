// ABOUTME: Assistant service abstraction for thread/run based conversational APIs
// ABOUTME: Defines threads, messages, runs, tool calls, and the async service contract
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Assistant Service Interface
//!
//! The relay talks to a hosted assistant through a small thread/run API:
//!
//! - **Thread**: a conversation owned by the service, referenced by an opaque id
//! - **Message**: a user or assistant turn inside a thread
//! - **Run**: one assistant invocation against a thread, observed by polling
//! - **Tool call**: a function the run asks the caller to execute
//!
//! [`AssistantService`] is the seam between the relay loop and the HTTP client, so the
//! loop can be exercised against scripted services in tests.

mod openai;

pub use openai::{OpenAiAssistantClient, ASSISTANTS_BETA_HEADER};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::errors::AppResult;

// ============================================================================
// Threads and Messages
// ============================================================================

/// A conversation held by the assistant service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Opaque thread identifier
    pub id: String,
    /// Unix timestamp of creation
    #[serde(default)]
    pub created_at: i64,
}

/// Role of a message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// End user
    User,
    /// The assistant
    Assistant,
}

impl MessageRole {
    /// Convert to string representation for API calls
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// Message to append to a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewMessage {
    /// Author role
    pub role: MessageRole,
    /// Plain text content
    pub content: String,
}

impl NewMessage {
    /// Create a user message
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Text payload of a content block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageText {
    /// The text itself
    pub value: String,
}

/// One content block of a thread message
///
/// Only text blocks matter to the relay; images and other block kinds are kept as
/// [`MessageContent::Unsupported`] so that new block types do not break parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    /// Text block
    Text {
        /// Text payload
        text: MessageText,
    },
    /// Any other block kind
    #[serde(other)]
    Unsupported,
}

impl MessageContent {
    /// Create a text block
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text {
            text: MessageText {
                value: value.into(),
            },
        }
    }

    /// Text of this block, if it is a text block
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(&text.value),
            Self::Unsupported => None,
        }
    }
}

/// A message stored in a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadMessage {
    /// Message identifier
    pub id: String,
    /// Thread the message belongs to
    pub thread_id: String,
    /// Author role
    pub role: MessageRole,
    /// Content blocks in order
    #[serde(default)]
    pub content: Vec<MessageContent>,
    /// Run that produced the message (assistant messages only)
    #[serde(default)]
    pub run_id: Option<String>,
    /// Unix timestamp of creation
    #[serde(default)]
    pub created_at: i64,
}

impl ThreadMessage {
    /// First text block of the message
    #[must_use]
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(MessageContent::as_text)
    }
}

/// Sort order for message listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    /// Oldest first
    Asc,
    /// Newest first
    #[default]
    Desc,
}

/// Query for listing thread messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListMessagesQuery {
    /// Sort order by creation time
    pub order: SortOrder,
    /// Maximum number of messages to return
    pub limit: u32,
    /// Only messages produced by this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl ListMessagesQuery {
    /// The newest message, optionally restricted to one run
    #[must_use]
    pub fn latest(run_id: Option<String>) -> Self {
        Self {
            order: SortOrder::Desc,
            limit: 1,
            run_id,
        }
    }
}

// ============================================================================
// Runs and Tool Calls
// ============================================================================

/// Lifecycle status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting to start
    Queued,
    /// Executing
    InProgress,
    /// Waiting for tool outputs
    RequiresAction,
    /// Cancellation requested
    Cancelling,
    /// Cancelled
    Cancelled,
    /// Failed
    Failed,
    /// Finished successfully
    Completed,
    /// Ended early (token limits and similar)
    Incomplete,
    /// Expired waiting for tool outputs
    Expired,
    /// Status this client does not know about
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    /// Whether the run ended without producing a usable reply
    #[must_use]
    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::Failed | Self::Cancelled | Self::Expired | Self::Incomplete
        )
    }

    /// Wire name of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::RequiresAction => "requires_action",
            Self::Cancelling => "cancelling",
            Self::Cancelled => "cancelled",
            Self::Failed => "failed",
            Self::Completed => "completed",
            Self::Incomplete => "incomplete",
            Self::Expired => "expired",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Function invocation requested by a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    pub name: String,
    /// JSON-encoded arguments
    #[serde(default)]
    pub arguments: String,
}

/// A pending tool call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier echoed back in the tool output
    pub id: String,
    /// Tool type (always `function` today)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Function details
    pub function: FunctionCall,
}

impl ToolCall {
    /// Create a function tool call
    #[must_use]
    pub fn function(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            kind: "function".to_owned(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.into(),
            },
        }
    }
}

/// Tool calls awaiting outputs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitToolOutputsAction {
    /// Every call that must be answered in the next submission
    #[serde(default)]
    pub tool_calls: Vec<ToolCall>,
}

/// Action a run is waiting on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredAction {
    /// Action type (`submit_tool_outputs`)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Pending tool calls
    #[serde(default)]
    pub submit_tool_outputs: SubmitToolOutputsAction,
}

/// Error reported by a failed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunError {
    /// Machine-readable code
    #[serde(default)]
    pub code: String,
    /// Description
    #[serde(default)]
    pub message: String,
}

/// One assistant invocation against a thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    /// Run identifier
    pub id: String,
    /// Thread the run executes against
    pub thread_id: String,
    /// Current status
    pub status: RunStatus,
    /// Pending action when `status` is `requires_action`
    #[serde(default)]
    pub required_action: Option<RequiredAction>,
    /// Failure details when `status` is `failed`
    #[serde(default)]
    pub last_error: Option<RunError>,
}

impl Run {
    /// Tool calls the run is waiting on (empty when none)
    #[must_use]
    pub fn pending_tool_calls(&self) -> &[ToolCall] {
        self.required_action
            .as_ref()
            .map(|action| action.submit_tool_outputs.tool_calls.as_slice())
            .unwrap_or_default()
    }
}

/// Result of one tool call, submitted back to the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// Call being answered
    pub tool_call_id: String,
    /// JSON-encoded result
    pub output: String,
}

// ============================================================================
// Service Trait
// ============================================================================

/// Thread/run assistant service
///
/// Every method maps to one call on the hosted service. Implementations must not
/// retry; the relay surfaces upstream failures to the widget, which resubmits.
#[async_trait]
pub trait AssistantService: Send + Sync {
    /// Create an empty thread
    async fn create_thread(&self) -> AppResult<Thread>;

    /// Append a message to a thread
    async fn add_message(&self, thread_id: &str, message: NewMessage) -> AppResult<ThreadMessage>;

    /// Start a run of `assistant_id` against a thread
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> AppResult<Run>;

    /// Fetch the current state of a run
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> AppResult<Run>;

    /// Answer every pending tool call of a run in one batch
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> AppResult<Run>;

    /// List messages of a thread
    async fn list_messages(
        &self,
        thread_id: &str,
        query: &ListMessagesQuery,
    ) -> AppResult<Vec<ThreadMessage>>;
}
