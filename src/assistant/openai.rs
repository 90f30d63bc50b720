// ABOUTME: HTTP client for the OpenAI Assistants v2 thread/run API
// ABOUTME: Implements AssistantService with bearer auth, beta header, and upstream error mapping
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI` Assistants Client
//!
//! Talks to the Assistants v2 REST API (or any proxy exposing the same routes):
//!
//! - `POST /threads`
//! - `POST /threads/{thread_id}/messages`
//! - `GET  /threads/{thread_id}/messages`
//! - `POST /threads/{thread_id}/runs`
//! - `GET  /threads/{thread_id}/runs/{run_id}`
//! - `POST /threads/{thread_id}/runs/{run_id}/submit_tool_outputs`
//!
//! Thread ids arrive from the widget, so every path segment is percent-encoded
//! rather than spliced into the URL.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, instrument};
use url::Url;

use super::{
    AssistantService, ListMessagesQuery, NewMessage, Run, Thread, ThreadMessage, ToolOutput,
};
use crate::config::AssistantConfig;
use crate::constants::defaults;
use crate::errors::{AppError, AppResult, ErrorCode};

/// Header opting into the Assistants v2 API
pub const ASSISTANTS_BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Service name used in error messages
const SERVICE_NAME: &str = "AssistantService";

// ============================================================================
// API Request/Response Types
// ============================================================================

/// Body for run creation
#[derive(Debug, Serialize)]
struct CreateRunRequest<'a> {
    assistant_id: &'a str,
}

/// Body for tool output submission
#[derive(Debug, Serialize)]
struct SubmitToolOutputsRequest {
    tool_outputs: Vec<ToolOutput>,
}

/// Paginated list envelope
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    data: Vec<T>,
}

/// Error response structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiErrorDetail,
}

/// Error detail structure
#[derive(Debug, Deserialize)]
struct OpenAiErrorDetail {
    message: String,
    #[serde(rename = "type")]
    error_type: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Assistants v2 client
pub struct OpenAiAssistantClient {
    client: Client,
    base_url: Url,
    api_key: String,
    organization: Option<String>,
}

impl OpenAiAssistantClient {
    /// Create a client from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(config: &AssistantConfig) -> AppResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(defaults::CONNECT_TIMEOUT_SECS))
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            organization: config.organization.clone(),
        })
    }

    /// Build an endpoint URL from path segments
    fn endpoint(&self, segments: &[&str]) -> AppResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| AppError::config(format!("Invalid assistant base URL: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Add authorization, organisation, and beta headers
    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        let request = request
            .bearer_auth(&self.api_key)
            .header(ASSISTANTS_BETA_HEADER.0, ASSISTANTS_BETA_HEADER.1);
        match self.organization {
            Some(ref organization) => request.header("OpenAI-Organization", organization),
            None => request,
        }
    }

    /// Send a request and decode a successful JSON body
    async fn execute<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> AppResult<T> {
        let response = self.authorize(request).send().await.map_err(|e| {
            error!("Failed to send {operation} request: {e}");
            if e.is_connect() || e.is_timeout() {
                AppError::external_unavailable(
                    SERVICE_NAME,
                    format!("Cannot reach {}: {e}", self.base_url),
                )
            } else {
                AppError::external_service(SERVICE_NAME, format!("Failed to connect: {e}"))
            }
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            error!("Failed to read {operation} response: {e}");
            AppError::external_service(SERVICE_NAME, format!("Failed to read response: {e}"))
        })?;

        if !status.is_success() {
            return Err(Self::parse_error_response(status, &body));
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(
                "Failed to parse {operation} response: {e} - body: {}",
                body.chars().take(500).collect::<String>()
            );
            AppError::external_service(
                SERVICE_NAME,
                format!("Failed to parse {operation} response: {e}"),
            )
        })
    }

    /// Parse error response from API
    fn parse_error_response(status: StatusCode, body: &str) -> AppError {
        let detail = serde_json::from_str::<OpenAiErrorResponse>(body).map_or_else(
            |_| body.chars().take(200).collect::<String>(),
            |response| match response.error.error_type {
                Some(error_type) => format!("{error_type} - {}", response.error.message),
                None => response.error.message,
            },
        );

        let code = match status.as_u16() {
            401 | 403 => ErrorCode::ExternalAuthFailed,
            429 => ErrorCode::ExternalRateLimited,
            502..=504 => ErrorCode::ExternalServiceUnavailable,
            _ => ErrorCode::ExternalServiceError,
        };

        AppError::new(code, format!("{SERVICE_NAME} API error ({status}): {detail}"))
    }
}

#[async_trait]
impl AssistantService for OpenAiAssistantClient {
    #[instrument(skip(self))]
    async fn create_thread(&self) -> AppResult<Thread> {
        let url = self.endpoint(&["threads"])?;
        let thread: Thread = self
            .execute(
                "create thread",
                self.client.post(url).json(&serde_json::json!({})),
            )
            .await?;
        debug!(thread_id = %thread.id, "Created thread");
        Ok(thread)
    }

    #[instrument(skip(self, message), fields(role = message.role.as_str()))]
    async fn add_message(&self, thread_id: &str, message: NewMessage) -> AppResult<ThreadMessage> {
        let url = self.endpoint(&["threads", thread_id, "messages"])?;
        self.execute("add message", self.client.post(url).json(&message))
            .await
    }

    #[instrument(skip(self))]
    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> AppResult<Run> {
        let url = self.endpoint(&["threads", thread_id, "runs"])?;
        let run: Run = self
            .execute(
                "create run",
                self.client
                    .post(url)
                    .json(&CreateRunRequest { assistant_id }),
            )
            .await?;
        debug!(run_id = %run.id, status = %run.status, "Created run");
        Ok(run)
    }

    #[instrument(skip(self))]
    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> AppResult<Run> {
        let url = self.endpoint(&["threads", thread_id, "runs", run_id])?;
        self.execute("retrieve run", self.client.get(url)).await
    }

    #[instrument(skip(self, outputs), fields(output_count = outputs.len()))]
    async fn submit_tool_outputs(
        &self,
        thread_id: &str,
        run_id: &str,
        outputs: Vec<ToolOutput>,
    ) -> AppResult<Run> {
        let url = self.endpoint(&["threads", thread_id, "runs", run_id, "submit_tool_outputs"])?;
        self.execute(
            "submit tool outputs",
            self.client.post(url).json(&SubmitToolOutputsRequest {
                tool_outputs: outputs,
            }),
        )
        .await
    }

    #[instrument(skip(self))]
    async fn list_messages(
        &self,
        thread_id: &str,
        query: &ListMessagesQuery,
    ) -> AppResult<Vec<ThreadMessage>> {
        let url = self.endpoint(&["threads", thread_id, "messages"])?;
        let list: ListResponse<ThreadMessage> = self
            .execute("list messages", self.client.get(url).query(query))
            .await?;
        Ok(list.data)
    }
}
