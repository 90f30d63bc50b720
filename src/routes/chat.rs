// ABOUTME: Chat route handler relaying widget messages to the assistant
// ABOUTME: Validates the request body, runs one relay turn, and maps failures to the widget's error bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Chat route for the support widget
//!
//! `POST /api/chat` is the only endpoint the widget uses. Any other method on the path
//! answers `405` with the same JSON error shape.

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::constants::chat::{CHAT_PATH, MESSAGE_REQUIRED};
use crate::errors::AppError;
use crate::relay::{AssistantRelay, ChatTurn};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Body sent by the widget
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ChatRequest {
    /// User text
    #[serde(default)]
    pub message: Option<String>,
    /// Conversation to continue
    #[serde(default, rename = "threadId")]
    pub thread_id: Option<String>,
}

/// Successful reply
#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Assistant text
    pub reply: String,
    /// Conversation id the widget should keep
    #[serde(rename = "threadId")]
    pub thread_id: String,
}

// ============================================================================
// Routes
// ============================================================================

/// Chat routes
pub struct ChatRoutes;

impl ChatRoutes {
    /// Create the chat route
    #[must_use]
    pub fn routes(relay: Arc<AssistantRelay>) -> Router {
        Router::new()
            .route(
                CHAT_PATH,
                post(Self::send_message).fallback(Self::method_not_allowed),
            )
            .with_state(relay)
    }

    /// Relay one message and return the assistant's reply
    async fn send_message(
        State(relay): State<Arc<AssistantRelay>>,
        payload: Result<Json<ChatRequest>, JsonRejection>,
    ) -> Result<Json<ChatResponse>, AppError> {
        let Json(request) = payload.map_err(|rejection| {
            debug!("Rejected chat body: {rejection}");
            AppError::missing_field(MESSAGE_REQUIRED)
        })?;

        let reply = relay
            .handle(ChatTurn {
                message: request.message.unwrap_or_default(),
                thread_id: request.thread_id,
            })
            .await?;

        Ok(Json(ChatResponse {
            reply: reply.reply,
            thread_id: reply.thread_id,
        }))
    }

    async fn method_not_allowed() -> AppError {
        AppError::method_not_allowed()
    }
}
