// ABOUTME: Route module organization for the support relay HTTP endpoints
// ABOUTME: Groups the widget chat endpoint and the health checks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Route module for the support relay

/// Widget chat endpoint
pub mod chat;
/// Health check and readiness routes
pub mod health;

/// Chat route handlers
pub use chat::{ChatRequest, ChatResponse, ChatRoutes};
/// Health check route handlers
pub use health::HealthRoutes;
