/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check and the `/api` marker route
/// - `auth`: Account endpoints (register, login, logout, Google sign-in, current user)
/// - `tasks`: Task CRUD, board, statistics and reminders
/// - `notifications`: Test email and manual reminder run

pub mod auth;
pub mod health;
pub mod notifications;
pub mod tasks;

use serde::Serialize;

/// Success envelope shared by the resource routes
///
/// ```json
/// { "success": true, "message": "...", "data": { ... } }
/// ```
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: None,
        }
    }
}
