// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types for the API-client boundary and the fetch layer.

use crate::storage::StorageError;

/// Typed failure of a call against the TransFleet backend.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Login rejected: {0}")]
    InvalidCredentials(String),

    #[error("Rate limited by backend")]
    RateLimited,

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Returns true if this error means the bearer token can no longer be used.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }

    /// Human-readable message suitable for showing next to a form or a table.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Unauthorized => "Your session has expired. Please sign in again.".to_string(),
            ApiError::InvalidCredentials(msg) if msg.is_empty() => {
                "Invalid email or password".to_string()
            }
            ApiError::InvalidCredentials(msg) => msg.clone(),
            ApiError::RateLimited => {
                "Too many requests. Please wait a moment and try again.".to_string()
            }
            ApiError::Http { message, .. } if !message.is_empty() => message.clone(),
            ApiError::Http { status, .. } => format!("Request failed with status {}", status),
            ApiError::Network(_) => {
                "Unable to reach the server. Check your connection and try again.".to_string()
            }
            ApiError::Decode(_) => "The server returned an unexpected response".to_string(),
            ApiError::Api(msg) => msg.clone(),
            ApiError::Validation(msg) => msg.clone(),
            ApiError::Storage(_) | ApiError::Internal(_) => {
                "Something went wrong. Please try again.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Outcome of a manual refetch that did not update state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Request superseded by a newer one")]
    Superseded,

    #[error("Fetch handle is unmounted")]
    Unmounted,

    #[error("{0}")]
    Failed(String),
}

/// Result type alias for backend calls
pub type Result<T> = std::result::Result<T, ApiError>;
