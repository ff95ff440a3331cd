// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use transfleet_dashboard::error::{ApiError, FetchError};
use transfleet_dashboard::storage::StorageError;

#[test]
fn test_is_auth_error_matches() {
    assert!(ApiError::Unauthorized.is_auth_error());
}

#[test]
fn test_is_auth_error_no_match() {
    let err = ApiError::InvalidCredentials("Invalid credentials".to_string());
    assert!(!err.is_auth_error());

    assert!(!ApiError::RateLimited.is_auth_error());

    let err = ApiError::Http {
        status: 403,
        message: "Forbidden".to_string(),
    };
    assert!(!err.is_auth_error());

    let err = ApiError::Api("Session expired".to_string());
    assert!(!err.is_auth_error());
}

#[test]
fn test_user_message_prefers_backend_text() {
    let err = ApiError::InvalidCredentials("Account locked".to_string());
    assert_eq!(err.user_message(), "Account locked");

    let err = ApiError::Http {
        status: 500,
        message: "Order service unavailable".to_string(),
    };
    assert_eq!(err.user_message(), "Order service unavailable");

    let err = ApiError::Api("Hospital not found".to_string());
    assert_eq!(err.user_message(), "Hospital not found");
}

#[test]
fn test_user_message_fallbacks() {
    let err = ApiError::InvalidCredentials(String::new());
    assert_eq!(err.user_message(), "Invalid email or password");

    let err = ApiError::Http {
        status: 502,
        message: String::new(),
    };
    assert_eq!(err.user_message(), "Request failed with status 502");

    // Transport details stay in the logs
    let err = ApiError::Network("tcp connect error: Connection refused (os error 111)".to_string());
    assert!(!err.user_message().contains("os error"));

    let err = ApiError::Storage(StorageError::Corrupt {
        path: "/tmp/storage.json".into(),
        message: "expected value at line 1".to_string(),
    });
    assert!(!err.user_message().contains("storage.json"));
}

#[test]
fn test_fetch_error_display() {
    assert_eq!(
        FetchError::Failed("Order service unavailable".to_string()).to_string(),
        "Order service unavailable"
    );
    assert_eq!(
        FetchError::NotAuthenticated.to_string(),
        "Not authenticated"
    );
}
