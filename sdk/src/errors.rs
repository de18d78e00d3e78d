//! Error types and handling
//!
//! This module provides the error types shared by the tutor engine and its
//! hosts. Errors implement the `TutorErrorExt` trait which provides a
//! user-friendly hint and indicates whether the action can simply be retried.
//!
//! Hints never contain API keys, prompts or model output, so they are safe
//! to show in any display surface.

use thiserror::Error;

/// Trait for tutor error extensions
///
/// Gives hosts a short message to show the student and tells them whether
/// retrying the same action may succeed.
pub trait TutorErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried as-is. Non-recoverable errors need
    /// a configuration change or a different input first.
    fn is_recoverable(&self) -> bool;
}

/// Infrastructure error type
///
/// Covers failures outside the tutoring logic itself: configuration,
/// the knowledge store, secret storage and the file system.
///
/// # Examples
///
/// ```
/// use tutor_sdk::errors::{EngineError, TutorErrorExt};
///
/// let error = EngineError::MissingApiKey("groq".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(!error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path canonicalization failed for {0:?}: {1}")]
    PathCanonicalization(std::path::PathBuf, String),

    // Knowledge store errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("No API key found for provider '{0}'")]
    MissingApiKey(String),

    // Keyring errors
    #[error("Keyring error: {0}")]
    KeyringError(String),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TutorErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::PathCanonicalization(_, _) => "Invalid path specified",
            Self::Database(_) => "Knowledge store unavailable. Check the store path",
            Self::MissingApiKey(_) => {
                "Set the provider's API key environment variable or run 'tutor secret set'"
            }
            Self::KeyringError(_) => "Failed to access secure storage. Check system keychain",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) | Self::PathCanonicalization(_, _) | Self::MissingApiKey(_) => false,
            _ => true,
        }
    }
}
