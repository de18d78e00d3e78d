//! STEM Tutor Engine Library
//!
//! This library provides the tutoring engine and the terminal host built on
//! it. It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret management module
pub mod secrets;

/// Knowledge store persistence module
pub mod db;

/// LLM provider abstraction layer
pub mod llm;

/// Reference retrieval over a similarity store
pub mod retrieval;

/// Tutoring core: classification, solutions, practice and levels
pub mod tutor;

/// Built-in practice problem collection
pub mod report;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
