//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Keep callers (HTTP layers, CLI) decoupled from storage details.

pub mod entry_store;
pub mod error;
