//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate credential checks and guarded persistence calls.
//! - Keep callers decoupled from storage and audit details.

pub mod account_service;
