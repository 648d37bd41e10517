//! Domain model for administrative accounts.
//!
//! # Responsibility
//! - Define the account record, its partial update projection, and the
//!   input shape used to create or edit an account.
//!
//! # Invariants
//! - Every persisted account carries `AuditFields` stamped by the audit
//!   interceptor, never by callers.

pub mod account;
