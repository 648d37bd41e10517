//! Persistence boundary for auditable records.
//!
//! # Responsibility
//! - Define storage contracts and their SQLite implementations.
//! - Expose guarded mutation entry points that apply the audit policy.
//!
//! # Invariants
//! - Service code reaches mutations only through guarded entry points.
//! - Repository APIs return semantic errors (`NotFound`, `Conflict`) in
//!   addition to DB transport errors.

pub mod account_repo;
