//! Audit-field auto-population for tagged persistence entry points.
//!
//! # Responsibility
//! - Declare which mutation entry points create or update records.
//! - Stamp created/updated time and actor on the target entity strictly
//!   before the underlying write runs.
//!
//! # Invariants
//! - Untagged entry points are never stamped and never fail.
//! - A tagged call with a target but no bound actor, or with a target that
//!   is not `Auditable`, aborts with `ContractViolation` before any write.
//!
//! # See also
//! - `crate::repo::account_repo::AuditedAccounts`

pub mod classifier;
pub mod fields;
pub mod interceptor;
pub mod violation;

pub use classifier::{
    ClassifierBuilder, ClassifierError, EntryPoint, OperationClassifier, OperationTag,
};
pub use fields::{AuditFields, Auditable, Entity};
pub use interceptor::AuditInterceptor;
pub use violation::ContractViolation;
