//! Core domain logic for the sky admin backend.
//!
//! Owns request identity, token authentication, audit-field stamping, and
//! the account store. Every business invariant lives here; outer layers
//! only translate transport to these calls.

pub mod audit;
pub mod auth;
pub mod clock;
pub mod config;
pub mod context;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use audit::{
    AuditFields, AuditInterceptor, Auditable, ClassifierBuilder, ClassifierError,
    ContractViolation, Entity, EntryPoint, OperationClassifier, OperationTag,
};
pub use auth::{
    authenticate_request, extract_bearer, find_header, AuthError, CredentialHasher,
    IdentityClaims, IdentityToken, PasswordError, TokenAuthenticator,
};
pub use clock::{Clock, SystemClock, Timestamp};
pub use config::{AppConfig, AuthConfig, ConfigError};
pub use context::{ActorId, IdentityContext};
pub use db::{open_db, open_db_in_memory, DbError};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::account::{
    Account, AccountDraft, AccountId, AccountPatch, AccountStatus, AccountValidationError,
};
pub use repo::account_repo::{
    AccountStore, AuditedAccounts, RepoError, RepoResult, SqliteAccountStore, ACCOUNT_INSERT,
    ACCOUNT_UPDATE,
};
pub use service::account_service::{AccountService, LoginError, ServiceError};

/// Builds the process-wide entry point table.
///
/// Called once at startup; a duplicate declaration aborts startup instead of
/// silently picking one tag.
pub fn build_classifier() -> Result<OperationClassifier, ClassifierError> {
    repo::account_repo::register_account_operations(OperationClassifier::builder()).build()
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
