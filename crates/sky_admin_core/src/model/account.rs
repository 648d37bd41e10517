//! Account domain model.
//!
//! # Responsibility
//! - Define the canonical account record and its status flag.
//! - Define `AccountPatch`, the partial projection sent to update writes.
//!
//! # Invariants
//! - `username` is unique, non-empty, and at most `MAX_USERNAME_CHARS` long.
//! - `password_hash` holds a PHC string, never a plain password.
//! - Audit fields are owned by the audit interceptor.

use crate::audit::{AuditFields, Auditable, Entity};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage identifier of an account.
pub type AccountId = i64;

pub const MAX_USERNAME_CHARS: usize = 32;

/// Placeholder returned instead of the stored hash on read APIs.
pub const MASKED_PASSWORD: &str = "****";

/// Whether an account may log in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountStatus {
    Disabled,
    Enabled,
}

impl AccountStatus {
    pub fn from_enabled(enabled: bool) -> Self {
        if enabled {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }

    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Enabled)
    }
}

/// Validation failures for account writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    EmptyUsername,
    UsernameTooLong { chars: usize },
}

impl Display for AccountValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "account name must not be empty"),
            Self::EmptyUsername => write!(f, "account username must not be empty"),
            Self::UsernameTooLong { chars } => write!(
                f,
                "account username has {chars} chars; at most {MAX_USERNAME_CHARS} allowed"
            ),
        }
    }
}

impl Error for AccountValidationError {}

/// Caller input for creating or editing an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDraft {
    pub name: String,
    pub username: String,
    pub phone: String,
    pub sex: String,
    pub id_number: String,
}

/// Canonical account record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// `None` until the record has been inserted.
    pub id: Option<AccountId>,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub phone: String,
    pub sex: String,
    pub id_number: String,
    pub status: AccountStatus,
    pub audit: AuditFields,
}

impl Account {
    /// Builds an unsaved, enabled account from `draft`.
    pub fn from_draft(draft: &AccountDraft, password_hash: impl Into<String>) -> Self {
        Self {
            id: None,
            name: draft.name.trim().to_string(),
            username: draft.username.trim().to_string(),
            password_hash: password_hash.into(),
            phone: draft.phone.clone(),
            sex: draft.sex.clone(),
            id_number: draft.id_number.clone(),
            status: AccountStatus::Enabled,
            audit: AuditFields::default(),
        }
    }

    pub fn validate(&self) -> Result<(), AccountValidationError> {
        validate_name(&self.name)?;
        validate_username(&self.username)
    }

    pub fn is_enabled(&self) -> bool {
        self.status.is_enabled()
    }

    /// Returns a copy safe to hand to callers outside the service layer.
    pub fn masked(mut self) -> Self {
        self.password_hash = MASKED_PASSWORD.to_string();
        self
    }
}

impl Auditable for Account {
    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Entity for Account {
    const NAME: &'static str = "account";

    fn as_auditable(&mut self) -> Option<&mut dyn Auditable> {
        Some(self)
    }
}

/// Partial account projection for update writes.
///
/// Only `Some` columns are written; `audit.updated_*` is stamped by the
/// interceptor and `audit.created_*` is never written by updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPatch {
    pub id: AccountId,
    pub name: Option<String>,
    pub username: Option<String>,
    pub phone: Option<String>,
    pub sex: Option<String>,
    pub id_number: Option<String>,
    pub status: Option<AccountStatus>,
    pub audit: AuditFields,
}

impl AccountPatch {
    /// Empty patch addressing `id`.
    pub fn new(id: AccountId) -> Self {
        Self {
            id,
            name: None,
            username: None,
            phone: None,
            sex: None,
            id_number: None,
            status: None,
            audit: AuditFields::default(),
        }
    }

    /// Patch carrying only the status flag.
    pub fn status(id: AccountId, status: AccountStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::new(id)
        }
    }

    /// Patch carrying every editable profile column from `draft`.
    pub fn profile(id: AccountId, draft: &AccountDraft) -> Self {
        Self {
            name: Some(draft.name.trim().to_string()),
            username: Some(draft.username.trim().to_string()),
            phone: Some(draft.phone.clone()),
            sex: Some(draft.sex.clone()),
            id_number: Some(draft.id_number.clone()),
            ..Self::new(id)
        }
    }

    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(username) = &self.username {
            validate_username(username)?;
        }
        Ok(())
    }
}

impl Auditable for AccountPatch {
    fn audit_mut(&mut self) -> &mut AuditFields {
        &mut self.audit
    }
}

impl Entity for AccountPatch {
    const NAME: &'static str = "account_patch";

    fn as_auditable(&mut self) -> Option<&mut dyn Auditable> {
        Some(self)
    }
}

fn validate_name(name: &str) -> Result<(), AccountValidationError> {
    if name.trim().is_empty() {
        return Err(AccountValidationError::EmptyName);
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<(), AccountValidationError> {
    if username.trim().is_empty() {
        return Err(AccountValidationError::EmptyUsername);
    }
    let chars = username.chars().count();
    if chars > MAX_USERNAME_CHARS {
        return Err(AccountValidationError::UsernameTooLong { chars });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        Account, AccountDraft, AccountPatch, AccountStatus, AccountValidationError,
        MASKED_PASSWORD,
    };

    fn draft() -> AccountDraft {
        AccountDraft {
            name: " Zhang San ".to_string(),
            username: "zhangsan".to_string(),
            phone: "13800000000".to_string(),
            sex: "1".to_string(),
            id_number: "110101199001011234".to_string(),
        }
    }

    #[test]
    fn from_draft_starts_enabled_and_unsaved() {
        let account = Account::from_draft(&draft(), "$argon2id$stub");
        assert_eq!(account.id, None);
        assert_eq!(account.name, "Zhang San");
        assert!(account.is_enabled());
        assert_eq!(account.audit.created_at, None);
        account.validate().expect("draft is valid");
    }

    #[test]
    fn validate_rejects_blank_and_long_usernames() {
        let mut account = Account::from_draft(&draft(), "hash");
        account.username = "  ".to_string();
        assert_eq!(account.validate(), Err(AccountValidationError::EmptyUsername));

        account.username = "x".repeat(33);
        assert_eq!(
            account.validate(),
            Err(AccountValidationError::UsernameTooLong { chars: 33 })
        );
    }

    #[test]
    fn status_patch_carries_only_status() {
        let patch = AccountPatch::status(9, AccountStatus::Disabled);
        assert_eq!(patch.id, 9);
        assert_eq!(patch.status, Some(AccountStatus::Disabled));
        assert!(patch.name.is_none());
        assert!(patch.username.is_none());
        patch.validate().expect("status patch is valid");
    }

    #[test]
    fn profile_patch_validates_supplied_columns() {
        let mut bad = draft();
        bad.name = String::new();
        assert_eq!(
            AccountPatch::profile(1, &bad).validate(),
            Err(AccountValidationError::EmptyName)
        );
    }

    #[test]
    fn masked_hides_password_hash() {
        let account = Account::from_draft(&draft(), "$argon2id$secret").masked();
        assert_eq!(account.password_hash, MASKED_PASSWORD);
    }
}
