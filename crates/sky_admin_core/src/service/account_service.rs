//! Account use-case service.
//!
//! # Responsibility
//! - Log in with username and password, yielding the actor id for token
//!   issuance.
//! - Create, edit, enable, and disable accounts through guarded entry
//!   points so audit fields are stamped from the caller's context.
//!
//! # Invariants
//! - The service never writes audit fields itself.
//! - Stored password hashes never leave the service unmasked.
//! - Passwords and usernames are never logged.

use crate::auth::password::{CredentialHasher, PasswordError, DEFAULT_PASSWORD};
use crate::context::{ActorId, IdentityContext};
use crate::model::account::{Account, AccountDraft, AccountId, AccountPatch, AccountStatus};
use crate::repo::account_repo::{AccountStore, AuditedAccounts, RepoError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Expected, caller-recoverable login failures.
#[derive(Debug)]
pub enum LoginError {
    NotFound,
    BadPassword,
    /// The account exists and the password matched, but it is disabled.
    Locked,
    Repo(RepoError),
}

impl Display for LoginError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "account not found"),
            Self::BadPassword => write!(f, "password does not match"),
            Self::Locked => write!(f, "account is locked"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LoginError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::NotFound | Self::BadPassword | Self::Locked => None,
        }
    }
}

impl From<RepoError> for LoginError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Account mutation failures.
#[derive(Debug)]
pub enum ServiceError {
    Repo(RepoError),
    Password(PasswordError),
}

impl ServiceError {
    /// Whether the failure is an audit contract defect rather than bad input.
    pub fn is_contract_violation(&self) -> bool {
        matches!(self, Self::Repo(RepoError::Contract(_)))
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Repo(err) => write!(f, "{err}"),
            Self::Password(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Password(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<PasswordError> for ServiceError {
    fn from(value: PasswordError) -> Self {
        Self::Password(value)
    }
}

/// Use-case service for administrative accounts.
pub struct AccountService<S: AccountStore> {
    accounts: AuditedAccounts<S>,
    hasher: CredentialHasher,
}

impl<S: AccountStore> AccountService<S> {
    /// Creates a service with the default Argon2 cost.
    pub fn new(accounts: AuditedAccounts<S>) -> Self {
        Self::with_hasher(accounts, CredentialHasher::default())
    }

    pub fn with_hasher(accounts: AuditedAccounts<S>, hasher: CredentialHasher) -> Self {
        Self { accounts, hasher }
    }

    /// Checks credentials and returns the actor id to issue a token for.
    ///
    /// # Contract
    /// - Check order: existence, password, then status.
    pub fn login(&self, username: &str, password: &str) -> Result<ActorId, LoginError> {
        let Some(account) = self.accounts.find_by_username(username.trim())? else {
            warn!("event=account_login module=service status=error error_code=not_found");
            return Err(LoginError::NotFound);
        };
        let actor = account.id.ok_or_else(|| {
            LoginError::Repo(RepoError::InvalidData(
                "persisted account without id".to_string(),
            ))
        })?;

        if !self.hasher.verify(password, &account.password_hash) {
            warn!(
                "event=account_login module=service status=error error_code=bad_password actor={}",
                actor
            );
            return Err(LoginError::BadPassword);
        }

        if !account.is_enabled() {
            warn!(
                "event=account_login module=service status=error error_code=locked actor={}",
                actor
            );
            return Err(LoginError::Locked);
        }

        info!("event=account_login module=service status=ok actor={}", actor);
        Ok(actor)
    }

    /// Creates an enabled account with the default initial password.
    ///
    /// Goes through the CREATE-tagged entry point.
    pub fn create_account(
        &self,
        draft: &AccountDraft,
        ctx: &IdentityContext,
    ) -> Result<AccountId, ServiceError> {
        let password_hash = self.hasher.hash(DEFAULT_PASSWORD)?;
        let mut account = Account::from_draft(draft, password_hash);

        let id = self
            .accounts
            .insert(&mut account, ctx)
            .map_err(|err| report("account_create", ctx, err))?;
        info!(
            "event=account_create module=service status=ok account_id={} request_id={}",
            id,
            ctx.request_id()
        );
        Ok(id)
    }

    /// Enables or disables an account.
    ///
    /// Sends a patch carrying only id and status through the UPDATE-tagged
    /// entry point.
    pub fn set_account_enabled(
        &self,
        id: AccountId,
        enabled: bool,
        ctx: &IdentityContext,
    ) -> Result<(), ServiceError> {
        let mut patch = AccountPatch::status(id, AccountStatus::from_enabled(enabled));
        self.accounts
            .update(&mut patch, ctx)
            .map_err(|err| report("account_set_status", ctx, err))?;
        info!(
            "event=account_set_status module=service status=ok account_id={} enabled={} request_id={}",
            id,
            enabled,
            ctx.request_id()
        );
        Ok(())
    }

    /// Replaces the editable profile columns of an account.
    pub fn update_account(
        &self,
        id: AccountId,
        draft: &AccountDraft,
        ctx: &IdentityContext,
    ) -> Result<(), ServiceError> {
        let mut patch = AccountPatch::profile(id, draft);
        self.accounts
            .update(&mut patch, ctx)
            .map_err(|err| report("account_update", ctx, err))?;
        info!(
            "event=account_update module=service status=ok account_id={} request_id={}",
            id,
            ctx.request_id()
        );
        Ok(())
    }

    /// Loads one account with its password hash masked.
    pub fn get_account(&self, id: AccountId) -> Result<Option<Account>, ServiceError> {
        Ok(self.accounts.get_by_id(id)?.map(Account::masked))
    }
}

fn report(event: &'static str, ctx: &IdentityContext, err: RepoError) -> RepoError {
    match &err {
        RepoError::Contract(_) | RepoError::Db(_) | RepoError::InvalidData(_) => error!(
            "event={} module=service status=error request_id={} error={}",
            event,
            ctx.request_id(),
            err
        ),
        RepoError::Validation(_) | RepoError::NotFound(_) | RepoError::Conflict(_) => warn!(
            "event={} module=service status=error request_id={} error={}",
            event,
            ctx.request_id(),
            err
        ),
    }
    err
}
