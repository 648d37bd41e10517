//! Account persistence boundary.
//!
//! # Responsibility
//! - `AccountStore`: raw account reads and writes; no audit policy.
//! - `AuditedAccounts`: the guarded entry points every mutation goes through.
//! - Declare the account entry points and their CREATE/UPDATE tags.
//!
//! # Invariants
//! - Guarded mutations take the target record as their first argument.
//! - Write paths validate the record before any SQL runs.
//! - Read paths reject invalid persisted state instead of masking it.
//! - A stamped update never moves `update_time` backwards: the stored value
//!   becomes `max(stamp, previous + 1)`, whichever process wrote previously.

use crate::audit::{
    AuditFields, AuditInterceptor, ClassifierBuilder, ContractViolation, EntryPoint, OperationTag,
};
use crate::context::IdentityContext;
use crate::db::DbError;
use crate::model::account::{
    Account, AccountId, AccountPatch, AccountStatus, AccountValidationError,
};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

/// Insert of a new account record.
pub const ACCOUNT_INSERT: EntryPoint = EntryPoint::new("account.insert");
/// Partial update of an existing account record.
pub const ACCOUNT_UPDATE: EntryPoint = EntryPoint::new("account.update");

const ACCOUNT_SELECT_SQL: &str = "SELECT
    id,
    name,
    username,
    password_hash,
    phone,
    sex,
    id_number,
    status,
    create_time,
    update_time,
    create_user,
    update_user
FROM accounts";

/// Declares the account entry points on a classifier under construction.
pub fn register_account_operations(builder: ClassifierBuilder) -> ClassifierBuilder {
    builder
        .tag(ACCOUNT_INSERT, OperationTag::Create)
        .tag(ACCOUNT_UPDATE, OperationTag::Update)
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Account persistence and guard errors.
#[derive(Debug)]
pub enum RepoError {
    Validation(AccountValidationError),
    Db(DbError),
    NotFound(AccountId),
    /// A unique column (username) is already taken.
    Conflict(String),
    InvalidData(String),
    /// The audit guard refused the call; nothing was written.
    Contract(ContractViolation),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "account not found: {id}"),
            Self::Conflict(message) => write!(f, "account conflict: {message}"),
            Self::InvalidData(message) => write!(f, "invalid persisted account data: {message}"),
            Self::Contract(err) => write!(f, "audit contract violation: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Contract(err) => Some(err),
            Self::NotFound(_) | Self::Conflict(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<AccountValidationError> for RepoError {
    fn from(value: AccountValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ContractViolation> for RepoError {
    fn from(value: ContractViolation) -> Self {
        Self::Contract(value)
    }
}

/// Raw account storage. Implementations never apply audit policy.
pub trait AccountStore {
    fn find_by_username(&self, username: &str) -> RepoResult<Option<Account>>;
    fn get_by_id(&self, id: AccountId) -> RepoResult<Option<Account>>;
    /// Inserts `account` and writes the generated id back into it.
    fn insert(&self, account: &mut Account) -> RepoResult<AccountId>;
    /// Writes the `Some` columns of `patch` plus its updated audit pair.
    ///
    /// The persisted `update_time` is written back into `patch.audit`.
    fn update(&self, patch: &mut AccountPatch) -> RepoResult<()>;
}

/// SQLite-backed account store.
pub struct SqliteAccountStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AccountStore for SqliteAccountStore<'_> {
    fn find_by_username(&self, username: &str) -> RepoResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE username = ?1;"))?;
        let mut rows = stmt.query([username])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_account_row(row)?)),
            None => Ok(None),
        }
    }

    fn get_by_id(&self, id: AccountId) -> RepoResult<Option<Account>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{ACCOUNT_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_account_row(row)?)),
            None => Ok(None),
        }
    }

    fn insert(&self, account: &mut Account) -> RepoResult<AccountId> {
        account.validate()?;

        self.conn
            .execute(
                "INSERT INTO accounts (
                    name,
                    username,
                    password_hash,
                    phone,
                    sex,
                    id_number,
                    status,
                    create_time,
                    update_time,
                    create_user,
                    update_user
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11);",
                params![
                    account.name.as_str(),
                    account.username.as_str(),
                    account.password_hash.as_str(),
                    account.phone.as_str(),
                    account.sex.as_str(),
                    account.id_number.as_str(),
                    status_to_db(account.status),
                    account.audit.created_at,
                    account.audit.updated_at,
                    account.audit.created_by,
                    account.audit.updated_by,
                ],
            )
            .map_err(map_write_error)?;

        let id = self.conn.last_insert_rowid();
        account.id = Some(id);
        Ok(id)
    }

    fn update(&self, patch: &mut AccountPatch) -> RepoResult<()> {
        patch.validate()?;

        let mut assignments: Vec<&'static str> = Vec::new();
        let mut bind_values: Vec<Value> = Vec::new();
        let text_columns = [
            ("name = ?", &patch.name),
            ("username = ?", &patch.username),
            ("phone = ?", &patch.phone),
            ("sex = ?", &patch.sex),
            ("id_number = ?", &patch.id_number),
        ];
        for (assignment, value) in text_columns {
            if let Some(value) = value {
                assignments.push(assignment);
                bind_values.push(Value::Text(value.clone()));
            }
        }
        if let Some(status) = patch.status {
            assignments.push("status = ?");
            bind_values.push(Value::Integer(status_to_db(status)));
        }
        if let Some(updated_at) = patch.audit.updated_at {
            assignments.push("update_time = MAX(?, COALESCE(update_time, 0) + 1)");
            bind_values.push(Value::Integer(updated_at));
        }
        if let Some(updated_by) = patch.audit.updated_by {
            assignments.push("update_user = ?");
            bind_values.push(Value::Integer(updated_by));
        }

        if assignments.is_empty() {
            let exists = self
                .conn
                .query_row("SELECT 1 FROM accounts WHERE id = ?1;", [patch.id], |_| Ok(()))
                .optional()?;
            return exists.ok_or(RepoError::NotFound(patch.id));
        }

        let sql = format!(
            "UPDATE accounts SET {} WHERE id = ? RETURNING update_time;",
            assignments.join(", ")
        );
        bind_values.push(Value::Integer(patch.id));

        let stored_update_time = self
            .conn
            .query_row(&sql, params_from_iter(bind_values), |row| {
                row.get::<_, Option<i64>>(0)
            })
            .optional()
            .map_err(map_write_error)?
            .ok_or(RepoError::NotFound(patch.id))?;

        if patch.audit.updated_at.is_some() {
            patch.audit.updated_at = stored_update_time;
        }
        Ok(())
    }
}

/// Guarded account entry points.
///
/// Every mutation is routed through the audit interceptor, which stamps the
/// record before the store sees it. Reads pass straight through.
pub struct AuditedAccounts<S: AccountStore> {
    store: S,
    interceptor: Arc<AuditInterceptor>,
}

impl<S: AccountStore> AuditedAccounts<S> {
    pub fn new(store: S, interceptor: Arc<AuditInterceptor>) -> Self {
        Self { store, interceptor }
    }

    pub fn find_by_username(&self, username: &str) -> RepoResult<Option<Account>> {
        self.store.find_by_username(username)
    }

    pub fn get_by_id(&self, id: AccountId) -> RepoResult<Option<Account>> {
        self.store.get_by_id(id)
    }

    /// CREATE-tagged insert.
    pub fn insert(&self, account: &mut Account, ctx: &IdentityContext) -> RepoResult<AccountId> {
        self.interceptor
            .invoke_audited(ACCOUNT_INSERT, ctx, account, |account| {
                self.store.insert(account)
            })
    }

    /// UPDATE-tagged partial update.
    pub fn update(&self, patch: &mut AccountPatch, ctx: &IdentityContext) -> RepoResult<()> {
        self.interceptor
            .invoke_audited(ACCOUNT_UPDATE, ctx, patch, |patch| self.store.update(patch))
    }
}

fn map_write_error(err: rusqlite::Error) -> RepoError {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            RepoError::Conflict("username already exists".to_string())
        }
        _ => RepoError::from(err),
    }
}

fn parse_account_row(row: &Row<'_>) -> RepoResult<Account> {
    let status_value: i64 = row.get("status")?;
    let status = parse_status(status_value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_value}` in accounts.status"))
    })?;

    let account = Account {
        id: Some(row.get("id")?),
        name: row.get("name")?,
        username: row.get("username")?,
        password_hash: row.get("password_hash")?,
        phone: row.get("phone")?,
        sex: row.get("sex")?,
        id_number: row.get("id_number")?,
        status,
        audit: AuditFields {
            created_at: row.get("create_time")?,
            created_by: row.get("create_user")?,
            updated_at: row.get("update_time")?,
            updated_by: row.get("update_user")?,
        },
    };
    account.validate()?;
    Ok(account)
}

fn status_to_db(status: AccountStatus) -> i64 {
    match status {
        AccountStatus::Disabled => 0,
        AccountStatus::Enabled => 1,
    }
}

fn parse_status(value: i64) -> Option<AccountStatus> {
    match value {
        0 => Some(AccountStatus::Disabled),
        1 => Some(AccountStatus::Enabled),
        _ => None,
    }
}
