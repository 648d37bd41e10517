use rusqlite::Connection;
use sky_admin_core::db::open_db_in_memory;
use sky_admin_core::model::account::MASKED_PASSWORD;
use sky_admin_core::{
    build_classifier, AccountDraft, AccountService, AccountStatus, AuditInterceptor,
    AuditedAccounts, CredentialHasher, IdentityContext, LoginError, RepoError, ServiceError,
    SqliteAccountStore,
};
use std::sync::Arc;

const INITIAL_PASSWORD: &str = "123456";

fn service(conn: &Connection) -> AccountService<SqliteAccountStore<'_>> {
    let interceptor = Arc::new(AuditInterceptor::new(build_classifier().unwrap()));
    AccountService::with_hasher(
        AuditedAccounts::new(SqliteAccountStore::new(conn), interceptor),
        CredentialHasher::with_cost(8, 1, 1).unwrap(),
    )
}

fn draft(username: &str) -> AccountDraft {
    AccountDraft {
        name: "Operator".to_string(),
        username: username.to_string(),
        phone: "13900000000".to_string(),
        sex: "0".to_string(),
        id_number: "110101199202022345".to_string(),
    }
}

#[test]
fn created_account_can_log_in_with_initial_password() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let id = service
        .create_account(&draft("operator"), &IdentityContext::for_actor(1))
        .unwrap();

    assert_eq!(service.login("operator", INITIAL_PASSWORD).unwrap(), id);
    assert_eq!(service.login("  operator ", INITIAL_PASSWORD).unwrap(), id);
}

#[test]
fn login_reports_not_found_bad_password_and_locked() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = IdentityContext::for_actor(1);
    let id = service.create_account(&draft("locked"), &ctx).unwrap();

    assert!(matches!(
        service.login("nobody", INITIAL_PASSWORD),
        Err(LoginError::NotFound)
    ));
    assert!(matches!(
        service.login("locked", "wrong"),
        Err(LoginError::BadPassword)
    ));

    service.set_account_enabled(id, false, &ctx).unwrap();

    assert!(matches!(
        service.login("locked", INITIAL_PASSWORD),
        Err(LoginError::Locked)
    ));
    // Password is checked before status.
    assert!(matches!(
        service.login("locked", "wrong"),
        Err(LoginError::BadPassword)
    ));
}

#[test]
fn set_account_enabled_stamps_the_editor() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let id = service
        .create_account(&draft("toggle"), &IdentityContext::for_actor(42))
        .unwrap();

    service
        .set_account_enabled(id, false, &IdentityContext::for_actor(7))
        .unwrap();

    let account = service.get_account(id).unwrap().unwrap();
    assert_eq!(account.status, AccountStatus::Disabled);
    assert_eq!(account.audit.created_by, Some(42));
    assert_eq!(account.audit.updated_by, Some(7));
    assert!(account.audit.updated_at >= account.audit.created_at);
}

#[test]
fn get_account_masks_password_hash() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let id = service
        .create_account(&draft("masked"), &IdentityContext::for_actor(1))
        .unwrap();

    let account = service.get_account(id).unwrap().unwrap();
    assert_eq!(account.password_hash, MASKED_PASSWORD);
    assert_eq!(account.username, "masked");

    assert!(service.get_account(id + 100).unwrap().is_none());
}

#[test]
fn update_account_replaces_profile_columns() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let id = service
        .create_account(&draft("before"), &IdentityContext::for_actor(1))
        .unwrap();

    let mut edited = draft("after");
    edited.name = "Renamed".to_string();
    edited.phone = "13700000000".to_string();
    service
        .update_account(id, &edited, &IdentityContext::for_actor(2))
        .unwrap();

    let account = service.get_account(id).unwrap().unwrap();
    assert_eq!(account.name, "Renamed");
    assert_eq!(account.username, "after");
    assert_eq!(account.phone, "13700000000");
    assert_eq!(account.audit.updated_by, Some(2));
    assert_eq!(service.login("after", INITIAL_PASSWORD).unwrap(), id);
}

#[test]
fn duplicate_username_is_a_conflict() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let ctx = IdentityContext::for_actor(1);
    service.create_account(&draft("taken"), &ctx).unwrap();

    let err = service.create_account(&draft("taken"), &ctx).unwrap_err();
    assert!(matches!(err, ServiceError::Repo(RepoError::Conflict(_))));
    assert!(!err.is_contract_violation());
}

#[test]
fn invalid_draft_is_rejected_before_write() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .create_account(&draft("   "), &IdentityContext::for_actor(1))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repo(RepoError::Validation(_))));

    let count: i64 = conn
        .query_row("SELECT COUNT(*) FROM accounts;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn mutations_without_actor_are_contract_violations() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .create_account(&draft("anonymous"), &IdentityContext::new())
        .unwrap_err();
    assert!(err.is_contract_violation());

    let id = service
        .create_account(&draft("present"), &IdentityContext::for_actor(1))
        .unwrap();
    let err = service
        .set_account_enabled(id, false, &IdentityContext::new())
        .unwrap_err();
    assert!(err.is_contract_violation());
    assert_eq!(
        service.get_account(id).unwrap().unwrap().status,
        AccountStatus::Enabled
    );
}

#[test]
fn updating_missing_account_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .set_account_enabled(404, true, &IdentityContext::for_actor(1))
        .unwrap_err();
    assert!(matches!(err, ServiceError::Repo(RepoError::NotFound(404))));
}
