//! Admin CLI over `sky_admin_core`.
//!
//! # Responsibility
//! - Wire configuration, logging, storage, and the account service together.
//! - Expose login, token inspection, and account creation for local use.
//!
//! Usage:
//!   sky_admin_cli version
//!   sky_admin_cli login --username <u> --password <p>
//!   sky_admin_cli whoami --token <t>
//!   sky_admin_cli create-account --token <t> --name <n> --username <u>

use clap::{Parser, Subcommand};
use log::error;
use rusqlite::Connection;
use serde_json::Map;
use sky_admin_core::{
    authenticate_request, build_classifier, core_version, init_logging, open_db,
    open_db_in_memory, AccountDraft, AccountService, AppConfig, AuditInterceptor, AuditedAccounts,
    IdentityContext, SqliteAccountStore, TokenAuthenticator,
};
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sky_admin_cli")]
#[command(about = "Account administration for the sky admin backend")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the core library version
    Version,
    /// Check credentials and print a fresh identity token
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// Verify a token and print the actor it was issued for
    Whoami {
        #[arg(short, long)]
        token: String,
    },
    /// Create an account on behalf of the token's actor
    CreateAccount {
        /// Identity token of the acting administrator
        #[arg(short, long)]
        token: String,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Login name; must be unique
        #[arg(short, long)]
        username: String,

        #[arg(long, default_value = "")]
        phone: String,

        #[arg(long, default_value = "")]
        sex: String,

        #[arg(long, default_value = "")]
        id_number: String,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli.command) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<String, String> {
    if matches!(command, Commands::Version) {
        return Ok(format!("sky_admin_core version={}", core_version()));
    }

    let config = AppConfig::from_env().map_err(|err| err.to_string())?;
    if let Some(log_dir) = &config.log_dir {
        init_logging(&config.log_level, log_dir)?;
    }

    let conn = match &config.db_path {
        Some(path) => open_db(path),
        None => open_db_in_memory(),
    }
    .map_err(|err| err.to_string())?;
    let service = account_service(&conn)?;
    let authenticator = TokenAuthenticator::new(&config.auth);

    match command {
        Commands::Version => Ok(format!("sky_admin_core version={}", core_version())),
        Commands::Login { username, password } => {
            let actor = service
                .login(&username, &password)
                .map_err(|err| err.to_string())?;
            let token = authenticator
                .issue_default(actor, Map::new())
                .map_err(|err| err.to_string())?;
            Ok(token.into_string())
        }
        Commands::Whoami { token } => {
            let ctx = authenticate(&authenticator, &token)?;
            Ok(format!(
                "actor={}",
                ctx.get().map_or_else(|| "none".to_string(), |id| id.to_string())
            ))
        }
        Commands::CreateAccount {
            token,
            name,
            username,
            phone,
            sex,
            id_number,
        } => {
            let ctx = authenticate(&authenticator, &token)?;
            let draft = AccountDraft {
                name,
                username,
                phone,
                sex,
                id_number,
            };
            let id = service
                .create_account(&draft, &ctx)
                .map_err(|err| err.to_string())?;
            Ok(format!("account_id={id}"))
        }
    }
}

fn account_service(conn: &Connection) -> Result<AccountService<SqliteAccountStore<'_>>, String> {
    let classifier = build_classifier().map_err(|err| {
        error!("event=startup module=cli status=error error={}", err);
        err.to_string()
    })?;
    let interceptor = Arc::new(AuditInterceptor::new(classifier));
    Ok(AccountService::new(AuditedAccounts::new(
        SqliteAccountStore::new(conn),
        interceptor,
    )))
}

/// Presents `token` under the configured header, as a request would.
fn authenticate(
    authenticator: &TokenAuthenticator,
    token: &str,
) -> Result<IdentityContext, String> {
    authenticate_request(authenticator, &[(authenticator.header_name(), token)])
        .map_err(|err| err.to_string())
}
