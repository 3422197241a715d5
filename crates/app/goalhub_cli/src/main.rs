// Import and re-export the `error` module
pub use self::error::{Error, Result};
mod error;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use cli::{Cli, Commands, SessionCommand};
use goalhub_client::auth::HttpAuthenticator;
use goalhub_client::config::parse_base_url;
use goalhub_client::pipeline::Body;
use goalhub_client::pipeline::csrf::MUTATING_METHODS;
use goalhub_client::{ApiClient, ClientConfig, ClientError};
use goalhub_core::auth::{BootstrapOutcome, SessionStore};
use goalhub_core::guard::{GuardDecision, require_auth};
use goalhub_core::models::auth::Credentials;
use goalhub_core::storage::FileTokenStorage;
use http::Method;
use serde_json::{Value, json};
use tracing::{debug, error, warn};

mod cli;
mod logging;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
    Ok(())
}

/// Session store and client wired to the same persisted token.
struct App {
    client: ApiClient,
    session: SessionStore,
    restored: BootstrapOutcome,
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    let Cli {
        api_url,
        data_dir,
        verbose,
        command,
    } = Cli::parse();
    logging::init(verbose)?;

    match command {
        Commands::Version => {
            println!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Session(command) => {
            let app = build(api_url.as_deref(), data_dir)?;
            let result = execute(&app, command).await;
            if let Err(e) = app.client.save_csrf_cookie() {
                warn!("could not persist CSRF cookie: {e}");
            }
            result
        }
    }
}

async fn execute(app: &App, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Login { username, password } => {
            let password = password.ok_or_else(|| {
                Error::Custom("password required (--password or GOALHUB_PASSWORD)".into())
            })?;
            prepare_csrf(&app.client).await;
            let claims = app
                .session
                .login(&Credentials::new(username, password))
                .await?;
            println!(
                "Logged in as {} (id {}){}",
                claims.full_name(),
                claims.user_id,
                if claims.is_superuser { " [admin]" } else { "" }
            );
        }
        SessionCommand::Logout => {
            prepare_csrf(&app.client).await;
            app.session.logout().await;
            println!("Logged out");
        }
        SessionCommand::Whoami => {
            guard(require_auth(&app.session, "/whoami"))?;
            let out = json!({
                "user": app.session.current_user(),
                "isAuthenticated": app.session.is_authenticated(),
                "isAdmin": app.session.is_admin(),
                "isStaff": app.session.is_staff(),
                "group": app.session.user_group(),
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        SessionCommand::Status => {
            let state = match app.restored {
                BootstrapOutcome::Restored => "active",
                BootstrapOutcome::NoSession => "not logged in",
                BootstrapOutcome::Malformed => "not logged in (stored session was malformed)",
                BootstrapOutcome::Expired => "not logged in (stored session expired)",
            };
            println!("session: {state}");
            if let Some(user) = app.session.current_user() {
                println!("user: {} (id {})", user.full_name(), user.user_id);
                println!("admin: {}", app.session.is_admin());
                println!("staff: {}", app.session.is_staff());
            }
        }
        SessionCommand::Request { method, path, data } => {
            guard(require_auth(&app.session, &path))?;
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
                .map_err(|e| Error::Custom(format!("invalid method {method:?}: {e}")))?;
            if MUTATING_METHODS.contains(&method) {
                prepare_csrf(&app.client).await;
            }
            let body = data
                .as_deref()
                .map(serde_json::from_str::<Value>)
                .transpose()?;
            match app.client.request(method, &path, body).await {
                Ok(Body::Json(value)) => println!("{}", serde_json::to_string_pretty(&value)?),
                Ok(Body::Text(text)) => println!("{text}"),
                Ok(Body::Empty) => {}
                Err(e @ ClientError::Status { .. }) => {
                    for line in e.messages() {
                        eprintln!("{line}");
                    }
                    return Err(e.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    Ok(())
}

fn build(api_url: Option<&str>, data_dir: Option<PathBuf>) -> Result<App> {
    let mut config = ClientConfig::from_env()?;
    if let Some(url) = api_url {
        config.api_url = parse_base_url(url)?;
    }
    if let Some(dir) = data_dir {
        config.data_dir = dir;
    }
    debug!(api_url = %config.api_url, data_dir = %config.data_dir.display(), "configuration");

    let storage = Arc::new(FileTokenStorage::new(&config.data_dir));
    let client = ApiClient::standard(&config, storage.clone())?;
    let session = SessionStore::new(storage, Arc::new(HttpAuthenticator::new(client.clone())));
    let restored = session.bootstrap();

    Ok(App {
        client,
        session,
        restored,
    })
}

/// Best-effort: without a cookie the CSRF stage warns and the backend decides.
async fn prepare_csrf(client: &ApiClient) {
    if let Err(e) = client.ensure_csrf_cookie().await {
        debug!("CSRF cookie request failed: {e}");
    }
}

fn guard(decision: GuardDecision) -> Result<()> {
    match decision {
        GuardDecision::Allow => Ok(()),
        GuardDecision::RedirectToLogin { .. } => Err(Error::Denied(
            "login required: run `goalhub login --username <name>`".into(),
        )),
        other => Err(Error::Denied(format!(
            "access denied (redirect to {})",
            other.redirect_target().unwrap_or_default()
        ))),
    }
}
