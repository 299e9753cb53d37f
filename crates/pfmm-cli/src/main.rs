//! pfmm - command-line access to the ministry site's backend.
//!
//! Inspects the site settings, manages the login session and builds file
//! URLs against the configured PocketBase server.

use std::io::{self, Write};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use pfmm_core::{ApiClient, AuthOutcome, AuthService, Config, Role, Session, SiteSettingsCache};

const USAGE: &str = "\
Usage: pfmm <command> [args]

Commands:
  settings                                  Print the site settings as JSON
  social-links                              Print the site's social profile URLs
  login [email]                             Log in and remember the session
  register <email> <username> [--admin]     Create an account and log in
  logout                                    Forget the saved session
  whoami                                    Show the logged-in user
  file-url <collection> <record> <file>     Print the URL of a stored file

Environment:
  PUBLIC_POCKETBASE_URL   Backend URL (overrides the config file)
  RUST_LOG                Log filter, e.g. RUST_LOG=debug";

/// Initialize the tracing subscriber for logging.
/// The returned guard flushes the background writer when dropped.
fn init_tracing() -> WorkerGuard {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let (writer, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer))
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        eprintln!("{}", USAGE);
        return Ok(());
    };

    let mut config = Config::load()?;
    let client = ApiClient::from_config(&config)?;
    info!(base_url = client.base_url(), command = %command, "pfmm starting");

    match command.as_str() {
        "settings" => {
            let cache = SiteSettingsCache::new(Arc::new(client));
            let settings = cache.load(false).await;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        "social-links" => {
            let cache = SiteSettingsCache::new(Arc::new(client));
            for url in cache.load(false).await.social_links() {
                println!("{}", url);
            }
        }
        "login" => {
            let email = match args.get(1).or(config.last_email.as_ref()) {
                Some(email) => email.clone(),
                None => prompt("Email: ")?,
            };
            let password = rpassword::prompt_password("Password: ")
                .context("Failed to read password")?;

            let mut auth = auth_service(&config, client)?;
            report_login(auth.login(&email, &password).await)?;

            config.last_email = Some(email);
            config.save()?;
        }
        "register" => {
            let (Some(email), Some(username)) = (args.get(1), args.get(2)) else {
                bail!("register needs <email> <username>\n\n{}", USAGE);
            };
            let role = if args.iter().any(|a| a == "--admin") {
                Role::Admin
            } else {
                Role::User
            };
            let password = rpassword::prompt_password("Password: ")
                .context("Failed to read password")?;
            let confirm = rpassword::prompt_password("Confirm password: ")
                .context("Failed to read password")?;

            let mut auth = auth_service(&config, client)?;
            match auth.register(email, &password, &confirm, username, role).await {
                AuthOutcome::Success { user } => {
                    println!("Registered {} ({})", user.display_name(), user.role.as_str());
                    if !auth.is_authenticated() {
                        println!("Automatic login failed; run `pfmm login {}`", email);
                    }
                }
                AuthOutcome::Failure { error } => bail!(error),
            }
        }
        "logout" => {
            let mut auth = auth_service(&config, client)?;
            auth.logout();
            println!("Logged out");
        }
        "whoami" => {
            let auth = auth_service(&config, client)?;
            match auth.current_user() {
                Some(user) if auth.is_authenticated() => {
                    println!("{} <{}>", user.display_name(), user.email);
                    println!("role: {}", user.role.as_str());
                    println!("admin: {}", auth.is_admin());
                }
                _ => println!("Not logged in"),
            }
        }
        "file-url" => {
            let (Some(collection), Some(record), Some(file)) = (args.get(1), args.get(2), args.get(3)) else {
                bail!("file-url needs <collection> <record> <file>\n\n{}", USAGE);
            };
            println!("{}", client.file_url(collection, record, file));
        }
        "help" | "--help" | "-h" => println!("{}", USAGE),
        other => bail!("Unknown command: {}\n\n{}", other, USAGE),
    }

    Ok(())
}

/// Build the auth service over the persisted session, if any
fn auth_service(config: &Config, client: ApiClient) -> Result<AuthService> {
    let mut session = Session::new(config.cache_dir()?);
    if let Err(e) = session.load() {
        tracing::warn!(error = %e, "Ignoring unreadable session file");
    }
    Ok(AuthService::new(client, session))
}

fn report_login(outcome: AuthOutcome) -> Result<()> {
    match outcome {
        AuthOutcome::Success { user } => {
            println!("Signed in as {} ({})", user.display_name(), user.role.as_str());
            Ok(())
        }
        AuthOutcome::Failure { error } => bail!(error),
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
