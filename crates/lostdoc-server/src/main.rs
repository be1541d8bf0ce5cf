//! lostdoc server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite registry, seeds default settings and serves the JSON API over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `bootstrap_admin.password_hash`:
//!
//! ```text
//! cargo run -p lostdoc-server -- --hash-password
//! ```

mod server_config;

use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context as _;
use clap::Parser;
use lostdoc_api::{AppState, api_router, auth::hash_password};
use lostdoc_core::{
  store::DocumentStore,
  user::{NewUser, Role},
};
use lostdoc_service::{ConfigProvider, DocumentService};
use lostdoc_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use server_config::{BootstrapAdmin, ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Lost-document registry server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    println!("{}", hash_password(&password)?);
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)?;

  // Open SQLite store.
  let store_path = expand_tilde(&server_cfg.store_path);
  if let Some(parent) = store_path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {parent:?}"))?;
  }
  let store = Arc::new(
    SqliteStore::open(&store_path)
      .await
      .with_context(|| format!("failed to open store at {store_path:?}"))?,
  );

  // Application settings: seed, then refuse to start on an invalid set.
  let config = ConfigProvider::new(
    Arc::clone(&store),
    Duration::from_secs(server_cfg.settings_cache_ttl_secs),
  );
  let seeded = config
    .ensure_defaults()
    .await
    .context("failed to seed default settings")?;
  if !seeded.is_empty() {
    tracing::info!(keys = ?seeded, "seeded default settings");
  }
  let app_config = config
    .current()
    .await
    .context("stored settings are invalid")?;
  tracing::info!(
    numbering = app_config.numbering.as_str(),
    retention_days = app_config.retention.as_days(),
    timezone = %app_config.timezone,
    "settings loaded"
  );

  bootstrap_admin(store.as_ref(), server_cfg.bootstrap_admin.as_ref()).await?;

  let service = DocumentService::new(Arc::clone(&store), config);
  let app = api_router(AppState::new(service)).layer(TraceLayer::new_for_http());
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Create the configured administrator when no user exists yet.
async fn bootstrap_admin(
  store: &SqliteStore,
  admin: Option<&BootstrapAdmin>,
) -> anyhow::Result<()> {
  let users = store.list_users().await.context("failed to list users")?;
  if !users.is_empty() {
    return Ok(());
  }

  let Some(admin) = admin else {
    tracing::warn!("no users exist and no bootstrap_admin is configured; nobody can log in");
    return Ok(());
  };

  let user = store
    .create_user(NewUser {
      username:      admin.username.clone(),
      full_name:     admin.full_name.clone(),
      rank:          None,
      position:      None,
      role:          Role::Admin,
      password_hash: admin.password_hash.clone(),
    })
    .await
    .context("failed to create bootstrap administrator")?;
  tracing::info!(user = %user.user_id, username = %user.username, "created bootstrap administrator");
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}
