//! Process-level server configuration, read once at startup.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use serde::Deserialize;

/// Runtime server configuration, deserialised from `config.toml` overlaid
/// with `LOSTDOC_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                    String,
  #[serde(default = "default_port")]
  pub port:                    u16,
  #[serde(default = "default_store_path")]
  pub store_path:              PathBuf,
  #[serde(default = "default_cache_ttl")]
  pub settings_cache_ttl_secs: u64,
  /// Created when the user table is empty.
  #[serde(default)]
  pub bootstrap_admin:         Option<BootstrapAdmin>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapAdmin {
  pub username:      String,
  pub full_name:     String,
  /// PHC string, see `--hash-password`.
  pub password_hash: String,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_store_path() -> PathBuf { PathBuf::from("~/.local/share/lostdoc/registry.db") }

fn default_cache_ttl() -> u64 { 30 }

impl ServerConfig {
  /// File (optional) first, then environment. Nested keys use `__`, e.g.
  /// `LOSTDOC_BOOTSTRAP_ADMIN__USERNAME`.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(
        config::Environment::with_prefix("LOSTDOC")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    settings
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use config::FileFormat;

  use super::*;

  fn parse(toml: &str) -> ServerConfig {
    config::Config::builder()
      .add_source(config::File::from_str(toml, FileFormat::Toml))
      .build()
      .unwrap()
      .try_deserialize()
      .unwrap()
  }

  #[test]
  fn empty_file_uses_defaults() {
    let cfg = parse("");
    assert_eq!(cfg.address(), "127.0.0.1:8080");
    assert_eq!(cfg.settings_cache_ttl_secs, 30);
    assert!(cfg.bootstrap_admin.is_none());
  }

  #[test]
  fn bootstrap_admin_table_is_read() {
    let cfg = parse(
      r#"
        port = 9000
        store_path = "/var/lib/lostdoc/registry.db"

        [bootstrap_admin]
        username = "admin"
        full_name = "Administrator"
        password_hash = "$argon2id$v=19$stub"
      "#,
    );
    assert_eq!(cfg.port, 9000);
    assert_eq!(cfg.store_path, PathBuf::from("/var/lib/lostdoc/registry.db"));
    assert_eq!(cfg.bootstrap_admin.unwrap().username, "admin");
  }

  #[test]
  fn absolute_paths_are_left_alone() {
    let p = Path::new("/tmp/registry.db");
    assert_eq!(expand_tilde(p), p);
  }
}
