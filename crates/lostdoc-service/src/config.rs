//! Cached access to the application settings.

use std::{
  sync::{Arc, Mutex, MutexGuard, PoisonError},
  time::Duration,
};

use lostdoc_core::{
  Error, Result,
  settings::{self, AppConfig, SettingsMap, keys},
  store::DocumentStore,
};
use moka::sync::Cache;

use crate::store_err;

/// Reads [`AppConfig`] through a single-entry TTL cache.
///
/// Every write goes through [`ConfigProvider::update`], which invalidates
/// the cache before it returns, so the next issuance sees the new values.
///
/// A reader that loaded settings before a write finished must not put its
/// stale copy back into the cache. Each write bumps `generation`; a reader
/// only caches what it loaded if the generation is unchanged, and the check
/// and insert happen under the same lock as the bump and invalidate.
pub struct ConfigProvider<S> {
  store:      Arc<S>,
  cache:      Cache<(), Arc<AppConfig>>,
  generation: Arc<Mutex<u64>>,
}

impl<S> Clone for ConfigProvider<S> {
  fn clone(&self) -> Self {
    Self {
      store:      Arc::clone(&self.store),
      cache:      self.cache.clone(),
      generation: Arc::clone(&self.generation),
    }
  }
}

impl<S> ConfigProvider<S> {
  fn generation(&self) -> MutexGuard<'_, u64> {
    self.generation.lock().unwrap_or_else(PoisonError::into_inner)
  }

  /// Call after every settings write.
  fn invalidate(&self) {
    let mut generation = self.generation();
    *generation += 1;
    self.cache.invalidate(&());
  }
}

impl<S: DocumentStore> ConfigProvider<S> {
  pub fn new(store: Arc<S>, ttl: Duration) -> Self {
    let cache = Cache::builder().max_capacity(1).time_to_live(ttl).build();
    Self { store, cache, generation: Arc::new(Mutex::new(0)) }
  }

  /// Write defaults for any well-known key that is not stored yet.
  /// Returns the keys that were written.
  pub async fn ensure_defaults(&self) -> Result<Vec<String>> {
    let stored = self.store.load_settings().await.map_err(store_err)?;
    let missing: SettingsMap = settings::defaults()
      .into_iter()
      .filter(|(key, _)| !stored.contains_key(key))
      .collect();
    let written = missing.keys().cloned().collect();

    if !missing.is_empty() {
      self.store.save_settings(missing).await.map_err(store_err)?;
      self.invalidate();
    }
    Ok(written)
  }

  /// The parsed configuration, from cache when fresh.
  pub async fn current(&self) -> Result<Arc<AppConfig>> {
    if let Some(config) = self.cache.get(&()) {
      return Ok(config);
    }
    let seen = *self.generation();
    let map = self.store.load_settings().await.map_err(store_err)?;
    let config = Arc::new(AppConfig::from_map(&map)?);

    let generation = self.generation();
    if *generation == seen {
      self.cache.insert((), Arc::clone(&config));
    }
    drop(generation);
    Ok(config)
  }

  /// The raw stored mapping, unknown keys included.
  pub async fn raw(&self) -> Result<SettingsMap> {
    self.store.load_settings().await.map_err(store_err)
  }

  /// Merge `changes` over the stored mapping, validate the result, persist
  /// and invalidate. Nothing is written if validation fails.
  pub async fn update(&self, changes: SettingsMap) -> Result<SettingsMap> {
    if let Some(path) = changes.get(keys::BACKUP_PATH)
      && path.contains("..")
    {
      return Err(Error::validation(
        "backup_path",
        "must not contain parent-directory components",
      ));
    }

    let mut merged = self.raw().await?;
    merged.extend(changes.clone());
    if let Err(e) = AppConfig::from_map(&merged) {
      return Err(match e {
        Error::Configuration(message) => Error::validation("settings", message),
        other => other,
      });
    }

    self.store.save_settings(changes).await.map_err(store_err)?;
    self.invalidate();
    Ok(merged)
  }
}
