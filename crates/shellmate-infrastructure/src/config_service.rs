//! Configuration service implementation.
//!
//! Loads [`AssistantConfig`] from `config.toml` and caches it, so repeated
//! reads from the UI do not hit the disk.

use crate::paths::ShellmatePaths;
use shellmate_core::config::AssistantConfig;
use shellmate_core::error::Result;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

/// Configuration service that loads and caches the assistant configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    /// Cached configuration; `None` until first access or after invalidation.
    config: Arc<RwLock<Option<AssistantConfig>>>,
}

impl ConfigService {
    /// Creates a service for the default config file location.
    ///
    /// The file is read lazily on first access.
    pub fn new() -> Result<Self> {
        Ok(Self::with_path(ShellmatePaths::new()?.config_file()))
    }

    /// Creates a service reading `path` instead of the default location.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets the configuration, loading from file if not cached.
    ///
    /// A broken file is logged and replaced by defaults for this session.
    pub fn get_config(&self) -> AssistantConfig {
        {
            let read_lock = self.config.read().unwrap_or_else(|e| e.into_inner());
            if let Some(ref cached) = *read_lock {
                return cached.clone();
            }
        }

        let loaded = self.load().unwrap_or_else(|e| {
            tracing::warn!(
                "[ConfigService] Failed to load {}: {}. Using defaults.",
                self.path.display(),
                e
            );
            AssistantConfig::default()
        });

        self.store_cache(loaded.clone());
        loaded
    }

    /// Reads the file without touching the cache. A missing file yields defaults.
    pub fn load(&self) -> Result<AssistantConfig> {
        if !self.path.exists() {
            return Ok(AssistantConfig::default());
        }
        let content = fs::read_to_string(&self.path)?;
        let config: AssistantConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Like [`ConfigService::load`], but writes the defaults when the file is missing.
    pub fn load_or_create(&self) -> Result<AssistantConfig> {
        if self.path.exists() {
            let config = self.load()?;
            self.store_cache(config.clone());
            return Ok(config);
        }

        tracing::info!(
            "[ConfigService] Creating default config at {}",
            self.path.display()
        );
        let config = AssistantConfig::default();
        self.save(&config)?;
        Ok(config)
    }

    /// Writes `config` to disk and refreshes the cache.
    pub fn save(&self, config: &AssistantConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)?;
        fs::write(&self.path, content)?;

        self.store_cache(config.clone());
        tracing::debug!("[ConfigService] Saved {}", self.path.display());
        Ok(())
    }

    /// Invalidates the cache, forcing a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = None;
    }

    fn store_cache(&self, config: AssistantConfig) {
        let mut write_lock = self.config.write().unwrap_or_else(|e| e.into_inner());
        *write_lock = Some(config);
    }
}
