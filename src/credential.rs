//! API key resolution: a configured value first, then the local key store.

use crate::error::{Result, StudioError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Key embedded at compile time, if the build environment provided one
pub const BUILD_TIME_API_KEY: Option<&str> = option_env!("SCRIPT_STUDIO_API_KEY");

/// Key store entry holding the generation service key
pub const API_KEY_ENTRY: &str = "gemini_api_key";

const PLACEHOLDER_KEYS: &[&str] = &["your_api_key_here", "YOUR_KEY"];

fn usable(key: &str) -> Option<String> {
    let key = key.trim();
    if key.is_empty() || PLACEHOLDER_KEYS.contains(&key) {
        None
    } else {
        Some(key.to_string())
    }
}

/// Resolve the API key in priority order: configured value (build-time
/// constant, then runtime configuration), then the key store.
pub fn resolve_api_key(configured: Option<&str>, store: &KeyStore) -> Result<Option<String>> {
    if let Some(key) = BUILD_TIME_API_KEY.and_then(usable) {
        debug!("Using build-time API key");
        return Ok(Some(key));
    }

    if let Some(key) = configured.and_then(usable) {
        debug!("Using configured API key");
        return Ok(Some(key));
    }

    let stored = store.get(API_KEY_ENTRY)?.and_then(|k| usable(&k));
    if stored.is_some() {
        debug!("Using API key from {}", store.path().display());
    }
    Ok(stored)
}

/// Small persistent key-value file (JSON object of strings)
#[derive(Debug, Clone)]
pub struct KeyStore {
    path: PathBuf,
}

impl KeyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                StudioError::Configuration(format!(
                    "key store {} is corrupt: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(entries)?)?;
        Ok(())
    }

    pub fn get(&self, name: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(name))
    }

    pub fn set(&self, name: &str, value: &str) -> Result<()> {
        let mut entries = self.load()?;
        entries.insert(name.to_string(), value.trim().to_string());
        self.persist(&entries)
    }

    /// Remove an entry; returns whether it existed
    pub fn remove(&self, name: &str) -> Result<bool> {
        let mut entries = self.load()?;
        let existed = entries.remove(name).is_some();
        if existed {
            self.persist(&entries)?;
        }
        Ok(existed)
    }
}

/// Mask a key for display, keeping the last four characters
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}", "*".repeat(chars.len() - 4), tail)
}
