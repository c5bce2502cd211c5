//! The layered settings store.
//!
//! A single [`SettingsStore`] is constructed at startup and passed by
//! reference to every caller. All state lives in one TOML file: the typed
//! slots as named fields, plus a reserved field holding the dynamic tier's
//! compact JSON blob. Every mutation persists the file immediately, so
//! there is nothing left to flush at shutdown.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::error::SettingsError;

use super::env::{self, EnvScope};
use super::resources;
use super::typed::{TypedSettings, TypedSlot};

/// Outcome of consulting a single tier for a read.
#[derive(Debug)]
enum TierLookup {
    Hit(String),
    Miss,
    /// Tier is broken (e.g. corrupt blob). Treated as a miss by `get`,
    /// but kept distinct so the fault is visible where it happens.
    Fault,
}

/// Outcome of asking a single tier to store a value.
#[derive(Debug, Clone, Copy)]
enum TierWrite {
    Stored,
    /// Tier does not apply to this key (no typed slot, tier disabled).
    Miss,
    /// Tier applies but could not persist; the write falls through.
    Fault,
}

/// Layered key/value settings store.
///
/// Reads resolve through typed slots, the dynamic blob, the environment
/// and the bundled resources, returning the first non-empty match. Writes
/// land in the first of the first three tiers that accepts the key; only
/// when all three refuse does [`SettingsStore::set`] report an error.
pub struct SettingsStore {
    path: PathBuf,
    dynamic_enabled: bool,
    inner: Mutex<TypedSettings>,
}

impl SettingsStore {
    /// Open the store backed by the given settings file. A missing file
    /// starts from defaults; a corrupt one is logged and discarded rather
    /// than propagated.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match fs::read_to_string(&path) {
            Ok(raw) => match toml::from_str(&raw) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(path = %path.display(), %err, "Settings file is corrupt, starting from defaults");
                    TypedSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => TypedSettings::default(),
            Err(err) => {
                warn!(path = %path.display(), %err, "Failed to read settings file, starting from defaults");
                TypedSettings::default()
            }
        };
        Self {
            path,
            dynamic_enabled: true,
            inner: Mutex::new(settings),
        }
    }

    /// Model a caller that declared no dynamic slot: writes to unknown
    /// keys fall straight through to the environment tier.
    pub fn without_dynamic_tier(mut self) -> Self {
        self.dynamic_enabled = false;
        self
    }

    /// Conventional per-user settings file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("md2doc")
            .join("settings.toml")
    }

    /// Location of the backing settings file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolve `key` through the tiers in precedence order, returning the
    /// first non-empty value. Missing keys and broken tiers both come back
    /// as `None`; this never errors.
    pub fn get(&self, key: &str) -> Option<String> {
        let key = key.trim();
        if key.is_empty() {
            return None;
        }

        if let TierLookup::Hit(value) = self.typed_lookup(key) {
            return Some(value);
        }
        if let TierLookup::Hit(value) = self.dynamic_lookup(key) {
            return Some(value);
        }
        if let Some(value) = env::lookup(key) {
            return Some(value);
        }
        resources::lookup(key)
    }

    /// Store `value` under `key` in the user environment scope.
    /// `None` (or an empty value) removes the key from the dynamic tier
    /// and clears a typed slot.
    pub fn set(&self, key: &str, value: Option<&str>) -> Result<(), SettingsError> {
        self.set_scoped(key, value, EnvScope::default())
    }

    /// Store `value` under `key`, naming the environment scope used if the
    /// write falls through to the environment tier.
    pub fn set_scoped(
        &self,
        key: &str,
        value: Option<&str>,
        scope: EnvScope,
    ) -> Result<(), SettingsError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(SettingsError::Persistence { key: String::new() });
        }
        let value = value.filter(|v| !v.is_empty());

        match self.typed_write(key, value) {
            TierWrite::Stored => return Ok(()),
            TierWrite::Miss => {}
            TierWrite::Fault => debug!(key, "Typed tier write failed, trying dynamic tier"),
        }
        match self.dynamic_write(key, value) {
            TierWrite::Stored => return Ok(()),
            TierWrite::Miss => {}
            TierWrite::Fault => debug!(key, "Dynamic tier write failed, trying environment"),
        }
        match Self::env_write(key, value, scope) {
            TierWrite::Stored => return Ok(()),
            TierWrite::Miss | TierWrite::Fault => {}
        }

        Err(SettingsError::Persistence {
            key: key.to_string(),
        })
    }

    /// Best-effort removal across the writable tiers, stopping at the
    /// first tier that recognizes the key. Never errors.
    pub fn remove(&self, key: &str) {
        let key = key.trim();
        if key.is_empty() {
            return;
        }

        if let Some(slot) = TypedSlot::from_key(key) {
            let mut guard = self.lock();
            *guard.slot_mut(slot) = None;
            if let Err(err) = self.persist(&guard) {
                warn!(key, %err, "Failed to persist typed slot removal");
            }
            return;
        }

        if self.dynamic_enabled {
            let mut guard = self.lock();
            let mut map = Self::parse_dynamic(guard.dynamic_settings.as_deref()).unwrap_or_default();
            if remove_key_ci(&mut map, key) {
                match serde_json::to_string(&map) {
                    Ok(blob) => guard.dynamic_settings = Some(blob),
                    Err(err) => warn!(key, %err, "Failed to reserialize dynamic settings"),
                }
                if let Err(err) = self.persist(&guard) {
                    warn!(key, %err, "Failed to persist dynamic removal");
                }
                return;
            }
        }

        if env::storable(key, None) {
            env::write(key, None, EnvScope::Process);
        }
    }

    /// All keys currently present in the dynamic tier, or empty if the
    /// tier is disabled or its blob is unreadable.
    pub fn list_dynamic_keys(&self) -> Vec<String> {
        if !self.dynamic_enabled {
            return Vec::new();
        }
        let guard = self.lock();
        Self::parse_dynamic(guard.dynamic_settings.as_deref())
            .unwrap_or_default()
            .into_keys()
            .collect()
    }

    fn typed_lookup(&self, key: &str) -> TierLookup {
        let Some(slot) = TypedSlot::from_key(key) else {
            return TierLookup::Miss;
        };
        let guard = self.lock();
        match guard.slot(slot) {
            Some(value) if !value.is_empty() => TierLookup::Hit(value.to_string()),
            _ => TierLookup::Miss,
        }
    }

    fn dynamic_lookup(&self, key: &str) -> TierLookup {
        if !self.dynamic_enabled {
            return TierLookup::Miss;
        }
        let guard = self.lock();
        let map = match Self::parse_dynamic(guard.dynamic_settings.as_deref()) {
            Ok(map) => map,
            Err(err) => {
                warn!(%err, "Dynamic settings blob is corrupt, treating as empty");
                return TierLookup::Fault;
            }
        };
        match map.iter().find(|(k, _)| k.eq_ignore_ascii_case(key)) {
            Some((_, value)) if !value.is_empty() => TierLookup::Hit(value.clone()),
            _ => TierLookup::Miss,
        }
    }

    fn typed_write(&self, key: &str, value: Option<&str>) -> TierWrite {
        let Some(slot) = TypedSlot::from_key(key) else {
            return TierWrite::Miss;
        };
        let mut guard = self.lock();
        *guard.slot_mut(slot) = value.map(str::to_string);
        match self.persist(&guard) {
            Ok(()) => TierWrite::Stored,
            Err(err) => {
                warn!(key, %err, "Failed to persist typed settings");
                TierWrite::Fault
            }
        }
    }

    fn dynamic_write(&self, key: &str, value: Option<&str>) -> TierWrite {
        if !self.dynamic_enabled {
            return TierWrite::Miss;
        }
        // Read-modify-write of the whole blob, serialized by the store lock.
        let mut guard = self.lock();
        let mut map = Self::parse_dynamic(guard.dynamic_settings.as_deref()).unwrap_or_default();
        remove_key_ci(&mut map, key);
        if let Some(value) = value {
            map.insert(key.to_string(), value.to_string());
        }
        let blob = match serde_json::to_string(&map) {
            Ok(blob) => blob,
            Err(err) => {
                warn!(key, %err, "Failed to serialize dynamic settings");
                return TierWrite::Fault;
            }
        };
        guard.dynamic_settings = Some(blob);
        match self.persist(&guard) {
            Ok(()) => TierWrite::Stored,
            Err(err) => {
                warn!(key, %err, "Failed to persist dynamic settings");
                TierWrite::Fault
            }
        }
    }

    fn env_write(key: &str, value: Option<&str>, scope: EnvScope) -> TierWrite {
        if !env::storable(key, value) {
            warn!(key, "Key cannot be stored in the environment");
            return TierWrite::Fault;
        }
        env::write(key, value, scope);
        TierWrite::Stored
    }

    fn parse_dynamic(blob: Option<&str>) -> Result<BTreeMap<String, String>, serde_json::Error> {
        match blob {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str(raw),
            _ => Ok(BTreeMap::new()),
        }
    }

    fn persist(&self, settings: &TypedSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }
        let toml_str = toml::to_string_pretty(settings).context("Failed to serialize settings")?;
        fs::write(&self.path, toml_str).context("Failed to write settings file")?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TypedSettings> {
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Remove a key from the map, matching case-insensitively. Returns whether
/// a key was removed.
fn remove_key_ci(map: &mut BTreeMap<String, String>, key: &str) -> bool {
    let existing = map
        .keys()
        .find(|k| k.eq_ignore_ascii_case(key))
        .cloned();
    match existing {
        Some(k) => map.remove(&k).is_some(),
        None => false,
    }
}
