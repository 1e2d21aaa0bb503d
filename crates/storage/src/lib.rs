use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use shared::{
    domain::Formation,
    protocol::{FormationExport, EXPORT_VERSION},
};

/// Auto-saved on every store mutation.
pub const CURRENT_FORMATION_KEY: &str = "current_formation";
/// Mutated only by explicit save/delete/rename/duplicate/import actions.
pub const SAVED_FORMATIONS_KEY: &str = "saved_formations";

/// String-keyed, string-valued persistence capability. The core never sees a
/// concrete backend; tests inject [`MemoryStore`] or a failing double.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// One file per sanitized key beneath a data directory.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root).with_context(|| {
            format!("failed to create storage directory '{}'", root.display())
        })?;
        Ok(Self { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let sanitized: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.root.join(format!("{sanitized}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => {
                Err(err).with_context(|| format!("failed to read '{}'", path.display()))
            }
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, value).with_context(|| format!("failed to write '{}'", path.display()))
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => {
                Err(err).with_context(|| format!("failed to remove '{}'", path.display()))
            }
        }
    }
}

/// The formation persistence contract on top of a [`KeyValueStore`].
///
/// Timestamps round-trip through RFC 3339 text and come back as
/// `DateTime<Utc>` values.
#[derive(Clone)]
pub struct FormationArchive {
    store: Arc<dyn KeyValueStore>,
}

impl FormationArchive {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Reads the auto-saved formation. Absent, unreadable, and unparseable
    /// all collapse to `None`; the caller starts from an empty formation.
    pub fn current_formation(&self) -> Option<Formation> {
        let raw = match self.store.get(CURRENT_FORMATION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!("failed to read current formation: {err:#}");
                return None;
            }
        };
        match serde_json::from_str(&raw) {
            Ok(formation) => Some(formation),
            Err(err) => {
                warn!("discarding unparseable current formation: {err}");
                None
            }
        }
    }

    pub fn store_current(&self, formation: &Formation) -> Result<()> {
        let raw =
            serde_json::to_string(formation).context("failed to serialize current formation")?;
        self.store.set(CURRENT_FORMATION_KEY, &raw)
    }

    pub fn saved_formations(&self) -> Result<Vec<Formation>> {
        let Some(raw) = self.store.get(SAVED_FORMATIONS_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(formations) => Ok(formations),
            Err(err) => {
                warn!("discarding unparseable saved-formation list: {err}");
                Ok(Vec::new())
            }
        }
    }

    pub fn formation_by_id(&self, id: Uuid) -> Result<Option<Formation>> {
        Ok(self
            .saved_formations()?
            .into_iter()
            .find(|formation| formation.id == Some(id)))
    }

    /// Upserts by id. Mints an id and `created_at` when missing and always
    /// refreshes `updated_at`. Returns the stamped copy as stored.
    pub fn save(&self, formation: &Formation) -> Result<Formation> {
        let now = Utc::now();
        let mut stamped = formation.clone();
        if stamped.id.is_none() {
            stamped.id = Some(Uuid::new_v4());
        }
        if stamped.created_at.is_none() {
            stamped.created_at = Some(now);
        }
        stamped.updated_at = Some(now);

        let mut formations = self.saved_formations()?;
        match formations
            .iter_mut()
            .find(|existing| existing.id == stamped.id)
        {
            Some(existing) => *existing = stamped.clone(),
            None => formations.push(stamped.clone()),
        }
        self.write_saved(&formations)?;
        Ok(stamped)
    }

    pub fn save_as(&self, formation: &Formation, name: &str) -> Result<Formation> {
        let mut named = formation.clone();
        named.name = Some(name.to_string());
        self.save(&named)
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        let mut formations = self.saved_formations()?;
        formations.retain(|formation| formation.id != Some(id));
        self.write_saved(&formations)
    }

    /// No-op when the id is unknown.
    pub fn rename(&self, id: Uuid, new_name: &str) -> Result<()> {
        let mut formations = self.saved_formations()?;
        let Some(existing) = formations
            .iter_mut()
            .find(|formation| formation.id == Some(id))
        else {
            return Ok(());
        };
        existing.name = Some(new_name.to_string());
        existing.updated_at = Some(Utc::now());
        self.write_saved(&formations)
    }

    pub fn duplicate(&self, id: Uuid) -> Result<Option<Formation>> {
        let Some(existing) = self.formation_by_id(id)? else {
            return Ok(None);
        };
        let now = Utc::now();
        let copy = Formation {
            id: Some(Uuid::new_v4()),
            name: Some(match &existing.name {
                Some(name) => format!("{name} (Copy)"),
                None => "Untitled (Copy)".to_string(),
            }),
            created_at: Some(now),
            updated_at: Some(now),
            ..existing
        };
        let mut formations = self.saved_formations()?;
        formations.push(copy.clone());
        self.write_saved(&formations)?;
        Ok(Some(copy))
    }

    pub fn export_json(&self, id: Uuid) -> Result<Option<String>> {
        let Some(formation) = self.formation_by_id(id)? else {
            return Ok(None);
        };
        let envelope = FormationExport {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            formation,
        };
        let raw = serde_json::to_string_pretty(&envelope)
            .context("failed to serialize export envelope")?;
        Ok(Some(raw))
    }

    /// Accepts either a [`FormationExport`] envelope or a bare formation.
    /// Always mints a fresh identity and fresh timestamps for the imported
    /// copy. Parse failure is `Ok(None)`; only backend failure is `Err`.
    pub fn import_json(&self, raw: &str) -> Result<Option<Formation>> {
        let payload: ImportPayload = match serde_json::from_str(raw) {
            Ok(payload) => payload,
            Err(err) => {
                warn!("rejecting formation import: {err}");
                return Ok(None);
            }
        };
        let mut formation = match payload {
            ImportPayload::Envelope(envelope) => envelope.formation,
            ImportPayload::Bare(formation) => formation,
        };
        let now = Utc::now();
        formation.id = Some(Uuid::new_v4());
        formation.created_at = Some(now);
        formation.updated_at = Some(now);

        let mut formations = self.saved_formations()?;
        formations.push(formation.clone());
        self.write_saved(&formations)?;
        Ok(Some(formation))
    }

    fn write_saved(&self, formations: &[Formation]) -> Result<()> {
        let raw = serde_json::to_string(formations)
            .context("failed to serialize saved formations")?;
        self.store.set(SAVED_FORMATIONS_KEY, &raw)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ImportPayload {
    Envelope(FormationExport),
    Bare(Formation),
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
