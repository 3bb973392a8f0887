//! Single-file JSON store.
//!
//! The whole database lives in memory and is rewritten on every change:
//! serialized to `<file>.tmp` next to the data file, then renamed over it so
//! readers of the file never observe a half-written document. The file is
//! loaded lazily on first access; a missing file starts an empty database
//! and is written immediately.

use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use vogel_core::{Error, Result};

use crate::models::{BirdObservation, BirdSpecies};

/// In-memory contents of the data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Database {
    #[serde(default)]
    pub species: Vec<BirdSpecies>,
    #[serde(default)]
    pub observations: Vec<BirdObservation>,
}

impl Database {
    /// Validate every record, naming the first offender.
    fn validate(&self) -> Result<()> {
        for species in &self.species {
            species
                .validate()
                .map_err(|e| Error::storage(format!("species '{}': {e}", species.id)))?;
        }
        for obs in &self.observations {
            obs.validate()
                .map_err(|e| Error::storage(format!("observation '{}': {e}", obs.id)))?;
        }
        Ok(())
    }
}

/// File-backed store with a process-local lock.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    data: RwLock<Option<Database>>,
}

impl JsonStore {
    /// Create a store for `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: RwLock::new(None),
        }
    }

    /// Create a store and load (or initialise) its file right away, so that
    /// a corrupt file is reported at startup rather than on first request.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(path);
        store.ensure_loaded()?;
        Ok(store)
    }

    /// Path of the backing data file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against a shared view of the database.
    pub fn read<T>(&self, f: impl FnOnce(&Database) -> T) -> Result<T> {
        self.ensure_loaded()?;
        let guard = self.data.read();
        match guard.as_ref() {
            Some(db) => Ok(f(db)),
            None => Err(Error::Internal("store not loaded".into())),
        }
    }

    /// Run `f` against the database under the write lock.
    ///
    /// `f` returns its result together with a "changed" flag; the file is
    /// rewritten only when the flag is set. If saving fails the in-memory
    /// change is rolled back so memory and disk stay in step.
    pub fn mutate<T>(&self, f: impl FnOnce(&mut Database) -> (T, bool)) -> Result<T> {
        self.ensure_loaded()?;
        let mut guard = self.data.write();
        let db = guard
            .as_mut()
            .ok_or_else(|| Error::Internal("store not loaded".into()))?;

        let before = db.clone();
        let (result, changed) = f(db);
        if changed {
            if let Err(e) = save(&self.path, db) {
                *db = before;
                return Err(e);
            }
            tracing::debug!(
                path = %self.path.display(),
                species = db.species.len(),
                observations = db.observations.len(),
                "Data file saved"
            );
        }
        Ok(result)
    }

    fn ensure_loaded(&self) -> Result<()> {
        if self.data.read().is_some() {
            return Ok(());
        }

        let mut guard = self.data.write();
        if guard.is_some() {
            return Ok(());
        }

        let db = if self.path.exists() {
            let db = load(&self.path)?;
            tracing::info!(
                path = %self.path.display(),
                species = db.species.len(),
                observations = db.observations.len(),
                "Data file loaded"
            );
            db
        } else {
            let db = Database::default();
            save(&self.path, &db)?;
            tracing::info!(path = %self.path.display(), "Data file created (new)");
            db
        };

        *guard = Some(db);
        Ok(())
    }
}

fn load(path: &Path) -> Result<Database> {
    let content = std::fs::read_to_string(path)?;
    let db: Database = serde_json::from_str(&content)
        .map_err(|e| Error::storage(format!("Failed to parse {}: {e}", path.display())))?;
    db.validate()?;
    Ok(db)
}

/// Write `db` to `<path>.tmp` and rename it over `path`.
fn save(path: &Path, db: &Database) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(db)
        .map_err(|e| Error::storage(format!("Failed to serialize database: {e}")))?;

    let tmp = tmp_path(path);
    std::fs::write(&tmp, json)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LatLng;

    fn species(id: &str) -> BirdSpecies {
        BirdSpecies {
            id: id.into(),
            common_name: "Amsel".into(),
            scientific_name: "Turdus merula".into(),
            family: "Turdidae".into(),
            conservation_status: None,
            images: Vec::new(),
            recordings: Vec::new(),
        }
    }

    #[test]
    fn missing_file_is_created_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/birds.data.json");
        let store = JsonStore::open(&path).unwrap();

        assert!(path.exists());
        let content: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content, serde_json::json!({"species": [], "observations": []}));
        assert_eq!(store.read(|db| db.species.len()).unwrap(), 0);
    }

    #[test]
    fn load_tolerates_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birds.data.json");
        std::fs::write(
            &path,
            r#"{"species": [{"id": "amsel", "commonName": "Amsel",
                "scientificName": "Turdus merula", "family": "Turdidae"}]}"#,
        )
        .unwrap();

        let store = JsonStore::open(&path).unwrap();
        let (n_species, n_obs) = store
            .read(|db| (db.species.len(), db.observations.len()))
            .unwrap();
        assert_eq!(n_species, 1);
        assert_eq!(n_obs, 0);
    }

    #[test]
    fn corrupt_file_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birds.data.json");
        std::fs::write(&path, "{ this is not json").unwrap();

        let err = JsonStore::open(&path).unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }

    #[test]
    fn invalid_record_is_storage_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birds.data.json");
        std::fs::write(
            &path,
            r#"{"observations": [{"id": "o", "speciesId": "s", "date": "soon",
                "location": {"latitude": 0, "longitude": 0},
                "observer": "x", "title": "y"}]}"#,
        )
        .unwrap();

        let err = JsonStore::open(&path).unwrap_err();
        assert!(err.to_string().contains("observation 'o'"));
    }

    #[test]
    fn mutate_persists_and_leaves_no_tmp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birds.data.json");
        let store = JsonStore::open(&path).unwrap();

        store
            .mutate(|db| {
                db.species.push(species("amsel"));
                ((), true)
            })
            .unwrap();

        assert!(!tmp_path(&path).exists());
        let reopened = JsonStore::open(&path).unwrap();
        let ids = reopened
            .read(|db| db.species.iter().map(|s| s.id.clone()).collect::<Vec<_>>())
            .unwrap();
        assert_eq!(ids, vec!["amsel".to_string()]);
    }

    #[test]
    fn unchanged_mutation_does_not_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birds.data.json");
        let store = JsonStore::open(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        store.mutate(|_| ((), false)).unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn saved_file_is_pretty_and_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birds.data.json");
        let store = JsonStore::open(&path).unwrap();

        store
            .mutate(|db| {
                let mut s = species("gruenfink");
                s.common_name = "Grünfink".into();
                db.species.push(s);
                db.observations.push(BirdObservation {
                    id: "o1".into(),
                    species_id: "gruenfink".into(),
                    date: "2024-05-01".into(),
                    location: LatLng {
                        latitude: 48.1,
                        longitude: 11.5,
                    },
                    observer: "Kim".into(),
                    title: "Feeder".into(),
                    notes: None,
                    image: None,
                    recording: None,
                    mystery: false,
                    include_audio_in_marker: true,
                });
                ((), true)
            })
            .unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Grünfink"));
        assert!(content.contains("\n  \"species\""));
    }

    #[test]
    fn lazy_store_loads_on_first_access() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("birds.data.json");
        let store = JsonStore::new(&path);
        assert!(!path.exists());

        assert_eq!(store.read(|db| db.observations.len()).unwrap(), 0);
        assert!(path.exists());
    }
}
