//! Species CRUD operations.

use vogel_core::Result;

use crate::models::BirdSpecies;
use crate::store::JsonStore;

/// List all species in stored order.
pub fn list_species(store: &JsonStore) -> Result<Vec<BirdSpecies>> {
    store.read(|db| db.species.clone())
}

/// Get a species by ID.
pub fn get_species(store: &JsonStore, id: &str) -> Result<Option<BirdSpecies>> {
    store.read(|db| db.species.iter().find(|s| s.id == id).cloned())
}

/// Replace the species with the same ID, or append it.
pub fn upsert_species(store: &JsonStore, species: BirdSpecies) -> Result<BirdSpecies> {
    store.mutate(|db| {
        match db.species.iter_mut().find(|s| s.id == species.id) {
            Some(existing) => *existing = species.clone(),
            None => db.species.push(species.clone()),
        }
        (species, true)
    })
}

/// Delete a species together with all of its observations.
///
/// Returns `false` (and leaves the file untouched) if no species had this ID.
pub fn delete_species(store: &JsonStore, id: &str) -> Result<bool> {
    store.mutate(|db| {
        let before = db.species.len();
        db.species.retain(|s| s.id != id);
        let deleted = db.species.len() != before;
        // Orphans of an unknown id stay; the delete is a 404 and writes nothing.
        if deleted {
            db.observations.retain(|o| o.species_id != id);
        }
        (deleted, deleted)
    })
}

/// Number of stored species.
pub fn species_count(store: &JsonStore) -> Result<usize> {
    store.read(|db| db.species.len())
}

/// Whether any observation references this species.
pub fn species_has_observations(store: &JsonStore, id: &str) -> Result<bool> {
    store.read(|db| db.observations.iter().any(|o| o.species_id == id))
}
