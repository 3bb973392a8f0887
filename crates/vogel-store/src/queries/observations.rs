//! Observation CRUD operations and filtered listing.

use vogel_core::Result;

use crate::models::BirdObservation;
use crate::store::JsonStore;

/// Filters for [`list_observations`].
///
/// Date bounds compare the stored ISO strings lexicographically, which
/// orders correctly as long as dates share a format.
#[derive(Debug, Clone, Default)]
pub struct ObservationFilter {
    pub species_id: Option<String>,
    /// Inclusive lower bound.
    pub date_from: Option<String>,
    /// Exclusive upper bound.
    pub date_to: Option<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

/// List observations matching `filter`, in stored order.
pub fn list_observations(
    store: &JsonStore,
    filter: &ObservationFilter,
) -> Result<Vec<BirdObservation>> {
    store.read(|db| {
        let matching = db.observations.iter().filter(|o| {
            filter
                .species_id
                .as_deref()
                .map_or(true, |id| o.species_id == id)
                && filter
                    .date_from
                    .as_deref()
                    .map_or(true, |from| o.date.as_str() >= from)
                && filter
                    .date_to
                    .as_deref()
                    .map_or(true, |to| o.date.as_str() < to)
        });

        let page = matching.skip(filter.offset);
        match filter.limit {
            Some(limit) => page.take(limit).cloned().collect(),
            None => page.cloned().collect(),
        }
    })
}

/// Get an observation by ID.
pub fn get_observation(store: &JsonStore, id: &str) -> Result<Option<BirdObservation>> {
    store.read(|db| db.observations.iter().find(|o| o.id == id).cloned())
}

/// Replace the observation with the same ID, or append it.
pub fn upsert_observation(store: &JsonStore, obs: BirdObservation) -> Result<BirdObservation> {
    store.mutate(|db| {
        match db.observations.iter_mut().find(|o| o.id == obs.id) {
            Some(existing) => *existing = obs.clone(),
            None => db.observations.push(obs.clone()),
        }
        (obs, true)
    })
}

/// Delete an observation. Returns whether it existed.
pub fn delete_observation(store: &JsonStore, id: &str) -> Result<bool> {
    store.mutate(|db| {
        let before = db.observations.len();
        db.observations.retain(|o| o.id != id);
        let deleted = db.observations.len() != before;
        (deleted, deleted)
    })
}

/// Number of stored observations.
pub fn observation_count(store: &JsonStore) -> Result<usize> {
    store.read(|db| db.observations.len())
}
