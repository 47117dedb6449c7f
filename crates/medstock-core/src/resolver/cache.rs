//! Per-clinic catalog snapshot owned by the caller.

use tracing::debug;

use crate::models::MedicationCatalogEntry;

/// Holds the catalog of the clinic currently being queried.
///
/// The snapshot is reloaded whenever a different clinic is requested or after
/// [`CatalogCache::invalidate`]. The resolver never reads the cache itself;
/// callers pass the returned slice in.
#[derive(Debug, Default)]
pub struct CatalogCache {
    snapshot: Option<Snapshot>,
}

#[derive(Debug)]
struct Snapshot {
    clinic_id: String,
    entries: Vec<MedicationCatalogEntry>,
}

impl CatalogCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached catalog for `clinic_id`, loading it through `loader` on a miss.
    ///
    /// A failed load leaves the cache empty so the next call retries.
    pub fn get_or_load<F, E>(&mut self, clinic_id: &str, loader: F) -> Result<&[MedicationCatalogEntry], E>
    where
        F: FnOnce(&str) -> Result<Vec<MedicationCatalogEntry>, E>,
    {
        let hit = matches!(&self.snapshot, Some(s) if s.clinic_id == clinic_id);
        if !hit {
            self.snapshot = None;
            let entries = loader(clinic_id)?;
            debug!(clinic_id, entries = entries.len(), "catalog loaded");
            self.snapshot = Some(Snapshot {
                clinic_id: clinic_id.to_string(),
                entries,
            });
        }

        Ok(self
            .snapshot
            .as_ref()
            .map(|s| s.entries.as_slice())
            .unwrap_or_default())
    }

    /// Drop the snapshot; the next lookup reloads.
    pub fn invalidate(&mut self) {
        self.snapshot = None;
    }

    /// Clinic whose catalog is cached, if any.
    pub fn clinic_id(&self) -> Option<&str> {
        self.snapshot.as_ref().map(|s| s.clinic_id.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn loader_for(calls: &Cell<u32>) -> impl Fn(&str) -> Result<Vec<MedicationCatalogEntry>, String> + '_ {
        move |clinic_id| {
            calls.set(calls.get() + 1);
            Ok(vec![MedicationCatalogEntry::new(format!("Remedio {}", clinic_id))])
        }
    }

    #[test]
    fn test_reuses_snapshot_for_same_clinic() {
        let calls = Cell::new(0);
        let mut cache = CatalogCache::new();

        cache.get_or_load("ubs-1", loader_for(&calls)).unwrap();
        let entries = cache.get_or_load("ubs-1", loader_for(&calls)).unwrap();

        assert_eq!(entries[0].name, "Remedio ubs-1");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_reloads_on_clinic_switch() {
        let calls = Cell::new(0);
        let mut cache = CatalogCache::new();

        cache.get_or_load("ubs-1", loader_for(&calls)).unwrap();
        let entries = cache.get_or_load("ubs-2", loader_for(&calls)).unwrap();

        assert_eq!(entries[0].name, "Remedio ubs-2");
        assert_eq!(cache.clinic_id(), Some("ubs-2"));
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_invalidate_forces_reload() {
        let calls = Cell::new(0);
        let mut cache = CatalogCache::new();

        cache.get_or_load("ubs-1", loader_for(&calls)).unwrap();
        cache.invalidate();
        assert!(cache.clinic_id().is_none());
        cache.get_or_load("ubs-1", loader_for(&calls)).unwrap();

        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let mut cache = CatalogCache::new();
        let result: Result<&[MedicationCatalogEntry], String> =
            cache.get_or_load("ubs-1", |_| Err("offline".to_string()));
        assert_eq!(result.unwrap_err(), "offline");
        assert!(cache.clinic_id().is_none());
    }
}
