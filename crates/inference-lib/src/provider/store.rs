//! Swappable slot holding the active model

use super::ModelHandle;
use std::sync::{Arc, RwLock};

/// Shared slot for the active [`ModelHandle`].
///
/// Readers clone the inner `Arc` and release the lock immediately; they keep
/// using that handle even if a reload swaps the slot meanwhile. Writers
/// replace the whole handle in one assignment.
#[derive(Clone, Default)]
pub struct ModelStore {
    current: Arc<RwLock<Option<Arc<ModelHandle>>>>,
}

impl ModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a handle
    pub fn with_handle(handle: ModelHandle) -> Self {
        let store = Self::new();
        store.replace(handle);
        store
    }

    /// Snapshot of the active handle
    pub fn current(&self) -> Option<Arc<ModelHandle>> {
        // A poisoned lock still holds a fully written Option.
        let guard = self.current.read().unwrap_or_else(|e| e.into_inner());
        guard.clone()
    }

    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// Install a new handle, returning the one it replaced
    pub fn replace(&self, handle: ModelHandle) -> Option<Arc<ModelHandle>> {
        self.install(Arc::new(handle))
    }

    /// Install an already shared handle
    pub fn install(&self, handle: Arc<ModelHandle>) -> Option<Arc<ModelHandle>> {
        let mut guard = self.current.write().unwrap_or_else(|e| e.into_inner());
        guard.replace(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Provenance;
    use crate::predictor::{StandardScaler, TreeEnsemble};

    fn handle(file: &str) -> ModelHandle {
        let forest =
            TreeEnsemble::from_json(br#"{"trees": [{"nodes": [{"value": [1.0, 1.0, 1.0]}]}]}"#)
                .unwrap();
        ModelHandle::new(
            Box::new(forest),
            StandardScaler::reference().unwrap(),
            Provenance::LocalFile {
                file: file.to_string(),
            },
        )
    }

    #[test]
    fn test_empty_store() {
        let store = ModelStore::new();
        assert!(!store.is_loaded());
        assert!(store.current().is_none());
    }

    #[test]
    fn test_replace_returns_previous() {
        let store = ModelStore::with_handle(handle("a.json"));
        let previous = store.replace(handle("b.json")).unwrap();
        assert_eq!(
            previous.provenance(),
            &Provenance::LocalFile {
                file: "a.json".to_string()
            }
        );
        assert_eq!(
            store.current().unwrap().provenance(),
            &Provenance::LocalFile {
                file: "b.json".to_string()
            }
        );
    }

    #[test]
    fn test_snapshot_survives_swap() {
        let store = ModelStore::with_handle(handle("old.json"));
        let snapshot = store.current().unwrap();
        store.replace(handle("new.json"));

        assert_eq!(
            snapshot.provenance(),
            &Provenance::LocalFile {
                file: "old.json".to_string()
            }
        );
        assert_eq!(Arc::strong_count(&snapshot), 1);
    }

    #[test]
    fn test_clones_share_slot() {
        let store = ModelStore::new();
        let other = store.clone();
        other.replace(handle("shared.json"));
        assert!(store.is_loaded());
        store.replace(handle("second.json"));
        assert_eq!(
            other.current().unwrap().provenance(),
            &Provenance::LocalFile {
                file: "second.json".to_string()
            }
        );
    }

    #[test]
    fn test_concurrent_readers_see_whole_handles() {
        let store = ModelStore::with_handle(handle("v0.json"));
        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        let current = store.current().expect("handle present");
                        assert!(matches!(current.provenance(), Provenance::LocalFile { .. }));
                    }
                })
            })
            .collect();
        for i in 1..50 {
            store.replace(handle(&format!("v{}.json", i)));
        }
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
