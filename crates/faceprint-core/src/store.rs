//! In-process profile store.
//!
//! Profiles are kept in insertion order behind a single `RwLock`. Ids come
//! from a counter that only moves forward, so an id is never handed out
//! twice, even after deletion.

use crate::error::{Lookup, ProfileError};
use crate::matcher;
use crate::types::{Embedding, Profile};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot has no free profile ids left")]
    IdsExhausted,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Inner {
    next_id: u64,
    profiles: Vec<Profile>,
}

#[derive(Debug, Default)]
pub struct ProfileStore {
    inner: RwLock<Inner>,
}

impl ProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON snapshot written by [`save`](Self::save).
    ///
    /// A missing file yields an empty store.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no profile snapshot; starting empty");
            return Ok(Self::new());
        }

        let mut inner: Inner = serde_json::from_str(&std::fs::read_to_string(path)?)?;
        let max_id = inner.profiles.iter().filter_map(|p| p.id).max();
        if let Some(max_id) = max_id {
            let after_max = max_id.checked_add(1).ok_or(StoreError::IdsExhausted)?;
            inner.next_id = inner.next_id.max(after_max);
        }
        if inner.next_id == u64::MAX {
            return Err(StoreError::IdsExhausted);
        }

        tracing::info!(
            path = %path.display(),
            profiles = inner.profiles.len(),
            next_id = inner.next_id,
            "loaded profile snapshot"
        );
        Ok(Self {
            inner: RwLock::new(inner),
        })
    }

    /// Overwrite `path` with a JSON snapshot of the store.
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&*self.read())?;
        std::fs::write(path, json)?;
        tracing::debug!(path = %path.display(), "saved profile snapshot");
        Ok(())
    }

    // Poisoning is ignored: every mutation leaves `Inner` consistent.
    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a profile, assigning the next id. Returns the stored copy.
    pub fn insert(&self, mut profile: Profile) -> Profile {
        let mut inner = self.write();
        let id = inner.next_id;
        inner.next_id = id.saturating_add(1);
        profile.id = Some(id);
        inner.profiles.push(profile.clone());
        tracing::info!(id, total = inner.profiles.len(), "profile stored");
        profile
    }

    pub fn get(&self, id: u64) -> Result<Profile, ProfileError> {
        self.read()
            .profiles
            .iter()
            .find(|p| p.id == Some(id))
            .cloned()
            .ok_or(ProfileError::ProfileNotFound(Lookup::Id(id)))
    }

    /// Remove a profile by id, returning it.
    pub fn delete(&self, id: u64) -> Result<Profile, ProfileError> {
        let mut inner = self.write();
        let index = inner
            .profiles
            .iter()
            .position(|p| p.id == Some(id))
            .ok_or(ProfileError::ProfileNotFound(Lookup::Id(id)))?;
        let removed = inner.profiles.remove(index);
        tracing::info!(id, remaining = inner.profiles.len(), "profile deleted");
        Ok(removed)
    }

    /// Remove every profile. Returns how many were removed.
    pub fn delete_all(&self) -> usize {
        let mut inner = self.write();
        let count = inner.profiles.len();
        inner.profiles.clear();
        tracing::info!(count, "all profiles deleted");
        count
    }

    pub fn list(&self) -> Vec<Profile> {
        self.read().profiles.clone()
    }

    pub fn len(&self) -> usize {
        self.read().profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().profiles.is_empty()
    }

    /// Exact-embedding lookup. See [`Embedding::is_identical`].
    pub fn find_by_embedding(&self, embedding: &Embedding) -> Result<Profile, ProfileError> {
        self.with_profiles(|profiles| matcher::find_exact(embedding, profiles).cloned())
    }

    /// Run `f` over a consistent read-locked view of all profiles.
    pub fn with_profiles<R>(&self, f: impl FnOnce(&[Profile]) -> R) -> R {
        f(&self.read().profiles)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::profile_with_embedding;
    use std::sync::Arc;

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("faceprint-{}-{name}", std::process::id()))
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let store = ProfileStore::new();
        let a = store.insert(profile_with_embedding(&[0.0]));
        let b = store.insert(profile_with_embedding(&[1.0]));
        assert_eq!(a.id, Some(0));
        assert_eq!(b.id, Some(1));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let store = ProfileStore::new();
        store.insert(profile_with_embedding(&[0.0]));
        store.insert(profile_with_embedding(&[1.0]));
        store.delete(0).unwrap();
        let c = store.insert(profile_with_embedding(&[2.0]));
        assert_eq!(c.id, Some(2));

        store.delete_all();
        let d = store.insert(profile_with_embedding(&[3.0]));
        assert_eq!(d.id, Some(3));
    }

    #[test]
    fn test_get_and_delete_missing() {
        let store = ProfileStore::new();
        store.insert(profile_with_embedding(&[0.0]));
        assert!(store.get(0).is_ok());
        assert!(matches!(
            store.get(7),
            Err(ProfileError::ProfileNotFound(Lookup::Id(7)))
        ));
        assert!(matches!(
            store.delete(7),
            Err(ProfileError::ProfileNotFound(Lookup::Id(7)))
        ));
    }

    #[test]
    fn test_delete_keeps_order() {
        let store = ProfileStore::new();
        for v in 0..4 {
            store.insert(profile_with_embedding(&[v as f32]));
        }
        let removed = store.delete(1).unwrap();
        assert_eq!(removed.embedding.values, vec![1.0]);
        let ids: Vec<_> = store.list().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![Some(0), Some(2), Some(3)]);
    }

    #[test]
    fn test_delete_all() {
        let store = ProfileStore::new();
        store.insert(profile_with_embedding(&[0.0]));
        store.insert(profile_with_embedding(&[1.0]));
        assert_eq!(store.delete_all(), 2);
        assert!(store.is_empty());
    }

    #[test]
    fn test_find_by_embedding() {
        let store = ProfileStore::new();
        store.insert(profile_with_embedding(&[0.5, 0.5]));
        let found = store
            .find_by_embedding(&Embedding::new(vec![0.5, 0.5]))
            .unwrap();
        assert_eq!(found.id, Some(0));
        assert!(matches!(
            store.find_by_embedding(&Embedding::new(vec![0.5, 0.6])),
            Err(ProfileError::ProfileNotFound(Lookup::Embedding))
        ));
    }

    #[test]
    fn test_concurrent_inserts_get_unique_ids() {
        let store = Arc::new(ProfileStore::new());
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..10 {
                        store.insert(profile_with_embedding(&[(t * 10 + i) as f32]));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids: Vec<u64> = store.list().iter().filter_map(|p| p.id).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..80).collect::<Vec<_>>());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let path = temp_path("roundtrip.json");
        let store = ProfileStore::new();
        store.insert(profile_with_embedding(&[0.0]));
        store.insert(profile_with_embedding(&[1.0]));
        store.delete(1).unwrap();
        store.save(&path).unwrap();

        let loaded = ProfileStore::load(&path).unwrap();
        assert_eq!(loaded.list(), store.list());
        // The counter survives the snapshot, so id 1 stays retired.
        assert_eq!(loaded.insert(profile_with_embedding(&[2.0])).id, Some(2));

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let store = ProfileStore::load(&temp_path("does-not-exist.json")).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_load_rejects_exhausted_ids() {
        let path = temp_path("max-id.json");
        let store = ProfileStore::new();
        store.insert(profile_with_embedding(&[0.0]));
        store.save(&path).unwrap();

        let json = std::fs::read_to_string(&path)
            .unwrap()
            .replace("\"id\": 0", &format!("\"id\": {}", u64::MAX));
        std::fs::write(&path, json).unwrap();
        assert!(matches!(
            ProfileStore::load(&path),
            Err(StoreError::IdsExhausted)
        ));
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_load_rejects_invalid_landmarks() {
        let path = temp_path("bad-landmarks.json");
        std::fs::write(
            &path,
            r#"{"next_id":1,"profiles":[{"id":0,"description":"x","embedding":{"values":[0.0]},
            "artifacts":{"lighting_inconsistency":0.0,"blur_measure":0.0,"asymmetry_score":0.0,
            "texture_score":0.0,"high_freq_artifacts":0.0,"gaze_direction":0.0},
            "landmarks":[{"x":0,"y":0}]}]}"#,
        )
        .unwrap();
        assert!(matches!(ProfileStore::load(&path), Err(StoreError::Json(_))));
        std::fs::remove_file(&path).unwrap();
    }
}
