//! In-memory photo store for testing and ephemeral use.
//!
//! [`MemoryStore`] keeps every photo in a `BTreeMap` keyed by id, so
//! enumeration order is stable. Data is lost when the store is dropped,
//! and no file on disk is ever touched.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{StoreError, StoreResult};
use crate::state::data::{Photo, PhotoChanges, PhotoId, PhotoVersion, ORIGINAL_VERSION_ID};
use crate::state::store::{NewPhoto, PhotoStore};

#[derive(Debug, Default)]
pub struct MemoryStore {
    photos: BTreeMap<PhotoId, Photo>,
    next_id: i64,
    commits: BTreeMap<PhotoId, usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully built photo, replacing any photo with the same id
    pub fn insert(&mut self, mut photo: Photo) {
        photo.changes = PhotoChanges::default();
        self.next_id = self.next_id.max(photo.id.0);
        self.photos.insert(photo.id, photo);
    }

    /// How many times `id` has been committed
    pub fn commit_count(&self, id: PhotoId) -> usize {
        self.commits.get(&id).copied().unwrap_or(0)
    }

    pub fn contains(&self, id: PhotoId) -> bool {
        self.photos.contains_key(&id)
    }
}

impl PhotoStore for MemoryStore {
    fn query_all(&self) -> StoreResult<Vec<Photo>> {
        Ok(self.photos.values().cloned().collect())
    }

    fn query_by_uri(&self, uri: &str) -> StoreResult<Vec<Photo>> {
        Ok(self
            .photos
            .values()
            .filter(|p| p.original_uri() == Some(uri))
            .cloned()
            .collect())
    }

    fn get(&self, id: PhotoId) -> StoreResult<Option<Photo>> {
        Ok(self.photos.get(&id).cloned())
    }

    fn create_photo(&mut self, new: NewPhoto) -> StoreResult<Photo> {
        self.next_id += 1;
        let mut original = PhotoVersion::original(new.uri);
        original.import_md5 = new.import_md5;
        let photo = Photo::from_parts(
            PhotoId(self.next_id),
            new.time,
            String::new(),
            ORIGINAL_VERSION_ID,
            [original],
            BTreeSet::new(),
        );

        self.photos.insert(photo.id, photo.clone());
        Ok(photo)
    }

    fn commit(&mut self, photo: &mut Photo) -> StoreResult<()> {
        if !self.photos.contains_key(&photo.id) {
            return Err(StoreError::PhotoNotFound { id: photo.id });
        }

        photo.changes = PhotoChanges::default();
        self.photos.insert(photo.id, photo.clone());
        *self.commits.entry(photo.id).or_default() += 1;
        Ok(())
    }

    fn remove(&mut self, photo: &Photo) -> StoreResult<()> {
        self.photos
            .remove(&photo.id)
            .map(|_| ())
            .ok_or(StoreError::PhotoNotFound { id: photo.id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_create_and_query_by_uri() {
        let mut store = MemoryStore::new();
        let time = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();

        let a = store.create_photo(NewPhoto::new("file:///a.jpg", time)).unwrap();
        store.create_photo(NewPhoto::new("file:///b.jpg", time)).unwrap();

        let found = store.query_by_uri("file:///a.jpg").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, a.id);
        assert!(store.query_by_uri("file:///c.jpg").unwrap().is_empty());
        assert_eq!(store.photo_count().unwrap(), 2);
    }

    #[test]
    fn test_loaded_photos_are_detached_until_commit() {
        let mut store = MemoryStore::new();
        let time = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let id = store.create_photo(NewPhoto::new("file:///a.jpg", time)).unwrap().id;

        let mut photo = store.get(id).unwrap().unwrap();
        photo.description = "edited".into();
        assert_eq!(store.get(id).unwrap().unwrap().description, "");

        photo.changes.data_changed = true;
        store.commit(&mut photo).unwrap();
        assert!(photo.changes.is_empty());
        assert_eq!(store.get(id).unwrap().unwrap().description, "edited");
        assert_eq!(store.commit_count(id), 1);
    }

    #[test]
    fn test_remove_missing_photo_fails() {
        let mut store = MemoryStore::new();
        let time = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        let photo = store.create_photo(NewPhoto::new("file:///a.jpg", time)).unwrap();

        store.remove(&photo).unwrap();
        assert!(!store.contains(photo.id));
        assert!(matches!(store.remove(&photo), Err(StoreError::PhotoNotFound { .. })));
    }
}
