//! The [`PhotoStore`] trait defining the photo catalog interface.
//!
//! Any backend (in-memory, SQLite) implements this trait. Photos handed
//! out by a store are detached copies; a mutation only becomes visible to
//! other readers once the photo is passed back to [`PhotoStore::commit`].

use chrono::{DateTime, Utc};

use crate::error::StoreResult;
use crate::state::data::{Photo, PhotoId, PhotoVersion, VersionId};

/// Everything needed to register a new photo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPhoto {
    /// Uri of the base version
    pub uri: String,
    /// Capture timestamp
    pub time: DateTime<Utc>,
    pub import_md5: Option<String>,
}

impl NewPhoto {
    pub fn new(uri: impl Into<String>, time: DateTime<Utc>) -> Self {
        Self {
            uri: uri.into(),
            time,
            import_md5: None,
        }
    }
}

/// How a version should be deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteMode {
    /// Allow deleting the base version
    pub remove_original: bool,
    /// Leave the version's file on disk
    pub keep_file: bool,
}

/// Storage backend for photo records.
pub trait PhotoStore {
    /// Every photo in the store, in a stable order.
    fn query_all(&self) -> StoreResult<Vec<Photo>>;

    /// Photos whose base version lives at `uri` (zero, one, or many).
    fn query_by_uri(&self, uri: &str) -> StoreResult<Vec<Photo>>;

    /// Load a single photo. Returns `Ok(None)` if it does not exist.
    fn get(&self, id: PhotoId) -> StoreResult<Option<Photo>>;

    /// Register a new photo with a single base version.
    fn create_photo(&mut self, new: NewPhoto) -> StoreResult<Photo>;

    /// Persist a photo's pending changes atomically and clear them.
    fn commit(&mut self, photo: &mut Photo) -> StoreResult<()>;

    /// Delete a photo record.
    fn remove(&mut self, photo: &Photo) -> StoreResult<()>;

    /// Copy `version` onto `target` as a new version.
    fn reparent_version(
        &mut self,
        target: &mut Photo,
        version: &PhotoVersion,
        is_original: bool,
    ) -> StoreResult<VersionId> {
        Ok(target.create_reparented_version(version, is_original))
    }

    /// Rename one of `photo`'s versions.
    fn rename_version(
        &mut self,
        photo: &mut Photo,
        version_id: VersionId,
        new_name: &str,
    ) -> StoreResult<()> {
        photo.rename_version(version_id, new_name)?;
        Ok(())
    }

    /// Delete one of `photo`'s versions.
    ///
    /// Backends that own files override this to honor `mode.keep_file`.
    fn delete_version(
        &mut self,
        photo: &mut Photo,
        version_id: VersionId,
        mode: DeleteMode,
    ) -> StoreResult<PhotoVersion> {
        Ok(photo.delete_version(version_id, mode.remove_original)?)
    }

    /// Number of photos in the store.
    fn photo_count(&self) -> StoreResult<usize> {
        Ok(self.query_all()?.len())
    }
}
