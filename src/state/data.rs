//! Shared data structures for the photo catalog
//!
//! These structs represent the data model that flows between
//! the store layer and the merge layer. A `Photo` loaded from a store
//! is a detached copy: mutate it, then hand it back to the store's
//! `commit` to persist the changes.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::PhotoError;

/// Scheme prefix used for local files
const FILE_SCHEME: &str = "file://";

/// Turn a local path into the uri form stored in the catalog
///
/// Uris keep the path unescaped, so spaces and parentheses in file names
/// survive as-is (e.g., "file:///pics/IMG_0001 (Modified).jpg").
pub fn path_to_uri(path: &Path) -> String {
    format!("{FILE_SCHEME}{}", path.display())
}

/// Inverse of [`path_to_uri`]. Uris without the file scheme are taken as paths.
pub fn uri_to_path(uri: &str) -> PathBuf {
    PathBuf::from(uri.strip_prefix(FILE_SCHEME).unwrap_or(uri))
}

/// Stable identifier of a photo record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub i64);

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a version, scoped to the photo that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(pub u32);

impl VersionId {
    /// Whether this is the base (unedited) version
    pub fn is_original(self) -> bool {
        self == ORIGINAL_VERSION_ID
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The base version of every photo. Edits get strictly positive ids.
pub const ORIGINAL_VERSION_ID: VersionId = VersionId(0);

/// Display name given to the base version of a newly created photo
pub const ORIGINAL_VERSION_NAME: &str = "Original";

/// One rendition of a photo (the original or an edit)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhotoVersion {
    pub version_id: VersionId,
    /// Display name (e.g., "Original", "Modified")
    pub name: String,
    /// Location of the file backing this version
    pub uri: String,
    /// Checksum recorded at import time, if any
    pub import_md5: Option<String>,
    /// Protected versions were the base of a photo before being reparented
    pub protected: bool,
}

impl PhotoVersion {
    /// Build the base version of a photo
    pub fn original(uri: impl Into<String>) -> Self {
        Self {
            version_id: ORIGINAL_VERSION_ID,
            name: ORIGINAL_VERSION_NAME.to_string(),
            uri: uri.into(),
            import_md5: None,
            protected: false,
        }
    }
}

/// A tag attached to photos
///
/// Two tags with the same id are the same tag, whatever their names say.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: i64,
    pub name: String,
}

impl Tag {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

impl PartialEq for Tag {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Tag {}

impl Hash for Tag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Tag {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tag {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

/// Pending modifications, cleared by the store on commit
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhotoChanges {
    pub data_changed: bool,
}

impl PhotoChanges {
    /// Check if anything needs to be written
    pub fn is_empty(&self) -> bool {
        !self.data_changed
    }
}

/// Represents a single photo in the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct Photo {
    pub id: PhotoId,
    /// Capture timestamp
    pub time: DateTime<Utc>,
    pub description: String,
    pub default_version_id: VersionId,
    versions: BTreeMap<VersionId, PhotoVersion>,
    highest_version_id: VersionId,
    pub tags: BTreeSet<Tag>,
    pub changes: PhotoChanges,
}

impl Photo {
    /// Create a photo with a single base version
    pub fn new(id: PhotoId, time: DateTime<Utc>, uri: impl Into<String>) -> Self {
        Self::from_parts(
            id,
            time,
            String::new(),
            ORIGINAL_VERSION_ID,
            [PhotoVersion::original(uri)],
            BTreeSet::new(),
        )
    }

    /// Rebuild a photo from stored parts (no pending changes)
    pub fn from_parts(
        id: PhotoId,
        time: DateTime<Utc>,
        description: String,
        default_version_id: VersionId,
        versions: impl IntoIterator<Item = PhotoVersion>,
        tags: BTreeSet<Tag>,
    ) -> Self {
        let versions: BTreeMap<VersionId, PhotoVersion> =
            versions.into_iter().map(|v| (v.version_id, v)).collect();
        let highest_version_id = versions
            .keys()
            .next_back()
            .copied()
            .unwrap_or(ORIGINAL_VERSION_ID);

        Self {
            id,
            time,
            description,
            default_version_id,
            versions,
            highest_version_id,
            tags,
            changes: PhotoChanges::default(),
        }
    }

    /// Version ids in creation order
    pub fn version_ids(&self) -> Vec<VersionId> {
        self.versions.keys().copied().collect()
    }

    /// All versions in creation order
    pub fn versions(&self) -> impl Iterator<Item = &PhotoVersion> {
        self.versions.values()
    }

    pub fn version(&self, version_id: VersionId) -> Option<&PhotoVersion> {
        self.versions.get(&version_id)
    }

    /// The canonical location of this photo: the uri of its base version
    pub fn original_uri(&self) -> Option<&str> {
        self.versions.get(&ORIGINAL_VERSION_ID).map(|v| v.uri.as_str())
    }

    pub fn version_name_exists(&self, name: &str) -> bool {
        self.versions.values().any(|v| v.name == name)
    }

    /// Copy a version owned by another photo into this one
    ///
    /// The new version gets the next free id and a placeholder name
    /// ("Reparented", "Reparented (2)", ...) that callers usually rename.
    /// A version that was the base of its former photo is marked protected.
    pub fn create_reparented_version(
        &mut self,
        version: &PhotoVersion,
        is_original: bool,
    ) -> VersionId {
        let name = (1..)
            .map(|n| {
                if n == 1 {
                    "Reparented".to_string()
                } else {
                    format!("Reparented ({n})")
                }
            })
            .find(|candidate| !self.version_name_exists(candidate))
            .unwrap_or_default();

        self.highest_version_id = VersionId(self.highest_version_id.0 + 1);
        let version_id = self.highest_version_id;

        self.versions.insert(
            version_id,
            PhotoVersion {
                version_id,
                name,
                uri: version.uri.clone(),
                import_md5: version.import_md5.clone(),
                protected: is_original,
            },
        );
        self.changes.data_changed = true;

        version_id
    }

    /// Give a version a new display name
    pub fn rename_version(
        &mut self,
        version_id: VersionId,
        new_name: &str,
    ) -> Result<(), PhotoError> {
        if version_id.is_original() {
            return Err(PhotoError::CannotRenameOriginal { photo: self.id });
        }
        if self.version_name_exists(new_name) {
            return Err(PhotoError::VersionNameExists {
                photo: self.id,
                name: new_name.to_string(),
            });
        }

        let version = self
            .versions
            .get_mut(&version_id)
            .ok_or(PhotoError::VersionNotFound {
                photo: self.id,
                version: version_id,
            })?;
        version.name = new_name.to_string();
        self.changes.data_changed = true;

        Ok(())
    }

    /// Drop a version from this photo and return it
    ///
    /// The base version can only be removed with `remove_original`.
    /// The default version falls back to the highest remaining id.
    pub fn delete_version(
        &mut self,
        version_id: VersionId,
        remove_original: bool,
    ) -> Result<PhotoVersion, PhotoError> {
        if version_id.is_original() && !remove_original {
            return Err(PhotoError::CannotDeleteOriginal { photo: self.id });
        }

        let removed = self
            .versions
            .remove(&version_id)
            .ok_or(PhotoError::VersionNotFound {
                photo: self.id,
                version: version_id,
            })?;
        self.changes.data_changed = true;

        if let Some(&highest) = self.versions.keys().next_back() {
            self.default_version_id = highest;
        }

        Ok(removed)
    }

    /// Union another tag set into this photo's tags
    ///
    /// A tag whose id is already present is left as it is.
    pub fn add_tags<'a>(&mut self, tags: impl IntoIterator<Item = &'a Tag>) {
        for tag in tags {
            if self.tags.insert(tag.clone()) {
                self.changes.data_changed = true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn photo(uri: &str) -> Photo {
        let time = Utc.with_ymd_and_hms(2021, 6, 1, 12, 0, 0).unwrap();
        Photo::new(PhotoId(1), time, uri)
    }

    #[test]
    fn test_uri_path_conversion() {
        let path = Path::new("/pics/IMG_0001 (Modified).jpg");
        let uri = path_to_uri(path);
        assert_eq!(uri, "file:///pics/IMG_0001 (Modified).jpg");
        assert_eq!(uri_to_path(&uri), path);
        assert_eq!(uri_to_path("/plain/path.jpg"), Path::new("/plain/path.jpg"));
    }

    #[test]
    fn test_new_photo_has_original_only() {
        let p = photo("file:///pics/img.jpg");
        assert_eq!(p.version_ids(), vec![ORIGINAL_VERSION_ID]);
        assert_eq!(p.original_uri(), Some("file:///pics/img.jpg"));
        assert!(p.changes.is_empty());
    }

    #[test]
    fn test_reparent_allocates_next_id_and_placeholder_name() {
        let mut p = photo("file:///pics/img.jpg");
        let source = PhotoVersion::original("file:///pics/img (Modified).jpg");

        let first = p.create_reparented_version(&source, true);
        let second = p.create_reparented_version(&source, false);

        assert_eq!(first, VersionId(1));
        assert_eq!(second, VersionId(2));
        assert_eq!(p.version(first).unwrap().name, "Reparented");
        assert_eq!(p.version(second).unwrap().name, "Reparented (2)");
        assert!(p.version(first).unwrap().protected);
        assert!(!p.version(second).unwrap().protected);
        assert_eq!(p.version(first).unwrap().uri, source.uri);
    }

    #[test]
    fn test_rename_rules() {
        let mut p = photo("file:///pics/img.jpg");
        let id = p.create_reparented_version(&PhotoVersion::original("file:///x.jpg"), false);

        assert!(matches!(
            p.rename_version(ORIGINAL_VERSION_ID, "Other"),
            Err(PhotoError::CannotRenameOriginal { .. })
        ));
        assert!(matches!(
            p.rename_version(id, ORIGINAL_VERSION_NAME),
            Err(PhotoError::VersionNameExists { .. })
        ));
        assert!(matches!(
            p.rename_version(VersionId(9), "Other"),
            Err(PhotoError::VersionNotFound { .. })
        ));

        p.rename_version(id, "Modified").unwrap();
        assert_eq!(p.version(id).unwrap().name, "Modified");
    }

    #[test]
    fn test_delete_original_requires_flag() {
        let mut p = photo("file:///pics/img.jpg");
        assert!(p.delete_version(ORIGINAL_VERSION_ID, false).is_err());

        let removed = p.delete_version(ORIGINAL_VERSION_ID, true).unwrap();
        assert_eq!(removed.uri, "file:///pics/img.jpg");
        assert!(p.version_ids().is_empty());
        assert!(p.changes.data_changed);
    }

    #[test]
    fn test_delete_moves_default_to_highest_remaining() {
        let mut p = photo("file:///pics/img.jpg");
        let v = PhotoVersion::original("file:///x.jpg");
        p.create_reparented_version(&v, false);
        let top = p.create_reparented_version(&v, false);
        p.default_version_id = top;

        p.delete_version(top, false).unwrap();
        assert_eq!(p.default_version_id, VersionId(1));

        // Ids are never reused after a delete
        assert_eq!(p.create_reparented_version(&v, false), VersionId(3));
    }

    #[test]
    fn test_add_tags_is_a_union() {
        let mut p = photo("file:///pics/img.jpg");
        p.add_tags(&[Tag::new(1, "Family")]);
        p.changes = PhotoChanges::default();

        p.add_tags(&[Tag::new(1, "Family"), Tag::new(2, "Beach")]);

        assert_eq!(p.tags.len(), 2);
        assert!(p.changes.data_changed);

        p.changes = PhotoChanges::default();
        p.add_tags(&[Tag::new(2, "Beach")]);
        assert!(p.changes.is_empty());
    }

    #[test]
    fn test_tag_identity_is_the_id() {
        let mut p = photo("file:///pics/img.jpg");
        p.add_tags(&[Tag::new(1, "A"), Tag::new(1, "a")]);

        assert_eq!(p.tags.len(), 1);
        assert_eq!(p.tags.iter().next().unwrap().name, "A");
        assert_eq!(Tag::new(7, "x"), Tag::new(7, "y"));
        assert_ne!(Tag::new(7, "x"), Tag::new(8, "x"));
    }
}
