//! Folder import
//!
//! Walks a folder and registers every image file in a store, so a
//! catalog can be built from disk before looking for versions.

use std::path::Path;

use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{StoreError, StoreResult};
use crate::state::data::path_to_uri;
use crate::state::store::{NewPhoto, PhotoStore};

/// Supported image extensions (common formats plus RAW)
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "tif", "tiff", "heic", "webp",
    "nef", "dng", "cr2", "cr3", "arw", "raf", "orf", "rw2",
    "pef", "srw", "erf", "kdc", "dcr", "mos", "raw", "rwl",
];

/// Result of a folder import operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub imported_count: usize,
    /// Files already in the store
    pub skipped_count: usize,
    pub failed_count: usize,
}

/// Whether the path has one of the supported image extensions
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()))
}

/// Import all image files below `folder`
///
/// The file's modification time (whole seconds) stands in for the capture
/// time. A failing file is logged and counted; it never stops the import.
pub fn import_folder<S: PhotoStore + ?Sized>(
    store: &mut S,
    folder: &Path,
) -> StoreResult<ImportResult> {
    let mut result = ImportResult::default();

    info!("Scanning folder: {}", folder.display());

    // Walk the directory tree recursively
    for entry in WalkDir::new(folder)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        // Only process image files (not directories)
        if !path.is_file() || !is_image(path) {
            continue;
        }

        match import_file(store, path) {
            Ok(true) => {
                result.imported_count += 1;
                if result.imported_count % 100 == 0 {
                    info!("Imported {} files...", result.imported_count);
                }
            }
            Ok(false) => result.skipped_count += 1,
            Err(e) => {
                warn!("Error importing {}: {}", path.display(), e);
                result.failed_count += 1;
            }
        }
    }

    info!(
        "Import complete: {} new, {} skipped, {} failed",
        result.imported_count, result.skipped_count, result.failed_count
    );

    Ok(result)
}

/// Returns `Ok(false)` when the file is already in the store
fn import_file<S: PhotoStore + ?Sized>(store: &mut S, path: &Path) -> StoreResult<bool> {
    let uri = path_to_uri(path);
    if !store.query_by_uri(&uri)?.is_empty() {
        debug!("Already imported: {}", uri);
        return Ok(false);
    }

    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let time = DateTime::<Utc>::from(modified).trunc_subsecs(0);

    store.create_photo(NewPhoto::new(uri, time))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::memory::MemoryStore;

    #[test]
    fn test_is_image() {
        assert!(is_image(Path::new("/a/IMG_0001.JPG")));
        assert!(is_image(Path::new("/a/IMG_0001 (Modified).jpeg")));
        assert!(is_image(Path::new("/a/DSC_0001.nef")));
        assert!(!is_image(Path::new("/a/notes.txt")));
        assert!(!is_image(Path::new("/a/jpg")));
    }

    #[test]
    fn test_import_walks_and_skips_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();
        for name in ["a.jpg", "a (Modified).jpg", "notes.txt", "sub/b.png"] {
            std::fs::write(dir.path().join(name), b"data").unwrap();
        }

        let mut store = MemoryStore::new();
        let first = import_folder(&mut store, dir.path()).unwrap();
        assert_eq!(first.imported_count, 3);
        assert_eq!(first.skipped_count, 0);

        let second = import_folder(&mut store, dir.path()).unwrap();
        assert_eq!(second.imported_count, 0);
        assert_eq!(second.skipped_count, 3);
        assert_eq!(store.photo_count().unwrap(), 3);

        let uri = path_to_uri(&dir.path().join("sub").join("b.png"));
        let found = store.query_by_uri(&uri).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].time.timestamp_subsec_nanos(), 0);
    }
}
