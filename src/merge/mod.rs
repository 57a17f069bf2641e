//! Version merging
//!
//! - Finding version photos and their originals (matcher.rs)
//! - Folding them together (merger.rs)
//! - Values passed between the two (request.rs)
//!
//! `run_merge` ties them together behind a single confirmation gate.

pub mod matcher;
pub mod merger;
pub mod request;

use serde::Serialize;
use tracing::info;

use crate::error::StoreResult;
use crate::state::store::PhotoStore;
use matcher::Matcher;
use merger::Merger;
use request::MergeReport;

/// How a batch run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchOutcome {
    /// No version photo had a matching original
    NothingToMerge,
    /// The confirmation gate said no; the store was not touched
    Declined { pending: usize },
    Merged { reports: Vec<MergeReport> },
}

/// Text shown to the confirmation gate
pub fn confirmation_message(pending: usize) -> String {
    let subject = if pending == 1 {
        "1 version photo".to_string()
    } else {
        format!("{pending} version photos")
    };
    format!(
        "This operation will merge {subject} into their originals. \
         Version names are taken from the label in parentheses before the file extension, \
         and the merged photos are removed from the catalog."
    )
}

/// Find every mergeable version, ask once, then merge them all
///
/// `confirm` is called at most once, with the number of pending merges in
/// the message, and never when there is nothing to merge.
pub fn run_merge<S, F>(store: &mut S, confirm: F) -> StoreResult<BatchOutcome>
where
    S: PhotoStore + ?Sized,
    F: FnOnce(&str) -> bool,
{
    let requests = Matcher::new().find_merge_candidates(&*store)?;
    if requests.is_empty() {
        info!("No versions to merge");
        return Ok(BatchOutcome::NothingToMerge);
    }

    if !confirm(&confirmation_message(requests.len())) {
        info!("Merge of {} version(s) declined", requests.len());
        return Ok(BatchOutcome::Declined {
            pending: requests.len(),
        });
    }

    let reports = Merger::new().execute(store, &requests);
    Ok(BatchOutcome::Merged { reports })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::import_folder;
    use crate::state::data::{path_to_uri, Photo, PhotoId};
    use crate::state::library::Library;
    use crate::state::memory::MemoryStore;
    use chrono::{TimeZone, Utc};
    use std::cell::Cell;
    use std::time::{Duration, SystemTime};

    fn store() -> MemoryStore {
        let time = Utc.with_ymd_and_hms(2023, 7, 1, 10, 0, 0).unwrap();
        let mut store = MemoryStore::new();
        store.insert(Photo::new(PhotoId(1), time, "file:///img.jpg"));
        store.insert(Photo::new(PhotoId(2), time, "file:///img (Modified).jpg"));
        store
    }

    #[test]
    fn test_message_carries_count() {
        assert!(confirmation_message(1).contains("1 version photo "));
        assert!(confirmation_message(3).contains("3 version photos"));
    }

    #[test]
    fn test_declined_batch_changes_nothing() {
        let mut store = store();
        let before = store.query_all().unwrap();
        let asked = Cell::new(0);

        let outcome = run_merge(&mut store, |message| {
            asked.set(asked.get() + 1);
            assert!(message.contains("1 version photo"));
            false
        })
        .unwrap();

        assert_eq!(outcome, BatchOutcome::Declined { pending: 1 });
        assert_eq!(asked.get(), 1);
        assert_eq!(store.query_all().unwrap(), before);
    }

    #[test]
    fn test_empty_batch_never_asks() {
        let mut store = MemoryStore::new();
        let outcome = run_merge(&mut store, |_| panic!("should not ask")).unwrap();
        assert_eq!(outcome, BatchOutcome::NothingToMerge);
    }

    #[test]
    fn test_confirmed_batch_merges() {
        let mut store = store();

        let outcome = run_merge(&mut store, |_| true).unwrap();

        let BatchOutcome::Merged { reports } = outcome else {
            panic!("expected a merge, got {outcome:?}");
        };
        assert_eq!(reports.len(), 1);
        assert!(reports[0].is_clean());
        assert!(!store.contains(PhotoId(2)));
        assert_eq!(store.get(PhotoId(1)).unwrap().unwrap().version_ids().len(), 2);

        // A second run finds nothing left to do
        assert_eq!(run_merge(&mut store, |_| true).unwrap(), BatchOutcome::NothingToMerge);
    }

    #[test]
    fn test_imported_folder_merges_in_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let shot = SystemTime::UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        for name in ["img.jpg", "img (Modified).jpg", "other.jpg"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"jpeg").unwrap();
            std::fs::File::options()
                .write(true)
                .open(&path)
                .unwrap()
                .set_modified(shot)
                .unwrap();
        }

        let db = dir.path().join("catalog").join("catalog.db");
        let mut library = Library::open(&db).unwrap();
        let imported = import_folder(&mut library, dir.path()).unwrap();
        assert_eq!(imported.imported_count, 3);

        let outcome = run_merge(&mut library, |_| true).unwrap();
        assert!(matches!(outcome, BatchOutcome::Merged { ref reports } if reports.len() == 1));
        drop(library);

        // Reopen to check what actually reached the database
        let library = Library::open(&db).unwrap();
        assert_eq!(library.photo_count().unwrap(), 2);
        let merged = library
            .query_by_uri(&path_to_uri(&dir.path().join("img.jpg")))
            .unwrap();
        assert_eq!(merged.len(), 1);
        let names: Vec<&str> = merged[0].versions().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["Original", "Modified"]);
        assert!(dir.path().join("img (Modified).jpg").exists());
    }
}
