//! Folds version photos into their originals.
//!
//! Every request is executed best-effort: a failing step is recorded in
//! the request's [`MergeReport`] and the merge moves on to the next step,
//! the next version, or the next request. Nothing is rolled back.

use tracing::{debug, info, warn};

use super::request::{MergeReport, MergeRequest, MergeState, MergeStep};
use crate::error::{StoreError, StoreResult};
use crate::state::data::{Photo, PhotoId};
use crate::state::store::{DeleteMode, PhotoStore};

/// Versions of the dissolved photo now live on the original, so their
/// files stay on disk.
const DISSOLVE: DeleteMode = DeleteMode {
    remove_original: true,
    keep_file: true,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct Merger;

impl Merger {
    pub fn new() -> Self {
        Self
    }

    /// Execute every request in order and report on each
    pub fn execute<S: PhotoStore + ?Sized>(
        &self,
        store: &mut S,
        requests: &[MergeRequest],
    ) -> Vec<MergeReport> {
        info!("Starting merge of {} version(s)", requests.len());

        let reports: Vec<MergeReport> = requests.iter().map(|r| self.merge(store, r)).collect();

        let clean = reports.iter().filter(|r| r.is_clean()).count();
        info!(
            "Merge finished: {} clean, {} with skipped steps",
            clean,
            reports.len() - clean
        );

        reports
    }

    /// Fold one version photo into its original
    pub fn merge<S: PhotoStore + ?Sized>(
        &self,
        store: &mut S,
        request: &MergeRequest,
    ) -> MergeReport {
        let mut report = MergeReport::new(request.clone());
        info!("Merging {} and {}", request.original_uri, request.version_uri);

        let resolved = resolve(store, request.original)
            .and_then(|o| Ok((o, resolve(store, request.version)?)));
        let (mut original, mut version) = match resolved {
            Ok(pair) => pair,
            Err(e) => {
                warn!("Cannot merge {}: {}", request.version_uri, e);
                report.record(MergeStep::Resolve, None, e);
                return report;
            }
        };

        // Every version moves over, in creation order; the last one
        // reparented ends up as the original's default.
        report.state = MergeState::Reparenting;
        for version_id in version.version_ids() {
            let Some(source) = version.version(version_id) else {
                continue;
            };
            let is_original = version_id.is_original();
            let name = if is_original {
                request.version_name.clone()
            } else {
                source.name.clone()
            };

            let new_id = match store.reparent_version(&mut original, source, is_original) {
                Ok(id) => id,
                Err(e) => {
                    warn!(
                        "Reparenting version {} of {} failed: {}",
                        version_id, request.version_uri, e
                    );
                    report.record(MergeStep::Reparent, Some(version_id), e);
                    continue;
                }
            };
            original.default_version_id = new_id;
            report.reparented.push((version_id, new_id));
            debug!(
                "Version {} of photo {} is now version {} of photo {}",
                version_id, version.id, new_id, original.id
            );

            if let Err(e) = store.rename_version(&mut original, new_id, &name) {
                warn!("Renaming version {} to '{}' failed: {}", new_id, name, e);
                report.record(MergeStep::Rename, Some(version_id), e);
            }
        }

        report.state = MergeState::TagMerging;
        original.add_tags(&version.tags);

        // Derived versions go before the base
        report.state = MergeState::Deleting;
        for version_id in version.version_ids().into_iter().rev() {
            if let Err(e) = store.delete_version(&mut version, version_id, DISSOLVE) {
                warn!(
                    "Deleting version {} of {} failed: {}",
                    version_id, request.version_uri, e
                );
                report.record(MergeStep::DeleteVersion, Some(version_id), e);
            }
        }

        original.changes.data_changed = true;
        if let Err(e) = store.commit(&mut original) {
            // The dissolved photo still holds the only persisted copy of its versions
            warn!(
                "Committing {} failed, keeping {}: {}",
                request.original_uri, request.version_uri, e
            );
            report.record(MergeStep::Commit, None, e);
            return report;
        }
        report.state = MergeState::Committed;

        match store.remove(&version) {
            Ok(()) => report.removed = true,
            Err(e) => {
                warn!("Removing {} failed: {}", request.version_uri, e);
                report.record(MergeStep::Remove, None, e);
            }
        }

        report
    }
}

fn resolve<S: PhotoStore + ?Sized>(store: &S, id: PhotoId) -> StoreResult<Photo> {
    store.get(id)?.ok_or(StoreError::PhotoNotFound { id })
}
