//! Values passed from the matcher to the merger, and what comes back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::state::data::{PhotoId, VersionId};

/// One standalone version photo to fold into its original
///
/// Holds ids only; both photos are loaded fresh from the store when the
/// request is executed, so a request never acts on a stale copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeRequest {
    /// Photo that absorbs the versions
    pub original: PhotoId,
    /// Photo that is dissolved
    pub version: PhotoId,
    /// Name given to the absorbed base version (the label in parentheses)
    pub version_name: String,
    pub original_uri: String,
    pub version_uri: String,
}

/// Progress of a single request through the merger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeState {
    Pending,
    Reparenting,
    TagMerging,
    Deleting,
    Committed,
}

/// The store call a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStep {
    Resolve,
    Reparent,
    Rename,
    DeleteVersion,
    Commit,
    Remove,
}

impl fmt::Display for MergeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MergeStep::Resolve => "resolve",
            MergeStep::Reparent => "reparent",
            MergeStep::Rename => "rename",
            MergeStep::DeleteVersion => "delete version",
            MergeStep::Commit => "commit",
            MergeStep::Remove => "remove",
        };
        f.write_str(name)
    }
}

/// A step that failed and was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub step: MergeStep,
    /// Version of the dissolved photo the step was working on, if any
    pub version_id: Option<VersionId>,
    pub error: String,
}

/// Outcome of executing one [`MergeRequest`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub request: MergeRequest,
    /// Furthest state reached
    pub state: MergeState,
    /// `(old id on the dissolved photo, new id on the original)` pairs
    pub reparented: Vec<(VersionId, VersionId)>,
    /// Whether the dissolved photo's record was dropped from the store
    pub removed: bool,
    pub failures: Vec<StepFailure>,
}

impl MergeReport {
    pub fn new(request: MergeRequest) -> Self {
        Self {
            request,
            state: MergeState::Pending,
            reparented: Vec::new(),
            removed: false,
            failures: Vec::new(),
        }
    }

    pub fn record(
        &mut self,
        step: MergeStep,
        version_id: Option<VersionId>,
        error: impl fmt::Display,
    ) {
        self.failures.push(StepFailure {
            step,
            version_id,
            error: error.to_string(),
        });
    }

    /// Committed, removed, and nothing skipped along the way
    pub fn is_clean(&self) -> bool {
        self.state == MergeState::Committed && self.removed && self.failures.is_empty()
    }
}
