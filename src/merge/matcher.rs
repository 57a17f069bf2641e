//! Finds standalone version photos and the originals they derive from.

use std::collections::HashSet;

use regex::Regex;
use tracing::{debug, info, warn};

use super::request::MergeRequest;
use crate::error::StoreResult;
use crate::state::store::PhotoStore;

/// `<base> (<label>).<ext>`: the label sits immediately before a 3-4
/// character extension.
pub const VERSION_PATTERN: &str = r"^(.*) \(([A-Za-z0-9_ -]+)\)(\.[A-Za-z0-9]{3,4})$";

/// What a version uri says about its original
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionName {
    /// The uri with " (label)" stripped
    pub original_uri: String,
    /// The label, used as the version's display name
    pub version_name: String,
}

#[derive(Debug, Clone)]
pub struct Matcher {
    pattern: Regex,
}

impl Default for Matcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Matcher {
    pub fn new() -> Self {
        Self {
            pattern: Regex::new(VERSION_PATTERN).expect("VERSION_PATTERN is a valid regex"),
        }
    }

    /// Split a version uri into its original uri and version label
    pub fn parse(&self, uri: &str) -> Option<VersionName> {
        let caps = self.pattern.captures(uri)?;
        Some(VersionName {
            original_uri: format!("{}{}", &caps[1], &caps[3]),
            version_name: caps[2].to_string(),
        })
    }

    /// Scan the whole store for photos that are versions of another photo
    ///
    /// A photo is accepted only when exactly one photo lives at the derived
    /// original uri and both share the same capture time. Anything else is
    /// logged and skipped. The store is never modified.
    pub fn find_merge_candidates<S: PhotoStore + ?Sized>(
        &self,
        store: &S,
    ) -> StoreResult<Vec<MergeRequest>> {
        let mut requests = Vec::new();
        let mut targeted = HashSet::new();

        for photo in store.query_all()? {
            let Some(uri) = photo.original_uri() else {
                debug!(photo = %photo.id, "photo has no original version, skipping");
                continue;
            };
            let Some(parsed) = self.parse(uri) else {
                continue;
            };

            let originals = store.query_by_uri(&parsed.original_uri)?;
            let original = match originals.as_slice() {
                [original] if original.time == photo.time => original,
                [original] => {
                    info!(
                        version = uri,
                        original = %parsed.original_uri,
                        version_time = %photo.time,
                        original_time = %original.time,
                        "capture times differ, not merging"
                    );
                    continue;
                }
                [] => {
                    info!(
                        version = uri,
                        original = %parsed.original_uri,
                        "no original found, not merging"
                    );
                    continue;
                }
                many => {
                    info!(
                        version = uri,
                        original = %parsed.original_uri,
                        matches = many.len(),
                        "ambiguous original, not merging"
                    );
                    continue;
                }
            };

            info!(
                version = uri,
                original = %parsed.original_uri,
                name = %parsed.version_name,
                "version found"
            );
            if !targeted.insert(original.id) {
                warn!(
                    original = %parsed.original_uri,
                    "several versions target the same original, merging them in turn"
                );
            }

            requests.push(MergeRequest {
                original: original.id,
                version: photo.id,
                version_name: parsed.version_name,
                original_uri: parsed.original_uri,
                version_uri: uri.to_string(),
            });
        }

        Ok(requests)
    }
}
