//! # merge-versions
//!
//! Finds photos in a catalog that are really edited copies of another
//! photo ("IMG_0001 (Modified).jpg" next to "IMG_0001.jpg") and folds them
//! back into their original: every version moves over, tags are unioned,
//! and the leftover record is removed.
//!
//! ```rust,ignore
//! use merge_versions::{run_merge, Library};
//!
//! let mut library = Library::open("catalog.db")?;
//! let outcome = run_merge(&mut library, |message| ask_user(message))?;
//! ```

pub mod config;
pub mod error;
pub mod import;
pub mod merge;
pub mod state;

pub use config::Config;
pub use error::{ConfigError, PhotoError, StoreError, StoreResult};
pub use import::{import_folder, ImportResult};
pub use merge::matcher::Matcher;
pub use merge::merger::Merger;
pub use merge::request::{MergeReport, MergeRequest, MergeState, MergeStep, StepFailure};
pub use merge::{confirmation_message, run_merge, BatchOutcome};
pub use state::data::{Photo, PhotoId, PhotoVersion, Tag, VersionId, ORIGINAL_VERSION_ID};
pub use state::library::Library;
pub use state::memory::MemoryStore;
pub use state::store::{DeleteMode, NewPhoto, PhotoStore};
