//! SQLite-backed photo catalog.
//!
//! Photos, their versions and their tags live in four tables. A commit
//! rewrites one photo's rows inside a single transaction.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{TimeZone, Utc};
use rusqlite::{params, Connection, OptionalExtension, Params};
use tracing::{debug, info, warn};

use super::data::{
    uri_to_path, Photo, PhotoId, PhotoVersion, Tag, VersionId, ORIGINAL_VERSION_ID,
    ORIGINAL_VERSION_NAME,
};
use super::store::{DeleteMode, NewPhoto, PhotoStore};
use crate::error::{StoreError, StoreResult};

/// Columns selected for every photo query, in `PhotoRow` order
const PHOTO_COLUMNS: &str = "p.id, p.time, p.description, p.default_version_id";

/// Raw `photos` row before its versions and tags are attached
type PhotoRow = (i64, i64, String, u32);

/// The Library manages the SQLite photo catalog.
/// It stores photos, their version lists, and their tags.
pub struct Library {
    conn: Connection,
    db_path: PathBuf,
}

impl Library {
    /// Open (or create) the catalog at `db_path` and initialize the schema.
    pub fn open(db_path: impl Into<PathBuf>) -> StoreResult<Self> {
        let db_path = db_path.into();

        // Ensure the parent directory exists
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(&db_path)?;
        info!("Catalog opened at {}", db_path.display());

        let mut library = Library { conn, db_path };
        library.init_schema()?;

        Ok(library)
    }

    /// Open a throwaway catalog that lives only in memory
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let mut library = Library {
            conn,
            db_path: PathBuf::from(":memory:"),
        };
        library.init_schema()?;

        Ok(library)
    }

    /// Initialize the database schema.
    /// Creates all necessary tables and indexes if they don't exist.
    fn init_schema(&mut self) -> StoreResult<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS photos (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                time                INTEGER NOT NULL,
                description         TEXT NOT NULL DEFAULT '',
                default_version_id  INTEGER NOT NULL DEFAULT 0,
                imported_at         INTEGER NOT NULL
            );

            -- One row per version; version 0 is the photo's original
            CREATE TABLE IF NOT EXISTS photo_versions (
                photo_id        INTEGER NOT NULL,
                version_id      INTEGER NOT NULL,
                name            TEXT NOT NULL,
                uri             TEXT NOT NULL,
                import_md5      TEXT,
                protected       INTEGER NOT NULL DEFAULT 0,
                PRIMARY KEY(photo_id, version_id),
                FOREIGN KEY(photo_id) REFERENCES photos(id) ON DELETE CASCADE
            );

            CREATE TABLE IF NOT EXISTS tags (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL UNIQUE
            );

            CREATE TABLE IF NOT EXISTS photo_tags (
                photo_id        INTEGER NOT NULL,
                tag_id          INTEGER NOT NULL,
                PRIMARY KEY(photo_id, tag_id),
                FOREIGN KEY(photo_id) REFERENCES photos(id) ON DELETE CASCADE,
                FOREIGN KEY(tag_id) REFERENCES tags(id) ON DELETE CASCADE
            );

            -- Lookups by original uri drive version matching
            CREATE INDEX IF NOT EXISTS idx_photo_versions_uri
            ON photo_versions(uri);",
        )?;

        debug!("Catalog schema initialized");

        Ok(())
    }

    /// Get the path to the database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Find or create a tag by name
    pub fn create_tag(&self, name: &str) -> StoreResult<Tag> {
        self.conn
            .execute("INSERT OR IGNORE INTO tags (name) VALUES (?1)", [name])?;
        let id: i64 = self
            .conn
            .query_row("SELECT id FROM tags WHERE name = ?1", [name], |row| row.get(0))?;

        Ok(Tag::new(id, name))
    }

    /// Run a photo query and attach versions and tags to every row
    fn query_photos<P: Params>(&self, sql: &str, params: P) -> StoreResult<Vec<Photo>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
            })?
            .collect::<Result<Vec<PhotoRow>, _>>()?;

        rows.into_iter().map(|row| self.hydrate(row)).collect()
    }

    fn hydrate(&self, (id, secs, description, default_version_id): PhotoRow) -> StoreResult<Photo> {
        let id = PhotoId(id);
        let time = Utc
            .timestamp_opt(secs, 0)
            .single()
            .ok_or(StoreError::InvalidTimestamp { id, secs })?;

        let mut stmt = self.conn.prepare(
            "SELECT version_id, name, uri, import_md5, protected
             FROM photo_versions
             WHERE photo_id = ?1
             ORDER BY version_id",
        )?;
        let versions = stmt
            .query_map([id.0], |row| {
                Ok(PhotoVersion {
                    version_id: VersionId(row.get(0)?),
                    name: row.get(1)?,
                    uri: row.get(2)?,
                    import_md5: row.get(3)?,
                    protected: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.name
             FROM tags t JOIN photo_tags pt ON pt.tag_id = t.id
             WHERE pt.photo_id = ?1",
        )?;
        let tags = stmt
            .query_map([id.0], |row| Ok(Tag::new(row.get(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(Photo::from_parts(
            id,
            time,
            description,
            VersionId(default_version_id),
            versions,
            tags,
        ))
    }
}

impl PhotoStore for Library {
    fn query_all(&self) -> StoreResult<Vec<Photo>> {
        self.query_photos(&format!("SELECT {PHOTO_COLUMNS} FROM photos p ORDER BY p.id"), [])
    }

    fn query_by_uri(&self, uri: &str) -> StoreResult<Vec<Photo>> {
        self.query_photos(
            &format!(
                "SELECT {PHOTO_COLUMNS}
                 FROM photos p JOIN photo_versions v ON v.photo_id = p.id
                 WHERE v.version_id = ?1 AND v.uri = ?2
                 ORDER BY p.id"
            ),
            params![ORIGINAL_VERSION_ID.0, uri],
        )
    }

    fn get(&self, id: PhotoId) -> StoreResult<Option<Photo>> {
        let row: Option<PhotoRow> = self
            .conn
            .query_row(
                &format!("SELECT {PHOTO_COLUMNS} FROM photos p WHERE p.id = ?1"),
                [id.0],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .optional()?;

        row.map(|row| self.hydrate(row)).transpose()
    }

    fn create_photo(&mut self, new: NewPhoto) -> StoreResult<Photo> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO photos (time, default_version_id, imported_at) VALUES (?1, ?2, ?3)",
            params![new.time.timestamp(), ORIGINAL_VERSION_ID.0, Utc::now().timestamp()],
        )?;
        let id = tx.last_insert_rowid();
        tx.execute(
            "INSERT INTO photo_versions (photo_id, version_id, name, uri, import_md5)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![id, ORIGINAL_VERSION_ID.0, ORIGINAL_VERSION_NAME, new.uri, new.import_md5],
        )?;
        tx.commit()?;

        self.get(PhotoId(id))?
            .ok_or(StoreError::PhotoNotFound { id: PhotoId(id) })
    }

    /// Rewrite the photo's row, versions and tags in one transaction
    fn commit(&mut self, photo: &mut Photo) -> StoreResult<()> {
        let tx = self.conn.transaction()?;

        let updated = tx.execute(
            "UPDATE photos SET time = ?1, description = ?2, default_version_id = ?3 WHERE id = ?4",
            params![
                photo.time.timestamp(),
                photo.description,
                photo.default_version_id.0,
                photo.id.0
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::PhotoNotFound { id: photo.id });
        }

        tx.execute("DELETE FROM photo_versions WHERE photo_id = ?1", [photo.id.0])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO photo_versions (photo_id, version_id, name, uri, import_md5, protected)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;
            for v in photo.versions() {
                stmt.execute(params![
                    photo.id.0,
                    v.version_id.0,
                    v.name,
                    v.uri,
                    v.import_md5,
                    v.protected
                ])?;
            }
        }

        tx.execute("DELETE FROM photo_tags WHERE photo_id = ?1", [photo.id.0])?;
        {
            let mut ensure_tag =
                tx.prepare("INSERT OR IGNORE INTO tags (id, name) VALUES (?1, ?2)")?;
            let mut link = tx.prepare("INSERT INTO photo_tags (photo_id, tag_id) VALUES (?1, ?2)")?;
            for tag in &photo.tags {
                ensure_tag.execute(params![tag.id, tag.name])?;
                link.execute(params![photo.id.0, tag.id])?;
            }
        }

        tx.commit()?;

        debug!(
            "Committed photo {} ({} versions, {} tags)",
            photo.id,
            photo.version_ids().len(),
            photo.tags.len()
        );
        photo.changes = Default::default();

        Ok(())
    }

    fn remove(&mut self, photo: &Photo) -> StoreResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM photo_tags WHERE photo_id = ?1", [photo.id.0])?;
        tx.execute("DELETE FROM photo_versions WHERE photo_id = ?1", [photo.id.0])?;
        let deleted = tx.execute("DELETE FROM photos WHERE id = ?1", [photo.id.0])?;
        if deleted == 0 {
            return Err(StoreError::PhotoNotFound { id: photo.id });
        }
        tx.commit()?;

        Ok(())
    }

    /// Delete a version, removing its file unless `keep_file` is set.
    /// A file that is already gone is not an error.
    fn delete_version(
        &mut self,
        photo: &mut Photo,
        version_id: VersionId,
        mode: DeleteMode,
    ) -> StoreResult<PhotoVersion> {
        let removed = photo.delete_version(version_id, mode.remove_original)?;

        if !mode.keep_file {
            let path = uri_to_path(&removed.uri);
            match std::fs::remove_file(&path) {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Could not remove {}: {}", path.display(), e),
            }
        }

        Ok(removed)
    }

    fn photo_count(&self) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM photos",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Library {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Library")
            .field("db_path", &self.db_path)
            .finish()
    }
}
