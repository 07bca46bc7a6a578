// Persistence slots: one key holding one serialized document

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default slot key, matching the browser storage key
pub const DEFAULT_KEY: &str = "todos";

/// A named key-value slot that is read once and overwritten wholesale
pub trait Slot {
    /// Key this slot reads and writes
    fn key(&self) -> &str;

    /// Current contents, or `None` if nothing has been written yet
    fn read(&self) -> Result<Option<String>>;

    /// Replace the contents
    fn write(&mut self, contents: &str) -> Result<()>;
}

impl<S: Slot + ?Sized> Slot for Box<S> {
    fn key(&self) -> &str {
        (**self).key()
    }

    fn read(&self) -> Result<Option<String>> {
        (**self).read()
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        (**self).write(contents)
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Slot key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Slot key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid slot key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

// ============================================================================
// SQLite
// ============================================================================

/// Slot stored as a row in a SQLite key-value table
pub struct SqliteSlot {
    key: String,
    db: Connection,
}

impl SqliteSlot {
    /// Open or create `todostore.db` in the given directory
    pub fn open<P: AsRef<Path>>(dir: P, key: &str) -> Result<Self> {
        validate_key(key)?;

        let dir = dir.as_ref();
        fs::create_dir_all(dir).context("Failed to create store directory")?;

        let db_path = dir.join("todostore.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let slot = Self {
            key: key.to_string(),
            db,
        };
        slot.create_schema()?;
        Ok(slot)
    }

    /// Open an in-memory database, mostly useful for tests
    pub fn open_in_memory(key: &str) -> Result<Self> {
        validate_key(key)?;
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let slot = Self {
            key: key.to_string(),
            db,
        };
        slot.create_schema()?;
        Ok(slot)
    }

    fn create_schema(&self) -> Result<()> {
        debug!("Creating slot schema");

        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS slots (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;

        Ok(())
    }
}

impl Slot for SqliteSlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> Result<Option<String>> {
        let value = self
            .db
            .query_row("SELECT value FROM slots WHERE key = ?1", [&self.key], |row| row.get(0))
            .optional()
            .context("Failed to read slot")?;
        Ok(value)
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        let tx = self.db.transaction()?;
        tx.execute(
            "INSERT OR REPLACE INTO slots (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![&self.key, contents, chrono::Utc::now().timestamp_millis()],
        )
        .context("Failed to write slot")?;
        tx.commit()?;

        debug!(key = %self.key, bytes = contents.len(), "Wrote SQLite slot");
        Ok(())
    }
}

// ============================================================================
// JSON file
// ============================================================================

/// Slot stored as `<dir>/<key>.json`
pub struct JsonFileSlot {
    key: String,
    path: PathBuf,
}

impl JsonFileSlot {
    pub fn open<P: AsRef<Path>>(dir: P, key: &str) -> Result<Self> {
        validate_key(key)?;

        let dir = dir.as_ref();
        fs::create_dir_all(dir).context("Failed to create store directory")?;

        Ok(Self {
            key: key.to_string(),
            path: dir.join(format!("{}.json", key)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Slot for JsonFileSlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path).context("Failed to read slot file")?;
        Ok(Some(contents))
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        let tmp_path = self.path.with_extension("json.tmp");
        let lock_path = self.path.with_extension("json.lock");

        // The lock file is never renamed, so every writer locks the same inode.
        // Held until `lock` drops, covering the whole write-then-rename.
        let lock = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .context("Failed to open slot lock file")?;
        lock.lock_exclusive().context("Failed to acquire file lock")?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .context("Failed to open slot file for writing")?;
        file.write_all(contents.as_bytes())?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, &self.path).context("Failed to replace slot file")?;
        drop(lock);

        debug!(path = ?self.path, bytes = contents.len(), "Wrote JSON file slot");
        Ok(())
    }
}

// ============================================================================
// Memory
// ============================================================================

/// Slot held in memory; can be told to reject writes
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    key: String,
    value: Option<String>,
    fail_writes: bool,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self {
            key: DEFAULT_KEY.to_string(),
            ..Self::default()
        }
    }

    /// Slot pre-filled with `contents`
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            value: Some(contents.into()),
            ..Self::new()
        }
    }

    /// Make subsequent writes fail, like a full storage quota
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn contents(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl Slot for MemorySlot {
    fn key(&self) -> &str {
        &self.key
    }

    fn read(&self) -> Result<Option<String>> {
        Ok(self.value.clone())
    }

    fn write(&mut self, contents: &str) -> Result<()> {
        if self.fail_writes {
            return Err(eyre!("Storage quota exceeded"));
        }
        self.value = Some(contents.to_string());
        Ok(())
    }
}
