// Key-value persistence backends

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use rusqlite::{Connection, OptionalExtension};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CURRENT_VERSION: u32 = 1;

/// Durable string storage addressed by key
pub trait Storage {
    /// Read the value stored under `key`, or `None` if nothing was saved yet
    fn load(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`
    fn save(&mut self, key: &str, value: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).save(key, value)
    }
}

// ============================================================================
// In-memory
// ============================================================================

/// Volatile storage, mostly for tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value directly, bypassing the store
    pub fn with_value(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// Files
// ============================================================================

/// One `<key>.json` file per key inside a data directory
///
/// The data directory stays exclusively locked until the storage is dropped,
/// so a second process blocks in `open` instead of overwriting this one's saves.
#[derive(Debug)]
pub struct FileStorage {
    base_path: PathBuf,
    _lock: fs::File,
}

impl FileStorage {
    /// Open or create file storage in `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).context("Failed to create data directory")?;
        let lock = lock_data_dir(&base_path)?;

        let storage = Self { base_path, _lock: lock };
        storage.write_version()?;

        debug!(path = %storage.base_path.display(), "Opened file storage");
        Ok(storage)
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(version_path, CURRENT_VERSION.to_string())?;
        }
        Ok(())
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(content))
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;

        let path = self.key_path(key);
        let tmp_path = self.base_path.join(format!(".{}.json.tmp", key));

        let mut file = fs::File::create(&tmp_path).context("Failed to create temp file")?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        fs::rename(&tmp_path, &path).with_context(|| format!("Failed to replace {}", path.display()))?;

        debug!(key, bytes = value.len(), "Saved value to file");
        Ok(())
    }
}

// ============================================================================
// SQLite
// ============================================================================

/// Values kept in a single SQLite table
///
/// On-disk databases hold the same data directory lock as [`FileStorage`].
pub struct SqliteStorage {
    db: Connection,
    _lock: Option<fs::File>,
}

impl SqliteStorage {
    /// Open or create `todostore.db` inside `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref();
        fs::create_dir_all(base_path).context("Failed to create data directory")?;
        let lock = lock_data_dir(base_path)?;

        let db_path = base_path.join("todostore.db");
        let db = Connection::open(&db_path).context("Failed to open SQLite database")?;

        let storage = Self { db, _lock: Some(lock) };
        storage.create_schema()?;

        debug!(path = %db_path.display(), "Opened SQLite storage");
        Ok(storage)
    }

    /// In-memory database, mainly for tests
    pub fn open_in_memory() -> Result<Self> {
        let db = Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let storage = Self { db, _lock: None };
        storage.create_schema()?;
        Ok(storage)
    }

    fn create_schema(&self) -> Result<()> {
        self.db.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );
            "#,
        )?;
        Ok(())
    }
}

impl Storage for SqliteStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let value = self
            .db
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get::<_, String>(0))
            .optional()?;
        Ok(value)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.db.execute(
            "INSERT OR REPLACE INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![key, value, now_ms()],
        )?;
        debug!(key, bytes = value.len(), "Saved value to SQLite");
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Take the exclusive `.lock` on a data directory, waiting for any other holder
fn lock_data_dir(base_path: &Path) -> Result<fs::File> {
    let lock = fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(base_path.join(".lock"))
        .context("Failed to open lock file")?;

    if lock.try_lock_exclusive().is_err() {
        info!(path = %base_path.display(), "Data directory is in use, waiting for lock");
        lock.lock_exclusive().context("Failed to acquire file lock")?;
    }

    Ok(lock)
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Storage key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid storage key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

/// Current time in milliseconds since the Unix epoch
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_memory_storage() {
        let mut storage = MemoryStorage::new();
        assert_eq!(storage.load("tasks").unwrap(), None);

        storage.save("tasks", "[]").unwrap();
        assert_eq!(storage.load("tasks").unwrap(), Some("[]".to_string()));
        assert_eq!(storage.get("tasks"), Some("[]"));
    }

    #[test]
    fn test_file_storage_open_creates_directory() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("data");

        let storage = FileStorage::open(&path).unwrap();
        assert!(path.exists());
        assert!(path.join(".version").exists());
        assert_eq!(storage.base_path(), path.as_path());
    }

    #[test]
    fn test_file_storage_save_and_load() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        assert_eq!(storage.load("darkMode").unwrap(), None);

        storage.save("darkMode", "true").unwrap();
        storage.save("darkMode", "false").unwrap();
        assert_eq!(storage.load("darkMode").unwrap(), Some("false".to_string()));
        assert!(temp.path().join("darkMode.json").exists());
        assert!(!temp.path().join(".darkMode.json.tmp").exists());

        // Survives reopening
        drop(storage);
        let reopened = FileStorage::open(temp.path()).unwrap();
        assert_eq!(reopened.load("darkMode").unwrap(), Some("false".to_string()));
    }

    #[test]
    fn test_file_storage_holds_lock_until_dropped() {
        let temp = TempDir::new().unwrap();
        let storage = FileStorage::open(temp.path()).unwrap();

        let other = fs::OpenOptions::new().write(true).open(temp.path().join(".lock")).unwrap();
        assert!(other.try_lock_exclusive().is_err());

        drop(storage);
        assert!(other.try_lock_exclusive().is_ok());
    }

    #[test]
    fn test_sqlite_storage_holds_lock_until_dropped() {
        let temp = TempDir::new().unwrap();
        let storage = SqliteStorage::open(temp.path()).unwrap();

        let other = fs::OpenOptions::new().write(true).open(temp.path().join(".lock")).unwrap();
        assert!(other.try_lock_exclusive().is_err());

        drop(storage);
        assert!(other.try_lock_exclusive().is_ok());
    }

    #[test]
    fn test_file_storage_rejects_bad_key() {
        let temp = TempDir::new().unwrap();
        let mut storage = FileStorage::open(temp.path()).unwrap();

        assert!(storage.save("../escape", "x").is_err());
        assert!(storage.load("").is_err());
    }

    #[test]
    fn test_sqlite_storage_save_and_load() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        assert_eq!(storage.load("tasks").unwrap(), None);

        storage.save("tasks", "[1]").unwrap();
        storage.save("tasks", "[2]").unwrap();
        assert_eq!(storage.load("tasks").unwrap(), Some("[2]".to_string()));
    }

    #[test]
    fn test_sqlite_storage_persists_to_disk() {
        let temp = TempDir::new().unwrap();
        {
            let mut storage = SqliteStorage::open(temp.path()).unwrap();
            storage.save("tasks", "[]").unwrap();
        }
        assert!(temp.path().join("todostore.db").exists());

        let storage = SqliteStorage::open(temp.path()).unwrap();
        assert_eq!(storage.load("tasks").unwrap(), Some("[]".to_string()));
    }

    #[test]
    fn test_validate_key() {
        assert!(validate_key("tasks").is_ok());
        assert!(validate_key("dark-mode_2").is_ok());

        assert!(validate_key("").is_err());
        assert!(validate_key("a/b").is_err());
        assert!(validate_key(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_boxed_storage() {
        let mut storage: Box<dyn Storage> = Box::new(MemoryStorage::new());
        storage.save("k", "v").unwrap();
        assert_eq!(storage.load("k").unwrap(), Some("v".to_string()));
    }
}
