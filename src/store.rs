use crate::workout::{WorkoutEntry, seed_entries};
use std::collections::HashMap;
use std::path::PathBuf;

use dirs_next as dirs;

/// Key under which the serialized entry list is stored.
pub const ENTRIES_KEY: &str = "workoutEntries";

const DATA_DIR_ENV: &str = "HEALTH_TRACKER_DATA_DIR";
const APP_DIR: &str = "health_challenge_tracker";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    Serialize(serde_json::Error),
    NoDataDir,
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(e) => write!(f, "storage I/O error: {e}"),
            StorageError::Serialize(e) => write!(f, "failed to serialize entries: {e}"),
            StorageError::NoDataDir => write!(f, "no data directory available"),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            StorageError::Serialize(e) => Some(e),
            StorageError::NoDataDir => None,
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::Io(e)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialize(e)
    }
}

/// A persistent string key-value store.
pub trait KeyValueStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for Box<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }
}

/// Stores every key as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    dir: PathBuf,
}

impl JsonFileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match std::fs::read_to_string(self.path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.path(key), value)?;
        Ok(())
    }
}

/// Volatile storage, used when no data directory can be resolved.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    values: HashMap<String, String>,
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Determine the directory holding persisted entries.
///
/// `HEALTH_TRACKER_DATA_DIR` takes precedence over the configured directory,
/// which in turn takes precedence over the platform data directory.
pub fn resolve_data_dir(configured: Option<&str>) -> Result<PathBuf, StorageError> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    if let Some(dir) = configured.filter(|d| !d.trim().is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::data_dir()
        .map(|p| p.join(APP_DIR))
        .ok_or(StorageError::NoDataDir)
}

/// Ordered list of workout entries mirrored into a [`KeyValueStorage`].
pub struct EntryStore<S> {
    storage: S,
    entries: Vec<WorkoutEntry>,
}

impl<S: KeyValueStorage> EntryStore<S> {
    /// Read the persisted entries.
    ///
    /// Missing, unreadable or malformed data is treated as absent: the store
    /// is filled with the seed entries, which are written back right away.
    pub fn load(storage: S) -> Self {
        let stored = match storage.get(ENTRIES_KEY) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Could not read stored entries: {e}");
                None
            }
        };
        let parsed = stored.and_then(|data| {
            serde_json::from_str::<Vec<WorkoutEntry>>(&data)
                .map_err(|e| log::warn!("Ignoring malformed stored entries: {e}"))
                .ok()
        });

        let mut store = Self {
            storage,
            entries: Vec::new(),
        };
        match parsed {
            Some(entries) => {
                log::info!("Loaded {} workout entries", entries.len());
                store.entries = entries;
            }
            None => {
                log::info!("No stored entries, using sample data");
                store.entries = seed_entries();
                if let Err(e) = store.save() {
                    log::error!("Failed to persist sample entries: {e}");
                }
            }
        }
        store
    }

    /// Append an entry and write the whole list back to storage.
    ///
    /// The entry is kept in memory even when persisting fails.
    pub fn add(&mut self, entry: WorkoutEntry) -> Result<(), StorageError> {
        self.entries.push(entry);
        self.save()
    }

    pub fn all(&self) -> &[WorkoutEntry] {
        &self.entries
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn save(&mut self) -> Result<(), StorageError> {
        let data = serde_json::to_string(&self.entries)?;
        self.storage.set(ENTRIES_KEY, &data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ENV_MUTEX;
    use crate::workout::WorkoutType;

    struct FailingStorage;

    impl KeyValueStorage for FailingStorage {
        fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Io(std::io::Error::other("read failed")))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::Io(std::io::Error::other("write failed")))
        }
    }

    fn stored_entries<S: KeyValueStorage>(storage: &S) -> Vec<WorkoutEntry> {
        let data = storage.get(ENTRIES_KEY).unwrap().expect("entries persisted");
        serde_json::from_str(&data).unwrap()
    }

    #[test]
    fn empty_storage_is_seeded_and_persisted() {
        let store = EntryStore::load(MemoryStorage::default());
        assert_eq!(store.all(), seed_entries().as_slice());
        assert_eq!(stored_entries(store.storage()), seed_entries());
    }

    #[test]
    fn malformed_data_falls_back_to_seed() {
        let mut storage = MemoryStorage::default();
        storage.set(ENTRIES_KEY, "{not json").unwrap();
        let store = EntryStore::load(storage);
        assert_eq!(store.all(), seed_entries().as_slice());
        assert_eq!(stored_entries(store.storage()), seed_entries());
    }

    #[test]
    fn stored_empty_list_is_kept() {
        let mut storage = MemoryStorage::default();
        storage.set(ENTRIES_KEY, "[]").unwrap();
        let store = EntryStore::load(storage);
        assert!(store.all().is_empty());
    }

    #[test]
    fn add_appends_and_overwrites_storage() {
        let mut store = EntryStore::load(MemoryStorage::default());
        let entry = WorkoutEntry::new("Ann", WorkoutType::Dance, 25);
        store.add(entry.clone()).unwrap();
        assert_eq!(store.all().len(), 7);
        assert_eq!(store.all().last(), Some(&entry));
        assert_eq!(stored_entries(store.storage()), store.all());
    }

    #[test]
    fn failing_storage_keeps_entries_in_memory() {
        let mut store = EntryStore::load(FailingStorage);
        assert_eq!(store.all().len(), 6);
        let err = store
            .add(WorkoutEntry::new("Ann", WorkoutType::Gym, 5))
            .unwrap_err();
        assert!(matches!(err, StorageError::Io(_)));
        assert_eq!(store.all().len(), 7);
    }

    #[test]
    fn file_storage_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("nested");
        {
            let mut store = EntryStore::load(JsonFileStorage::new(&nested));
            store
                .add(WorkoutEntry::new("Ann", WorkoutType::Walking, 10))
                .unwrap();
        }
        assert!(nested.join("workoutEntries.json").exists());
        let store = EntryStore::load(JsonFileStorage::new(&nested));
        assert_eq!(store.all().len(), 7);
        assert_eq!(store.all()[6].user_name, "Ann");
    }

    #[test]
    fn boxed_storage_delegates() {
        let storage: Box<dyn KeyValueStorage> = Box::new(MemoryStorage::default());
        let mut store = EntryStore::load(storage);
        store
            .add(WorkoutEntry::new("Ann", WorkoutType::Yoga, 30))
            .unwrap();
        assert_eq!(stored_entries(store.storage()).len(), 7);
    }

    #[test]
    fn file_storage_missing_key_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let storage = JsonFileStorage::new(dir.path());
        assert!(storage.get("missing").unwrap().is_none());
    }

    #[test]
    fn env_var_overrides_configured_dir() {
        let _guard = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        let prev = std::env::var_os(DATA_DIR_ENV);

        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/forced");
        }
        let dir = resolve_data_dir(Some("/tmp/configured")).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/forced"));

        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
        let dir = resolve_data_dir(Some("/tmp/configured")).unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/configured"));

        if let Some(val) = prev {
            unsafe {
                std::env::set_var(DATA_DIR_ENV, val);
            }
        }
    }
}
