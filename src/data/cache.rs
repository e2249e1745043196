use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use super::error::LoadError;
use super::loader::load_csv;
use super::model::Dataset;

struct CacheEntry {
    modified: SystemTime,
    dataset: Arc<Dataset>,
}

/// Loaded datasets keyed by file path. An entry is reused only while the
/// file's modification time is unchanged.
#[derive(Default)]
pub struct DatasetCache {
    entries: HashMap<PathBuf, CacheEntry>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached dataset for `path`, loading it first if it is absent
    /// or the file changed on disk since it was cached.
    pub fn get_or_load(&mut self, path: &Path) -> Result<Arc<Dataset>, LoadError> {
        let key = path.canonicalize()?;
        let modified = std::fs::metadata(&key)?.modified()?;

        if let Some(entry) = self.entries.get(&key) {
            if entry.modified == modified {
                log::debug!("Dataset cache hit for {}", key.display());
                return Ok(Arc::clone(&entry.dataset));
            }
            log::info!("{} changed on disk, reloading", key.display());
        }

        let dataset = Arc::new(load_csv(&key)?);
        self.entries.insert(
            key,
            CacheEntry {
                modified,
                dataset: Arc::clone(&dataset),
            },
        );
        Ok(dataset)
    }

    /// Whether `path` is cached and still matches the file on disk.
    pub fn is_fresh(&self, path: &Path) -> bool {
        let Ok(key) = path.canonicalize() else {
            return false;
        };
        let Ok(modified) = std::fs::metadata(&key).and_then(|m| m.modified()) else {
            return false;
        };
        self.entries
            .get(&key)
            .is_some_and(|entry| entry.modified == modified)
    }

    pub fn invalidate(&mut self, path: &Path) {
        let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
        self.entries.remove(&key);
    }

    /// Number of cached files.
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;
    use std::time::Duration;

    use super::*;

    const HEADER: &str =
        "transaction_id,date,amount,category,merchant,payment_method,account_type,transaction_type,description";

    fn write_csv(path: &Path, rows: &[&str]) {
        let mut f = File::create(path).unwrap();
        writeln!(f, "{HEADER}").unwrap();
        for row in rows {
            writeln!(f, "{row}").unwrap();
        }
    }

    #[test]
    fn reuses_entry_while_file_is_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx.csv");
        write_csv(&path, &["T1,2024-01-01,1,A,M,Card,Checking,debit,"]);

        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(&path).unwrap();
        let second = cache.get_or_load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
        assert!(cache.is_fresh(&path));
    }

    #[test]
    fn reloads_when_mtime_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx.csv");
        write_csv(&path, &["T1,2024-01-01,1,A,M,Card,Checking,debit,"]);

        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(&path).unwrap();
        assert_eq!(first.len(), 1);

        write_csv(
            &path,
            &[
                "T1,2024-01-01,1,A,M,Card,Checking,debit,",
                "T2,2024-01-02,2,A,M,Card,Checking,debit,",
            ],
        );
        let later = SystemTime::now() + Duration::from_secs(5);
        File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(later)
            .unwrap();
        assert!(!cache.is_fresh(&path));

        let second = cache.get_or_load(&path).unwrap();
        assert_eq!(second.len(), 2);
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn invalidate_forces_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tx.csv");
        write_csv(&path, &["T1,2024-01-01,1,A,M,Card,Checking,debit,"]);

        let mut cache = DatasetCache::new();
        let first = cache.get_or_load(&path).unwrap();
        cache.invalidate(&path);
        assert_eq!(cache.len(), 0);
        let second = cache.get_or_load(&path).unwrap();
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn schema_errors_are_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "transaction_id,date\nT1,2024-01-01\n").unwrap();

        let mut cache = DatasetCache::new();
        assert!(matches!(cache.get_or_load(&path), Err(LoadError::Schema { .. })));
        assert_eq!(cache.len(), 0);
    }
}
