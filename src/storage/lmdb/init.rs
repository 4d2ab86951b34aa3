// storage/lmdb/init.rs

use std::fs;
use std::path::Path;
use std::sync::Arc;
use log::{info, debug, error};
use lmdb_rkv::{Environment, Database, DatabaseFlags, Error as LmdbError};

use crate::error::{Error, Result};
use crate::config::subsystems::storage::StorageConfig;
use crate::storage::metrics::StorageMetrics;

use super::LMDBStorage;
use super::config::{create_env_options, DB_FREQUENCY, DB_EMOTICONS};

impl LMDBStorage {
    /// Open (creating if needed) the store directory at `path`. Existing rows
    /// are left alone; `storage::create_storage` decides whether to clear them.
    pub fn new<P: AsRef<Path>>(path: P, config: &StorageConfig, file_size: Option<u64>) -> Result<Self> {
        let path_buf = path.as_ref().to_path_buf();

        if !path_buf.exists() {
            fs::create_dir_all(&path_buf)
                .map_err(|e| Error::storage(format!("Failed to create database directory {:?}: {}", path_buf, e)))?;
        } else if !path_buf.is_dir() {
            return Err(Error::storage(format!("Database path {:?} is not a directory", path_buf)));
        }

        let (env_flags, max_readers, max_dbs, map_size) = create_env_options(config, file_size);

        info!(
            "Opening LMDB environment at {:?} with map_size={} MB, max_readers={}, max_dbs={}",
            path_buf,
            map_size / (1024 * 1024),
            max_readers,
            max_dbs
        );

        let env = Self::create_environment(&path_buf, env_flags, max_readers, max_dbs, map_size)?;

        let frequency_db = Self::create_database(&env, DB_FREQUENCY)?;
        let emoticon_db = Self::create_database(&env, DB_EMOTICONS)?;

        let storage = Self {
            env: Arc::new(env),
            frequency_db,
            emoticon_db,
            metrics: Arc::new(StorageMetrics::default()),
            db_path: path_buf,
            map_size,
            closed: false,
        };

        storage.verify_environment()?;
        Ok(storage)
    }

    fn create_environment(
        path: &Path,
        flags: lmdb_rkv::EnvironmentFlags,
        max_readers: u32,
        max_dbs: u32,
        map_size: usize
    ) -> Result<Environment> {
        debug!("Creating LMDB environment at {:?}", path);

        Environment::new()
            .set_flags(flags)
            .set_max_readers(max_readers)
            .set_max_dbs(max_dbs)
            .set_map_size(map_size)
            .open(path)
            .map_err(|e| {
                match e {
                    LmdbError::VersionMismatch | LmdbError::Invalid => {
                        error!("LMDB version mismatch or invalid file at {:?}", path);
                        Error::storage(format!("LMDB version mismatch: {}", e))
                    },
                    LmdbError::ReadersFull => {
                        error!("LMDB reader table is full. Increase lmdb_max_readers in configuration.");
                        Error::storage(format!("LMDB environment busy: {}", e))
                    },
                    _ => {
                        error!("Failed to open LMDB environment: {}", e);
                        Error::storage(format!("Failed to open LMDB environment: {}", e))
                    }
                }
            })
    }

    fn create_database(env: &Environment, name: &str) -> Result<Database> {
        debug!("Creating database: {}", name);

        env.create_db(Some(name), DatabaseFlags::empty())
            .map_err(|e| {
                match e {
                    LmdbError::DbsFull => {
                        error!("Maximum number of databases reached. Increase lmdb_max_dbs in configuration.");
                        Error::storage(format!("LMDB max databases reached: {}", e))
                    },
                    _ => {
                        error!("Failed to open database {}: {}", name, e);
                        Error::storage(format!("Failed to open database {}: {}", name, e))
                    }
                }
            })
    }

    /// Check the environment answers a stat call and log what it holds.
    pub fn verify_environment(&self) -> Result<()> {
        let stat = self.env.stat()
            .map_err(|e| Error::storage(format!("Failed to get environment stats: {}", e)))?;
        debug!("Environment stats: entries={}, branch_pages={}, leaf_pages={}, overflow_pages={}",
              stat.entries(), stat.branch_pages(), stat.leaf_pages(), stat.overflow_pages());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempdir().expect("temp dir");
        let db_path = dir.path().join("nested").join("stats");
        let storage = LMDBStorage::new(&db_path, &StorageConfig::default(), None).expect("open store");
        assert!(db_path.is_dir());
        assert_eq!(storage.path(), db_path.as_path());
    }

    #[test]
    fn test_rejects_file_as_directory() {
        let file = tempfile::NamedTempFile::new().expect("temp file");
        let result = LMDBStorage::new(file.path(), &StorageConfig::default(), None);
        assert!(matches!(result, Err(Error::StoreUnavailable(_))));
    }

    #[test]
    fn test_map_grows_for_larger_input() {
        let dir = tempdir().expect("temp dir");
        let mut storage = LMDBStorage::new(dir.path(), &StorageConfig::default(), Some(10)).expect("open store");
        assert_eq!(storage.map_size(), 64 << 20);
        storage.upsert_add("before", 1).expect("write before resize");

        storage.reserve_for_input(50_000_000).expect("grow map");
        assert_eq!(storage.map_size(), 1 << 30);
        assert_eq!(storage.env.info().expect("env info").map_size(), 1 << 30);

        storage.reserve_for_input(10).expect("smaller input");
        assert_eq!(storage.map_size(), 1 << 30);

        storage.upsert_add("after", 1).expect("write after resize");
        assert_eq!(storage.get_count("before").expect("read"), Some(1));
        assert_eq!(storage.get_count("after").expect("read"), Some(1));
    }
}
