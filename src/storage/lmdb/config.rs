// storage/lmdb/config.rs

use log::debug;
use lmdb_rkv::EnvironmentFlags;
use crate::config::subsystems::storage::StorageConfig;

// Database names
pub const DB_FREQUENCY: &str = "frequency";   // word -> u64 count (big endian)
pub const DB_EMOTICONS: &str = "emoticons";   // code -> space-joined positions

pub const DEFAULT_MAX_READERS: u32 = 126;
pub const DEFAULT_MAX_DBS: u32 = 4;

/// Largest key LMDB accepts with its default page size.
pub const MAX_KEY_SIZE: usize = 511;

const MB: usize = 1024 * 1024;

pub fn default_env_flags() -> EnvironmentFlags {
    EnvironmentFlags::NO_TLS |
    EnvironmentFlags::NO_READAHEAD
}

/// Environment flags, reader slots, database slots and map size for a store.
pub fn create_env_options(config: &StorageConfig, file_size: Option<u64>) -> (EnvironmentFlags, u32, u32, usize) {
    let mut flags = default_env_flags();

    if !config.use_fsync {
        flags |= EnvironmentFlags::NO_SYNC;
    }

    let max_readers = config.lmdb_max_readers.unwrap_or(DEFAULT_MAX_READERS);
    let max_dbs = config.lmdb_max_dbs.unwrap_or(DEFAULT_MAX_DBS);

    let map_size = match config.lmdb_map_size_mb {
        Some(mb) => mb * MB,
        None => calculate_map_size_from_file_size(file_size.unwrap_or(0)),
    };

    debug!("Created LMDB environment options:");
    debug!("  Flags: {:?}", flags);
    debug!("  Max readers: {}", max_readers);
    debug!("  Max DBs: {}", max_dbs);
    debug!("  Map size: {} bytes", map_size);

    (flags, max_readers, max_dbs, map_size)
}

/// Calculate an LMDB map size from the input size. The map is only address
/// space, so the estimate is generous: every distinct word costs a key, a count
/// and page overhead, and emoticon strings grow with the file.
pub fn calculate_map_size_from_file_size(file_size: u64) -> usize {
    let base_map_size: u64 = match file_size {
        size if size < 1_000_000 => 64 << 20,
        size if size < 100_000_000 => 1 << 30,
        size => (4_u64 << 30).max(size.saturating_mul(4)),
    };

    let page_size = 4096;
    let remainder = base_map_size % page_size;
    let map_size = if remainder == 0 {
        base_map_size
    } else {
        base_map_size + (page_size - remainder)
    };

    debug!("Calculated LMDB map size: {} MB for file size: {} bytes",
        map_size / MB as u64, file_size);

    map_size as usize
}
