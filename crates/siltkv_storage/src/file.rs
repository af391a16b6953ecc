//! File-based storage engine for persistent storage.
//!
//! ```text
//! <dir>/
//! ├─ LOCK        # Advisory lock for single-process access
//! └─ data.log    # Append-only batch log
//! ```
//!
//! The whole key space is rebuilt in memory from the log on open.

use crate::batch::WriteBatch;
use crate::engine::{Snapshot, StorageEngine};
use crate::error::{StorageError, StorageResult};
use crate::log::{encode_record, file_header, replay};
use crate::mvcc::VersionedTable;
use fs2::FileExt;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const LOCK_FILE: &str = "LOCK";
const DATA_FILE: &str = "data.log";
const DATA_TEMP: &str = "data.log.tmp";

/// Entries per record when rewriting the log.
const COMPACT_CHUNK: usize = 1024;

/// Options for opening a [`FileEngine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEngineOptions {
    /// Create the directory if it does not exist.
    pub create_if_missing: bool,
    /// Fail if the directory already holds a non-empty log.
    pub error_if_exists: bool,
    /// Call `fsync` after every committed batch.
    pub sync_on_commit: bool,
    /// Rewrite the log with only live entries right after opening.
    pub compact_on_open: bool,
}

impl Default for FileEngineOptions {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            error_if_exists: false,
            sync_on_commit: true,
            compact_on_open: false,
        }
    }
}

#[derive(Debug)]
struct LogWriter {
    file: File,
    /// Length of the log up to the last committed record.
    len: u64,
    /// Set when a failed append could not be truncated away.
    failed: bool,
}

/// A file-based storage engine.
///
/// Committed batches are appended to `data.log` and survive process
/// restarts. Reads are served from the in-memory versioned table.
///
/// # Durability
///
/// With `sync_on_commit` (the default) a batch is on disk before
/// [`StorageEngine::commit`] returns. Otherwise it is handed to the OS and
/// synced on [`StorageEngine::close`].
///
/// # Thread Safety
///
/// Commits are serialized by an internal writer lock. Readers never wait
/// on disk I/O.
///
/// # Example
///
/// ```no_run
/// use siltkv_storage::{FileEngine, FileEngineOptions, StorageEngine, WriteBatch};
/// use std::path::Path;
///
/// let engine = FileEngine::open(Path::new("my_store"), FileEngineOptions::default()).unwrap();
/// let mut batch = WriteBatch::new();
/// batch.put(b"k".to_vec(), b"v".to_vec());
/// engine.commit(batch).unwrap();
/// ```
#[derive(Debug)]
pub struct FileEngine {
    path: PathBuf,
    options: FileEngineOptions,
    table: Arc<VersionedTable>,
    writer: Mutex<LogWriter>,
    lock_file: File,
    #[cfg(test)]
    fail_next_append: AtomicBool,
}

impl FileEngine {
    /// Opens or creates an engine in directory `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - The log holds data and `error_if_exists` is true
    /// - Another process holds the lock (returns `Locked`)
    /// - The log fails validation or I/O errors occur
    pub fn open(path: &Path, options: FileEngineOptions) -> StorageResult<Self> {
        if !path.exists() {
            if options.create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(StorageError::NotFound {
                    path: path.to_path_buf(),
                });
            }
        }
        if !path.is_dir() {
            return Err(StorageError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a directory: {}", path.display()),
            )));
        }

        let lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path.join(LOCK_FILE))?;
        if lock_file.try_lock_exclusive().is_err() {
            return Err(StorageError::Locked {
                path: path.to_path_buf(),
            });
        }

        let data_path = path.join(DATA_FILE);
        let existing = match fs::read(&data_path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };
        if options.error_if_exists && !existing.is_empty() {
            return Err(StorageError::AlreadyExists {
                path: path.to_path_buf(),
            });
        }

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&data_path)?;
        let table = Arc::new(VersionedTable::new());

        let len = if existing.is_empty() {
            file.write_all(&file_header())?;
            file.sync_all()?;
            file_header().len() as u64
        } else {
            let replayed = replay(&existing)?;
            if replayed.torn_bytes > 0 {
                warn!(
                    path = %data_path.display(),
                    torn_bytes = replayed.torn_bytes,
                    "discarding torn record at end of log"
                );
                file.set_len(replayed.valid_len)?;
                file.sync_all()?;
            }
            for batch in &replayed.batches {
                table.apply(batch)?;
            }
            info!(
                path = %path.display(),
                batches = replayed.batches.len(),
                keys = table.live_len(),
                "replayed log"
            );
            replayed.valid_len
        };

        let engine = Self {
            path: path.to_path_buf(),
            options,
            table,
            writer: Mutex::new(LogWriter {
                file,
                len,
                failed: false,
            }),
            lock_file,
            #[cfg(test)]
            fail_next_append: AtomicBool::new(false),
        };
        if engine.options.compact_on_open {
            engine.compact()?;
        }
        Ok(engine)
    }

    /// Returns the engine directory.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the options the engine was opened with.
    #[must_use]
    pub fn options(&self) -> &FileEngineOptions {
        &self.options
    }

    /// Returns the current log size in bytes.
    #[must_use]
    pub fn log_size(&self) -> u64 {
        self.writer.lock().len
    }

    /// Returns the number of live keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.table.live_len()
    }

    /// Returns true if no key holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes one record and makes it as durable as the options ask.
    fn append(&self, file: &mut File, record: &[u8]) -> io::Result<()> {
        file.write_all(record)?;
        file.flush()?;
        if self.options.sync_on_commit {
            file.sync_data()?;
        }
        self.injected_failure()
    }

    #[cfg(test)]
    fn injected_failure(&self) -> io::Result<()> {
        if self.fail_next_append.swap(false, Ordering::SeqCst) {
            return Err(io::Error::other("injected append failure"));
        }
        Ok(())
    }

    #[cfg(not(test))]
    #[inline]
    fn injected_failure(&self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(unix)]
    fn sync_directory(&self) -> StorageResult<()> {
        File::open(&self.path)?.sync_all()?;
        Ok(())
    }

    #[cfg(not(unix))]
    fn sync_directory(&self) -> StorageResult<()> {
        Ok(())
    }
}

impl StorageEngine for FileEngine {
    fn get(&self, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        self.table.get_latest(key)
    }

    fn snapshot(&self) -> StorageResult<Box<dyn Snapshot>> {
        Ok(Box::new(self.table.pin()?))
    }

    fn commit(&self, batch: WriteBatch) -> StorageResult<()> {
        batch.validate()?;
        let record = encode_record(&batch)?;

        let mut writer = self.writer.lock();
        self.table.ensure_open()?;
        if writer.failed {
            return Err(StorageError::WriterFailed);
        }
        let writer = &mut *writer;
        if let Err(e) = self.append(&mut writer.file, &record) {
            // Whatever part of the record reached the file must not replay.
            if let Err(truncate) = writer
                .file
                .set_len(writer.len)
                .and_then(|()| writer.file.sync_data())
            {
                writer.failed = true;
                error!(
                    path = %self.path.display(),
                    error = %e,
                    truncate_error = %truncate,
                    "could not remove failed record from log"
                );
                return Err(truncate.into());
            }
            warn!(error = %e, bytes = record.len(), "commit append failed");
            return Err(e.into());
        }
        writer.len += record.len() as u64;

        let seq = self.table.apply(&batch)?;
        debug!(seq, ops = batch.len(), bytes = record.len(), "committed batch");
        Ok(())
    }

    fn close(&self) -> StorageResult<()> {
        let writer = self.writer.lock();
        if self.table.ensure_open().is_ok() {
            writer.file.sync_all()?;
            self.table.close();
            self.lock_file.unlock()?;
            debug!(path = %self.path.display(), "closed engine");
        }
        Ok(())
    }

    fn compact(&self) -> StorageResult<()> {
        let mut writer = self.writer.lock();
        let entries = self.table.live_entries()?;
        let before = writer.len;

        let temp_path = self.path.join(DATA_TEMP);
        let mut temp = File::create(&temp_path)?;
        let mut len = file_header().len() as u64;
        temp.write_all(&file_header())?;
        for chunk in entries.chunks(COMPACT_CHUNK) {
            let mut batch = WriteBatch::new();
            for (key, value) in chunk {
                batch.put(key.as_slice(), value.as_slice());
            }
            let record = encode_record(&batch)?;
            temp.write_all(&record)?;
            len += record.len() as u64;
        }
        temp.sync_all()?;
        drop(temp);

        let data_path = self.path.join(DATA_FILE);
        fs::rename(&temp_path, &data_path)?;
        self.sync_directory()?;

        writer.file = OpenOptions::new().read(true).append(true).open(&data_path)?;
        writer.len = len;
        writer.failed = false;
        self.table.collect_garbage();
        info!(
            path = %self.path.display(),
            keys = entries.len(),
            before,
            after = len,
            "compacted log"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn put(engine: &FileEngine, key: &[u8], value: &[u8]) {
        let mut batch = WriteBatch::new();
        batch.put(key, value);
        engine.commit(batch).unwrap();
    }

    #[test]
    fn data_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
            put(&engine, b"a", b"1");
            put(&engine, b"b", b"2");
            let mut batch = WriteBatch::new();
            batch.delete(b"a".as_slice());
            engine.commit(batch).unwrap();
            engine.close().unwrap();
        }

        let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
        assert_eq!(engine.get(b"a").unwrap(), None);
        assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn second_open_is_locked() {
        let dir = tempdir().unwrap();
        let _engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
        assert!(matches!(
            FileEngine::open(dir.path(), FileEngineOptions::default()),
            Err(StorageError::Locked { .. })
        ));
    }

    #[test]
    fn close_releases_directory_lock() {
        let dir = tempdir().unwrap();
        let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
        engine.close().unwrap();
        engine.close().unwrap();
        FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
    }

    #[test]
    fn missing_directory_without_create() {
        let dir = tempdir().unwrap();
        let options = FileEngineOptions {
            create_if_missing: false,
            ..FileEngineOptions::default()
        };
        assert!(matches!(
            FileEngine::open(&dir.path().join("nope"), options),
            Err(StorageError::NotFound { .. })
        ));
    }

    #[test]
    fn error_if_exists_rejects_existing_log() {
        let dir = tempdir().unwrap();
        drop(FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap());
        let options = FileEngineOptions {
            error_if_exists: true,
            ..FileEngineOptions::default()
        };
        assert!(matches!(
            FileEngine::open(dir.path(), options),
            Err(StorageError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn torn_tail_is_truncated_on_open() {
        let dir = tempdir().unwrap();
        let good_len = {
            let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
            put(&engine, b"a", b"1");
            engine.log_size()
        };
        let mut file = OpenOptions::new()
            .append(true)
            .open(dir.path().join(DATA_FILE))
            .unwrap();
        file.write_all(&[9, 0, 0, 0, 1, 2]).unwrap();
        drop(file);

        let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
        assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.log_size(), good_len);
        put(&engine, b"b", b"2");
        drop(engine);

        let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
        assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn corrupted_record_fails_open() {
        let dir = tempdir().unwrap();
        {
            let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
            put(&engine, b"a", b"1");
        }
        let data_path = dir.path().join(DATA_FILE);
        let mut data = fs::read(&data_path).unwrap();
        let last = data.len() - 1;
        data[last] ^= 0xFF;
        fs::write(&data_path, data).unwrap();

        assert!(matches!(
            FileEngine::open(dir.path(), FileEngineOptions::default()),
            Err(StorageError::Corrupted(_))
        ));
    }

    #[test]
    fn overstated_length_mid_log_fails_open() {
        let dir = tempdir().unwrap();
        {
            let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
            put(&engine, b"a", b"1");
            put(&engine, b"b", b"2");
            put(&engine, b"c", b"3");
        }
        let data_path = dir.path().join(DATA_FILE);
        let mut data = fs::read(&data_path).unwrap();
        let first = crate::log::FILE_HEADER_SIZE;
        data[first..first + 4].copy_from_slice(&0x00FF_FFFFu32.to_le_bytes());
        fs::write(&data_path, &data).unwrap();

        assert!(matches!(
            FileEngine::open(dir.path(), FileEngineOptions::default()),
            Err(StorageError::Corrupted(_))
        ));
        assert_eq!(fs::metadata(&data_path).unwrap().len(), data.len() as u64);
    }

    #[test]
    fn failed_append_is_removed_from_log() {
        let dir = tempdir().unwrap();
        {
            let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
            put(&engine, b"a", b"1");
            let before = engine.log_size();

            engine.fail_next_append.store(true, Ordering::SeqCst);
            let mut batch = WriteBatch::new();
            batch.put(b"lost".as_slice(), b"x".as_slice());
            assert!(matches!(engine.commit(batch), Err(StorageError::Io(_))));
            assert_eq!(engine.get(b"lost").unwrap(), None);
            assert_eq!(engine.log_size(), before);
            assert_eq!(
                fs::metadata(dir.path().join(DATA_FILE)).unwrap().len(),
                before
            );

            put(&engine, b"b", b"2");
            engine.close().unwrap();
        }

        let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
        assert_eq!(engine.get(b"lost").unwrap(), None);
        assert_eq!(engine.get(b"a").unwrap(), Some(b"1".to_vec()));
        assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn failed_writer_refuses_commits_until_compacted() {
        let dir = tempdir().unwrap();
        let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
        put(&engine, b"a", b"1");
        engine.writer.lock().failed = true;

        let mut batch = WriteBatch::new();
        batch.put(b"b".as_slice(), b"2".as_slice());
        assert!(matches!(
            engine.commit(batch),
            Err(StorageError::WriterFailed)
        ));

        engine.compact().unwrap();
        put(&engine, b"b", b"2");
        assert_eq!(engine.get(b"b").unwrap(), Some(b"2".to_vec()));
    }

    #[test]
    fn compact_shrinks_log_and_keeps_data() {
        let dir = tempdir().unwrap();
        let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
        for i in 0..50u8 {
            put(&engine, b"hot", &[i + 1]);
        }
        put(&engine, b"cold", b"x");
        let before = engine.log_size();

        let snap = engine.snapshot().unwrap();
        engine.compact().unwrap();
        assert!(engine.log_size() < before);
        assert_eq!(snap.get(b"hot").unwrap(), Some(vec![50]));

        put(&engine, b"after", b"y");
        drop(snap);
        drop(engine);

        let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
        assert_eq!(engine.get(b"hot").unwrap(), Some(vec![50]));
        assert_eq!(engine.get(b"cold").unwrap(), Some(b"x".to_vec()));
        assert_eq!(engine.get(b"after").unwrap(), Some(b"y".to_vec()));
        assert!(!dir.path().join(DATA_TEMP).exists());
    }

    #[test]
    fn compact_on_open_rewrites_log() {
        let dir = tempdir().unwrap();
        let before = {
            let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
            for _ in 0..10 {
                put(&engine, b"k", b"v");
            }
            engine.log_size()
        };
        let options = FileEngineOptions {
            compact_on_open: true,
            ..FileEngineOptions::default()
        };
        let engine = FileEngine::open(dir.path(), options).unwrap();
        assert!(engine.log_size() < before);
        assert_eq!(engine.get(b"k").unwrap(), Some(b"v".to_vec()));
    }

    #[test]
    fn closed_engine_rejects_commits() {
        let dir = tempdir().unwrap();
        let engine = FileEngine::open(dir.path(), FileEngineOptions::default()).unwrap();
        engine.close().unwrap();
        engine.close().unwrap();
        let mut batch = WriteBatch::new();
        batch.put(b"a".as_slice(), b"1".as_slice());
        assert!(matches!(engine.commit(batch), Err(StorageError::Closed)));
        assert!(matches!(engine.compact(), Err(StorageError::Closed)));
    }
}
