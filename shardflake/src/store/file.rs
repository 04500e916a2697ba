use std::{
    fs::{self, File, OpenOptions},
    io::{Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use nix::{
    errno::Errno,
    fcntl::{Flock, FlockArg},
};
use snafu::{OptionExt, ResultExt};

use crate::error::{CorruptCursorSnafu, Error, LockSnafu, OpenStoreSnafu, StoreIoSnafu};

use super::{Cursor, Lease, SequenceStore};

/// Cursor kept in a single file, shared by every process that opens it.
///
/// The file holds the decimal digits of [`Cursor::encode`] and nothing else.
/// Each lease takes a blocking exclusive `flock`, so the read-modify-write of
/// one id is atomic across processes. Two `FileStore`s opened on the same path
/// in one process exclude each other as well.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    file: File,
}

impl FileStore {
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir).context(OpenStoreSnafu { path: &path })?;
        }
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .context(OpenStoreSnafu { path: &path })?;
        tracing::debug!("cursor file opened");
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SequenceStore for FileStore {
    type Guard<'a> = FileLease<'a>;

    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn lease(&mut self) -> Result<Self::Guard<'_>, Error> {
        let mut file = self
            .file
            .try_clone()
            .context(StoreIoSnafu { path: &self.path })?;
        let lock = loop {
            match Flock::lock(file, FlockArg::LockExclusive) {
                Ok(lock) => break lock,
                Err((f, Errno::EINTR)) => file = f,
                Err((_, errno)) => {
                    return Err(std::io::Error::from(errno))
                        .context(LockSnafu { path: &self.path });
                }
            }
        };
        Ok(FileLease {
            path: &self.path,
            lock,
        })
    }
}

/// Holds the file lock until dropped.
pub struct FileLease<'a> {
    path: &'a Path,
    lock: Flock<File>,
}

impl Lease for FileLease<'_> {
    fn get(&mut self) -> Result<Cursor, Error> {
        let mut file: &File = &self.lock;
        let mut bytes = Vec::new();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_end(&mut bytes))
            .context(StoreIoSnafu { path: self.path })?;

        let corrupt = || CorruptCursorSnafu {
            path: self.path,
            content: String::from_utf8_lossy(&bytes).into_owned(),
        };
        let content = std::str::from_utf8(&bytes).ok().with_context(&corrupt)?;
        // older writers padded the record with NUL bytes
        let digits = content.trim_end_matches('\0').trim();
        if digits.is_empty() {
            return Ok(Cursor::default());
        }
        let raw = digits.parse::<u64>().ok().with_context(&corrupt)?;
        Ok(Cursor::decode(raw))
    }

    /// Overwrites in place and trims afterwards, so the file never holds an
    /// empty record a crash could leave behind.
    fn set(&mut self, cursor: Cursor) -> Result<(), Error> {
        let mut file: &File = &self.lock;
        let digits = cursor.encode().to_string();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(digits.as_bytes()))
            .and_then(|_| file.set_len(digits.len() as u64))
            .and_then(|_| file.sync_data())
            .context(StoreIoSnafu { path: self.path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_reads_as_empty_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::open(dir.path().join("nested/cursor")).unwrap();
        assert_eq!(store.lease().unwrap().get().unwrap(), Cursor::default());
        assert!(dir.path().join("nested/cursor").exists());
    }

    #[test]
    fn set_writes_decimal_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        let mut store = FileStore::open(&path).unwrap();

        store
            .lease()
            .unwrap()
            .set(Cursor::new(1_521_676_800, 12))
            .unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, ((1_521_676_800u64 << 14) | 12).to_string());

        // a shorter record must not leave stale digits behind
        store.lease().unwrap().set(Cursor::new(1, 0)).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), (1u64 << 14).to_string());
    }

    #[test]
    fn reads_existing_record_with_padding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        let raw = (1_700_000_000u64 << 14) | 77;
        fs::write(&path, format!("{raw}\0\0\0")).unwrap();

        let mut store = FileStore::open(&path).unwrap();
        assert_eq!(
            store.lease().unwrap().get().unwrap(),
            Cursor::new(1_700_000_000, 77)
        );
    }

    #[test]
    fn garbage_record_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        fs::write(&path, "not a number").unwrap();

        let mut store = FileStore::open(&path).unwrap();
        let err = store.lease().unwrap().get().unwrap_err();
        assert!(matches!(
            err,
            Error::CorruptCursor { content, .. } if content == "not a number"
        ));
    }

    #[test]
    fn non_utf8_record_is_reported_as_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        fs::write(&path, [0xff, 0xfe, b'1']).unwrap();

        let mut store = FileStore::open(&path).unwrap();
        let err = store.lease().unwrap().get().unwrap_err();
        assert!(matches!(err, Error::CorruptCursor { .. }));
    }

    #[test]
    fn overwrite_keeps_record_readable_at_every_step() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        let mut store = FileStore::open(&path).unwrap();
        store.lease().unwrap().set(Cursor::new(1_700_000_000, 5)).unwrap();

        // the new digits land over the old ones before any trimming, so an
        // interrupted write leaves the same-length record, never an empty one
        let mut lease = store.lease().unwrap();
        lease.set(Cursor::new(1_700_000_000, 6)).unwrap();
        assert_eq!(lease.get().unwrap(), Cursor::new(1_700_000_000, 6));
        drop(lease);
        assert_eq!(
            fs::metadata(&path).unwrap().len(),
            ((1_700_000_000u64 << 14) | 6).to_string().len() as u64
        );
    }

    #[test]
    fn open_failure_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // a directory cannot be opened as the cursor file
        let err = FileStore::open(dir.path()).unwrap_err();
        assert!(matches!(err, Error::OpenStore { .. }));
    }

    #[test]
    fn open_does_not_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursor");
        FileStore::open(&path)
            .unwrap()
            .lease()
            .unwrap()
            .set(Cursor::new(9, 9))
            .unwrap();

        let mut reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.lease().unwrap().get().unwrap(), Cursor::new(9, 9));
    }
}
