use std::{fmt, path::PathBuf, sync::Arc};

use parking_lot::Mutex;
use snafu::ensure;
use tracing::warn;

use crate::{
    clock::{Clock, SystemClock},
    error::{
        ClockMovedBackwardsSnafu, Error, InstanceIdOutOfRangeSnafu, SequenceExhaustedSnafu,
        ShardIdOutOfRangeSnafu, TimestampOutOfRangeSnafu,
    },
    layout::{self, Id, MAX_INSTANCE_ID, MAX_SEQUENCE, MAX_SHARD_ID, MAX_TIMESTAMP},
    store::{mem::MemoryStore, AnyStore, Cursor, Lease, SequenceStore},
};

pub trait IdGenerator: Clone + Send + Sync + 'static {
    fn next_id(&self, shard_id: u16) -> Result<u64, Error>;
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    pub instance_id: u16,
    /// cursor file shared between processes, in memory when unset
    #[cfg_attr(feature = "serde", serde(default))]
    pub store_path: Option<PathBuf>,
}

impl Config {
    pub fn new(instance_id: u16) -> Self {
        Self {
            instance_id,
            store_path: None,
        }
    }

    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_path = Some(path.into());
        self
    }
}

pub type AnyGenerator = Generator<AnyStore>;

/// Builds a generator with the store selected by `config`.
///
/// An empty `store_path` counts as unset. Fails only when the cursor file
/// cannot be opened or created.
#[tracing::instrument]
pub fn open(config: Config) -> Result<AnyGenerator, Error> {
    let store = match config.store_path {
        Some(path) if !path.as_os_str().is_empty() => durable_store(path)?,
        _ => AnyStore::Memory(MemoryStore::new()),
    };
    Ok(Generator::with_clock(config.instance_id, store, SystemClock))
}

#[cfg(all(unix, feature = "persist"))]
fn durable_store(path: PathBuf) -> Result<AnyStore, Error> {
    Ok(AnyStore::File(crate::store::file::FileStore::open(path)?))
}

#[cfg(not(all(unix, feature = "persist")))]
fn durable_store(path: PathBuf) -> Result<AnyStore, Error> {
    use snafu::IntoError;

    Err(crate::error::OpenStoreSnafu { path }.into_error(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "durable store not available in this build",
    )))
}

struct Inner<S, C> {
    instance_id: u16,
    clock: C,
    store: Mutex<S>,
}

/// Cheaply cloneable handle; clones share the same sequence.
pub struct Generator<S, C = SystemClock> {
    inner: Arc<Inner<S, C>>,
}

impl<S, C> fmt::Debug for Generator<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("instance_id", &self.inner.instance_id)
            .finish_non_exhaustive()
    }
}

impl<S, C> Clone for Generator<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl Generator<MemoryStore> {
    #[tracing::instrument]
    pub fn memory(instance_id: u16) -> Self {
        Self::with_clock(instance_id, MemoryStore::new(), SystemClock)
    }
}

#[cfg(all(unix, feature = "persist"))]
impl Generator<crate::store::file::FileStore> {
    #[tracing::instrument(skip(path))]
    pub fn durable(instance_id: u16, path: impl AsRef<std::path::Path>) -> Result<Self, Error> {
        let store = crate::store::file::FileStore::open(path)?;
        Ok(Self::with_clock(instance_id, store, SystemClock))
    }
}

impl<S, C> Generator<S, C>
where
    S: SequenceStore,
    C: Clock,
{
    /// `instance_id` is checked on every call rather than here, so a bad
    /// value shows up as [`Error::InstanceIdOutOfRange`] from
    /// [`generate`](Self::generate).
    pub fn with_clock(instance_id: u16, store: S, clock: C) -> Self {
        Self {
            inner: Arc::new(Inner {
                instance_id,
                clock,
                store: Mutex::new(store),
            }),
        }
    }

    pub fn instance_id(&self) -> u16 {
        self.inner.instance_id
    }

    /// Produces the next id for `shard_id`.
    ///
    /// Within one second, sequences handed out by the same store start at 0
    /// and grow by one per successful call. A rejected call leaves the store
    /// untouched, so it never burns a sequence.
    #[tracing::instrument(skip(self), fields(instance_id = self.inner.instance_id))]
    pub fn generate(&self, shard_id: u16) -> Result<Id, Error> {
        let mut store = self.inner.store.lock();
        let mut lease = store.lease()?;

        // read the clock only once the lease is held, so `last` can never be
        // from a later second than `now` on a sane clock
        let now = self.inner.clock.now_secs();
        let last = lease.get()?;

        if now < last.timestamp {
            warn!(last = last.timestamp, now, "clock moved backwards");
            return ClockMovedBackwardsSnafu {
                last: last.timestamp,
                now,
            }
            .fail();
        }
        let sequence = if last.timestamp == now {
            last.sequence as u64 + 1
        } else {
            0
        };

        if sequence >= MAX_SEQUENCE {
            warn!(timestamp = now, "sequence exhausted");
            return SequenceExhaustedSnafu { timestamp: now }.fail();
        }
        ensure!(
            (shard_id as u64) < MAX_SHARD_ID,
            ShardIdOutOfRangeSnafu { shard_id }
        );
        let instance_id = self.inner.instance_id;
        ensure!(
            (instance_id as u64) < MAX_INSTANCE_ID,
            InstanceIdOutOfRangeSnafu { instance_id }
        );
        ensure!(
            now < MAX_TIMESTAMP,
            TimestampOutOfRangeSnafu { timestamp: now }
        );

        lease.set(Cursor::new(now, sequence as u16))?;
        Ok(Id::from(layout::pack(
            now,
            instance_id as u64,
            shard_id as u64,
            sequence,
        )))
    }

    /// The last cursor recorded by the store, read under the same lock as
    /// [`generate`](Self::generate).
    pub fn cursor(&self) -> Result<Cursor, Error> {
        let mut store = self.inner.store.lock();
        let mut lease = store.lease()?;
        lease.get()
    }
}

impl<S, C> IdGenerator for Generator<S, C>
where
    S: SequenceStore,
    C: Clock,
{
    fn next_id(&self, shard_id: u16) -> Result<u64, Error> {
        self.generate(shard_id).map(u64::from)
    }
}
