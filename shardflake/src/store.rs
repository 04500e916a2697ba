#[cfg(all(unix, feature = "persist"))]
pub mod file;
pub mod mem;

use crate::{error::Error, layout::SEQUENCE_BITS};

/// The last `(timestamp, sequence)` pair handed out.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub timestamp: u64,
    pub sequence: u16,
}

impl Cursor {
    pub fn new(timestamp: u64, sequence: u16) -> Self {
        Self {
            timestamp,
            sequence,
        }
    }

    /// `(timestamp << 14) | sequence`, the persisted form of a cursor.
    pub fn encode(&self) -> u64 {
        (self.timestamp << SEQUENCE_BITS) | self.sequence as u64
    }

    pub fn decode(raw: u64) -> Self {
        Self {
            timestamp: raw >> SEQUENCE_BITS,
            sequence: (raw & ((1 << SEQUENCE_BITS) - 1)) as u16,
        }
    }
}

/// Exclusive access to the cursor for one read-modify-write.
///
/// Dropping the lease releases it, on every path.
pub trait Lease {
    /// Returns `Cursor::default()` when nothing was recorded yet.
    fn get(&mut self) -> Result<Cursor, Error>;

    fn set(&mut self, cursor: Cursor) -> Result<(), Error>;
}

pub trait SequenceStore: Send + 'static {
    type Guard<'a>: Lease
    where
        Self: 'a;

    /// Blocks until the cursor is exclusively held by the caller.
    fn lease(&mut self) -> Result<Self::Guard<'_>, Error>;
}

/// A store picked at runtime from [`Config`](crate::Config).
pub enum AnyStore {
    Memory(mem::MemoryStore),
    #[cfg(all(unix, feature = "persist"))]
    File(file::FileStore),
}

pub enum AnyLease<'a> {
    Memory(&'a mut Cursor),
    #[cfg(all(unix, feature = "persist"))]
    File(file::FileLease<'a>),
}

impl Lease for AnyLease<'_> {
    fn get(&mut self) -> Result<Cursor, Error> {
        match self {
            AnyLease::Memory(lease) => lease.get(),
            #[cfg(all(unix, feature = "persist"))]
            AnyLease::File(lease) => lease.get(),
        }
    }

    fn set(&mut self, cursor: Cursor) -> Result<(), Error> {
        match self {
            AnyLease::Memory(lease) => lease.set(cursor),
            #[cfg(all(unix, feature = "persist"))]
            AnyLease::File(lease) => lease.set(cursor),
        }
    }
}

impl SequenceStore for AnyStore {
    type Guard<'a> = AnyLease<'a>;

    fn lease(&mut self) -> Result<Self::Guard<'_>, Error> {
        Ok(match self {
            AnyStore::Memory(store) => AnyLease::Memory(store.lease()?),
            #[cfg(all(unix, feature = "persist"))]
            AnyStore::File(store) => AnyLease::File(store.lease()?),
        })
    }
}
