#![forbid(unsafe_code)]

//! Time-ordered 64-bit identifiers tagged with a shard.
//!
//! An id packs, most significant bits first, a 32 bit timestamp in seconds,
//! an 8 bit instance id, a 10 bit shard id and a 14 bit per-second sequence.
//! See [`layout`] for the exact bit positions.

pub mod clock;
pub mod error;
pub mod generator;
pub mod layout;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::Error;
pub use generator::{open, AnyGenerator, Config, Generator, IdGenerator};
pub use layout::Id;
pub use store::{mem::MemoryStore, Cursor, Lease, SequenceStore};

#[cfg(all(unix, feature = "persist"))]
pub use store::file::FileStore;
