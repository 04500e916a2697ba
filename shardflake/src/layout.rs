//! Bit layout of an id.
//!
//! ```text
//! | timestamp (32) | instance (8) | shard (10) | sequence (14) |
//! 63             32 31          24 23       14 13            0
//! ```

use std::fmt;

pub const TIMESTAMP_BITS: u32 = 32;
pub const INSTANCE_BITS: u32 = 8;
pub const SHARD_BITS: u32 = 10;
pub const SEQUENCE_BITS: u32 = 14;

const SHARD_SHIFT: u32 = SEQUENCE_BITS;
const INSTANCE_SHIFT: u32 = SHARD_SHIFT + SHARD_BITS;
const TIMESTAMP_SHIFT: u32 = INSTANCE_SHIFT + INSTANCE_BITS;

/// Exclusive upper bound of the sequence field.
pub const MAX_SEQUENCE: u64 = 1 << SEQUENCE_BITS;
/// Exclusive upper bound of the shard field.
pub const MAX_SHARD_ID: u64 = 1 << SHARD_BITS;
/// Exclusive upper bound of the instance field.
pub const MAX_INSTANCE_ID: u64 = 1 << INSTANCE_BITS;
/// Exclusive upper bound of the timestamp field.
pub const MAX_TIMESTAMP: u64 = 1 << TIMESTAMP_BITS;

const SEQUENCE_MASK: u64 = MAX_SEQUENCE - 1;
const SHARD_MASK: u64 = MAX_SHARD_ID - 1;
const INSTANCE_MASK: u64 = MAX_INSTANCE_ID - 1;

/// Packs the four fields into one id.
///
/// Callers are expected to have checked every field against its bound,
/// out of range bits would bleed into the neighbouring field.
pub const fn pack(timestamp: u64, instance_id: u64, shard_id: u64, sequence: u64) -> u64 {
    (timestamp << TIMESTAMP_SHIFT)
        | (instance_id << INSTANCE_SHIFT)
        | (shard_id << SHARD_SHIFT)
        | sequence
}

pub const fn timestamp(id: u64) -> u64 {
    id >> TIMESTAMP_SHIFT
}

pub const fn instance_id(id: u64) -> u64 {
    (id >> INSTANCE_SHIFT) & INSTANCE_MASK
}

pub const fn shard_id(id: u64) -> u64 {
    (id >> SHARD_SHIFT) & SHARD_MASK
}

pub const fn sequence(id: u64) -> u64 {
    id & SEQUENCE_MASK
}

/// A generated id with typed field accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Id(u64);

impl Id {
    /// `None` when `shard_id` or `sequence` does not fit its field.
    pub const fn new(
        timestamp: u32,
        instance_id: u8,
        shard_id: u16,
        sequence: u16,
    ) -> Option<Self> {
        if shard_id as u64 >= MAX_SHARD_ID || sequence as u64 >= MAX_SEQUENCE {
            return None;
        }
        Some(Self(pack(
            timestamp as u64,
            instance_id as u64,
            shard_id as u64,
            sequence as u64,
        )))
    }

    pub const fn timestamp(&self) -> u32 {
        timestamp(self.0) as u32
    }

    pub const fn instance_id(&self) -> u8 {
        instance_id(self.0) as u8
    }

    pub const fn shard_id(&self) -> u16 {
        shard_id(self.0) as u16
    }

    pub const fn sequence(&self) -> u16 {
        sequence(self.0) as u16
    }

    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<Id> for u64 {
    fn from(value: Id) -> Self {
        value.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
