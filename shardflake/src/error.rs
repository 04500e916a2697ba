use std::path::PathBuf;

use snafu::{Location, Snafu};

#[derive(Snafu, Debug)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("sequence exhausted for second {timestamp}"))]
    SequenceExhausted {
        timestamp: u64,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("shard id {shard_id} out of range"))]
    ShardIdOutOfRange {
        shard_id: u16,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("instance id {instance_id} out of range"))]
    InstanceIdOutOfRange {
        instance_id: u16,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("timestamp {timestamp} does not fit in 32 bits"))]
    TimestampOutOfRange {
        timestamp: u64,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("clock moved backwards: last {last}, now {now}"))]
    ClockMovedBackwards {
        last: u64,
        now: u64,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("open cursor file {} error", path.display()))]
    OpenStore {
        path: PathBuf,
        #[snafu(source)]
        error: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("cursor file {} io error", path.display()))]
    StoreIo {
        path: PathBuf,
        #[snafu(source)]
        error: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
    /// `flock` failed with something other than `EINTR`, which is retried.
    /// On a file this process opened itself that means `ENOLCK` or a similar
    /// kernel resource failure, so no test provokes it.
    #[snafu(display("lock cursor file {} error", path.display()))]
    Lock {
        path: PathBuf,
        #[snafu(source)]
        error: std::io::Error,
        #[snafu(implicit)]
        location: Location,
    },
    #[snafu(display("corrupt cursor file {}: {content:?}", path.display()))]
    CorruptCursor {
        path: PathBuf,
        content: String,
        #[snafu(implicit)]
        location: Location,
    },
}

impl Error {
    /// Whether the same call can succeed later without any change from the
    /// caller, i.e. once the clock has moved on.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::SequenceExhausted { .. } | Error::ClockMovedBackwards { .. }
        )
    }
}
