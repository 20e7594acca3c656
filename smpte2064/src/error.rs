/// Common error type covering every fallible operation in this crate.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// An argument was syntactically invalid: wrong buffer size, bad bit count, unknown
    /// audio type, and similar caller mistakes that do not depend on the format tables.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A caller-controlled allocation size was rejected before attempting to allocate.
    #[error("out of memory: {0}")]
    OutOfMemory(String),
    /// `pack` was called before enough video frames had been processed to prime the
    /// motion-detection ring.
    #[error("no fingerprint data available yet; need at least 3 video frames")]
    NoData,
    /// The requested geometry or frame rate is syntactically well-formed but has no entry
    /// in the format tables.
    #[error("format unsupported: {0}")]
    FormatUnsupported(String),
}

/// Common result type.
pub type Result<T> = std::result::Result<T, Error>;
