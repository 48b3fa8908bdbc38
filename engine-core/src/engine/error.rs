use thiserror::Error;

/// A read from a connection either produces a complete command, hits a
/// clean end of stream, or fails partway through a record. Any variant
/// of this error causes the caller to return rather than fall through
/// to the next read.
#[derive(Debug, Error)]
pub enum FramingError {
    #[error("connection closed mid-record after {bytes_read} of {record_len} bytes")]
    ShortRead { bytes_read: usize, record_len: usize },
    #[error("I/O error reading command: {0}")]
    Io(#[from] std::io::Error),
    #[error("unrecognized command type byte {0:#04x}")]
    UnknownCommandType(u8),
}

/// Fatal failures that abort startup before the engine ever accepts a
/// connection.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to bind socket at {path}: {source}")]
    Bind {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
