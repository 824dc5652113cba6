use thiserror::Error;

/// Errors that can occur while probing, fetching, or merging a download.
#[derive(Error, Debug)]
pub enum DownloadError {
    /// Connection, DNS, or TLS failure underneath a request.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server returned status {status}")]
    Remote { status: u16 },

    /// Response metadata (content length or filename) could not be parsed.
    #[error("{0}")]
    Parse(String),

    /// A range request returned a different number of bytes than asked for.
    #[error("part {index}: got {actual} bytes, expected {expected}")]
    ShortRead {
        index: usize,
        expected: u64,
        actual: u64,
    },

    /// The merged file's digest does not match the expected value.
    #[error("corrupted file: sha-256 is {actual}, expected {expected}")]
    Integrity { expected: String, actual: String },

    #[error("cannot split {size} bytes into {parts} parts")]
    BadSplit { size: u64, parts: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
