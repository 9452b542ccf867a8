use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Raised by every cursor/read/peek primitive whose byte precondition
    /// fails. Recoverable: the caller decides whether it means "end of an
    /// optional field" or "truncated input".
    #[error("Insufficient bytes: {requested} requested, {available} available")]
    Underflow { requested: usize, available: usize },
    #[error("Bit position is invalid: {0}, must be between 0 and 7")]
    InvalidBitPosition(u32),
    #[error("Bit length is invalid: {0}, must be between 1 and 8")]
    InvalidBitLength(u32),
    #[error("Unknown encoding: {0}")]
    UnknownEncoding(String),
    #[error("Invalid utf16 sequence")]
    InvalidUtf16,
}

impl Error {
    pub(crate) fn underflow(requested: usize, available: usize) -> Self {
        Error::Underflow {
            requested,
            available,
        }
    }
}
