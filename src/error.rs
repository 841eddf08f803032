use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Reading the source file failed, either while indexing or while serving a line
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A custom index does not start at 0 or is not strictly increasing
    #[error("malformed index")]
    MalformedIndex,

    /// On request for a non existing line
    #[error("line {line} is out of bounds, the file has {total} lines")]
    OutOfRange { line: i64, total: usize },

    #[error("line is not valid utf-8")]
    Utf8(#[from] FromUtf8Error),
}

impl Error {
    /// Returns `true` if the error was caused by a line outside of the index.
    #[inline]
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, Self::OutOfRange { .. })
    }

    #[inline]
    pub(crate) fn out_of_range(line: usize, total: usize) -> Self {
        Self::OutOfRange {
            line: i64::try_from(line).unwrap_or(i64::MAX),
            total,
        }
    }
}
