//!Serve single lines of large, static text files using a pregenerated line index. The file is
//!scanned once, afterwards every line is read with a single positioned, bounded read.

pub mod config;
pub mod error;
/// Positional reads on a single shared file handle
pub mod file;
/// The index of files
pub mod index;
/// A file which gets opened again for each read
pub mod reopen;
pub mod server;
/// A single file handle with serialized seek and read
pub mod shared_file;
pub mod store;

pub use file::PositionalFile;
pub use reopen::ReopenFile;
pub use shared_file::SharedFile;
pub use store::{LineStore, ReadStrategy};

use async_trait::async_trait;
use index::Index;

pub type Result<T> = std::result::Result<T, error::Error>;

pub trait Indexable {
    /// Returns a reference to the files index.
    fn get_index(&self) -> &Index;

    /// Returns the total amount of lines in the file.
    #[inline]
    fn total_lines(&self) -> usize {
        self.get_index().len()
    }
}

/// A trait defining behavior for reading certain lines directly from indexed files. Reads take
/// `&self` so a single reader can serve many lines concurrently.
#[async_trait]
pub trait ReadByLine: Indexable + Send + Sync {
    /// Should append all bytes of `line`, including its line break, to `buf`. Returns the amount
    /// of bytes read.
    async fn read_line_into(&self, line: usize, buf: &mut Vec<u8>) -> Result<usize>;

    /// Reads the given line without its line break
    async fn read_line_raw(&self, line: usize) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        self.read_line_into(line, &mut buf).await?;
        strip_line_break(&mut buf);
        Ok(buf)
    }

    /// Reads the given line
    async fn read_line(&self, line: usize) -> Result<String> {
        Ok(String::from_utf8(self.read_line_raw(line).await?)?)
    }
}

/// Removes a trailing \n. Any other byte, including a \r before it, is part of the line
#[inline]
pub(crate) fn strip_line_break(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
    }
}

/// Returns the amount of bytes between `start` and `end`
#[inline]
pub(crate) fn span_len(start: u64, end: u64) -> Result<usize> {
    usize::try_from(end - start).map_err(|_| error::Error::MalformedIndex)
}
