use std::{io::SeekFrom, path::Path, sync::Arc};

use async_std::{fs, io::prelude::*, path::PathBuf};
use async_trait::async_trait;

use crate::{index::Index, span_len, Indexable, ReadByLine, Result};

/// Implements `ReadByLine` by opening a new `async_std::fs::File` for each read. Every read has
/// its own file position, so no reads have to wait for each other.
#[derive(Debug, Clone)]
pub struct ReopenFile {
    path: PathBuf,
    index: Arc<Index>,
}

impl ReopenFile {
    /// Creates a new `ReopenFile`. The file isn't opened until the first read. Expects the index
    /// to be properly built for the files content.
    #[inline]
    pub fn new<P: AsRef<Path>>(path: P, index: Arc<Index>) -> ReopenFile {
        Self {
            path: path.as_ref().to_path_buf().into(),
            index,
        }
    }
}

impl Indexable for ReopenFile {
    #[inline]
    fn get_index(&self) -> &Index {
        &self.index
    }
}

#[async_trait]
impl ReadByLine for ReopenFile {
    async fn read_line_into(&self, line: usize, buf: &mut Vec<u8>) -> Result<usize> {
        let (start, end) = self.get_index().range(line)?;
        let len = span_len(start, end)?;

        let mut file = fs::File::open(&self.path).await?;
        file.seek(SeekFrom::Start(start)).await?;

        let old_len = buf.len();
        buf.resize(old_len + len, 0);
        if let Err(e) = file.read_exact(&mut buf[old_len..]).await {
            buf.truncate(old_len);
            return Err(e.into());
        }

        Ok(len)
    }
}
