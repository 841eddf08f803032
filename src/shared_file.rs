use std::{io::SeekFrom, sync::Arc};

use async_std::{
    fs,
    io::{prelude::*, BufReader},
    path::Path,
    sync::Mutex,
};
use async_trait::async_trait;

use crate::{index::Index, span_len, Indexable, ReadByLine, Result};

/// A wrapper around a single `async_std::fs::File` which implements `ReadByLine`. Since all reads
/// share one file position, seeking and reading is done while holding a lock.
#[derive(Debug)]
pub struct SharedFile {
    inner: Mutex<Inner>,
    index: Arc<Index>,
}

#[derive(Debug)]
struct Inner {
    file: BufReader<fs::File>,
    /// The line which ends at the current position. `None` if the position is unknown
    last_line: Option<usize>,
}

impl SharedFile {
    /// Open a file and read it using `index`. Expects the index to be properly built for the
    /// files content.
    pub async fn open<P: AsRef<Path>>(path: P, index: Arc<Index>) -> Result<SharedFile> {
        let file = fs::File::open(path).await?;
        Self::new(file, index).await
    }

    /// Use an already opened file. The position of `file` doesn't matter.
    pub async fn new(file: fs::File, index: Arc<Index>) -> Result<SharedFile> {
        let mut file = BufReader::new(file);
        file.seek(SeekFrom::Start(0)).await?;

        Ok(Self {
            inner: Mutex::new(Inner {
                file,
                last_line: None,
            }),
            index,
        })
    }
}

impl Indexable for SharedFile {
    #[inline]
    fn get_index(&self) -> &Index {
        &self.index
    }
}

#[async_trait]
impl ReadByLine for SharedFile {
    async fn read_line_into(&self, line: usize, buf: &mut Vec<u8>) -> Result<usize> {
        let (start, end) = self.get_index().range(line)?;
        let len = span_len(start, end)?;

        let mut inner = self.inner.lock().await;

        // We don't need to seek if we're sequencially reading the file, aka. if
        // line == last_line + 1
        let sequential = line > 0 && inner.last_line == Some(line - 1);

        // If this read fails or gets cancelled the position is unknown
        inner.last_line = None;

        if !sequential {
            inner.file.seek(SeekFrom::Start(start)).await?;
        }

        let old_len = buf.len();
        buf.resize(old_len + len, 0);
        if let Err(e) = inner.file.read_exact(&mut buf[old_len..]).await {
            buf.truncate(old_len);
            return Err(e.into());
        }

        inner.last_line = Some(line);
        Ok(len)
    }
}
