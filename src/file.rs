use std::{io, path::Path, sync::Arc};

use async_std::task;
use async_trait::async_trait;

use crate::{index::Index, span_len, Indexable, ReadByLine, Result};

/// A wrapper around `std::fs::File` which implements `ReadByLine` using positional reads. The
/// handle has no shared file position, so reads never have to wait for each other.
#[derive(Debug, Clone)]
pub struct PositionalFile {
    inner_file: Arc<std::fs::File>,
    index: Arc<Index>,
}

impl PositionalFile {
    /// Open a file and read it using `index`. Expects the index to be properly built for the
    /// files content.
    pub async fn open<P: AsRef<Path>>(path: P, index: Arc<Index>) -> Result<PositionalFile> {
        let path = path.as_ref().to_path_buf();
        let file = task::spawn_blocking(move || std::fs::File::open(path)).await?;
        Ok(Self::new(file, index))
    }

    /// Use an already opened file.
    #[inline]
    pub fn new(file: std::fs::File, index: Arc<Index>) -> PositionalFile {
        Self {
            inner_file: Arc::new(file),
            index,
        }
    }
}

impl Indexable for PositionalFile {
    #[inline]
    fn get_index(&self) -> &Index {
        &self.index
    }
}

#[async_trait]
impl ReadByLine for PositionalFile {
    async fn read_line_into(&self, line: usize, buf: &mut Vec<u8>) -> Result<usize> {
        let (start, end) = self.get_index().range(line)?;
        let len = span_len(start, end)?;

        let file = Arc::clone(&self.inner_file);
        let data = task::spawn_blocking(move || {
            let mut data = vec![0; len];
            read_exact_at(&file, &mut data, start)?;
            Ok::<_, io::Error>(data)
        })
        .await?;

        buf.extend_from_slice(&data);
        Ok(len)
    }
}

#[cfg(unix)]
#[inline]
fn read_exact_at(file: &std::fs::File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &std::fs::File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                let tmp = buf;
                buf = &mut tmp[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }

    Ok(())
}
