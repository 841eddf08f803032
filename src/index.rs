use std::{io::ErrorKind, mem::size_of};

use async_std::io::{prelude::*, Read};
use itertools::Itertools;

use crate::{error::Error, Result};

/// Amount of bytes read at once while scanning for line breaks
const SCAN_BUF_SIZE: usize = 64 * 1024;

/// Contains an in-memory line-index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Index {
    /// Maps line to seek position in order to seek efficiently. The index within the Vec represents
    /// the line-index in the file
    inner: Vec<u64>,
    /// Amount of bytes of the indexed data. Marks the end of the last line
    data_len: u64,
}

impl Index {
    /// Create a new Index from a prebuilt list of line offsets. `data_len` is the length of the
    /// indexed data in bytes.
    ///
    /// Returns `Error::MalformedIndex` if the offsets don't start at 0, aren't strictly increasing
    /// or point behind the end of the data.
    pub fn new(offsets: Vec<u64>, data_len: u64) -> Result<Index> {
        let starts_at_zero = offsets
            .first()
            .map_or(data_len == 0, |first| *first == 0);
        let increasing = offsets.iter().tuple_windows().all(|(a, b)| a < b);
        let in_bounds = offsets.last().map_or(true, |last| *last < data_len);

        if !(starts_at_zero && increasing && in_bounds) {
            return Err(Error::MalformedIndex);
        }

        Ok(Self {
            inner: offsets,
            data_len,
        })
    }

    /// Build a new index for the text within `reader`, reading it from its current position until
    /// EOF. Offsets are counted from the position the reader is at when this is called.
    pub async fn build<R: Read + Unpin>(reader: &mut R) -> Result<Self> {
        Self::scan(reader, SCAN_BUF_SIZE).await
    }

    pub(crate) async fn scan<R: Read + Unpin>(reader: &mut R, buf_size: usize) -> Result<Self> {
        let mut line_index: Vec<u64> = Vec::new();
        let mut buf = vec![0u8; buf_size];

        // Offset of the first byte in `buf`
        let mut chunk_start: u64 = 0;
        // Set if the next byte read begins a new line
        let mut at_line_start = true;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };

            if at_line_start {
                line_index.push(chunk_start);
                at_line_start = false;
            }

            for pos in memchr::memchr_iter(b'\n', &buf[..n]) {
                // A trailing \n at EOF must not add an empty line, so lines starting in the next
                // chunk are only pushed once we know that chunk isn't empty
                if pos + 1 < n {
                    line_index.push(chunk_start + pos as u64 + 1);
                } else {
                    at_line_start = true;
                }
            }

            chunk_start += n as u64;
        }

        Ok(Self {
            inner: line_index,
            data_len: chunk_start,
        })
    }

    /// Get the Index value
    #[inline]
    pub fn get(&self, pos: usize) -> Result<u64> {
        self.inner
            .get(pos)
            .copied()
            .ok_or_else(|| Error::out_of_range(pos, self.len()))
    }

    /// Returns the byte range `[start, end)` of line `pos`, including its line break.
    #[inline]
    pub fn range(&self, pos: usize) -> Result<(u64, u64)> {
        let start = self.get(pos)?;
        let end = self.inner.get(pos + 1).copied().unwrap_or(self.data_len);
        Ok((start, end))
    }

    /// Returns the amount of items of the index. This represents the amount of lines in the file.
    #[inline]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Returns `true` if the index is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the amount of bytes the index occupies in memory
    #[inline]
    pub fn len_bytes(&self) -> usize {
        self.inner.len() * size_of::<u64>()
    }

    /// Returns the length of the indexed data in bytes
    #[inline]
    pub fn data_len(&self) -> u64 {
        self.data_len
    }

    #[inline]
    pub fn offsets(&self) -> &[u64] {
        &self.inner
    }
}
