use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use async_std::{fs, task};
use async_trait::async_trait;
use clap::ValueEnum;
use log::{debug, info};

use crate::{
    error::Error, file::PositionalFile, index::Index, reopen::ReopenFile,
    shared_file::SharedFile, Indexable, ReadByLine, Result,
};

/// How a `LineStore` reads the bytes of a line from its file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReadStrategy {
    /// Positional reads on one shared handle. No read depends on a file position, so any amount
    /// of reads can run at the same time.
    #[default]
    Positional,
    /// Open a new handle for every read.
    Reopen,
    /// One shared handle. Seek and read are guarded by a mutex.
    Locked,
}

/// Holds the line index of a file together with a reader for it. Built once, never mutated
/// afterwards and safe to share between any amount of concurrent requests.
pub struct LineStore {
    path: PathBuf,
    index: Arc<Index>,
    source: Box<dyn ReadByLine>,
}

impl LineStore {
    /// Index the file at `path` and serve it using positional reads.
    ///
    /// Returns an error if the file can't be opened or read.
    #[inline]
    pub async fn build<P: AsRef<Path>>(path: P) -> Result<LineStore> {
        Self::build_with(path, ReadStrategy::default()).await
    }

    /// Index the file at `path` and serve it using `strategy`.
    pub async fn build_with<P: AsRef<Path>>(path: P, strategy: ReadStrategy) -> Result<LineStore> {
        let path = path.as_ref().to_path_buf();
        info!("Indexing '{}'", path.display());
        let start = Instant::now();

        let std_file = {
            let path = path.clone();
            task::spawn_blocking(move || std::fs::File::open(path)).await?
        };

        // The scan uses a duplicate of the handle so the handle itself can be kept for reading
        let mut scan_file = fs::File::from(std_file.try_clone()?);
        let index = Arc::new(Index::build(&mut scan_file).await?);

        info!(
            "Indexing complete. Found {} lines ({} bytes) in {:.2?}",
            index.len(),
            index.data_len(),
            start.elapsed()
        );
        debug!(
            "Index uses {} bytes, serving with {:?}",
            index.len_bytes(),
            strategy
        );

        let source: Box<dyn ReadByLine> = match strategy {
            ReadStrategy::Positional => {
                Box::new(PositionalFile::new(std_file, Arc::clone(&index)))
            }
            ReadStrategy::Reopen => Box::new(ReopenFile::new(&path, Arc::clone(&index))),
            ReadStrategy::Locked => {
                Box::new(SharedFile::new(scan_file, Arc::clone(&index)).await?)
            }
        };

        Ok(Self {
            path,
            index,
            source,
        })
    }

    /// Returns the content of line `line` without its line break.
    ///
    /// Returns `Error::OutOfRange` if `line` is negative or not below `total_lines()`, and
    /// `Error::Io` if the file couldn't be read.
    pub async fn get_line(&self, line: i64) -> Result<Vec<u8>> {
        let total = self.total_lines();
        let out_of_range = || Error::OutOfRange { line, total };

        let pos = usize::try_from(line).map_err(|_| out_of_range())?;
        if pos >= total {
            return Err(out_of_range());
        }

        self.source.read_line_raw(pos).await
    }

    /// Returns the path of the served file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the length of the file in bytes, as seen while indexing.
    #[inline]
    pub fn file_len(&self) -> u64 {
        self.index.data_len()
    }
}

impl Indexable for LineStore {
    #[inline]
    fn get_index(&self) -> &Index {
        &self.index
    }
}

#[async_trait]
impl ReadByLine for LineStore {
    #[inline]
    async fn read_line_into(&self, line: usize, buf: &mut Vec<u8>) -> Result<usize> {
        self.source.read_line_into(line, buf).await
    }
}

impl std::fmt::Debug for LineStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineStore")
            .field("path", &self.path)
            .field("lines", &self.index.len())
            .field("file_len", &self.index.data_len())
            .finish()
    }
}
