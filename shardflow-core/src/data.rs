//! Data sources
//!
//! `IterableData` is the read capability the fingerprint builder consumes.
//! Sizes, chunk counts and the padded size all derive from `size()` unless an
//! implementation overrides them.

use crate::chunk::{chunks_for_size, padded_size_for, segments_for_size};
use crate::error::{Result, ShardflowError};
use bytes::Bytes;
use parking_lot::Mutex;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

/// Data that can be split into chunks and segments for upload
pub trait IterableData: Send + Sync {
    /// Logical size in bytes
    fn size(&self) -> u64;

    /// Read into `buf` starting at `offset`, returning the number of bytes read
    fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize>;

    /// Number of 256-byte chunks
    fn num_chunks(&self) -> u64 {
        chunks_for_size(self.size())
    }

    /// Number of segments
    fn num_segments(&self) -> u64 {
        segments_for_size(self.size())
    }

    /// Size after flow padding
    fn padded_size(&self) -> u64 {
        padded_size_for(self.size())
    }
}

/// Data held entirely in memory
#[derive(Debug, Clone)]
pub struct DataInMemory {
    data: Bytes,
}

impl DataInMemory {
    /// Wrap in-memory content. Empty content is rejected.
    pub fn new(data: impl Into<Bytes>) -> Result<Self> {
        let data: Bytes = data.into();
        if data.is_empty() {
            return Err(ShardflowError::EmptyData);
        }
        Ok(Self { data })
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }
}

impl IterableData for DataInMemory {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let len = self.data.len() as u64;
        if offset >= len {
            return Ok(0);
        }

        let start = offset as usize;
        let n = buf.len().min(self.data.len() - start);
        buf[..n].copy_from_slice(&self.data[start..start + n]);
        Ok(n)
    }
}

/// Data backed by a file on disk
pub struct FileData {
    file: Mutex<File>,
    size: u64,
}

impl FileData {
    /// Open a file for reading. Empty files are rejected.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let size = file.metadata()?.len();
        if size == 0 {
            return Err(ShardflowError::EmptyData);
        }

        Ok(Self {
            file: Mutex::new(file),
            size,
        })
    }
}

impl IterableData for FileData {
    fn size(&self) -> u64 {
        self.size
    }

    fn read(&self, buf: &mut [u8], offset: u64) -> Result<usize> {
        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(offset))?;

        // fill as much of the buffer as the file allows
        let mut read = 0;
        while read < buf.len() {
            match file.read(&mut buf[read..])? {
                0 => break,
                n => read += n,
            }
        }
        Ok(read)
    }
}
