//! BLOB chunking.
//!
//! Grounded on `spec.md` §4.H and `sysync_SDK/Sources/blobs.cpp`'s
//! streaming contract: a BLOB is read or written in bounded chunks
//! rather than loaded whole, tracked as `(block, total_size, first,
//! last)`, one stream active per item at a time.

use crate::error::{Error, Result};

pub const DEFAULT_BLOCK_SIZE: usize = 2048;

#[derive(Debug, Clone)]
pub struct BlobChunk {
    pub data: Vec<u8>,
    pub total_size: usize,
    pub first: bool,
    pub last: bool,
}

pub struct BlobReader<'a> {
    data: &'a [u8],
    offset: usize,
    block_size: usize,
}

impl<'a> BlobReader<'a> {
    pub fn new(data: &'a [u8], block_size: usize) -> Self {
        Self {
            data,
            offset: 0,
            block_size: block_size.max(1),
        }
    }

    pub fn next_chunk(&mut self) -> Option<BlobChunk> {
        if self.offset > self.data.len() {
            return None;
        }
        let first = self.offset == 0;
        let end = (self.offset + self.block_size).min(self.data.len());
        let chunk = self.data[self.offset..end].to_vec();
        let last = end >= self.data.len();
        // Push offset past len+0 once the final (possibly empty) chunk
        // has been yielded, so the next call reports exhaustion.
        self.offset = if last { self.data.len() + 1 } else { end };
        Some(BlobChunk {
            data: chunk,
            total_size: self.data.len(),
            first,
            last,
        })
    }
}

/// Accumulates incoming chunks for a write stream; enforces that only
/// one write stream is active per item (the caller holds a single
/// `BlobWriter` for the duration of the write).
pub struct BlobWriter {
    buffer: Vec<u8>,
    expected_total: Option<usize>,
    finished: bool,
}

impl BlobWriter {
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            expected_total: None,
            finished: false,
        }
    }

    pub fn write_chunk(&mut self, chunk: BlobChunk) -> Result<()> {
        if self.finished {
            return Err(Error::Generic("BLOB write stream already finished".into()));
        }
        if chunk.first {
            self.buffer.clear();
            self.expected_total = Some(chunk.total_size);
        }
        self.buffer.extend_from_slice(&chunk.data);
        if chunk.last {
            self.finished = true;
        }
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn into_bytes(self) -> Result<Vec<u8>> {
        if !self.finished {
            return Err(Error::Generic("BLOB write stream is not complete".into()));
        }
        Ok(self.buffer)
    }
}

impl Default for BlobWriter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reader_splits_into_bounded_chunks() {
        let data = vec![0u8; 5000];
        let mut reader = BlobReader::new(&data, DEFAULT_BLOCK_SIZE);
        let mut chunks = Vec::new();
        while let Some(c) = reader.next_chunk() {
            chunks.push(c);
        }
        assert!(chunks.len() > 1);
        assert!(chunks.first().unwrap().first);
        assert!(chunks.last().unwrap().last);
        assert!(chunks.iter().all(|c| c.data.len() <= DEFAULT_BLOCK_SIZE));
    }

    #[test]
    fn reader_of_empty_blob_yields_single_empty_chunk() {
        let data: Vec<u8> = Vec::new();
        let mut reader = BlobReader::new(&data, DEFAULT_BLOCK_SIZE);
        let chunk = reader.next_chunk().unwrap();
        assert!(chunk.first && chunk.last);
        assert!(chunk.data.is_empty());
        assert!(reader.next_chunk().is_none());
    }

    #[test]
    fn writer_reassembles_chunks_in_order() {
        let data = vec![7u8; 5000];
        let mut reader = BlobReader::new(&data, 1024);
        let mut writer = BlobWriter::new();
        while let Some(chunk) = reader.next_chunk() {
            writer.write_chunk(chunk).unwrap();
        }
        assert!(writer.is_finished());
        assert_eq!(writer.into_bytes().unwrap(), data);
    }

    #[test]
    fn writer_rejects_writes_after_finish() {
        let mut writer = BlobWriter::new();
        writer
            .write_chunk(BlobChunk {
                data: vec![1],
                total_size: 1,
                first: true,
                last: true,
            })
            .unwrap();
        let err = writer.write_chunk(BlobChunk {
            data: vec![2],
            total_size: 1,
            first: false,
            last: true,
        });
        assert!(err.is_err());
    }
}
