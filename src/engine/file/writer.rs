//! Append-only frame writer
//!
//! Frames are buffered and reach the disk on `finish`. With
//! `sync_each_case` set, every case frame is flushed and fsynced as it is
//! written.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use super::errors::RecordResult;
use super::record::{encode_frame, FrameKind};

pub struct FileWriter {
    writer: BufWriter<File>,
    sync_each_case: bool,
    bytes_written: u64,
}

impl FileWriter {
    /// Creates `path`, truncating any existing file.
    pub fn create(path: &Path, sync_each_case: bool) -> RecordResult<Self> {
        let file = File::create(path)?;
        Ok(Self::wrap(file, sync_each_case))
    }

    /// Opens an existing file for appending frames.
    pub fn append(path: &Path, sync_each_case: bool) -> RecordResult<Self> {
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self::wrap(file, sync_each_case))
    }

    fn wrap(file: File, sync_each_case: bool) -> Self {
        Self {
            writer: BufWriter::new(file),
            sync_each_case,
            bytes_written: 0,
        }
    }

    /// Bytes written through this writer so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn write_frame(&mut self, kind: FrameKind, payload: &[u8]) -> RecordResult<()> {
        let frame = encode_frame(kind, payload);
        self.writer.write_all(&frame)?;
        self.bytes_written += frame.len() as u64;

        if kind == FrameKind::Case && self.sync_each_case {
            self.sync()?;
        }
        Ok(())
    }

    fn sync(&mut self) -> RecordResult<()> {
        self.writer.flush()?;
        self.writer.get_ref().sync_all()?;
        Ok(())
    }

    /// Flushes and fsyncs everything written.
    pub fn finish(mut self) -> RecordResult<()> {
        self.sync()
    }
}
