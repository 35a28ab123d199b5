//! Loads a data file with strict corruption detection
//!
//! Every frame's checksum is verified on load. A file must start with a
//! header frame followed by a dictionary frame; everything after that must
//! be case frames whose cell count matches the dictionary.

use std::fs;
use std::path::Path;

use super::errors::{RecordError, RecordResult};
use super::record::{decode_case, decode_dictionary, decode_frame, decode_header, Cell, FrameKind, VariableDef};
use crate::observability::{log_event_with_fields, Event};

/// Contents of a data file as read from disk
#[derive(Debug)]
pub struct LoadedFile {
    pub compressed: bool,
    pub variables: Vec<VariableDef>,
    pub cases: Vec<Vec<Cell>>,
}

/// Sequential frame reader over an in-memory copy of a file.
pub struct FileReader {
    data: Vec<u8>,
    offset: usize,
}

impl FileReader {
    /// Reads the whole file at `path`.
    pub fn open(path: &Path) -> RecordResult<Self> {
        let data = fs::read(path)?;
        Ok(Self { data, offset: 0 })
    }

    #[cfg(test)]
    fn from_bytes(data: Vec<u8>) -> Self {
        Self { data, offset: 0 }
    }

    /// Returns the current byte offset.
    pub fn current_offset(&self) -> u64 {
        self.offset as u64
    }

    /// Returns whether there are more frames to read.
    pub fn has_more(&self) -> bool {
        self.offset < self.data.len()
    }

    /// Reads the next frame, verifying its checksum.
    ///
    /// Returns `Ok(None)` at end of file.
    pub fn read_next(&mut self) -> RecordResult<Option<(FrameKind, Vec<u8>)>> {
        if !self.has_more() {
            return Ok(None);
        }
        let (kind, payload, consumed) = decode_frame(&self.data[self.offset..], self.current_offset())?;
        let payload = payload.to_vec();
        self.offset += consumed;
        Ok(Some((kind, payload)))
    }

    fn expect(&mut self, wanted: FrameKind) -> RecordResult<Vec<u8>> {
        let offset = self.current_offset();
        match self.read_next()? {
            Some((kind, payload)) if kind == wanted => Ok(payload),
            Some((kind, _)) => Err(RecordError::UnexpectedKind {
                offset,
                kind: kind as u8,
            }),
            None => Err(RecordError::Truncated {
                offset,
                reason: format!("missing {:?} frame", wanted),
            }),
        }
    }

    /// Reads and validates the complete file.
    pub fn load(mut self) -> RecordResult<LoadedFile> {
        let compressed = decode_header(&self.expect(FrameKind::Header)?)?;
        let variables = decode_dictionary(&self.expect(FrameKind::Dictionary)?)?;

        let mut cases = Vec::new();
        while self.has_more() {
            let offset = self.current_offset();
            let payload = self.expect(FrameKind::Case)?;
            cases.push(decode_case(&payload, variables.len(), offset)?);
        }

        Ok(LoadedFile {
            compressed,
            variables,
            cases,
        })
    }
}

/// Loads the file at `path`, logging any corruption found.
pub fn load_file(path: &Path) -> RecordResult<LoadedFile> {
    let result = FileReader::open(path).and_then(FileReader::load);
    if let Err(ref err) = result {
        if err.is_corruption() {
            let path = path.display().to_string();
            let reason = err.to_string();
            log_event_with_fields(Event::RecordCorruption, &[("path", &path), ("reason", &reason)]);
        }
    }
    result
}
