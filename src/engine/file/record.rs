//! On-disk record frames for the reference file engine
//!
//! Every record is one frame:
//!
//! ```text
//! +------------------+
//! | Frame Length     | (u32 LE, whole frame)
//! +------------------+
//! | Kind             | (u8: 1 header, 2 dictionary, 3 case)
//! +------------------+
//! | Payload          | (variable)
//! +------------------+
//! | Checksum         | (u32 LE)
//! +------------------+
//! ```
//!
//! Checksum covers all bytes except the checksum itself. A readable file is
//! one header frame, one dictionary frame, then any number of case frames.

use serde::{Deserialize, Serialize};

use super::checksum::{compute_checksum, verify_checksum};
use super::errors::{RecordError, RecordResult};
use crate::engine::{Alignment, FormatSpec, MeasurementLevel, SYSTEM_MISSING};

/// File signature at the start of the header payload
pub const MAGIC: &[u8; 8] = b"SAVKIT\0\x01";

/// length + kind + checksum
pub const MIN_FRAME_SIZE: usize = 4 + 1 + 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameKind {
    Header = 1,
    Dictionary = 2,
    Case = 3,
}

impl FrameKind {
    fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            1 => Some(FrameKind::Header),
            2 => Some(FrameKind::Dictionary),
            3 => Some(FrameKind::Case),
            _ => None,
        }
    }
}

/// Builds a complete frame around a payload.
pub fn encode_frame(kind: FrameKind, payload: &[u8]) -> Vec<u8> {
    let frame_length = (MIN_FRAME_SIZE + payload.len()) as u32;

    let mut frame = Vec::with_capacity(frame_length as usize);
    frame.extend_from_slice(&frame_length.to_le_bytes());
    frame.push(kind as u8);
    frame.extend_from_slice(payload);

    let checksum = compute_checksum(&frame);
    frame.extend_from_slice(&checksum.to_le_bytes());
    frame
}

/// Decodes the frame at the start of `data`, verifying its checksum.
///
/// `offset` is the frame's position in the file, used for error context.
/// Returns the kind, the payload and the number of bytes consumed.
pub fn decode_frame(data: &[u8], offset: u64) -> RecordResult<(FrameKind, &[u8], usize)> {
    if data.len() < MIN_FRAME_SIZE {
        return Err(RecordError::Truncated {
            offset,
            reason: format!("{} bytes remaining, minimum frame size is {}", data.len(), MIN_FRAME_SIZE),
        });
    }

    let frame_length = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    if frame_length < MIN_FRAME_SIZE || frame_length > data.len() {
        return Err(RecordError::Truncated {
            offset,
            reason: format!("frame length {} with {} bytes remaining", frame_length, data.len()),
        });
    }

    let body_end = frame_length - 4;
    let stored = u32::from_le_bytes([
        data[body_end],
        data[body_end + 1],
        data[body_end + 2],
        data[body_end + 3],
    ]);
    if !verify_checksum(&data[..body_end], stored) {
        return Err(RecordError::ChecksumMismatch { offset });
    }

    let kind = FrameKind::from_byte(data[4]).ok_or(RecordError::UnexpectedKind { offset, kind: data[4] })?;
    Ok((kind, &data[5..body_end], frame_length))
}

/// Header payload: signature plus compression flag
pub fn encode_header(compressed: bool) -> Vec<u8> {
    let mut payload = MAGIC.to_vec();
    payload.push(u8::from(compressed));
    payload
}

/// Returns the compression flag stored in a header payload
pub fn decode_header(payload: &[u8]) -> RecordResult<bool> {
    if payload.len() != MAGIC.len() + 1 || &payload[..MAGIC.len()] != MAGIC {
        return Err(RecordError::BadHeader("signature mismatch".into()));
    }
    match payload[MAGIC.len()] {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(RecordError::BadHeader(format!("compression flag {}", other))),
    }
}

/// One variable as stored in the dictionary frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableDef {
    pub name: String,
    /// 0 numeric, otherwise string length
    pub native_type: i32,
    #[serde(default)]
    pub label: String,
    pub column_width: u32,
    pub measurement_level: MeasurementLevel,
    pub alignment: Alignment,
    pub print_format: FormatSpec,
    pub write_format: FormatSpec,
    #[serde(default)]
    pub missing_format: i32,
    #[serde(default)]
    pub missing_numeric: [f64; 3],
    #[serde(default)]
    pub missing_strings: Vec<String>,
    #[serde(default)]
    pub numeric_labels: Vec<(f64, String)>,
    #[serde(default)]
    pub string_labels: Vec<(String, String)>,
}

impl VariableDef {
    /// A fresh variable with the engine's defaults for its type
    pub fn new(name: &str, native_type: i32) -> Self {
        let (format, alignment, level) = if native_type == 0 {
            (FormatSpec::numeric_default(), Alignment::Right, MeasurementLevel::Unknown)
        } else {
            (FormatSpec::string(native_type as u32), Alignment::Left, MeasurementLevel::Unknown)
        };
        Self {
            name: name.to_string(),
            native_type,
            label: String::new(),
            column_width: 8,
            measurement_level: level,
            alignment,
            print_format: format,
            write_format: format,
            missing_format: 0,
            missing_numeric: [0.0; 3],
            missing_strings: Vec::new(),
            numeric_labels: Vec::new(),
            string_labels: Vec::new(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.native_type == 0
    }

    /// Value of this variable in a freshly cleared case buffer
    pub fn blank_cell(&self) -> Cell {
        if self.is_numeric() {
            Cell::Number(SYSTEM_MISSING)
        } else {
            Cell::Text(String::new())
        }
    }
}

pub fn encode_dictionary(variables: &[VariableDef]) -> RecordResult<Vec<u8>> {
    Ok(serde_json::to_vec(variables)?)
}

pub fn decode_dictionary(payload: &[u8]) -> RecordResult<Vec<VariableDef>> {
    Ok(serde_json::from_slice(payload)?)
}

/// One value in a case buffer
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
}

const CELL_NUMBER: u8 = 0;
const CELL_TEXT: u8 = 1;
const CELL_SYSMIS: u8 = 2;

/// Case payload. With compression on, system-missing numbers take one byte.
pub fn encode_case(cells: &[Cell], compressed: bool) -> Vec<u8> {
    let mut buf = Vec::with_capacity(cells.len() * 9);
    for cell in cells {
        match cell {
            Cell::Number(v) if compressed && *v == SYSTEM_MISSING => buf.push(CELL_SYSMIS),
            Cell::Number(v) => {
                buf.push(CELL_NUMBER);
                buf.extend_from_slice(&v.to_le_bytes());
            }
            Cell::Text(s) => {
                buf.push(CELL_TEXT);
                buf.extend_from_slice(&(s.len() as u32).to_le_bytes());
                buf.extend_from_slice(s.as_bytes());
            }
        }
    }
    buf
}

pub fn decode_case(payload: &[u8], expected: usize, offset: u64) -> RecordResult<Vec<Cell>> {
    let truncated = |reason: &str| RecordError::Truncated {
        offset,
        reason: reason.to_string(),
    };

    let mut cells = Vec::with_capacity(expected);
    let mut pos = 0;
    while pos < payload.len() {
        let tag = payload[pos];
        pos += 1;
        match tag {
            CELL_NUMBER => {
                let bytes = payload.get(pos..pos + 8).ok_or_else(|| truncated("number cell"))?;
                let mut raw = [0u8; 8];
                raw.copy_from_slice(bytes);
                cells.push(Cell::Number(f64::from_le_bytes(raw)));
                pos += 8;
            }
            CELL_TEXT => {
                let len_bytes = payload.get(pos..pos + 4).ok_or_else(|| truncated("text length"))?;
                let len = u32::from_le_bytes([len_bytes[0], len_bytes[1], len_bytes[2], len_bytes[3]]) as usize;
                pos += 4;
                let text = payload.get(pos..pos + len).ok_or_else(|| truncated("text cell"))?;
                let text = String::from_utf8(text.to_vec()).map_err(|_| truncated("text cell is not UTF-8"))?;
                cells.push(Cell::Text(text));
                pos += len;
            }
            CELL_SYSMIS => cells.push(Cell::Number(SYSTEM_MISSING)),
            other => return Err(RecordError::UnexpectedKind { offset, kind: other }),
        }
    }

    if cells.len() != expected {
        return Err(RecordError::CellCount {
            expected,
            found: cells.len(),
        });
    }
    Ok(cells)
}
