//! Fixed-layout binary record decoder.
//!
//! Each record is a 48-byte header followed by `pdu_len` bytes of payload.
//! The payload is never interpreted, only skipped. Fields are read in the
//! byte order of the machine that produced the trace; no conversion is done.

use super::action::{action_char, category};
use crate::utils::config::{
    DEBUG_DUMP_RECORDS, RECORD_HEADER_SIZE, TRACE_MAGIC, TRACE_MAGIC_MASK,
};
use crate::utils::error::ParseError;
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One decoded trace event. Never mutated after decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockIoEvent {
    pub sequence: u32,
    /// Nanoseconds
    pub timestamp: u64,
    pub sector: u64,
    pub byte_count: u32,
    pub action: u32,
    pub pid: u32,
    pub device: u32,
    pub cpu: u32,
    pub error: u16,
    /// Length of the skipped payload that followed this header
    pub pdu_len: u16,
}

impl BlockIoEvent {
    /// Category bitmask of this event
    pub fn category(&self) -> u32 {
        category(self.action)
    }

    /// One-character action mnemonic
    pub fn action_char(&self) -> char {
        action_char(self.action)
    }
}

/// Decode one record from the start of `data`.
///
/// **Public** - single-record entry point
///
/// # Returns
/// The event and the number of bytes consumed (header plus payload)
///
/// # Errors
/// * `ParseError::TruncatedHeader` - fewer than 48 bytes available
/// * `ParseError::BadMagic` - header does not carry the trace magic
/// * `ParseError::TruncatedPayload` - declared payload runs past the buffer
pub fn decode_record(data: &[u8]) -> Result<(BlockIoEvent, usize), ParseError> {
    decode_at(data, 0)
}

fn decode_at(buf: &[u8], offset: usize) -> Result<(BlockIoEvent, usize), ParseError> {
    let data = buf.get(offset..).unwrap_or_default();
    let Some(header) = data.get(..RECORD_HEADER_SIZE) else {
        return Err(ParseError::TruncatedHeader {
            offset,
            available: data.len(),
            needed: RECORD_HEADER_SIZE,
        });
    };

    let magic = read_u32(header, 0);
    if magic & TRACE_MAGIC_MASK != TRACE_MAGIC {
        return Err(ParseError::BadMagic { offset, magic });
    }

    let event = BlockIoEvent {
        sequence: read_u32(header, 4),
        timestamp: read_u64(header, 8),
        sector: read_u64(header, 16),
        byte_count: read_u32(header, 24),
        action: read_u32(header, 28),
        pid: read_u32(header, 32),
        device: read_u32(header, 36),
        cpu: read_u32(header, 40),
        error: read_u16(header, 44),
        pdu_len: read_u16(header, 46),
    };

    let payload = event.pdu_len as usize;
    let available = data.len() - RECORD_HEADER_SIZE;
    if payload > available {
        return Err(ParseError::TruncatedPayload {
            offset,
            declared: payload,
            available,
        });
    }

    Ok((event, RECORD_HEADER_SIZE + payload))
}

/// Encode an event back into its on-disk form, followed by `pdu_len` zero bytes.
///
/// **Public** - used to build synthetic traces
pub fn encode_record(event: &BlockIoEvent) -> Vec<u8> {
    let mut out = Vec::with_capacity(RECORD_HEADER_SIZE + event.pdu_len as usize);
    out.extend_from_slice(&(TRACE_MAGIC | 0x07).to_ne_bytes());
    out.extend_from_slice(&event.sequence.to_ne_bytes());
    out.extend_from_slice(&event.timestamp.to_ne_bytes());
    out.extend_from_slice(&event.sector.to_ne_bytes());
    out.extend_from_slice(&event.byte_count.to_ne_bytes());
    out.extend_from_slice(&event.action.to_ne_bytes());
    out.extend_from_slice(&event.pid.to_ne_bytes());
    out.extend_from_slice(&event.device.to_ne_bytes());
    out.extend_from_slice(&event.cpu.to_ne_bytes());
    out.extend_from_slice(&event.error.to_ne_bytes());
    out.extend_from_slice(&event.pdu_len.to_ne_bytes());
    out.resize(RECORD_HEADER_SIZE + event.pdu_len as usize, 0);
    out
}

/// Iterator over the records of a bulk-read trace buffer.
///
/// Stops after the first error; a decode error is not recoverable because
/// record boundaries are lost.
pub struct RecordReader<'a> {
    buf: &'a [u8],
    offset: usize,
    decoded: usize,
    failed: bool,
}

impl<'a> RecordReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            offset: 0,
            decoded: 0,
            failed: false,
        }
    }

    /// Records decoded so far
    pub fn decoded(&self) -> usize {
        self.decoded
    }
}

impl Iterator for RecordReader<'_> {
    type Item = Result<BlockIoEvent, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.offset >= self.buf.len() {
            return None;
        }

        match decode_at(self.buf, self.offset) {
            Ok((event, consumed)) => {
                if self.decoded < DEBUG_DUMP_RECORDS {
                    dump_record(self.decoded, &event, consumed);
                }
                self.offset += consumed;
                self.decoded += 1;
                Some(Ok(event))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}

/// Read a whole trace file and decode every record.
///
/// **Public** - bulk entry point used by the analyze command
pub fn read_trace_file(path: impl AsRef<Path>) -> Result<Vec<BlockIoEvent>, ParseError> {
    let path = path.as_ref();
    debug!("Reading trace file: {}", path.display());

    let buf = std::fs::read(path)?;
    let events = RecordReader::new(&buf).collect::<Result<Vec<_>, _>>()?;

    debug!("Decoded {} records ({} bytes)", events.len(), buf.len());
    Ok(events)
}

fn dump_record(index: usize, event: &BlockIoEvent, consumed: usize) {
    debug!("========== record[{}] ==========", index);
    debug!("sequence : {}", event.sequence);
    debug!(
        "time     : {}.{:09}",
        event.timestamp / 1_000_000_000,
        event.timestamp % 1_000_000_000
    );
    debug!("sector   : {}", event.sector);
    debug!("bytes    : {}", event.byte_count);
    debug!("action   : {:#010x} ({})", event.action, event.action_char());
    debug!("pid      : {}", event.pid);
    debug!("device   : {}", event.device);
    debug!("cpu      : {}", event.cpu);
    debug!("error    : {}", event.error);
    debug!("pdu_len  : {} ({} bytes consumed)", event.pdu_len, consumed);
}

// ---------------------------------------------------------------------------
// Byte-reading helpers. Callers guarantee the header slice is full length.
// ---------------------------------------------------------------------------

fn read_u16(data: &[u8], offset: usize) -> u16 {
    let mut raw = [0u8; 2];
    raw.copy_from_slice(&data[offset..offset + 2]);
    u16::from_ne_bytes(raw)
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    let mut raw = [0u8; 4];
    raw.copy_from_slice(&data[offset..offset + 4]);
    u32::from_ne_bytes(raw)
}

fn read_u64(data: &[u8], offset: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[offset..offset + 8]);
    u64::from_ne_bytes(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::action::{make_action, ACTION_QUEUE, CATEGORY_READ};

    fn sample(pdu_len: u16) -> BlockIoEvent {
        BlockIoEvent {
            sequence: 3,
            timestamp: 1_500_000_000,
            sector: 2048,
            byte_count: 4096,
            action: make_action(CATEGORY_READ, ACTION_QUEUE),
            pid: 77,
            device: 8,
            cpu: 2,
            error: 0,
            pdu_len,
        }
    }

    #[test]
    fn test_decode_record_header_only() {
        let bytes = encode_record(&sample(0));
        let (event, consumed) = decode_record(&bytes).unwrap();
        assert_eq!(consumed, RECORD_HEADER_SIZE);
        assert_eq!(event, sample(0));
        assert_eq!(event.action_char(), 'Q');
    }

    #[test]
    fn test_payload_is_skipped() {
        let mut bytes = encode_record(&sample(16));
        bytes.extend(encode_record(&sample(0)));

        let events: Vec<_> = RecordReader::new(&bytes).collect::<Result<_, _>>().unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].pdu_len, 16);
        assert_eq!(events[1].pdu_len, 0);
    }

    #[test]
    fn test_truncated_header() {
        let bytes = encode_record(&sample(0));
        let err = decode_record(&bytes[..20]).unwrap_err();
        assert!(matches!(err, ParseError::TruncatedHeader { available: 20, .. }));
    }

    #[test]
    fn test_truncated_payload() {
        let mut bytes = encode_record(&sample(32));
        bytes.truncate(RECORD_HEADER_SIZE + 8);
        let err = decode_record(&bytes).unwrap_err();
        assert!(matches!(err, ParseError::TruncatedPayload { declared: 32, .. }));
    }

    #[test]
    fn test_bad_magic_stops_reader() {
        let mut bytes = encode_record(&sample(0));
        bytes[..4].copy_from_slice(&0xdead_beef_u32.to_ne_bytes());
        bytes.extend(encode_record(&sample(0)));

        let mut reader = RecordReader::new(&bytes);
        assert!(matches!(reader.next(), Some(Err(ParseError::BadMagic { offset: 0, .. }))));
        assert!(reader.next().is_none());
        assert_eq!(reader.decoded(), 0);
    }

    #[test]
    fn test_read_trace_file() {
        let mut bytes = Vec::new();
        for i in 0..3 {
            let mut ev = sample(0);
            ev.sequence = i;
            bytes.extend(encode_record(&ev));
        }
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), &bytes).unwrap();

        let events = read_trace_file(file.path()).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[2].sequence, 2);
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_trace_file("/nonexistent/trace.bin").unwrap_err();
        assert!(matches!(err, ParseError::Io(_)));
    }
}
