use bytes::{BufMut, BytesMut};

use crate::error::{FrameError, Result};
use crate::record::{Field, Record, FIELD_COUNT};

/// Synchronization marker: `A5 5A A5 7F`.
///
/// Read as a little-endian `f32` this is the signalling NaN `0x7FA55AA5`,
/// which no arithmetic produces. No proper prefix of the marker is also a
/// suffix of it, so two occurrences can never overlap.
pub const MARKER: [u8; 4] = [0xA5, 0x5A, 0xA5, 0x7F];

/// Marker length in bytes.
pub const MARKER_SIZE: usize = MARKER.len();

/// Encoded size of one field.
pub const FIELD_SIZE: usize = 4;

/// Encoded size of all six fields.
pub const PAYLOAD_SIZE: usize = FIELD_COUNT * FIELD_SIZE;

/// Total wire size of a frame: marker (4) + 6 fields × 4 = 28 bytes.
pub const FRAME_SIZE: usize = MARKER_SIZE + PAYLOAD_SIZE;

/// Encode a single field as little-endian IEEE-754 single precision.
///
/// Every bit pattern, NaN payloads included, survives [`decode_field`].
pub fn encode_field(value: f32) -> [u8; FIELD_SIZE] {
    value.to_le_bytes()
}

/// Decode a single field from exactly four bytes.
pub fn decode_field(bytes: &[u8]) -> Result<f32> {
    let array: [u8; FIELD_SIZE] = bytes.try_into().map_err(|_| FrameError::InvalidLength {
        len: bytes.len(),
        expected: FIELD_SIZE,
    })?;
    Ok(decode_field_array(&array))
}

/// Decode a single field from a fixed-size array.
pub fn decode_field_array(bytes: &[u8; FIELD_SIZE]) -> f32 {
    f32::from_le_bytes(*bytes)
}

/// Encode a record into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────────┬────────┬────────┬────────┬────────┬────────┬────────┐
/// │ Marker (4B) │ curr_x │ curr_y │ pred_x │ pred_y │ goal_x │ goal_y │
/// │ A5 5A A5 7F │ f32 LE │ f32 LE │ f32 LE │ f32 LE │ f32 LE │ f32 LE │
/// └─────────────┴────────┴────────┴────────┴────────┴────────┴────────┘
/// ```
pub fn encode_frame(record: &Record, dst: &mut BytesMut) {
    dst.reserve(FRAME_SIZE);
    dst.put_slice(&MARKER);
    for value in record.to_array() {
        dst.put_slice(&encode_field(value));
    }
}

/// Decode one complete, already-aligned frame.
///
/// This is the batch counterpart of the reassembler for callers that hold a
/// whole frame; stream input goes through [`Reassembler`](crate::Reassembler).
pub fn decode_frame(src: &[u8]) -> Result<Record> {
    if src.len() != FRAME_SIZE {
        return Err(FrameError::InvalidLength {
            len: src.len(),
            expected: FRAME_SIZE,
        });
    }
    if src[..MARKER_SIZE] != MARKER {
        return Err(FrameError::InvalidMarker);
    }

    let mut record = Record::default();
    for (field, chunk) in Field::ALL
        .iter()
        .zip(src[MARKER_SIZE..].chunks_exact(FIELD_SIZE))
    {
        record.set(*field, decode_field(chunk)?);
    }
    Ok(record)
}

/// Offset of the first marker occurrence in `haystack`.
pub fn find_marker(haystack: &[u8]) -> Option<usize> {
    haystack
        .windows(MARKER_SIZE)
        .position(|window| window == MARKER)
}
