// Serializes `all_rows` into a self-describing little-endian binary
// format, and decodes it back.

use crate::error::ErrorKind;
use crate::parser::Parser;

const MAGIC: u32 = 0x4F43_5356;
const VERSION: u32 = 1;
const HEADER_SIZE: usize = 24;

/// Packs `all_rows` into the wire format. Returns an empty buffer (and
/// records `FieldTooLargeToPack`) if any field exceeds 65 535 bytes;
/// returns an empty buffer with no error if there are no rows.
pub fn pack(parser: &mut Parser) -> Vec<u8> {
    let rows = parser.all_rows();
    if rows.is_empty() {
        return Vec::new();
    }

    for row in rows {
        for field in row {
            if field.len() > u16::MAX as usize {
                parser.record_field_too_large();
                return Vec::new();
            }
        }
    }

    let row_count = rows.len();
    let field_count = rows.first().map(|r| r.len()).unwrap_or(0);
    let field_bytes: usize = rows
        .iter()
        .flat_map(|row| row.iter())
        .map(|field| 2 + field.len())
        .sum();
    let total = HEADER_SIZE + row_count * 4 + field_bytes;

    let mut buf = Vec::with_capacity(total);
    buf.extend_from_slice(&MAGIC.to_le_bytes());
    buf.extend_from_slice(&VERSION.to_le_bytes());
    buf.extend_from_slice(&(row_count as u32).to_le_bytes());
    buf.extend_from_slice(&(field_count as u32).to_le_bytes());
    buf.extend_from_slice(&(total as u64).to_le_bytes());

    // Row offset table: filled in as we go, since each row's absolute
    // start depends on the length of every row before it.
    let table_start = buf.len();
    buf.resize(table_start + row_count * 4, 0);

    for (i, row) in rows.iter().enumerate() {
        let row_start = buf.len() as u32;
        buf[table_start + i * 4..table_start + i * 4 + 4].copy_from_slice(&row_start.to_le_bytes());
        for field in row {
            buf.extend_from_slice(&(field.len() as u16).to_le_bytes());
            buf.extend_from_slice(field);
        }
    }

    debug_assert_eq!(buf.len(), total);
    buf
}

/// Decodes a buffer produced by `pack` back into owned rows. Returns `None`
/// if the header is malformed (bad magic, truncated buffer).
pub fn decode(buf: &[u8]) -> Option<Vec<Vec<Vec<u8>>>> {
    if buf.len() < HEADER_SIZE {
        return None;
    }
    let magic = u32::from_le_bytes(buf[0..4].try_into().ok()?);
    if magic != MAGIC {
        return None;
    }
    let _version = u32::from_le_bytes(buf[4..8].try_into().ok()?);
    let row_count = u32::from_le_bytes(buf[8..12].try_into().ok()?) as usize;
    let _field_count = u32::from_le_bytes(buf[12..16].try_into().ok()?);
    let total_bytes = u64::from_le_bytes(buf[16..24].try_into().ok()?) as usize;
    if total_bytes != buf.len() {
        return None;
    }

    let table_start = HEADER_SIZE;
    let table_end = table_start + row_count * 4;
    if table_end > buf.len() {
        return None;
    }

    let mut row_starts = Vec::with_capacity(row_count);
    for i in 0..row_count {
        let off = table_start + i * 4;
        row_starts.push(u32::from_le_bytes(buf[off..off + 4].try_into().ok()?) as usize);
    }

    let mut rows = Vec::with_capacity(row_count);
    for i in 0..row_count {
        let start = row_starts[i];
        let end = if i + 1 < row_count { row_starts[i + 1] } else { buf.len() };
        if start > end || end > buf.len() {
            return None;
        }
        rows.push(decode_row(&buf[start..end])?);
    }

    Some(rows)
}

fn decode_row(mut slice: &[u8]) -> Option<Vec<Vec<u8>>> {
    let mut fields = Vec::new();
    while !slice.is_empty() {
        if slice.len() < 2 {
            return None;
        }
        let len = u16::from_le_bytes(slice[0..2].try_into().ok()?) as usize;
        slice = &slice[2..];
        if slice.len() < len {
            return None;
        }
        fields.push(slice[..len].to_vec());
        slice = &slice[len..];
    }
    Some(fields)
}

impl Parser {
    pub(crate) fn record_field_too_large(&mut self) {
        self.record(ErrorKind::FieldTooLargeToPack, b"field exceeds 65535 bytes", b"");
    }
}
