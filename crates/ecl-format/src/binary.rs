//! Unformatted (binary, big-endian) layout.
//!
//! Header record (24 bytes):
//!
//! ```text
//! [16][NAME....][count:i32][TYPE][16]
//! ```
//!
//! followed by the payload blocks described in [`crate::block`].

use std::io::{self, BufRead, Read, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::array::ArrayData;
use crate::error::{EclFormatError, EclResult};
use crate::types::{ArrayType, NAME_WIDTH};

const HEADER_RECORD_LEN: i32 = 16;

/// Decoded array header.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    pub name: String,
    pub array_type: ArrayType,
    pub count: usize,
}

/// Read one header record. Returns `Ok(None)` at a clean end of file.
pub fn read_header<R: BufRead>(reader: &mut R) -> EclResult<Option<Header>> {
    if reader.fill_buf()?.is_empty() {
        return Ok(None);
    }

    let head = reader.read_i32::<BigEndian>()?;
    if head != HEADER_RECORD_LEN {
        return Err(EclFormatError::InvalidHeader(format!(
            "expected header marker {}, found {}",
            HEADER_RECORD_LEN, head
        )));
    }

    let mut name = [0u8; NAME_WIDTH];
    reader.read_exact(&mut name)?;
    let count = reader.read_i32::<BigEndian>()?;
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;

    let tail = reader.read_i32::<BigEndian>()?;
    if tail != head {
        return Err(EclFormatError::InvalidHeader(format!(
            "header tail marker {} does not match head {}",
            tail, head
        )));
    }

    let name = String::from_utf8_lossy(&name).trim_end().to_string();
    let array_type = ArrayType::from_tag(&String::from_utf8_lossy(&tag))?;

    if count < 0 {
        return Err(EclFormatError::InvalidHeader(format!(
            "negative element count {} for array '{}'",
            count, name
        )));
    }

    Ok(Some(Header {
        name,
        array_type,
        count: count as usize,
    }))
}

/// Read one head or tail block marker.
pub fn read_marker<R: Read>(reader: &mut R) -> io::Result<i32> {
    reader.read_i32::<BigEndian>()
}

/// Read and decode a whole payload, validating every block's markers.
pub fn read_payload<R: Read>(
    reader: &mut R,
    name: &str,
    array_type: ArrayType,
    count: usize,
) -> EclResult<ArrayData> {
    if array_type == ArrayType::Mess {
        return Ok(ArrayData::Mess);
    }

    let element_size = array_type.element_size();
    let per_block = array_type.block_elements();
    let mut buf = BytesMut::zeroed(count * element_size);
    let mut filled = 0usize;
    let mut remaining = count;

    while remaining > 0 {
        let head = read_marker(reader)?;
        let expected = remaining.min(per_block) * element_size;

        if head < 0 || head as usize != expected {
            return Err(EclFormatError::corrupted(
                name,
                format!("block head marker {} where {} bytes were expected", head, expected),
            ));
        }

        reader.read_exact(&mut buf[filled..filled + expected])?;
        filled += expected;

        let tail = read_marker(reader)?;
        if tail != head {
            return Err(EclFormatError::corrupted(
                name,
                format!("block tail marker {} does not match head {}", tail, head),
            ));
        }

        remaining -= expected / element_size;
    }

    Ok(decode(array_type, buf.freeze(), count))
}

/// Decode `count` big-endian elements from a payload with markers removed.
pub fn decode(array_type: ArrayType, mut data: Bytes, count: usize) -> ArrayData {
    match array_type {
        ArrayType::Inte => ArrayData::Inte((0..count).map(|_| data.get_i32()).collect()),
        ArrayType::Real => ArrayData::Real((0..count).map(|_| data.get_f32()).collect()),
        ArrayType::Doub => ArrayData::Doub((0..count).map(|_| data.get_f64()).collect()),
        ArrayType::Logi => ArrayData::Logi((0..count).map(|_| data.get_i32() != 0).collect()),
        ArrayType::Char | ArrayType::C0nn(_) => {
            let width = array_type.element_size();
            ArrayData::Char(
                (0..count)
                    .map(|_| {
                        let raw = data.split_to(width);
                        String::from_utf8_lossy(&raw).trim_end().to_string()
                    })
                    .collect(),
            )
        }
        ArrayType::Mess => ArrayData::Mess,
    }
}

/// Write a header record.
pub fn write_header<W: Write>(
    writer: &mut W,
    name: &str,
    array_type: ArrayType,
    count: usize,
) -> EclResult<()> {
    writer.write_i32::<BigEndian>(HEADER_RECORD_LEN)?;
    writer.write_all(format!("{:<width$}", name, width = NAME_WIDTH).as_bytes())?;
    writer.write_i32::<BigEndian>(count as i32)?;
    writer.write_all(array_type.tag().as_bytes())?;
    writer.write_i32::<BigEndian>(HEADER_RECORD_LEN)?;
    Ok(())
}

/// Encode and write a payload split into marker-bracketed blocks.
pub fn write_payload<W: Write>(
    writer: &mut W,
    array_type: ArrayType,
    data: &ArrayData,
) -> EclResult<()> {
    let encoded = encode(array_type, data);
    let block_bytes = array_type.block_elements() * array_type.element_size();

    for block in encoded.chunks(block_bytes.max(1)) {
        writer.write_i32::<BigEndian>(block.len() as i32)?;
        writer.write_all(block)?;
        writer.write_i32::<BigEndian>(block.len() as i32)?;
    }

    Ok(())
}

fn encode(array_type: ArrayType, data: &ArrayData) -> Bytes {
    let mut buf = BytesMut::with_capacity(data.len() * array_type.element_size());

    match data {
        ArrayData::Inte(values) => values.iter().for_each(|v| buf.put_i32(*v)),
        ArrayData::Real(values) => values.iter().for_each(|v| buf.put_f32(*v)),
        ArrayData::Doub(values) => values.iter().for_each(|v| buf.put_f64(*v)),
        ArrayData::Logi(values) => values
            .iter()
            .for_each(|v| buf.put_i32(if *v { -1 } else { 0 })),
        ArrayData::Char(values) => {
            let width = array_type.element_size();
            for value in values {
                let padded = format!("{:<width$.width$}", value, width = width);
                buf.put_slice(padded.as_bytes());
            }
        }
        ArrayData::Mess => {}
    }

    buf.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_roundtrip() {
        let mut out = Vec::new();
        write_header(&mut out, "ZCORN", ArrayType::Real, 1234).unwrap();
        assert_eq!(out.len(), 24);
        assert_eq!(&out[4..12], b"ZCORN   ");

        let mut cursor = Cursor::new(out);
        let header = read_header(&mut cursor).unwrap().unwrap();
        assert_eq!(header.name, "ZCORN");
        assert_eq!(header.array_type, ArrayType::Real);
        assert_eq!(header.count, 1234);
        assert!(read_header(&mut cursor).unwrap().is_none());
    }

    #[test]
    fn test_payload_spans_blocks() {
        let values: Vec<i32> = (0..2500).collect();
        let mut out = Vec::new();
        write_payload(&mut out, ArrayType::Inte, &ArrayData::Inte(values.clone())).unwrap();
        assert_eq!(out.len() as u64, ArrayType::Inte.size_on_disk(2500, false));

        let decoded = read_payload(&mut Cursor::new(out), "TEST", ArrayType::Inte, 2500).unwrap();
        assert_eq!(decoded, ArrayData::Inte(values));
    }

    #[test]
    fn test_tail_mismatch_is_corruption() {
        let mut out = Vec::new();
        write_payload(&mut out, ArrayType::Real, &ArrayData::Real(vec![1.0, 2.0])).unwrap();
        let last = out.len() - 1;
        out[last] ^= 0xFF;

        let err = read_payload(&mut Cursor::new(out), "PARAMS", ArrayType::Real, 2).unwrap_err();
        assert!(matches!(err, EclFormatError::CorruptedData { .. }));
    }

    #[test]
    fn test_logical_and_strings() {
        let mut out = Vec::new();
        write_payload(&mut out, ArrayType::Logi, &ArrayData::Logi(vec![true, false])).unwrap();
        assert_eq!(&out[4..8], &[0xFF, 0xFF, 0xFF, 0xFF]);

        let strings = ArrayData::Char(vec!["OP_1".to_string(), ":+:+:+:+".to_string()]);
        let mut out = Vec::new();
        write_payload(&mut out, ArrayType::Char, &strings).unwrap();
        let decoded = read_payload(&mut Cursor::new(out), "WGNAMES", ArrayType::Char, 2).unwrap();
        assert_eq!(decoded, strings);
    }
}
