//! Formatted (text) layout.
//!
//! Header line:
//!
//! ```text
//!  'PARAMS  '          42 'REAL'
//! ```
//!
//! followed by fixed-width columns, e.g. four `REAL` values of 17 characters
//! per line. Every block of 1000 elements (105 for strings) ends with a line
//! break, even when the last line of the block is not full.

use std::io::{BufRead, Read, Write};

use crate::array::ArrayData;
use crate::binary::Header;
use crate::error::{EclFormatError, EclResult};
use crate::types::{ArrayType, NAME_WIDTH};

/// Read one header line. Returns `Ok(None)` at end of file.
pub fn read_header<R: BufRead>(reader: &mut R) -> EclResult<Option<Header>> {
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        if !line.trim().is_empty() {
            break;
        }
    }

    parse_header_line(&line).map(Some)
}

fn parse_header_line(line: &str) -> EclResult<Header> {
    let invalid = || EclFormatError::InvalidHeader(format!("malformed header line '{}'", line.trim_end()));

    let mut parts = line.split('\'');
    let _lead = parts.next().ok_or_else(invalid)?;
    let name = parts.next().ok_or_else(invalid)?.trim_end().to_string();
    let count = parts
        .next()
        .ok_or_else(invalid)?
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid())?;
    let tag = parts.next().ok_or_else(invalid)?;

    Ok(Header {
        name,
        array_type: ArrayType::from_tag(tag)?,
        count,
    })
}

/// Write a header line.
pub fn write_header<W: Write>(
    writer: &mut W,
    name: &str,
    array_type: ArrayType,
    count: usize,
) -> EclResult<()> {
    writeln!(
        writer,
        " '{:<width$}' {:>11} '{}'",
        name,
        count,
        array_type.tag(),
        width = NAME_WIDTH
    )?;
    Ok(())
}

/// Read and decode a whole formatted payload.
pub fn read_payload<R: Read>(
    reader: &mut R,
    name: &str,
    array_type: ArrayType,
    count: usize,
) -> EclResult<ArrayData> {
    let size = array_type.size_on_disk(count, true) as usize;
    let mut raw = vec![0u8; size];
    reader.read_exact(&mut raw)?;
    let text = String::from_utf8_lossy(&raw);

    decode(&text, name, array_type, count)
}

/// Decode `count` elements from the text of a formatted payload.
pub fn decode(text: &str, name: &str, array_type: ArrayType, count: usize) -> EclResult<ArrayData> {
    if array_type.is_string() {
        // quoted strings may contain blanks, so split on the quotes instead
        let values: Vec<String> = text
            .split('\'')
            .skip(1)
            .step_by(2)
            .take(count)
            .map(|s| s.trim_end().to_string())
            .collect();

        if values.len() != count {
            return Err(EclFormatError::corrupted(
                name,
                format!("expected {} strings, found {}", count, values.len()),
            ));
        }
        return Ok(ArrayData::Char(values));
    }

    let tokens: Vec<&str> = text.split_ascii_whitespace().take(count).collect();
    if tokens.len() != count {
        return Err(EclFormatError::corrupted(
            name,
            format!("expected {} values, found {}", count, tokens.len()),
        ));
    }

    let bad_token = |token: &str| EclFormatError::corrupted(name, format!("invalid value '{}'", token));

    let data = match array_type {
        ArrayType::Inte => ArrayData::Inte(
            tokens
                .iter()
                .map(|t| t.parse::<i32>().map_err(|_| bad_token(*t)))
                .collect::<EclResult<_>>()?,
        ),
        ArrayType::Real => ArrayData::Real(
            tokens
                .iter()
                .map(|t| parse_real(t).ok_or_else(|| bad_token(*t)))
                .collect::<EclResult<_>>()?,
        ),
        ArrayType::Doub => ArrayData::Doub(
            tokens
                .iter()
                .map(|t| parse_double(t).ok_or_else(|| bad_token(*t)))
                .collect::<EclResult<_>>()?,
        ),
        ArrayType::Logi => ArrayData::Logi(
            tokens
                .iter()
                .map(|t| match *t {
                    "T" => Ok(true),
                    "F" => Ok(false),
                    other => Err(bad_token(other)),
                })
                .collect::<EclResult<_>>()?,
        ),
        ArrayType::Mess => ArrayData::Mess,
        ArrayType::Char | ArrayType::C0nn(_) => unreachable!("strings handled above"),
    };

    Ok(data)
}

/// Parse one formatted `REAL` token such as `0.12345678E+01`.
pub fn parse_real(token: &str) -> Option<f32> {
    parse_double(token).map(|v| v as f32)
}

/// Parse one formatted floating point token, accepting `D` exponents.
pub fn parse_double(token: &str) -> Option<f64> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if token.contains(['D', 'd']) {
        token.replace(['D', 'd'], "E").parse().ok()
    } else {
        token.parse().ok()
    }
}

/// Parse up to `count` real values, replacing missing or malformed tokens
/// with `sentinel`. Returns the values and the number of replaced tokens.
pub fn parse_reals_lenient(text: &str, count: usize, sentinel: f32) -> (Vec<f32>, usize) {
    let mut tokens = text.split_ascii_whitespace();
    let mut replaced = 0usize;

    let values = (0..count)
        .map(|_| match tokens.next().and_then(parse_real) {
            Some(v) => v,
            None => {
                replaced += 1;
                sentinel
            }
        })
        .collect();

    (values, replaced)
}

/// Write a payload in fixed-width columns.
pub fn write_payload<W: Write>(
    writer: &mut W,
    array_type: ArrayType,
    data: &ArrayData,
) -> EclResult<()> {
    let cells: Vec<String> = match data {
        ArrayData::Inte(values) => values.iter().map(|v| format!("{:>12}", v)).collect(),
        ArrayData::Real(values) => values
            .iter()
            .map(|v| format!("{:>17}", fortran_exponent(*v as f64, 8, 'E')))
            .collect(),
        ArrayData::Doub(values) => values
            .iter()
            .map(|v| format!("{:>23}", fortran_exponent(*v, 14, 'D')))
            .collect(),
        ArrayData::Logi(values) => values
            .iter()
            .map(|v| format!("  {}", if *v { 'T' } else { 'F' }))
            .collect(),
        ArrayData::Char(values) => {
            let width = array_type.element_size();
            values
                .iter()
                .map(|v| format!(" '{:<width$.width$}'", v, width = width))
                .collect()
        }
        ArrayData::Mess => Vec::new(),
    };

    let layout = array_type.formatted_layout();
    let per_block = layout.elements_per_block;
    let total = cells.len();

    for (n, cell) in cells.iter().enumerate() {
        writer.write_all(cell.as_bytes())?;

        let in_block = n % per_block + 1;
        let block_end = in_block == per_block || n + 1 == total;
        if in_block % layout.columns == 0 || block_end {
            writer.write_all(b"\n")?;
        }
    }

    Ok(())
}

/// Format a value as `0.ddddE+xx` with `digits` mantissa digits.
pub fn fortran_exponent(value: f64, digits: usize, exp_char: char) -> String {
    if !value.is_finite() {
        return format!("{}", value);
    }
    if value == 0.0 {
        return format!("0.{}{}+00", "0".repeat(digits), exp_char);
    }

    // d.ddddde<exp> -> 0.dddddd x 10^(exp+1)
    let scientific = format!("{:.*e}", digits - 1, value.abs());
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent = exponent.parse::<i32>().unwrap_or(0) + 1;
    let mantissa_digits: String = mantissa.chars().filter(|c| c.is_ascii_digit()).collect();
    let sign = if value < 0.0 { "-" } else { "" };
    let exp_sign = if exponent < 0 { '-' } else { '+' };

    format!(
        "{}0.{}{}{}{:02}",
        sign,
        mantissa_digits,
        exp_char,
        exp_sign,
        exponent.abs()
    )
}
