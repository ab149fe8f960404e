// pgm.rs - Binary PGM (P5) header codec

use thiserror::Error;

/// Bytes read from the front of a grid file when looking for its header.
pub const HEADER_PROBE: usize = 100;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PgmError {
    #[error("not a binary PGM file (expected magic P5)")]
    Magic,
    #[error("header ends before the {0} field")]
    Truncated(&'static str),
    #[error("bad {field} field: {text:?}")]
    Field { field: &'static str, text: String },
    #[error("maxval {0} needs more than one byte per cell")]
    WideSamples(u32),
    #[error("expected {expected} cell bytes, found {found}")]
    ShortData { expected: usize, found: usize },
    #[error("{width}x{height} cells do not fit in memory")]
    TooLarge { width: usize, height: usize },
}

/// A parsed `P5` header and the number of bytes it occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PgmHeader {
    pub width: usize,
    pub height: usize,
    pub maxval: u32,
    pub len: usize,
}

impl PgmHeader {
    /// The header written for a `size x size` generation.
    pub fn square(size: usize) -> Self {
        let mut header = Self { width: size, height: size, maxval: 255, len: 0 };
        header.len = header.encode().len();
        header
    }

    pub fn encode(&self) -> String {
        format!("P5\n{} {}\n{}\n", self.width, self.height, self.maxval)
    }

    /// Parses the header at the front of `bytes`. Comment lines starting
    /// with `#` are allowed between fields.
    pub fn parse(bytes: &[u8]) -> Result<Self, PgmError> {
        match bytes {
            [b'P', b'5', next, ..] if next.is_ascii_whitespace() || *next == b'#' => {}
            _ => return Err(PgmError::Magic),
        }
        let mut pos = 2;
        let width = next_field(bytes, &mut pos, "width")?;
        let height = next_field(bytes, &mut pos, "height")?;
        let maxval = next_field(bytes, &mut pos, "maxval")?;

        // Exactly one whitespace byte separates maxval from the raster.
        match bytes.get(pos) {
            Some(byte) if byte.is_ascii_whitespace() => pos += 1,
            Some(_) => return Err(PgmError::Field { field: "maxval", text: "missing separator".into() }),
            None => return Err(PgmError::Truncated("raster")),
        }

        if maxval == 0 || maxval > 255 {
            return Err(PgmError::WideSamples(maxval as u32));
        }
        Ok(Self { width, height, maxval: maxval as u32, len: pos })
    }
}

fn next_field(bytes: &[u8], pos: &mut usize, field: &'static str) -> Result<usize, PgmError> {
    // Skip whitespace and comments.
    loop {
        match bytes.get(*pos) {
            Some(b'#') => {
                while bytes.get(*pos).is_some_and(|&b| b != b'\n') {
                    *pos += 1;
                }
            }
            Some(byte) if byte.is_ascii_whitespace() => *pos += 1,
            Some(_) => break,
            None => return Err(PgmError::Truncated(field)),
        }
    }

    let start = *pos;
    while bytes.get(*pos).is_some_and(u8::is_ascii_digit) {
        *pos += 1;
    }
    let text = String::from_utf8_lossy(&bytes[start..*pos]).into_owned();
    if *pos == bytes.len() {
        return Err(PgmError::Truncated(field));
    }
    text.parse().map_err(|_| PgmError::Field { field, text })
}

/// Splits a whole PGM file into its header and `width * height` cell bytes.
pub fn decode(bytes: &[u8]) -> Result<(PgmHeader, &[u8]), PgmError> {
    let header = PgmHeader::parse(&bytes[..bytes.len().min(HEADER_PROBE)])?;
    let expected = header
        .width
        .checked_mul(header.height)
        .ok_or(PgmError::TooLarge { width: header.width, height: header.height })?;
    let found = bytes.len() - header.len;
    if found < expected {
        return Err(PgmError::ShortData { expected, found });
    }
    Ok((header, &bytes[header.len..header.len + expected]))
}

/// A whole `size x size` grid file.
pub fn encode(size: usize, cells: &[u8]) -> Vec<u8> {
    let mut bytes = PgmHeader::square(size).encode().into_bytes();
    bytes.extend_from_slice(cells);
    bytes
}
