//! DICT data: parsing and encoding.

use core::ops;

use super::Cursor;
use crate::{
    alloc::{vec, Vec},
    errors::ParseErrorKind,
    ParseError,
};

/// DICT operator. Only operators relevant for subsetting are distinguished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DictOperator {
    Charset,
    Encoding,
    CharStrings,
    Private,
    Subrs,
    CharstringType,
    Ros,
    CidCount,
    FdArray,
    FdSelect,
    FontName,
    /// Other one-byte operator.
    Other(u8),
    /// Other escaped operator (`12 x`).
    OtherEscaped(u8),
}

impl DictOperator {
    const ESCAPE: u8 = 12;

    fn from_byte(byte: u8) -> Self {
        match byte {
            15 => Self::Charset,
            16 => Self::Encoding,
            17 => Self::CharStrings,
            18 => Self::Private,
            19 => Self::Subrs,
            _ => Self::Other(byte),
        }
    }

    fn from_escaped(byte: u8) -> Self {
        match byte {
            6 => Self::CharstringType,
            30 => Self::Ros,
            34 => Self::CidCount,
            36 => Self::FdArray,
            37 => Self::FdSelect,
            38 => Self::FontName,
            _ => Self::OtherEscaped(byte),
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Charset => "charset",
            Self::Encoding => "Encoding",
            Self::CharStrings => "CharStrings",
            Self::Private => "Private",
            Self::Subrs => "Subrs",
            Self::CharstringType => "CharstringType",
            Self::Ros => "ROS",
            Self::CidCount => "CIDCount",
            Self::FdArray => "FDArray",
            Self::FdSelect => "FDSelect",
            Self::FontName => "FontName",
            Self::Other(_) | Self::OtherEscaped(_) => "unknown",
        }
    }

    #[allow(clippy::cast_possible_truncation)] // intentional
    pub(crate) fn write(self, buffer: &mut Vec<u8>) {
        let escaped = match self {
            Self::Charset => 15,
            Self::Encoding => 16,
            Self::CharStrings => 17,
            Self::Private => 18,
            Self::Subrs => 19,
            Self::Other(byte) => u16::from(byte),
            Self::CharstringType => 6 | 0x100,
            Self::Ros => 30 | 0x100,
            Self::CidCount => 34 | 0x100,
            Self::FdArray => 36 | 0x100,
            Self::FdSelect => 37 | 0x100,
            Self::FontName => 38 | 0x100,
            Self::OtherEscaped(byte) => u16::from(byte) | 0x100,
        };
        if escaped > 0xff {
            buffer.push(Self::ESCAPE);
        }
        buffer.push((escaped & 0xff) as u8);
    }

    pub(crate) fn to_bytes(self) -> Vec<u8> {
        let mut bytes = vec![];
        self.write(&mut bytes);
        bytes
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Operand {
    Integer(i32),
    /// Real number. The value is never needed when subsetting, so it's not decoded.
    Real,
}

/// Single DICT entry: operands followed by an operator.
#[derive(Debug, Clone)]
pub(crate) struct DictEntry {
    pub(crate) operator: DictOperator,
    pub(crate) operands: Vec<Operand>,
    /// Absolute range of the entry (including operands) in the CFF data.
    pub(crate) range: ops::Range<usize>,
}

impl DictEntry {
    fn invalid(&self) -> ParseError {
        ParseError::new(
            ParseErrorKind::InvalidDictEntry(self.operator.name()),
            self.range.start,
        )
    }

    pub(crate) fn integer_operand(&self, idx: usize) -> Result<i32, ParseError> {
        match self.operands.get(idx) {
            Some(Operand::Integer(value)) => Ok(*value),
            _ => Err(self.invalid()),
        }
    }

    /// Gets a non-negative integer operand (e.g., an offset or a size).
    pub(crate) fn offset_operand(&self, idx: usize) -> Result<usize, ParseError> {
        let value = self.integer_operand(idx)?;
        usize::try_from(value).map_err(|_| self.invalid())
    }
}

/// Parses all entries in the DICT occupying the specified absolute range.
pub(crate) fn parse_entries(
    data: &[u8],
    range: ops::Range<usize>,
) -> Result<Vec<DictEntry>, ParseError> {
    let dict_data = Cursor::new(data).slice(0..range.end)?;
    let mut cursor = Cursor::at(dict_data, range.start)?;
    let mut entries = vec![];
    while !cursor.is_empty() {
        entries.push(read_entry(&mut cursor)?);
    }
    Ok(entries)
}

#[allow(clippy::cast_possible_wrap)] // intentional
fn read_entry(cursor: &mut Cursor<'_>) -> Result<DictEntry, ParseError> {
    let start = cursor.position();
    let mut operands = vec![];
    let operator = loop {
        let b0 = cursor.read_u8()?;
        let operand = match b0 {
            DictOperator::ESCAPE => break DictOperator::from_escaped(cursor.read_u8()?),
            0..=27 | 31 => break DictOperator::from_byte(b0),
            28 => Operand::Integer(i32::from(cursor.read_u16()? as i16)),
            29 => Operand::Integer(cursor.read_u32()? as i32),
            30 => {
                skip_real(cursor)?;
                Operand::Real
            }
            32..=246 => Operand::Integer(i32::from(b0) - 139),
            247..=250 => {
                let b1 = cursor.read_u8()?;
                Operand::Integer((i32::from(b0) - 247) * 256 + i32::from(b1) + 108)
            }
            251..=254 => {
                let b1 = cursor.read_u8()?;
                Operand::Integer(-(i32::from(b0) - 251) * 256 - i32::from(b1) - 108)
            }
            255 => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidDictOperand(b0),
                    cursor.position() - 1,
                ));
            }
        };
        operands.push(operand);
    };

    Ok(DictEntry {
        operator,
        operands,
        range: start..cursor.position(),
    })
}

/// Skips packed BCD nibbles of a real number up to and including the `0xf` terminator nibble.
fn skip_real(cursor: &mut Cursor<'_>) -> Result<(), ParseError> {
    loop {
        let byte = cursor.read_u8()?;
        if byte >> 4 == 0xf || byte & 0xf == 0xf {
            return Ok(());
        }
    }
}

/// Length of an integer written with [`write_fixed_integer()`].
pub(crate) const FIXED_INTEGER_LEN: usize = 5;

/// Writes an integer operand in the shortest encoding.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // intentional
pub(crate) fn write_integer(buffer: &mut Vec<u8>, value: i32) {
    match value {
        -107..=107 => buffer.push((value + 139) as u8),
        108..=1131 => {
            let value = value - 108;
            buffer.extend_from_slice(&[(value >> 8) as u8 + 247, value as u8]);
        }
        -1131..=-108 => {
            let value = -value - 108;
            buffer.extend_from_slice(&[(value >> 8) as u8 + 251, value as u8]);
        }
        _ => {
            if let Ok(value) = i16::try_from(value) {
                buffer.push(28);
                buffer.extend_from_slice(&value.to_be_bytes());
            } else {
                write_fixed_integer(buffer, value);
            }
        }
    }
}

/// Writes an integer operand in the 5-byte encoding, so that its length doesn't depend on the value.
pub(crate) fn write_fixed_integer(buffer: &mut Vec<u8>, value: i32) {
    buffer.push(29);
    buffer.extend_from_slice(&value.to_be_bytes());
}
