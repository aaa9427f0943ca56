//! Charsets and FDSelect.

use core::ops;

use super::Cursor;
use crate::{
    alloc::{vec, Vec},
    errors::ParseErrorKind,
    ParseError,
};

/// Custom (i.e., not predefined) charset. Only its location is recorded; the charset is copied
/// verbatim to subsets of CID-keyed fonts.
#[derive(Debug, Clone)]
pub(crate) struct Charset {
    pub(crate) offset: usize,
    pub(crate) byte_len: usize,
}

impl Charset {
    pub(crate) fn parse(data: &[u8], offset: usize, glyph_count: usize) -> Result<Self, ParseError> {
        let mut cursor = Cursor::at(data, offset)?;
        let format = cursor.read_u8()?;
        // `.notdef` is not covered by the charset
        let covered_glyphs = glyph_count.saturating_sub(1);
        match format {
            0 => cursor.skip(2 * covered_glyphs)?,
            1 | 2 => {
                let mut covered = 0;
                while covered < covered_glyphs {
                    cursor.skip(2)?; // first SID / CID
                    let left = if format == 1 {
                        usize::from(cursor.read_u8()?)
                    } else {
                        usize::from(cursor.read_u16()?)
                    };
                    covered += left + 1;
                }
            }
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedFormat(format),
                    offset,
                ))
            }
        }

        Ok(Self {
            offset,
            byte_len: cursor.position() - offset,
        })
    }

    pub(crate) fn range(&self) -> ops::Range<usize> {
        self.offset..self.offset + self.byte_len
    }
}

/// Parsed FDSelect mapping glyphs to Font DICTs.
#[derive(Debug, Clone)]
pub(crate) struct FdSelect {
    pub(crate) offset: usize,
    pub(crate) byte_len: usize,
    /// Font DICT index for each glyph.
    font_dicts: Vec<u8>,
}

impl FdSelect {
    pub(crate) fn parse(
        data: &[u8],
        offset: usize,
        glyph_count: usize,
        font_dict_count: usize,
    ) -> Result<Self, ParseError> {
        let mut cursor = Cursor::at(data, offset)?;
        let format = cursor.read_u8()?;
        let font_dicts = match format {
            0 => {
                let bytes = cursor.slice(cursor.position()..cursor.position() + glyph_count)?;
                cursor.skip(glyph_count)?;
                bytes.to_vec()
            }
            3 => Self::parse_ranges(&mut cursor, glyph_count)?,
            _ => {
                return Err(ParseError::new(
                    ParseErrorKind::UnexpectedFormat(format),
                    offset,
                ))
            }
        };

        if let Some(&fd) = font_dicts
            .iter()
            .find(|&&fd| usize::from(fd) >= font_dict_count)
        {
            return Err(ParseError::new(
                ParseErrorKind::FontDictOutOfRange(fd),
                offset,
            ));
        }

        Ok(Self {
            offset,
            byte_len: cursor.position() - offset,
            font_dicts,
        })
    }

    fn parse_ranges(cursor: &mut Cursor<'_>, glyph_count: usize) -> Result<Vec<u8>, ParseError> {
        let range_count = cursor.read_u16()?;
        let mut font_dicts = vec![0; glyph_count];
        let mut first = usize::from(cursor.read_u16()?);
        for _ in 0..range_count {
            let fd = cursor.read_u8()?;
            let next = usize::from(cursor.read_u16()?);
            if next < first || next > glyph_count {
                return Err(cursor.err(ParseErrorKind::RangeOutOfBounds {
                    range: first..next,
                    len: glyph_count,
                }));
            }
            font_dicts[first..next].fill(fd);
            first = next;
        }
        Ok(font_dicts)
    }

    /// Gets the Font DICT for the specified glyph. Glyphs outside the FDSelect map to Font DICT 0.
    pub(crate) fn font_dict(&self, glyph: usize) -> u8 {
        self.font_dicts.get(glyph).copied().unwrap_or(0)
    }

    pub(crate) fn range(&self) -> ops::Range<usize> {
        self.offset..self.offset + self.byte_len
    }
}
