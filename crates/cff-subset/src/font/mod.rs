//! CFF parsing logic.

use core::ops;

pub(crate) use self::{
    dict::{DictEntry, DictOperator},
    index::IndexRef,
    select::{Charset, FdSelect},
};
use crate::{
    alloc::{String, Vec},
    errors::{ParseErrorKind, Structure},
    ParseError,
};

pub(crate) mod dict;
mod index;
mod select;

/// Sequential / random-access reader over the CFF data. Positions are absolute.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub(crate) fn at(data: &'a [u8], offset: usize) -> Result<Self, ParseError> {
        let mut this = Self::new(data);
        this.seek(offset)?;
        Ok(this)
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub(crate) fn err(&self, kind: ParseErrorKind) -> ParseError {
        ParseError::new(kind, self.pos)
    }

    pub(crate) fn seek(&mut self, offset: usize) -> Result<(), ParseError> {
        if offset > self.data.len() {
            return Err(self.err(ParseErrorKind::OffsetOutOfBounds(offset)));
        }
        self.pos = offset;
        Ok(())
    }

    pub(crate) fn skip(&mut self, len: usize) -> Result<(), ParseError> {
        if self.data.len() - self.pos < len {
            return Err(self.err(ParseErrorKind::UnexpectedEof));
        }
        self.pos += len;
        Ok(())
    }

    pub(crate) fn read_byte_array<const N: usize>(&mut self) -> Result<[u8; N], ParseError> {
        let bytes = self
            .data
            .get(self.pos..)
            .and_then(|tail| tail.get(..N))
            .ok_or_else(|| self.err(ParseErrorKind::UnexpectedEof))?;
        let mut array = [0_u8; N];
        array.copy_from_slice(bytes);
        self.pos += N;
        Ok(array)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8, ParseError> {
        let [byte] = self.read_byte_array()?;
        Ok(byte)
    }

    pub(crate) fn read_u16(&mut self) -> Result<u16, ParseError> {
        self.read_byte_array().map(u16::from_be_bytes)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32, ParseError> {
        self.read_byte_array().map(u32::from_be_bytes)
    }

    /// Reads a big-endian unsigned integer of `size` bytes (1..=4).
    pub(crate) fn read_offset(&mut self, size: u8) -> Result<usize, ParseError> {
        let mut value = 0_usize;
        for _ in 0..size {
            value = (value << 8) | usize::from(self.read_u8()?);
        }
        Ok(value)
    }

    pub(crate) fn slice(&self, range: ops::Range<usize>) -> Result<&'a [u8], ParseError> {
        self.data.get(range.clone()).ok_or_else(|| {
            ParseError::new(
                ParseErrorKind::RangeOutOfBounds {
                    range: range.clone(),
                    len: self.data.len(),
                },
                range.start,
            )
        })
    }
}

/// Private DICT of a font or of a Font DICT, together with its local subroutines.
#[derive(Debug, Clone)]
pub(crate) struct PrivateDict {
    pub(crate) range: ops::Range<usize>,
    pub(crate) entries: Vec<DictEntry>,
    /// Local Subr INDEX referenced by the `Subrs` entry.
    pub(crate) subrs: Option<IndexRef>,
}

impl PrivateDict {
    /// Parses the dict referenced by a `Private` entry (`size offset Private`).
    fn from_entry(data: &[u8], entry: &DictEntry) -> Result<Self, ParseError> {
        let size = entry.offset_operand(0)?;
        let offset = entry.offset_operand(1)?;
        let range = offset..offset.saturating_add(size);
        Self::parse(data, range).map_err(|err| err.in_structure(Structure::PrivateDict))
    }

    fn parse(data: &[u8], range: ops::Range<usize>) -> Result<Self, ParseError> {
        let entries = dict::parse_entries(data, range.clone())?;
        let mut subrs = None;
        for entry in &entries {
            if entry.operator == DictOperator::Subrs {
                // `Subrs` offset is relative to the start of the Private DICT.
                let offset = range.start.saturating_add(entry.offset_operand(0)?);
                let index = IndexRef::at(data, offset)
                    .map_err(|err| err.in_structure(Structure::LocalSubrs))?;
                subrs = Some(index);
            }
        }
        Ok(Self {
            range,
            entries,
            subrs,
        })
    }
}

/// Font DICT from the FDArray of a CID-keyed font.
#[derive(Debug, Clone)]
pub(crate) struct FontDict {
    pub(crate) entries: Vec<DictEntry>,
    pub(crate) private: Option<PrivateDict>,
}

impl FontDict {
    fn parse(data: &[u8], range: ops::Range<usize>) -> Result<Self, ParseError> {
        let entries = dict::parse_entries(data, range)?;
        let private = entries
            .iter()
            .find(|entry| entry.operator == DictOperator::Private)
            .map(|entry| PrivateDict::from_entry(data, entry))
            .transpose()?;
        Ok(Self { entries, private })
    }
}

/// Descriptor of a single font in a [`Cff`] table.
///
/// Created once when parsing the table and read-only afterward.
#[derive(Debug, Clone)]
pub struct CffFont {
    pub(crate) name: String,
    pub(crate) name_range: ops::Range<usize>,
    pub(crate) top_dict: Vec<DictEntry>,
    pub(crate) charstring_type: u8,
    pub(crate) char_strings: IndexRef,
    /// `None` for predefined charsets.
    pub(crate) charset: Option<Charset>,
    /// Private DICT of a non-CID font.
    pub(crate) private: Option<PrivateDict>,
    /// Always present for CID fonts; `None` for non-CID fonts.
    pub(crate) fd_select: Option<FdSelect>,
    /// FDArray of a CID font; `None` for non-CID fonts.
    pub(crate) font_dicts: Option<Vec<FontDict>>,
}

impl CffFont {
    /// Charset offsets `0..=2` denote predefined charsets.
    const PREDEFINED_CHARSETS: usize = 2;

    fn parse(
        data: &[u8],
        name_range: ops::Range<usize>,
        top_dict_range: ops::Range<usize>,
    ) -> Result<Self, ParseError> {
        let name = String::from_utf8_lossy(&data[name_range.clone()]).into_owned();
        let top_dict = dict::parse_entries(data, top_dict_range)
            .map_err(|err| err.in_structure(Structure::TopDict))?;

        let mut is_cid = false;
        let mut charstring_type = 2;
        let (mut char_strings, mut charset, mut private) = (None, None, None);
        let (mut fd_array, mut fd_select) = (None, None);
        for entry in &top_dict {
            let entry_err = |err: ParseError| err.in_structure(Structure::TopDict);
            match entry.operator {
                DictOperator::Ros => is_cid = true,
                DictOperator::CharStrings => {
                    char_strings = Some(entry.offset_operand(0).map_err(entry_err)?);
                }
                DictOperator::Charset => charset = Some(entry.offset_operand(0).map_err(entry_err)?),
                DictOperator::Private => private = Some(entry),
                DictOperator::FdArray => fd_array = Some(entry.offset_operand(0).map_err(entry_err)?),
                DictOperator::FdSelect => {
                    fd_select = Some(entry.offset_operand(0).map_err(entry_err)?);
                }
                DictOperator::CharstringType => {
                    charstring_type = match entry.integer_operand(0).map_err(entry_err)? {
                        1 => 1,
                        2 => 2,
                        other => {
                            return Err(ParseError::new(
                                ParseErrorKind::UnexpectedCharstringType(other),
                                entry.range.start,
                            )
                            .in_structure(Structure::TopDict));
                        }
                    };
                }
                _ => { /* copied through on output */ }
            }
        }

        let char_strings = char_strings
            .ok_or_else(|| ParseError::missing_entry("CharStrings", Structure::TopDict))?;
        let char_strings = IndexRef::at(data, char_strings)
            .map_err(|err| err.in_structure(Structure::CharStrings))?;
        let glyph_count = char_strings.len();

        let charset = charset
            .filter(|&offset| offset > Self::PREDEFINED_CHARSETS)
            .map(|offset| Charset::parse(data, offset, glyph_count))
            .transpose()
            .map_err(|err| err.in_structure(Structure::Charset))?;

        let (private, fd_select, font_dicts) = if is_cid {
            let fd_array = fd_array
                .ok_or_else(|| ParseError::missing_entry("FDArray", Structure::TopDict))?;
            let font_dicts = Self::parse_fd_array(data, fd_array)
                .map_err(|err| err.in_structure(Structure::FdArray))?;
            if font_dicts.is_empty() {
                return Err(ParseError::new(ParseErrorKind::EmptyFdArray, fd_array)
                    .in_structure(Structure::FdArray));
            }
            let fd_select = fd_select
                .ok_or_else(|| ParseError::missing_entry("FDSelect", Structure::TopDict))?;
            let fd_select = FdSelect::parse(data, fd_select, glyph_count, font_dicts.len())
                .map_err(|err| err.in_structure(Structure::FdSelect))?;
            (None, Some(fd_select), Some(font_dicts))
        } else {
            let private = private
                .map(|entry| PrivateDict::from_entry(data, entry))
                .transpose()?;
            (private, None, None)
        };

        Ok(Self {
            name,
            name_range,
            top_dict,
            charstring_type,
            char_strings,
            charset,
            private,
            fd_select,
            font_dicts,
        })
    }

    fn parse_fd_array(data: &[u8], offset: usize) -> Result<Vec<FontDict>, ParseError> {
        let index = IndexRef::at(data, offset)?;
        (0..index.len())
            .map(|fd| FontDict::parse(data, index.range(fd)))
            .collect()
    }

    /// Gets the font name as recorded in the Name INDEX.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Checks whether this font is CID-keyed.
    pub fn is_cid(&self) -> bool {
        self.font_dicts.is_some()
    }

    /// Gets the number of glyphs in this font.
    pub fn glyph_count(&self) -> usize {
        self.char_strings.len()
    }

    /// Gets the charstring type (1 or 2).
    pub fn charstring_type(&self) -> u8 {
        self.charstring_type
    }

    /// Gets the number of Font DICTs. Non-CID fonts are considered to have a single Font DICT.
    pub fn font_dict_count(&self) -> usize {
        self.font_dicts.as_ref().map_or(1, Vec::len)
    }

    /// Gets the Font DICT index for the specified glyph.
    pub(crate) fn font_dict_for(&self, glyph: usize) -> usize {
        self.fd_select
            .as_ref()
            .map_or(0, |fd_select| usize::from(fd_select.font_dict(glyph)))
    }

    /// Gets the Private DICT governing the specified Font DICT.
    pub(crate) fn private_dict(&self, fd: usize) -> Option<&PrivateDict> {
        match &self.font_dicts {
            Some(font_dicts) => font_dicts.get(fd)?.private.as_ref(),
            None => self.private.as_ref(),
        }
    }
}

/// Parsed Compact Font Format (CFF) table.
///
/// Parsing validates all structures the subsetter relies on (INDEX offsets, DICTs,
/// charsets, FDSelect and Private DICTs); charstring programs are only inspected
/// when subsetting.
#[derive(Debug)]
pub struct Cff<'a> {
    pub(crate) data: &'a [u8],
    pub(crate) header_size: usize,
    pub(crate) strings: IndexRef,
    pub(crate) global_subrs: IndexRef,
    pub(crate) fonts: Vec<CffFont>,
}

impl<'a> Cff<'a> {
    /// Number of predefined standard strings.
    pub(crate) const STANDARD_STRING_COUNT: usize = 391;
    const MIN_HEADER_SIZE: u8 = 4;

    /// Parses a CFF table from the provided raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the table is malformed.
    pub fn new(data: &'a [u8]) -> Result<Self, ParseError> {
        let mut cursor = Cursor::new(data);
        let header_size = Self::parse_header(&mut cursor)
            .map_err(|err| err.in_structure(Structure::Header))?;
        cursor.seek(header_size)?;

        let names =
            IndexRef::parse(&mut cursor).map_err(|err| err.in_structure(Structure::NameIndex))?;
        let top_dicts =
            IndexRef::parse(&mut cursor).map_err(|err| err.in_structure(Structure::TopDict))?;
        let strings =
            IndexRef::parse(&mut cursor).map_err(|err| err.in_structure(Structure::StringIndex))?;
        let global_subrs =
            IndexRef::parse(&mut cursor).map_err(|err| err.in_structure(Structure::GlobalSubrs))?;

        if names.len() != top_dicts.len() {
            return Err(ParseError::new(
                ParseErrorKind::FontCountMismatch {
                    names: names.len(),
                    top_dicts: top_dicts.len(),
                },
                header_size,
            )
            .in_structure(Structure::TopDict));
        }
        let fonts = (0..names.len())
            .map(|idx| CffFont::parse(data, names.range(idx), top_dicts.range(idx)))
            .collect::<Result<_, _>>()?;

        Ok(Self {
            data,
            header_size,
            strings,
            global_subrs,
            fonts,
        })
    }

    fn parse_header(cursor: &mut Cursor<'_>) -> Result<usize, ParseError> {
        let major = cursor.read_u8()?;
        if major != 1 {
            return Err(ParseError::new(ParseErrorKind::UnexpectedVersion(major), 0));
        }
        cursor.skip(1)?; // minor
        let header_size = cursor.read_u8()?;
        if header_size < Self::MIN_HEADER_SIZE {
            return Err(cursor.err(ParseErrorKind::OffsetOutOfBounds(header_size.into())));
        }
        cursor.skip(1)?; // offSize
        Ok(header_size.into())
    }

    /// Gets the fonts contained in this table.
    pub fn fonts(&self) -> &[CffFont] {
        &self.fonts
    }

    /// Finds the index of a font by its name.
    pub fn font_index(&self, name: &str) -> Option<usize> {
        self.fonts.iter().position(|font| font.name == name)
    }

    pub(crate) fn string_count(&self) -> usize {
        Self::STANDARD_STRING_COUNT + self.strings.len()
    }
}
