use core::{fmt, ops};

use crate::alloc::String;

/// CFF structure a [`ParseError`] relates to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Structure {
    /// CFF header.
    Header,
    /// Name INDEX.
    NameIndex,
    /// Top DICT INDEX or a Top DICT.
    TopDict,
    /// String INDEX.
    StringIndex,
    /// Global Subr INDEX.
    GlobalSubrs,
    /// CharStrings INDEX.
    CharStrings,
    /// Charset.
    Charset,
    /// FDSelect.
    FdSelect,
    /// FDArray (Font DICT INDEX) or a Font DICT.
    FdArray,
    /// Private DICT.
    PrivateDict,
    /// Local Subr INDEX.
    LocalSubrs,
}

impl fmt::Display for Structure {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Header => "header",
            Self::NameIndex => "Name INDEX",
            Self::TopDict => "Top DICT",
            Self::StringIndex => "String INDEX",
            Self::GlobalSubrs => "Global Subr INDEX",
            Self::CharStrings => "CharStrings INDEX",
            Self::Charset => "charset",
            Self::FdSelect => "FDSelect",
            Self::FdArray => "FDArray",
            Self::PrivateDict => "Private DICT",
            Self::LocalSubrs => "Local Subr INDEX",
        })
    }
}

/// Kind of a font [`ParseError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ParseErrorKind {
    /// Unexpected end of the font data.
    UnexpectedEof,
    /// Unexpected major version in the CFF header.
    UnexpectedVersion(u8),
    /// Offset size of an INDEX is outside `1..=4`.
    InvalidOffsetSize(u8),
    /// Offset inferred from the font data is out of bounds.
    OffsetOutOfBounds(usize),
    /// Range inferred from the font data is out of bounds.
    RangeOutOfBounds {
        /// Inferred range.
        range: ops::Range<usize>,
        /// Length of the indexed data.
        len: usize,
    },
    /// INDEX offsets are not monotonically non-decreasing.
    NonMonotonicIndex,
    /// Unexpected format of a charset or FDSelect.
    UnexpectedFormat(u8),
    /// Reserved byte encountered in DICT data.
    InvalidDictOperand(u8),
    /// Required DICT entry (e.g., `CharStrings`) is missing.
    MissingDictEntry(&'static str),
    /// DICT entry has unexpected operands.
    InvalidDictEntry(&'static str),
    /// `CharstringType` is neither 1 nor 2.
    UnexpectedCharstringType(i32),
    /// FDSelect refers to a Font DICT not present in the FDArray.
    FontDictOutOfRange(u8),
    /// FDArray of a CID-keyed font contains no Font DICTs.
    EmptyFdArray,
    /// Name INDEX and Top DICT INDEX have different number of entries.
    FontCountMismatch {
        /// Number of entries in the Name INDEX.
        names: usize,
        /// Number of entries in the Top DICT INDEX.
        top_dicts: usize,
    },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedEof => formatter.write_str("unexpected end of the font data"),
            Self::UnexpectedVersion(val) => write!(formatter, "unexpected CFF version ({val})"),
            Self::InvalidOffsetSize(val) => {
                write!(formatter, "INDEX offset size ({val}) is not in 1..=4")
            }
            Self::OffsetOutOfBounds(val) => {
                write!(
                    formatter,
                    "offset ({val}) inferred from the font data is out of bounds"
                )
            }
            Self::RangeOutOfBounds { range, len } => {
                write!(
                    formatter,
                    "range ({range:?}) inferred from the font data is out of bounds (..{len})"
                )
            }
            Self::NonMonotonicIndex => formatter.write_str("INDEX offsets are not monotonic"),
            Self::UnexpectedFormat(val) => write!(formatter, "unexpected format ({val})"),
            Self::InvalidDictOperand(val) => {
                write!(formatter, "reserved byte ({val}) in DICT data")
            }
            Self::MissingDictEntry(name) => write!(formatter, "missing `{name}` DICT entry"),
            Self::InvalidDictEntry(name) => {
                write!(formatter, "unexpected operands for `{name}` DICT entry")
            }
            Self::UnexpectedCharstringType(val) => {
                write!(formatter, "unexpected charstring type ({val})")
            }
            Self::FontDictOutOfRange(val) => {
                write!(formatter, "Font DICT #{val} is not present in FDArray")
            }
            Self::EmptyFdArray => formatter.write_str("FDArray contains no Font DICTs"),
            Self::FontCountMismatch { names, top_dicts } => {
                write!(
                    formatter,
                    "Name INDEX has {names} entries, while Top DICT INDEX has {top_dicts}"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseErrorKind {}

/// Errors that can occur when parsing a [`Cff`](crate::Cff) table.
#[derive(Debug)]
pub struct ParseError {
    pub(crate) kind: ParseErrorKind,
    pub(crate) offset: usize,
    pub(crate) structure: Option<Structure>,
}

impl fmt::Display for ParseError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(structure) = self.structure {
            write!(formatter, "[{structure}] ")?;
        }
        if self.offset > 0 {
            write!(formatter, "{}: ", self.offset)?;
        }
        fmt::Display::fmt(&self.kind, formatter)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ParseError {}

impl ParseError {
    pub(crate) fn new(kind: ParseErrorKind, offset: usize) -> Self {
        Self {
            kind,
            offset,
            structure: None,
        }
    }

    pub(crate) fn missing_entry(name: &'static str, structure: Structure) -> Self {
        Self {
            kind: ParseErrorKind::MissingDictEntry(name),
            offset: 0,
            structure: Some(structure),
        }
    }

    /// Attaches the structure to this error unless it's already attached.
    pub(crate) fn in_structure(mut self, structure: Structure) -> Self {
        self.structure.get_or_insert(structure);
        self
    }

    /// Gets the error kind.
    pub fn kind(&self) -> &ParseErrorKind {
        &self.kind
    }

    /// Gets the CFF structure this error relates to.
    pub fn structure(&self) -> Option<Structure> {
        self.structure
    }

    /// Gets the offset in the CFF data.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

/// Errors that can occur when creating a [`CffSubset`](crate::CffSubset).
#[derive(Debug)]
#[non_exhaustive]
pub enum SubsetError {
    /// Error parsing the CFF data.
    Parse(ParseError),
    /// Font index is out of range of the Name INDEX.
    FontOutOfRange {
        /// Requested font index.
        index: usize,
        /// Number of fonts in the CFF data.
        count: usize,
    },
    /// No font with the specified name.
    FontNotFound(String),
    /// String INDEX of a promoted non-CID font would not fit into an INDEX.
    TooManyStrings {
        /// Number of strings in the output String INDEX.
        count: usize,
    },
}

impl From<ParseError> for SubsetError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl fmt::Display for SubsetError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(formatter, "failed parsing CFF data: {err}"),
            Self::FontOutOfRange { index, count } => {
                write!(
                    formatter,
                    "font #{index} is out of range (CFF data contains {count} font(s))"
                )
            }
            Self::FontNotFound(name) => write!(formatter, "font `{name}` is not present"),
            Self::TooManyStrings { count } => {
                write!(
                    formatter,
                    "output String INDEX would contain {count} strings, more than an INDEX can hold"
                )
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for SubsetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            _ => None,
        }
    }
}
