//! INDEX parsing.

use core::ops;

use super::Cursor;
use crate::{
    alloc::{vec, Vec},
    errors::ParseErrorKind,
    ParseError,
};

/// Parsed CFF INDEX. Stores `count + 1` absolute offsets into the CFF data.
#[derive(Debug, Clone)]
pub(crate) struct IndexRef {
    /// Absolute offset of the `count` field.
    start: usize,
    /// For an empty INDEX, contains a single element pointing past the `count` field.
    offsets: Vec<usize>,
}

impl IndexRef {
    const MAX_OFFSET_SIZE: u8 = 4;

    /// Parses an INDEX at the cursor position and advances the cursor past the INDEX.
    pub(crate) fn parse(cursor: &mut Cursor<'_>) -> Result<Self, ParseError> {
        let start = cursor.position();
        let count = cursor.read_u16()?;
        if count == 0 {
            return Ok(Self {
                start,
                offsets: vec![cursor.position()],
            });
        }

        let offset_size = cursor.read_u8()?;
        if !(1..=Self::MAX_OFFSET_SIZE).contains(&offset_size) {
            return Err(cursor.err(ParseErrorKind::InvalidOffsetSize(offset_size)));
        }
        let offsets_start = cursor.position();
        let relative_offsets = (0..=count)
            .map(|_| cursor.read_offset(offset_size))
            .collect::<Result<Vec<_>, _>>()?;
        // Offsets are 1-based relative to the byte preceding the object data.
        let base = cursor.position() - 1;

        let mut offsets = Vec::with_capacity(relative_offsets.len());
        let mut prev_offset = 1;
        for (i, relative) in relative_offsets.into_iter().enumerate() {
            let err_offset = offsets_start + i * usize::from(offset_size);
            if relative == 0 {
                return Err(ParseError::new(
                    ParseErrorKind::OffsetOutOfBounds(relative),
                    err_offset,
                ));
            }
            if relative < prev_offset {
                return Err(ParseError::new(ParseErrorKind::NonMonotonicIndex, err_offset));
            }
            prev_offset = relative;
            offsets.push(base + relative);
        }

        let data_range = base + 1..base + prev_offset;
        cursor.slice(data_range.clone())?;
        cursor.seek(data_range.end)?;
        Ok(Self { start, offsets })
    }

    pub(crate) fn at(data: &[u8], offset: usize) -> Result<Self, ParseError> {
        let mut cursor = Cursor::at(data, offset)?;
        Self::parse(&mut cursor)
    }

    pub(crate) fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Gets the absolute range of the element.
    ///
    /// # Panics
    ///
    /// Panics if `idx` is out of bounds.
    pub(crate) fn range(&self, idx: usize) -> ops::Range<usize> {
        self.offsets[idx]..self.offsets[idx + 1]
    }

    /// Gets the element bytes. Panics if `idx` is out of bounds.
    pub(crate) fn get<'a>(&self, data: &'a [u8], idx: usize) -> &'a [u8] {
        &data[self.range(idx)]
    }

    /// Absolute offset immediately after the INDEX.
    pub(crate) fn end(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    /// Gets the raw bytes of the entire INDEX, including its header.
    pub(crate) fn raw<'a>(&self, data: &'a [u8]) -> &'a [u8] {
        &data[self.start..self.end()]
    }
}
