//! Logic for serializing `CffSubset`s.

use self::linker::{Item, Linker, Marker};
use crate::{
    alloc::{vec, Vec},
    font::{
        dict::{self, DictEntry},
        Cff, DictOperator, IndexRef, PrivateDict,
    },
    subset::UsedSet,
    CffSubset,
};

mod linker;

/// Charstring replacing unused glyphs.
const ENDCHAR: u8 = 14;
/// Charstring replacing unused subroutines.
const RETURN: u8 = 11;
/// Maximum length of the synthesized Font DICT name.
const MAX_FONT_NAME_LEN: usize = 127;

fn write_u16(writer: &mut Vec<u8>, value: u16) {
    writer.extend_from_slice(&value.to_be_bytes());
}

/// Writes `value` as a big-endian integer with `size` bytes.
fn write_offset(writer: &mut Vec<u8>, value: usize, size: u8) {
    let bytes = u32::try_from(value)
        .expect("offset overflow")
        .to_be_bytes();
    writer.extend_from_slice(&bytes[4 - usize::from(size)..]);
}

/// Returns the minimum offset size `w` such that `max_offset < 256^w`.
fn offset_size(max_offset: usize) -> u8 {
    match max_offset {
        0..=0xff => 1,
        0x100..=0xffff => 2,
        0x1_0000..=0xff_ffff => 3,
        _ => 4,
    }
}

/// Writes an INDEX header (count, offset size and offsets) for elements with the specified lengths.
fn index_header(lengths: &[usize]) -> Vec<u8> {
    let count = u16::try_from(lengths.len()).expect("INDEX count overflow");
    let mut header = vec![];
    write_u16(&mut header, count);
    if count == 0 {
        return header;
    }

    let data_len: usize = lengths.iter().sum();
    // Offsets are 1-based.
    let offset_size = offset_size(data_len + 1);
    header.push(offset_size);
    let mut offset = 1;
    write_offset(&mut header, offset, offset_size);
    for len in lengths {
        offset += len;
        write_offset(&mut header, offset, offset_size);
    }
    header
}

/// Serializes an INDEX with the specified elements.
pub(crate) fn write_index(elements: &[&[u8]]) -> Vec<u8> {
    let lengths: Vec<_> = elements.iter().map(|element| element.len()).collect();
    let mut buffer = index_header(&lengths);
    for element in elements {
        buffer.extend_from_slice(element);
    }
    buffer
}

/// Serializes a copy of `index` in which unused elements are replaced with `filler`.
fn subset_index(data: &[u8], index: &IndexRef, used: &UsedSet, filler: u8) -> Vec<u8> {
    let filler = [filler];
    let elements: Vec<&[u8]> = (0..index.len())
        .map(|idx| {
            if used.contains(idx) {
                index.get(data, idx)
            } else {
                &filler
            }
        })
        .collect();
    write_index(&elements)
}

/// Markers for data referenced from the Top DICT.
#[derive(Debug)]
struct TopDictMarkers {
    fd_array: Marker,
    fd_select: Marker,
    charset: Marker,
    char_strings: Marker,
}

impl TopDictMarkers {
    fn new(linker: &mut Linker<'_>) -> Self {
        Self {
            fd_array: linker.marker(),
            fd_select: linker.marker(),
            charset: linker.marker(),
            char_strings: linker.marker(),
        }
    }
}

/// Private DICT prepared for output.
#[derive(Debug)]
struct PrivateOutput<'a> {
    marker: Marker,
    items: Vec<Item<'a>>,
    subrs: Option<(Marker, Vec<u8>)>,
}

impl<'a> PrivateOutput<'a> {
    fn len(&self) -> usize {
        self.items.iter().map(Item::len).sum()
    }

    /// Items for a `Private` DICT entry referencing this dict.
    fn dict_entry(&self) -> Vec<Item<'a>> {
        let mut size = vec![];
        let size_value = i32::try_from(self.len()).expect("Private DICT length overflow");
        dict::write_integer(&mut size, size_value);
        vec![
            Item::Literal(size),
            Item::dict_offset(self.marker),
            Item::Literal(DictOperator::Private.to_bytes()),
        ]
    }
}

fn write_dict_integers(values: &[usize], operator: DictOperator) -> Vec<u8> {
    let mut bytes = vec![];
    for &value in values {
        let value = i32::try_from(value).expect("DICT operand overflow");
        dict::write_integer(&mut bytes, value);
    }
    operator.write(&mut bytes);
    bytes
}

impl<'a> CffSubset<'a> {
    /// Serializes this subset as a CFF table containing a single CID-keyed font.
    ///
    /// The output retains glyph IDs of the original font.
    pub fn to_cff(&self) -> Vec<u8> {
        let data = self.cff.data;
        let font = self.font;
        let char_strings = subset_index(data, &font.char_strings, &self.glyphs, ENDCHAR);
        let global_subrs = subset_index(data, &self.cff.global_subrs, &self.global_subrs, RETURN);

        let mut linker = Linker::default();
        let markers = TopDictMarkers::new(&mut linker);
        linker.push(Item::Copy(&data[..self.cff.header_size]));
        linker.push_index(vec![vec![Item::Copy(&data[font.name_range.clone()])]]);
        linker.push_index(vec![self.top_dict_items(&markers)]);
        self.write_strings(&mut linker);
        linker.push(Item::Literal(global_subrs));

        if font.is_cid() {
            self.write_cid_data(&mut linker, &markers);
        } else {
            self.write_synthesized_cid_data(&mut linker, &markers);
        }
        linker.mark(markers.char_strings);
        linker.push(Item::Literal(char_strings));
        linker.link()
    }

    fn top_dict_items(&self, markers: &TopDictMarkers) -> Vec<Item<'a>> {
        let data = self.cff.data;
        let mut items = vec![];
        if !self.font.is_cid() {
            // ROS must be the first entry in the Top DICT of a CID-keyed font.
            let string_count = self.cff.string_count();
            let mut cid_entries = write_dict_integers(
                &[string_count, string_count + 1, 0],
                DictOperator::Ros,
            );
            cid_entries.extend(write_dict_integers(
                &[self.font.glyph_count()],
                DictOperator::CidCount,
            ));
            items.push(Item::Literal(cid_entries));
        }

        let copied_entries = self.font.top_dict.iter().filter(|entry| {
            !matches!(
                entry.operator,
                DictOperator::Encoding
                    | DictOperator::Private
                    | DictOperator::FdSelect
                    | DictOperator::FdArray
                    | DictOperator::Charset
                    | DictOperator::CharStrings
            )
        });
        items.extend(copied_entries.map(|entry| Item::Copy(&data[entry.range.clone()])));

        for (marker, operator) in [
            (markers.fd_array, DictOperator::FdArray),
            (markers.fd_select, DictOperator::FdSelect),
            (markers.charset, DictOperator::Charset),
            (markers.char_strings, DictOperator::CharStrings),
        ] {
            items.push(Item::dict_offset(marker));
            items.push(Item::Literal(operator.to_bytes()));
        }
        items
    }

    fn write_strings(&self, linker: &mut Linker<'a>) {
        let data = self.cff.data;
        let strings = &self.cff.strings;
        if self.font.is_cid() {
            linker.push(Item::Copy(strings.raw(data)));
            return;
        }

        let mut font_dict_name = data[self.font.name_range.clone()].to_vec();
        font_dict_name.extend_from_slice(b"-OneRange");
        font_dict_name.truncate(MAX_FONT_NAME_LEN);

        let mut elements: Vec<_> = (0..strings.len())
            .map(|idx| vec![Item::Copy(strings.get(data, idx))])
            .collect();
        elements.push(vec![Item::Literal(b"Adobe".to_vec())]);
        elements.push(vec![Item::Literal(b"Identity".to_vec())]);
        elements.push(vec![Item::Literal(font_dict_name)]);
        linker.push_index(elements);
    }

    /// Prepares the Private DICT with the `Subrs` entry pointing to the subsetted local subrs.
    fn private_output(
        &self,
        linker: &mut Linker<'a>,
        private: &PrivateDict,
        fd: usize,
    ) -> PrivateOutput<'a> {
        let data = self.cff.data;
        let marker = linker.marker();
        let subrs = private.subrs.as_ref().map(|subrs| {
            let bytes = subset_index(data, subrs, &self.local_subrs[fd], RETURN);
            (linker.marker(), bytes)
        });

        let mut items = vec![];
        for entry in &private.entries {
            match (entry.operator, &subrs) {
                (DictOperator::Subrs, Some((subrs_marker, _))) => {
                    items.push(Item::Offset {
                        target: *subrs_marker,
                        base: Some(marker),
                        encoding: linker::OffsetEncoding::DictInteger,
                    });
                    items.push(Item::Literal(DictOperator::Subrs.to_bytes()));
                }
                _ => items.push(Item::Copy(&data[entry.range.clone()])),
            }
        }
        PrivateOutput {
            marker,
            items,
            subrs,
        }
    }

    fn write_private(linker: &mut Linker<'a>, private: PrivateOutput<'a>) {
        linker.mark(private.marker);
        linker.extend(private.items);
        if let Some((subrs_marker, subrs)) = private.subrs {
            linker.mark(subrs_marker);
            linker.push(Item::Literal(subrs));
        }
    }

    fn write_cid_data(&self, linker: &mut Linker<'a>, markers: &TopDictMarkers) {
        let data = self.cff.data;
        let font = self.font;
        let glyph_count = font.glyph_count();

        linker.mark(markers.fd_select);
        match &font.fd_select {
            Some(fd_select) => linker.push(Item::Copy(&data[fd_select.range()])),
            None => linker.push(Item::Literal(synthesized_fd_select(glyph_count))),
        }
        linker.mark(markers.charset);
        match &font.charset {
            Some(charset) => linker.push(Item::Copy(&data[charset.range()])),
            None => linker.push(Item::Literal(synthesized_charset(glyph_count))),
        }

        let font_dicts = font.font_dicts.as_deref().unwrap_or_default();
        let mut privates = vec![];
        let mut elements = vec![];
        for (fd, font_dict) in font_dicts.iter().enumerate() {
            if !self.font_dicts.contains(fd) {
                // Unused Font DICTs are not referenced by FDSelect, so they are emptied.
                elements.push(vec![]);
                continue;
            }

            let private = font_dict
                .private
                .as_ref()
                .map(|private| self.private_output(linker, private, fd));
            elements.push(Self::font_dict_items(data, &font_dict.entries, private.as_ref()));
            privates.extend(private);
        }
        linker.mark(markers.fd_array);
        linker.push_index(elements);
        for private in privates {
            Self::write_private(linker, private);
        }
    }

    fn font_dict_items(
        data: &'a [u8],
        entries: &[DictEntry],
        private: Option<&PrivateOutput<'a>>,
    ) -> Vec<Item<'a>> {
        let mut items = vec![];
        for entry in entries {
            match (entry.operator, private) {
                (DictOperator::Private, Some(private)) => items.extend(private.dict_entry()),
                _ => items.push(Item::Copy(&data[entry.range.clone()])),
            }
        }
        items
    }

    fn write_synthesized_cid_data(&self, linker: &mut Linker<'a>, markers: &TopDictMarkers) {
        let glyph_count = self.font.glyph_count();
        linker.mark(markers.fd_select);
        linker.push(Item::Literal(synthesized_fd_select(glyph_count)));
        linker.mark(markers.charset);
        linker.push(Item::Literal(synthesized_charset(glyph_count)));

        let private = match &self.font.private {
            Some(private) => self.private_output(linker, private, 0),
            None => PrivateOutput {
                marker: linker.marker(),
                items: vec![],
                subrs: None,
            },
        };
        // The font name is the last string added in `write_strings()`.
        let font_name_sid = self.cff.string_count() + 2;
        let mut font_dict = vec![Item::Literal(write_dict_integers(
            &[font_name_sid],
            DictOperator::FontName,
        ))];
        font_dict.extend(private.dict_entry());

        linker.mark(markers.fd_array);
        linker.push_index(vec![font_dict]);
        Self::write_private(linker, private);
    }
}

/// FDSelect (format 3) mapping all glyphs to Font DICT 0.
fn synthesized_fd_select(glyph_count: usize) -> Vec<u8> {
    let glyph_count = u16::try_from(glyph_count).expect("glyph count overflow");
    let mut bytes = vec![3];
    write_u16(&mut bytes, 1); // nRanges
    write_u16(&mut bytes, 0); // first glyph
    bytes.push(0); // Font DICT
    write_u16(&mut bytes, glyph_count); // sentinel
    bytes
}

/// Identity charset (format 2) mapping glyph `i` to CID `i`.
fn synthesized_charset(glyph_count: usize) -> Vec<u8> {
    let mut bytes = vec![2];
    if glyph_count > 1 {
        let left = u16::try_from(glyph_count - 2).expect("glyph count overflow");
        write_u16(&mut bytes, 1); // first CID
        write_u16(&mut bytes, left);
    }
    bytes
}
