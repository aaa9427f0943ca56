use std::{collections::BTreeSet, fmt, slice};

use allsorts::{
    binary::read::ReadScope,
    cff::{CFFVariant, CFF},
};
use pretty_assertions::assert_eq;
use test_casing::{test_casing, Product};

use crate::{
    font::{
        dict::{write_fixed_integer, write_integer, FIXED_INTEGER_LEN},
        DictOperator,
    },
    write::write_index,
    Cff, CffSubset,
};

pub(crate) const RLINETO: u8 = 5;
pub(crate) const CALLSUBR: u8 = 10;
pub(crate) const RETURN: u8 = 11;
pub(crate) const HSBW: u8 = 13;
pub(crate) const ENDCHAR: u8 = 14;
pub(crate) const HSTEMHM: u8 = 18;
pub(crate) const HINTMASK: u8 = 19;
pub(crate) const RMOVETO: u8 = 21;
pub(crate) const CALLGSUBR: u8 = 29;

/// Part of a charstring program.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Cs {
    /// Number operand.
    N(i32),
    /// One-byte operator.
    Op(u8),
    /// Escaped operator.
    Esc(u8),
    /// Raw bytes (e.g., hint mask data).
    Raw(&'static [u8]),
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub(crate) fn charstring(parts: &[Cs]) -> Vec<u8> {
    let mut bytes = vec![];
    for part in parts {
        match *part {
            Cs::N(value @ -107..=107) => bytes.push((value + 139) as u8),
            Cs::N(value @ 108..=1131) => {
                let value = value - 108;
                bytes.extend_from_slice(&[(value >> 8) as u8 + 247, value as u8]);
            }
            Cs::N(value @ -1131..=-108) => {
                let value = -value - 108;
                bytes.extend_from_slice(&[(value >> 8) as u8 + 251, value as u8]);
            }
            Cs::N(value) => {
                bytes.push(28);
                bytes.extend_from_slice(&i16::try_from(value).unwrap().to_be_bytes());
            }
            Cs::Op(op) => bytes.push(op),
            Cs::Esc(op) => bytes.extend_from_slice(&[12, op]),
            Cs::Raw(raw) => bytes.extend_from_slice(raw),
        }
    }
    bytes
}

fn dict_entry(operands: &[i32], operator: DictOperator) -> Vec<u8> {
    let mut bytes = vec![];
    for &operand in operands {
        write_integer(&mut bytes, operand);
    }
    operator.write(&mut bytes);
    bytes
}

fn as_slices(elements: &[Vec<u8>]) -> Vec<&[u8]> {
    elements.iter().map(Vec::as_slice).collect()
}

/// Private DICT contents.
#[derive(Debug, Clone, Default)]
pub(crate) struct PrivateData {
    /// Raw DICT entries except for `Subrs`.
    pub(crate) entries: Vec<u8>,
    pub(crate) subrs: Option<Vec<Vec<u8>>>,
}

impl PrivateData {
    /// Returns the Private DICT followed by local subrs, and the Private DICT length.
    fn build(&self) -> (Vec<u8>, usize) {
        let mut bytes = self.entries.clone();
        if let Some(subrs) = &self.subrs {
            let private_len = bytes.len() + FIXED_INTEGER_LEN + 1;
            write_fixed_integer(&mut bytes, private_len.try_into().unwrap());
            DictOperator::Subrs.write(&mut bytes);
            bytes.extend_from_slice(&write_index(&as_slices(subrs)));
            (bytes, private_len)
        } else {
            let len = bytes.len();
            (bytes, len)
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum FdSelectData {
    Format0(Vec<u8>),
    /// `(first glyph, Font DICT)` ranges.
    Format3(Vec<(u16, u8)>),
}

impl FdSelectData {
    fn build(&self, glyph_count: usize) -> Vec<u8> {
        match self {
            Self::Format0(fds) => {
                let mut bytes = vec![0];
                bytes.extend_from_slice(fds);
                bytes
            }
            Self::Format3(ranges) => {
                let mut bytes = vec![3];
                let range_count = u16::try_from(ranges.len()).unwrap();
                bytes.extend_from_slice(&range_count.to_be_bytes());
                for &(first, fd) in ranges {
                    bytes.extend_from_slice(&first.to_be_bytes());
                    bytes.push(fd);
                }
                let sentinel = u16::try_from(glyph_count).unwrap();
                bytes.extend_from_slice(&sentinel.to_be_bytes());
                bytes
            }
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum Keying {
    Sid(PrivateData),
    Cid {
        fd_select: FdSelectData,
        font_dicts: Vec<PrivateData>,
    },
}

#[derive(Debug, Default)]
struct FontOffsets {
    charset: usize,
    char_strings: usize,
    private: (usize, usize),
    fd_array: usize,
    fd_select: usize,
}

/// Builder of synthetic CFF fonts. All offsets in Top DICTs and Font DICTs use the fixed-size
/// integer encoding, so that DICT lengths do not depend on the layout.
#[derive(Debug, Clone)]
pub(crate) struct FontBuilder {
    pub(crate) name: &'static str,
    /// Custom strings, referenced from the Top DICT by SIDs starting from 391.
    pub(crate) strings: Vec<&'static str>,
    /// Raw entries added to the Top DICT.
    pub(crate) top_dict_extra: Vec<u8>,
    pub(crate) charstring_type: Option<i32>,
    pub(crate) omit_char_strings: bool,
    pub(crate) global_subrs: Vec<Vec<u8>>,
    pub(crate) charstrings: Vec<Vec<u8>>,
    pub(crate) keying: Keying,
}

impl FontBuilder {
    const HEADER: [u8; 4] = [1, 0, 4, 4];
    const FONT_DICT_LEN: usize = 2 * FIXED_INTEGER_LEN + 1;

    pub(crate) fn set_fd_select_format0(&mut self, fds: &[u8]) {
        let Keying::Cid { fd_select, .. } = &mut self.keying else {
            panic!("not a CID-keyed font");
        };
        *fd_select = FdSelectData::Format0(fds.to_vec());
    }

    pub(crate) fn build(&self) -> Vec<u8> {
        build_cff(slice::from_ref(self))
    }

    fn is_cid(&self) -> bool {
        matches!(self.keying, Keying::Cid { .. })
    }

    fn glyph_count(&self) -> i32 {
        self.charstrings.len().try_into().unwrap()
    }

    fn top_dict(&self, offsets: &FontOffsets) -> Vec<u8> {
        let mut dict = vec![];
        if self.is_cid() {
            dict.extend(dict_entry(&[391, 392, 0], DictOperator::Ros));
            dict.extend(dict_entry(&[self.glyph_count()], DictOperator::CidCount));
        } else {
            // FullName
            dict.extend(dict_entry(&[391], DictOperator::Other(2)));
        }
        dict.extend_from_slice(&self.top_dict_extra);
        if let Some(charstring_type) = self.charstring_type {
            dict.extend(dict_entry(&[charstring_type], DictOperator::CharstringType));
        }
        if !self.is_cid() {
            // Standard encoding
            dict.extend(dict_entry(&[0], DictOperator::Encoding));
        }

        let offset = |value: usize| i32::try_from(value).unwrap();
        write_fixed_integer(&mut dict, offset(offsets.charset));
        DictOperator::Charset.write(&mut dict);
        if !self.omit_char_strings {
            write_fixed_integer(&mut dict, offset(offsets.char_strings));
            DictOperator::CharStrings.write(&mut dict);
        }
        if self.is_cid() {
            write_fixed_integer(&mut dict, offset(offsets.fd_array));
            DictOperator::FdArray.write(&mut dict);
            write_fixed_integer(&mut dict, offset(offsets.fd_select));
            DictOperator::FdSelect.write(&mut dict);
        } else {
            let (private_offset, private_len) = offsets.private;
            write_fixed_integer(&mut dict, offset(private_len));
            write_fixed_integer(&mut dict, offset(private_offset));
            DictOperator::Private.write(&mut dict);
        }
        dict
    }

    fn charset(&self) -> Vec<u8> {
        let covered_glyphs = self.charstrings.len() - 1;
        if self.is_cid() {
            let mut charset = vec![2];
            if covered_glyphs > 0 {
                let left = u16::try_from(covered_glyphs - 1).unwrap();
                charset.extend_from_slice(&1_u16.to_be_bytes());
                charset.extend_from_slice(&left.to_be_bytes());
            }
            charset
        } else {
            let sids = 1..=u16::try_from(covered_glyphs).unwrap();
            let mut charset = vec![0];
            charset.extend(sids.flat_map(u16::to_be_bytes));
            charset
        }
    }

    /// Writes charset, charstrings and private data; returns their offsets.
    fn write_data(&self, tail: &mut Vec<u8>, tail_start: usize) -> FontOffsets {
        let mut offsets = FontOffsets {
            charset: tail_start + tail.len(),
            ..FontOffsets::default()
        };
        tail.extend(self.charset());
        offsets.char_strings = tail_start + tail.len();
        tail.extend(write_index(&as_slices(&self.charstrings)));

        match &self.keying {
            Keying::Sid(private) => {
                let (bytes, private_len) = private.build();
                offsets.private = (tail_start + tail.len(), private_len);
                tail.extend(bytes);
            }
            Keying::Cid {
                fd_select,
                font_dicts,
            } => {
                offsets.fd_select = tail_start + tail.len();
                tail.extend(fd_select.build(self.charstrings.len()));

                offsets.fd_array = tail_start + tail.len();
                let placeholders = vec![[0_u8; Self::FONT_DICT_LEN].as_slice(); font_dicts.len()];
                let fd_array_len = write_index(&placeholders).len();
                let mut private_offset = offsets.fd_array + fd_array_len;
                let mut font_dict_bytes = vec![];
                let mut private_bytes = vec![];
                for private in font_dicts {
                    let (bytes, private_len) = private.build();
                    let mut font_dict = vec![];
                    write_fixed_integer(&mut font_dict, private_len.try_into().unwrap());
                    write_fixed_integer(&mut font_dict, private_offset.try_into().unwrap());
                    DictOperator::Private.write(&mut font_dict);
                    font_dict_bytes.push(font_dict);
                    private_offset += bytes.len();
                    private_bytes.extend(bytes);
                }
                tail.extend(write_index(&as_slices(&font_dict_bytes)));
                tail.extend(private_bytes);
            }
        }
        offsets
    }
}

/// Builds a CFF table with the specified fonts. Strings and global subrs are taken from the first font.
pub(crate) fn build_cff(fonts: &[FontBuilder]) -> Vec<u8> {
    let first = &fonts[0];
    let names: Vec<&[u8]> = fonts.iter().map(|font| font.name.as_bytes()).collect();
    let name_index = write_index(&names);
    let strings: Vec<&[u8]> = first.strings.iter().map(|s| s.as_bytes()).collect();
    let string_index = write_index(&strings);
    let global_subrs_index = write_index(&as_slices(&first.global_subrs));

    let placeholder_dicts: Vec<_> = fonts
        .iter()
        .map(|font| font.top_dict(&FontOffsets::default()))
        .collect();
    let top_dict_index_len = write_index(&as_slices(&placeholder_dicts)).len();

    let tail_start = FontBuilder::HEADER.len()
        + name_index.len()
        + top_dict_index_len
        + string_index.len()
        + global_subrs_index.len();
    let mut tail = vec![];
    let top_dicts: Vec<_> = fonts
        .iter()
        .map(|font| {
            let offsets = font.write_data(&mut tail, tail_start);
            font.top_dict(&offsets)
        })
        .collect();
    let top_dict_index = write_index(&as_slices(&top_dicts));
    assert_eq!(top_dict_index.len(), top_dict_index_len);

    let mut cff = FontBuilder::HEADER.to_vec();
    cff.extend(name_index);
    cff.extend(top_dict_index);
    cff.extend(string_index);
    cff.extend(global_subrs_index);
    cff.extend(tail);
    cff
}

fn simple_glyph(glyph: i32) -> Vec<u8> {
    charstring(&[
        Cs::N(glyph * 10),
        Cs::N(0),
        Cs::Op(RMOVETO),
        Cs::N(100),
        Cs::N(0),
        Cs::Op(RLINETO),
        Cs::N(0),
        Cs::N(100),
        Cs::Op(RLINETO),
        Cs::Op(ENDCHAR),
    ])
}

fn leaf_subr(delta: i32) -> Vec<u8> {
    charstring(&[Cs::N(delta), Cs::N(delta), Cs::Op(RLINETO), Cs::Op(RETURN)])
}

fn calling_subr(operator: u8, target: i32) -> Vec<u8> {
    charstring(&[Cs::N(target - 107), Cs::Op(operator), Cs::Op(RETURN)])
}

fn calling_glyph(operator: u8, target: i32) -> Vec<u8> {
    charstring(&[Cs::N(target - 107), Cs::Op(operator), Cs::Op(ENDCHAR)])
}

/// Non-CID font with 10 glyphs, 4 local and 3 global subrs.
///
/// - Glyph 1 calls local subr 1.
/// - Glyph 2 calls global subr 2.
/// - Glyph 3 calls local subr 0 -> global subr 1 -> local subr 2 -> global subr 0.
/// - Glyph 7 declares 9 stem hints, uses a 2-byte hint mask and calls local subr 3.
fn sid_font() -> FontBuilder {
    let hinted_glyph = {
        let mut parts: Vec<_> = (0..18).map(|i| Cs::N(i * 20)).collect();
        parts.extend([
            Cs::Op(HSTEMHM),
            Cs::Op(HINTMASK),
            // If the mask were read as a single byte, 0x1c would start a `shortint`
            // swallowing the following call.
            Cs::Raw(&[0xff, 0x1c]),
            Cs::N(3 - 107),
            Cs::Op(CALLSUBR),
            Cs::Op(ENDCHAR),
        ]);
        charstring(&parts)
    };

    let charstrings = (0..10)
        .map(|glyph| match glyph {
            0 => charstring(&[Cs::Op(ENDCHAR)]),
            1 => charstring(&[
                Cs::N(50),
                Cs::N(50),
                Cs::Op(RMOVETO),
                Cs::N(1 - 107),
                Cs::Op(CALLSUBR),
                Cs::Op(ENDCHAR),
            ]),
            2 => calling_glyph(CALLGSUBR, 2),
            3 => calling_glyph(CALLSUBR, 0),
            7 => hinted_glyph.clone(),
            _ => simple_glyph(glyph),
        })
        .collect();

    let mut private_entries = dict_entry(&[-15, 0, 500, 515], DictOperator::Other(6));
    private_entries.extend(dict_entry(&[50], DictOperator::Other(10)));
    private_entries.extend(dict_entry(&[500], DictOperator::Other(20)));
    private_entries.extend(dict_entry(&[600], DictOperator::Other(21)));

    FontBuilder {
        name: "SidFont",
        strings: vec!["Sid Font Regular"],
        top_dict_extra: vec![],
        charstring_type: None,
        omit_char_strings: false,
        global_subrs: vec![leaf_subr(1), calling_subr(CALLSUBR, 2), leaf_subr(3)],
        charstrings,
        keying: Keying::Sid(PrivateData {
            entries: private_entries,
            subrs: Some(vec![
                calling_subr(CALLGSUBR, 1),
                leaf_subr(10),
                calling_subr(CALLGSUBR, 0),
                leaf_subr(5),
            ]),
        }),
    }
}

/// CID-keyed font with 6 glyphs: glyphs 0..3 use Font DICT 0, glyphs 3..6 use Font DICT 1.
///
/// - Glyph 1 calls local subr 1 (FD 0).
/// - Glyphs 2 and 4 call global subr 0, which calls local subr 0 of the caller's Font DICT.
/// - Glyph 5 calls local subr 1 (FD 1).
fn cid_font() -> FontBuilder {
    let charstrings = (0..6)
        .map(|glyph| match glyph {
            0 => charstring(&[Cs::Op(ENDCHAR)]),
            1 | 5 => calling_glyph(CALLSUBR, 1),
            2 | 4 => calling_glyph(CALLGSUBR, 0),
            _ => simple_glyph(glyph),
        })
        .collect();

    FontBuilder {
        name: "CidFont",
        strings: vec!["Adobe", "Identity"],
        top_dict_extra: vec![],
        charstring_type: Some(2),
        omit_char_strings: false,
        global_subrs: vec![calling_subr(CALLSUBR, 0), leaf_subr(6)],
        charstrings,
        keying: Keying::Cid {
            fd_select: FdSelectData::Format3(vec![(0, 0), (3, 1)]),
            font_dicts: vec![
                PrivateData {
                    entries: dict_entry(&[40], DictOperator::Other(10)),
                    subrs: Some(vec![leaf_subr(1), leaf_subr(2)]),
                },
                PrivateData {
                    entries: dict_entry(&[60], DictOperator::Other(10)),
                    subrs: Some(vec![leaf_subr(3), leaf_subr(4), leaf_subr(5)]),
                },
            ],
        },
    }
}

/// Non-CID font with Type 1 charstrings (i.e., zero subr bias). Glyph 1 calls local subr 1,
/// which calls local subr 2.
fn type1_font() -> FontBuilder {
    let hsbw = [Cs::N(0), Cs::N(500), Cs::Op(HSBW)];
    let charstrings = vec![
        charstring(&[hsbw[0], hsbw[1], hsbw[2], Cs::Op(ENDCHAR)]),
        charstring(&[
            hsbw[0],
            hsbw[1],
            hsbw[2],
            Cs::N(1),
            Cs::Op(CALLSUBR),
            Cs::Op(ENDCHAR),
        ]),
        charstring(&[hsbw[0], hsbw[1], hsbw[2], Cs::Op(ENDCHAR)]),
    ];
    let subrs = vec![
        charstring(&[Cs::N(3), Cs::N(3), Cs::Op(RLINETO), Cs::Op(RETURN)]),
        charstring(&[Cs::N(2), Cs::Op(CALLSUBR), Cs::Op(RETURN)]),
        charstring(&[Cs::N(7), Cs::N(7), Cs::Op(RLINETO), Cs::Op(RETURN)]),
    ];

    FontBuilder {
        name: "Type1Font",
        strings: vec!["Type1 Font"],
        top_dict_extra: vec![],
        charstring_type: Some(1),
        omit_char_strings: false,
        global_subrs: vec![],
        charstrings,
        keying: Keying::Sid(PrivateData {
            entries: dict_entry(&[500], DictOperator::Other(20)),
            subrs: Some(subrs),
        }),
    }
}

#[derive(Clone, Copy)]
pub(crate) struct TestFont {
    pub(crate) name: &'static str,
    pub(crate) builder: fn() -> FontBuilder,
}

impl fmt::Debug for TestFont {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.name, formatter)
    }
}

impl TestFont {
    pub(crate) fn bytes(&self) -> Vec<u8> {
        (self.builder)().build()
    }
}

pub(crate) const SID_FONT: TestFont = TestFont {
    name: "SidFont",
    builder: sid_font,
};
pub(crate) const CID_FONT: TestFont = TestFont {
    name: "CidFont",
    builder: cid_font,
};
pub(crate) const TYPE1_FONT: TestFont = TestFont {
    name: "Type1Font",
    builder: type1_font,
};

pub(crate) const FONTS: [TestFont; 3] = [SID_FONT, CID_FONT, TYPE1_FONT];

/// Glyph sets used for subsetting. Each set touches both Font DICTs of [`CID_FONT`].
pub(crate) const GLYPH_SETS: [&[u16]; 3] = [&[3], &[4, 5], &[1, 2, 5]];

fn init_logging() {
    env_logger::builder().is_test(true).try_init().ok();
}

#[test_casing(9, Product((FONTS, GLYPH_SETS)))]
fn subsetting_font(font: TestFont, glyphs: &'static [u16]) {
    init_logging();
    let data = font.bytes();
    let glyphs: BTreeSet<u16> = glyphs.iter().copied().collect();
    let cff = Cff::new(&data).unwrap();
    let subset = CffSubset::new(&cff, 0, &glyphs).unwrap();
    let output = subset.to_cff();

    assert_valid_subset(&cff, &output, &glyphs);
    // Subsetting is deterministic.
    assert_eq!(subset.to_cff(), output);
}

fn assert_valid_subset(source: &Cff<'_>, output: &[u8], glyphs: &BTreeSet<u16>) {
    let source_font = &source.fonts()[0];
    let subset = Cff::new(output).unwrap();
    assert_eq!(subset.fonts().len(), 1);
    let font = &subset.fonts()[0];
    assert_eq!(font.name(), source_font.name());
    assert!(font.is_cid());
    assert_eq!(font.glyph_count(), source_font.glyph_count());
    assert_eq!(font.charstring_type(), source_font.charstring_type());
    assert_eq!(font.font_dict_count(), source_font.font_dict_count());
    assert_eq!(subset.global_subrs.len(), source.global_subrs.len());

    for glyph in 0..font.glyph_count() {
        let actual = font.char_strings.get(subset.data, glyph);
        let is_used = glyph == 0 || glyphs.contains(&u16::try_from(glyph).unwrap());
        if is_used {
            let expected = source_font.char_strings.get(source.data, glyph);
            assert_eq!(actual, expected, "glyph #{glyph}");
        } else {
            assert_eq!(actual, [ENDCHAR], "glyph #{glyph}");
        }
    }

    let reference = ReadScope::new(output).read::<CFF<'_>>().unwrap();
    assert_eq!(reference.fonts.len(), 1);
    let reference_font = &reference.fonts[0];
    assert!(reference_font.is_cid_keyed());
    assert_eq!(
        reference_font.char_strings_index.len(),
        source_font.glyph_count()
    );
    let CFFVariant::CID(cid_data) = &reference_font.data else {
        unreachable!();
    };
    assert_eq!(
        cid_data.local_subr_indices.len(),
        source_font.font_dict_count()
    );
}

#[test]
fn subsetting_font_from_multi_font_table() {
    let mut second_font = type1_font();
    second_font.name = "Second";
    let data = build_cff(&[sid_font(), second_font]);
    let cff = Cff::new(&data).unwrap();
    assert_eq!(cff.fonts().len(), 2);
    let font_idx = cff.font_index("Second").unwrap();
    assert_eq!(font_idx, 1);

    let glyphs = BTreeSet::from([1]);
    let output = CffSubset::new(&cff, font_idx, &glyphs).unwrap().to_cff();
    let subset = Cff::new(&output).unwrap();
    assert_eq!(subset.fonts().len(), 1);
    assert_eq!(subset.fonts()[0].name(), "Second");
    assert_eq!(subset.fonts()[0].glyph_count(), 3);
    ReadScope::new(&output).read::<CFF<'_>>().unwrap();
}

#[test]
fn subsetting_with_empty_glyph_set() {
    for font in FONTS {
        let data = font.bytes();
        let cff = Cff::new(&data).unwrap();
        let glyphs = BTreeSet::new();
        let subset = CffSubset::new(&cff, 0, &glyphs).unwrap();
        assert_eq!(subset.used_glyph_count(), 1);
        let output = subset.to_cff();
        let parsed = Cff::new(&output).unwrap();
        assert_eq!(parsed.fonts()[0].glyph_count(), cff.fonts()[0].glyph_count());
    }
}

#[test]
fn subsetting_cid_font_with_format0_fd_select() {
    let mut builder = cid_font();
    builder.set_fd_select_format0(&[0, 0, 0, 1, 1, 1]);
    let data = builder.build();
    let cff = Cff::new(&data).unwrap();
    let glyphs = BTreeSet::from([2, 4]);
    let subset = CffSubset::new(&cff, 0, &glyphs).unwrap();
    let output = subset.to_cff();
    assert_valid_subset(&cff, &output, &glyphs);
}

#[test]
fn subsetting_non_cid_font_end_to_end() {
    init_logging();
    let data = SID_FONT.bytes();
    let cff = Cff::new(&data).unwrap();
    let glyphs = BTreeSet::from([0, 3, 7]);
    let output = CffSubset::new(&cff, 0, &glyphs).unwrap().to_cff();
    assert_valid_subset(&cff, &output, &glyphs);

    let subset = Cff::new(&output).unwrap();
    let font = &subset.fonts()[0];
    assert_eq!(font.font_dict_count(), 1);
    assert_eq!(font.glyph_count(), 10);
    // `.notdef` is a bare `endchar` in the source font, so it's skipped.
    let filler_count = (1..10)
        .filter(|&glyph| font.char_strings.get(subset.data, glyph) == [ENDCHAR])
        .count();
    assert_eq!(filler_count, 7);

    // Single-range charset (format 2) and FDSelect (format 3)
    let charset = font.charset.as_ref().unwrap();
    assert_eq!(output[charset.range()], [2, 0, 1, 0, 8]);
    let fd_select = font.fd_select.as_ref().unwrap();
    assert_eq!(output[fd_select.range()], [3, 0, 1, 0, 0, 0, 0, 10]);
}
