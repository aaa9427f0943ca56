//! Relocatable output: a sequence of items, some of which refer to positions of other items.
//! Linking lays out the items, resolves offsets and emits the resulting bytes.

use crate::{
    alloc::{vec, Vec},
    font::dict::{write_fixed_integer, FIXED_INTEGER_LEN},
};

/// Position in the output, resolved during linking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Marker(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OffsetEncoding {
    /// Big-endian unsigned integer with the specified byte size (1..=4).
    Fixed(u8),
    /// 5-byte DICT integer operand.
    DictInteger,
}

impl OffsetEncoding {
    fn len(self) -> usize {
        match self {
            Self::Fixed(size) => size.into(),
            Self::DictInteger => FIXED_INTEGER_LEN,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Item<'a> {
    /// Bytes copied from the source.
    Copy(&'a [u8]),
    /// Synthesized bytes.
    Literal(Vec<u8>),
    /// Offset of `target`, relative to `base` (if specified) or to the start of the output.
    Offset {
        target: Marker,
        base: Option<Marker>,
        encoding: OffsetEncoding,
    },
    /// Placement of a marker. Has zero length.
    Mark(Marker),
}

impl Item<'_> {
    pub(crate) fn len(&self) -> usize {
        match self {
            Self::Copy(bytes) => bytes.len(),
            Self::Literal(bytes) => bytes.len(),
            Self::Offset { encoding, .. } => encoding.len(),
            Self::Mark(_) => 0,
        }
    }

    /// Absolute DICT offset operand pointing to `target`.
    pub(crate) fn dict_offset(target: Marker) -> Self {
        Self::Offset {
            target,
            base: None,
            encoding: OffsetEncoding::DictInteger,
        }
    }
}

/// Ordered sequence of output items.
#[derive(Debug, Default)]
pub(crate) struct Linker<'a> {
    items: Vec<Item<'a>>,
    marker_count: usize,
}

impl<'a> Linker<'a> {
    pub(crate) fn marker(&mut self) -> Marker {
        let marker = Marker(self.marker_count);
        self.marker_count += 1;
        marker
    }

    pub(crate) fn push(&mut self, item: Item<'a>) {
        self.items.push(item);
    }

    pub(crate) fn extend(&mut self, items: impl IntoIterator<Item = Item<'a>>) {
        self.items.extend(items);
    }

    pub(crate) fn mark(&mut self, marker: Marker) {
        self.items.push(Item::Mark(marker));
    }

    /// Pushes an INDEX with elements consisting of the specified items. Element sizes
    /// are static, so INDEX offsets are computed immediately.
    pub(crate) fn push_index(&mut self, elements: Vec<Vec<Item<'a>>>) {
        let lengths: Vec<usize> = elements
            .iter()
            .map(|items| items.iter().map(Item::len).sum())
            .collect();
        self.push(Item::Literal(super::index_header(&lengths)));
        self.extend(elements.into_iter().flatten());
    }

    /// Computes the position of each placed marker and the total output length.
    fn layout(&self) -> (Vec<Option<usize>>, usize) {
        let mut positions = vec![None; self.marker_count];
        let mut pos = 0;
        for item in &self.items {
            if let Item::Mark(Marker(idx)) = item {
                debug_assert!(positions[*idx].is_none(), "marker #{idx} placed twice");
                positions[*idx] = Some(pos);
            }
            pos += item.len();
        }
        (positions, pos)
    }

    fn resolve(positions: &[Option<usize>], target: Marker, base: Option<Marker>) -> usize {
        let position = |Marker(idx): Marker| positions[idx].expect("marker is not placed");
        let target = position(target);
        let base = base.map_or(0, position);
        target.checked_sub(base).expect("offset underflow")
    }

    pub(crate) fn link(self) -> Vec<u8> {
        let (positions, total_len) = self.layout();
        let mut buffer = Vec::with_capacity(total_len);
        for item in self.items {
            match item {
                Item::Copy(bytes) => buffer.extend_from_slice(bytes),
                Item::Literal(bytes) => buffer.extend_from_slice(&bytes),
                Item::Offset {
                    target,
                    base,
                    encoding,
                } => {
                    let offset = Self::resolve(&positions, target, base);
                    match encoding {
                        OffsetEncoding::Fixed(size) => super::write_offset(&mut buffer, offset, size),
                        OffsetEncoding::DictInteger => {
                            let offset = i32::try_from(offset).expect("offset overflow");
                            write_fixed_integer(&mut buffer, offset);
                        }
                    }
                }
                Item::Mark(_) => { /* zero-length */ }
            }
        }
        debug_assert_eq!(buffer.len(), total_len);
        buffer
    }
}
