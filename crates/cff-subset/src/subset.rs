use crate::{
    alloc::{vec, BTreeSet, Vec, VecDeque},
    charstring::{Scanner, SubrPool, SubrRef},
    font::{Cff, CffFont},
    SubsetError,
};

/// Set of used INDEX elements. Iteration follows the discovery order.
#[derive(Debug, Clone, Default)]
pub(crate) struct UsedSet {
    members: BTreeSet<usize>,
    order: Vec<usize>,
}

impl UsedSet {
    /// Inserts an element; returns `true` if it was not present.
    pub(crate) fn insert(&mut self, idx: usize) -> bool {
        let is_new = self.members.insert(idx);
        if is_new {
            self.order.push(idx);
        }
        is_new
    }

    pub(crate) fn contains(&self, idx: usize) -> bool {
        self.members.contains(&idx)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.order.iter().copied()
    }
}

/// Reachability state for a single Private DICT context (i.e., a Font DICT for CID fonts).
#[derive(Debug)]
struct Closure<'g> {
    local_subrs: UsedSet,
    /// Global subrs already scanned in this context. A global subr calling `callsubr`
    /// resolves against the context's local subrs, so it's rescanned in each context.
    scanned_global_subrs: BTreeSet<usize>,
    global_subrs: &'g mut UsedSet,
    queue: VecDeque<SubrRef>,
}

impl<'g> Closure<'g> {
    fn new(global_subrs: &'g mut UsedSet) -> Self {
        Self {
            local_subrs: UsedSet::default(),
            scanned_global_subrs: BTreeSet::new(),
            global_subrs,
            queue: VecDeque::new(),
        }
    }

    fn record(&mut self, subr: SubrRef) {
        let is_new = match subr {
            SubrRef::Local(idx) => self.local_subrs.insert(idx),
            SubrRef::Global(idx) => {
                self.global_subrs.insert(idx);
                self.scanned_global_subrs.insert(idx)
            }
        };
        if is_new {
            self.queue.push_back(subr);
        }
    }

    /// Computes local subrs reachable from the specified glyphs. Global subrs are added
    /// to the shared global set.
    fn run<'a>(
        mut self,
        scanner: &Scanner<'a>,
        glyphs: impl Iterator<Item = &'a [u8]>,
    ) -> UsedSet {
        for charstring in glyphs {
            scanner.scan(charstring, &mut |subr| self.record(subr));
        }
        while let Some(subr) = self.queue.pop_front() {
            let body = scanner.body(subr);
            scanner.scan(body, &mut |subr| self.record(subr));
        }
        self.local_subrs
    }
}

/// Subset of a font from a [`Cff`] table that retains only the specified glyphs
/// and the subroutines they use.
///
/// The subset retains glyph IDs: unused glyphs and subroutines are replaced with trivial
/// charstrings, so no charstring needs to be rewritten. The subset is always emitted
/// as a CID-keyed font.
#[derive(Debug)]
pub struct CffSubset<'a> {
    pub(crate) cff: &'a Cff<'a>,
    pub(crate) font: &'a CffFont,
    pub(crate) glyphs: UsedSet,
    pub(crate) global_subrs: UsedSet,
    /// Font DICTs used by the retained glyphs; always `{0}` for non-CID fonts.
    pub(crate) font_dicts: UsedSet,
    /// Used local subrs per Font DICT.
    pub(crate) local_subrs: Vec<UsedSet>,
}

impl<'a> CffSubset<'a> {
    const PROMOTION_STRING_COUNT: usize = 3;

    /// Creates a subset of the font with the specified index. Glyph 0 (`.notdef`) is always retained;
    /// glyph IDs outside the font are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the font index is out of range, or if the font is not CID-keyed
    /// and its strings together with the ones added on promotion do not fit into an INDEX.
    pub fn new(
        cff: &'a Cff<'a>,
        font_idx: usize,
        glyphs: &BTreeSet<u16>,
    ) -> Result<Self, SubsetError> {
        let font = cff
            .fonts
            .get(font_idx)
            .ok_or_else(|| SubsetError::FontOutOfRange {
                index: font_idx,
                count: cff.fonts.len(),
            })?;
        if !font.is_cid() {
            // Promotion appends the registry, ordering and Font DICT name strings.
            let count = cff.strings.len() + Self::PROMOTION_STRING_COUNT;
            if count > usize::from(u16::MAX) {
                return Err(SubsetError::TooManyStrings { count });
            }
        }

        let mut this = Self::empty(cff, font);
        for &glyph in glyphs {
            this.ensure_glyph(glyph);
        }
        this.compute_closure();

        log::debug!(
            "subset of font `{}` uses {}/{} glyphs, {}/{} global subrs, {} local subrs in {} Font DICT(s)",
            font.name,
            this.glyphs.len(),
            font.glyph_count(),
            this.global_subrs.len(),
            cff.global_subrs.len(),
            this.used_local_subr_count(),
            this.font_dicts.len()
        );
        Ok(this)
    }

    fn empty(cff: &'a Cff<'a>, font: &'a CffFont) -> Self {
        let mut glyphs = UsedSet::default();
        if font.glyph_count() > 0 {
            // `.notdef` must always be retained
            glyphs.insert(0);
        }
        Self {
            cff,
            font,
            glyphs,
            global_subrs: UsedSet::default(),
            font_dicts: UsedSet::default(),
            local_subrs: vec![UsedSet::default(); font.font_dict_count()],
        }
    }

    fn ensure_glyph(&mut self, glyph: u16) {
        let idx = usize::from(glyph);
        if idx < self.font.glyph_count() {
            self.glyphs.insert(idx);
        } else {
            log::warn!(
                "glyph #{glyph} is out of range for font `{}` with {} glyphs; ignoring",
                self.font.name,
                self.font.glyph_count()
            );
        }
    }

    fn compute_closure(&mut self) {
        let data = self.cff.data;
        let charstring_type = self.font.charstring_type;
        let global_pool = SubrPool::new(data, &self.cff.global_subrs, charstring_type);

        for glyph in self.glyphs.iter() {
            self.font_dicts.insert(self.font.font_dict_for(glyph));
        }
        for fd in self.font_dicts.iter() {
            let local_pool = self
                .font
                .private_dict(fd)
                .and_then(|private| private.subrs.as_ref())
                .map(|subrs| SubrPool::new(data, subrs, charstring_type));
            let scanner = Scanner::new(local_pool, global_pool);

            let font = self.font;
            let glyphs = self
                .glyphs
                .iter()
                .filter(|&glyph| font.font_dict_for(glyph) == fd)
                .map(|glyph| font.char_strings.get(data, glyph));
            let used_subrs = Closure::new(&mut self.global_subrs).run(&scanner, glyphs);
            if let Some(slot) = self.local_subrs.get_mut(fd) {
                *slot = used_subrs;
            }
        }
    }

    /// Gets the number of retained glyphs, including `.notdef`.
    pub fn used_glyph_count(&self) -> usize {
        self.glyphs.len()
    }

    /// Gets the number of retained global subroutines.
    pub fn used_global_subr_count(&self) -> usize {
        self.global_subrs.len()
    }

    /// Gets the total number of retained local subroutines across all Font DICTs.
    pub fn used_local_subr_count(&self) -> usize {
        self.local_subrs.iter().map(UsedSet::len).sum()
    }
}
