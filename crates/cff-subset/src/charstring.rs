//! Charstring scanning: discovers subroutine calls made by a charstring program.
//!
//! Charstrings are not interpreted; the scanner only tracks the operand stack depth
//! (with values where they are statically known) and the number of declared stem hints,
//! which is required to skip `hintmask` / `cntrmask` data correctly.

use crate::{
    alloc::Vec,
    font::{Cursor, IndexRef},
    ParseError,
};

/// Charstring operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Operator {
    HStem,
    VStem,
    CallSubr,
    Return,
    EndChar,
    HStemHm,
    HintMask,
    CntrMask,
    VStemHm,
    CallGsubr,
    And,
    Or,
    Not,
    Abs,
    Add,
    Sub,
    Div,
    Neg,
    Eq,
    Drop,
    Put,
    Get,
    IfElse,
    Random,
    Mul,
    Sqrt,
    Dup,
    Exch,
    Index,
    Roll,
    /// Any other one-byte operator (path construction, Type 1-specific or reserved).
    Other(u8),
    /// Any other escaped operator.
    OtherEscaped(u8),
}

impl Operator {
    const ESCAPE: u8 = 12;

    fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::HStem,
            3 => Self::VStem,
            10 => Self::CallSubr,
            11 => Self::Return,
            14 => Self::EndChar,
            18 => Self::HStemHm,
            19 => Self::HintMask,
            20 => Self::CntrMask,
            23 => Self::VStemHm,
            29 => Self::CallGsubr,
            _ => Self::Other(byte),
        }
    }

    fn from_escaped(byte: u8) -> Self {
        match byte {
            3 => Self::And,
            4 => Self::Or,
            5 => Self::Not,
            9 => Self::Abs,
            10 => Self::Add,
            11 => Self::Sub,
            12 => Self::Div,
            14 => Self::Neg,
            15 => Self::Eq,
            18 => Self::Drop,
            20 => Self::Put,
            21 => Self::Get,
            22 => Self::IfElse,
            23 => Self::Random,
            24 => Self::Mul,
            26 => Self::Sqrt,
            27 => Self::Dup,
            28 => Self::Exch,
            29 => Self::Index,
            30 => Self::Roll,
            _ => Self::OtherEscaped(byte),
        }
    }

    pub(crate) fn stack_effect(self) -> StackEffect {
        match self {
            Self::IfElse => StackEffect::Pop(3),
            Self::Roll | Self::Put => StackEffect::Pop(2),
            Self::CallSubr
            | Self::CallGsubr
            | Self::Add
            | Self::Sub
            | Self::Div
            | Self::Mul
            | Self::Drop
            | Self::And
            | Self::Or
            | Self::Eq => StackEffect::Pop(1),
            Self::Abs
            | Self::Neg
            | Self::Sqrt
            | Self::Exch
            | Self::Index
            | Self::Get
            | Self::Not
            | Self::Return => StackEffect::Keep,
            Self::Random | Self::Dup => StackEffect::Push,
            _ => StackEffect::Clear,
        }
    }

    fn is_stem(self) -> bool {
        matches!(
            self,
            Self::HStem | Self::VStem | Self::HStemHm | Self::VStemHm
        )
    }
}

/// Net effect of an operator on the operand stack depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StackEffect {
    Pop(usize),
    Keep,
    Push,
    Clear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token {
    Operand(i32),
    Operator(Operator),
}

/// Reads a single charstring token.
#[allow(clippy::cast_possible_wrap)] // intentional
pub(crate) fn read_token(cursor: &mut Cursor<'_>) -> Result<Token, ParseError> {
    let b0 = cursor.read_u8()?;
    Ok(match b0 {
        Operator::ESCAPE => Token::Operator(Operator::from_escaped(cursor.read_u8()?)),
        28 => Token::Operand(i32::from(cursor.read_u16()? as i16)),
        0..=31 => Token::Operator(Operator::from_byte(b0)),
        32..=246 => Token::Operand(i32::from(b0) - 139),
        247..=250 => {
            let b1 = cursor.read_u8()?;
            Token::Operand((i32::from(b0) - 247) * 256 + i32::from(b1) + 108)
        }
        251..=254 => {
            let b1 = cursor.read_u8()?;
            Token::Operand(-(i32::from(b0) - 251) * 256 - i32::from(b1) - 108)
        }
        // 16.16 fixed-point number in Type 2 charstrings, 32-bit integer in Type 1 ones
        255 => Token::Operand(cursor.read_u32()? as i32),
    })
}

/// Computes the bias added to subroutine call operands.
pub(crate) fn subr_bias(charstring_type: u8, subr_count: usize) -> i32 {
    if charstring_type == 1 {
        0
    } else if subr_count < 1_240 {
        107
    } else if subr_count < 33_900 {
        1_131
    } else {
        32_768
    }
}

/// Computes the byte length of `hintmask` / `cntrmask` data.
pub(crate) fn hint_mask_len(hint_count: usize) -> usize {
    hint_count.div_ceil(8).max(1)
}

/// Reference to a subroutine from a certain pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum SubrRef {
    Local(usize),
    Global(usize),
}

/// Subroutine INDEX together with its call bias.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SubrPool<'a> {
    data: &'a [u8],
    index: &'a IndexRef,
    bias: i32,
}

impl<'a> SubrPool<'a> {
    pub(crate) fn new(data: &'a [u8], index: &'a IndexRef, charstring_type: u8) -> Self {
        Self {
            data,
            index,
            bias: subr_bias(charstring_type, index.len()),
        }
    }

    /// Resolves a call operand into a subroutine index. Returns `None` for out-of-range targets.
    fn resolve(&self, operand: i32) -> Option<usize> {
        let idx = i64::from(operand) + i64::from(self.bias);
        usize::try_from(idx).ok().filter(|&idx| idx < self.index.len())
    }

    pub(crate) fn body(&self, idx: usize) -> &'a [u8] {
        self.index.get(self.data, idx)
    }
}

/// Operand stack and hint state of a single charstring execution.
#[derive(Debug)]
struct ScanState {
    /// Operands; `None` marks values that cannot be statically determined.
    stack: Vec<Option<i32>>,
    hint_count: usize,
    /// Remaining number of tokens that may be read from inlined subroutine bodies.
    inline_budget: usize,
}

impl ScanState {
    fn new(inline_budget: usize) -> Self {
        Self {
            stack: Vec::new(),
            hint_count: 0,
            inline_budget,
        }
    }

    fn top(&self) -> Option<i32> {
        self.stack.last().copied().flatten()
    }

    fn execute(&mut self, operator: Operator) {
        let len = self.stack.len();
        let lhs = len.checked_sub(2).and_then(|i| self.stack[i]);
        let rhs = self.top();

        match operator.stack_effect() {
            StackEffect::Pop(count) => self.stack.truncate(len.saturating_sub(count)),
            StackEffect::Keep => { /* depth is unchanged */ }
            StackEffect::Push => self.stack.push(None),
            StackEffect::Clear => self.stack.clear(),
        }

        let result = match operator {
            Operator::Add => lhs.zip(rhs).and_then(|(a, b)| a.checked_add(b)),
            Operator::Sub => lhs.zip(rhs).and_then(|(a, b)| a.checked_sub(b)),
            Operator::Mul => lhs.zip(rhs).and_then(|(a, b)| a.checked_mul(b)),
            Operator::Abs => rhs.and_then(i32::checked_abs),
            Operator::Neg => rhs.and_then(i32::checked_neg),
            Operator::Dup => rhs,
            Operator::Exch => {
                if len >= 2 {
                    self.stack.swap(len - 2, len - 1);
                }
                return;
            }
            Operator::Div
            | Operator::And
            | Operator::Or
            | Operator::Eq
            | Operator::IfElse
            | Operator::Sqrt
            | Operator::Index
            | Operator::Get
            | Operator::Not
            | Operator::Random
            | Operator::Roll => None,
            _ => return,
        };
        if let Some(top) = self.stack.last_mut() {
            *top = result;
        }
    }
}

/// Scanner of charstrings in a single Private DICT context.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Scanner<'a> {
    local: Option<SubrPool<'a>>,
    global: SubrPool<'a>,
}

impl<'a> Scanner<'a> {
    /// Maximum subroutine nesting depth followed when scanning.
    const MAX_NESTING: usize = 10;
    /// Maximum number of tokens read from inlined subroutine bodies during a single scan.
    /// Bounds the work on fonts where subroutines call each other with a high fan-out.
    const INLINE_BUDGET: usize = 4_096;

    pub(crate) fn new(local: Option<SubrPool<'a>>, global: SubrPool<'a>) -> Self {
        Self { local, global }
    }

    pub(crate) fn body(&self, subr: SubrRef) -> &'a [u8] {
        match subr {
            // `SubrRef::Local` is only produced if there is a local pool
            SubrRef::Local(idx) => match self.local {
                Some(pool) => pool.body(idx),
                None => &[],
            },
            SubrRef::Global(idx) => self.global.body(idx),
        }
    }

    /// Scans a charstring (a glyph or a subroutine) and reports all subroutine calls
    /// with statically known targets.
    ///
    /// Called subroutines are followed inline (up to a fixed nesting depth and a fixed number
    /// of inlined tokens) so that stem hints declared in subroutines are accounted for.
    /// Once the inline budget is exhausted, calls in `charstring` itself are still reported,
    /// but their bodies are no longer followed.
    ///
    /// The scan starts with no declared hints. When a subroutine body is scanned on its own,
    /// hints declared by its callers are thus unknown, and `hintmask` / `cntrmask` data
    /// in the body may be sized too short. The remaining mask bytes are then decoded as tokens
    /// and may be reported as calls, so the result can contain spurious subroutines.
    /// Calls made from a body are still found when it's inlined into a caller
    /// with the correct hint count.
    pub(crate) fn scan(&self, charstring: &[u8], on_call: &mut impl FnMut(SubrRef)) {
        let mut state = ScanState::new(Self::INLINE_BUDGET);
        self.scan_inner(charstring, &mut state, 0, on_call);
    }

    fn scan_inner(
        &self,
        charstring: &[u8],
        state: &mut ScanState,
        depth: usize,
        on_call: &mut impl FnMut(SubrRef),
    ) {
        let mut cursor = Cursor::new(charstring);
        while !cursor.is_empty() {
            if depth > 0 {
                if state.inline_budget == 0 {
                    log::trace!("inline budget is exhausted; skipping the rest of a subroutine");
                    return;
                }
                state.inline_budget -= 1;
            }
            let Ok(token) = read_token(&mut cursor) else {
                log::trace!("charstring is truncated at {}", cursor.position());
                return;
            };
            let operator = match token {
                Token::Operand(value) => {
                    state.stack.push(Some(value));
                    continue;
                }
                Token::Operator(operator) => operator,
            };

            let pending_operands = state.stack.len();
            let top = state.top();
            state.execute(operator);

            match operator {
                Operator::CallSubr | Operator::CallGsubr => {
                    self.follow_call(operator, top, state, depth, on_call);
                }
                op if op.is_stem() => state.hint_count += pending_operands / 2,
                Operator::HintMask | Operator::CntrMask => {
                    // Operands before the first mask are implicit `vstem` hints.
                    state.hint_count += pending_operands / 2;
                    if cursor.skip(hint_mask_len(state.hint_count)).is_err() {
                        log::trace!("hint mask is truncated at {}", cursor.position());
                        return;
                    }
                }
                _ => { /* no effect on subroutines or hints */ }
            }
        }
    }

    fn follow_call(
        &self,
        operator: Operator,
        operand: Option<i32>,
        state: &mut ScanState,
        depth: usize,
        on_call: &mut impl FnMut(SubrRef),
    ) {
        let Some(operand) = operand else {
            log::trace!("ignoring {operator:?} with statically unknown operand");
            return;
        };
        let (pool, subr) = if operator == Operator::CallSubr {
            let Some(pool) = self.local else {
                log::trace!("ignoring local subroutine call without local subroutines");
                return;
            };
            (pool, pool.resolve(operand).map(SubrRef::Local))
        } else {
            (self.global, self.global.resolve(operand).map(SubrRef::Global))
        };

        let Some(subr) = subr else {
            log::trace!("ignoring {operator:?} with out-of-range operand {operand}");
            return;
        };
        on_call(subr);
        if depth < Self::MAX_NESTING && state.inline_budget > 0 {
            let (SubrRef::Local(idx) | SubrRef::Global(idx)) = subr;
            self.scan_inner(pool.body(idx), state, depth + 1, on_call);
        }
    }
}
