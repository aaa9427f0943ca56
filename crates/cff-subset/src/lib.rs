//! Compact Font Format (CFF) table subsetting.
//!
//! This crate produces a subset of a font from a CFF table, retaining only the specified glyphs
//! together with the global and local subroutines reachable from their charstrings. Glyph IDs
//! are retained: unused glyphs and subroutines are replaced with trivial charstrings
//! (`endchar` and `return`, respectively), so that the charstrings of retained glyphs
//! are copied verbatim. This makes the output suitable for embedding into PDF documents
//! that refer to glyphs by their original IDs.
//!
//! The output is always a CFF table with a single CID-keyed font. Non-CID fonts are promoted
//! to CID-keyed ones with an identity charset and a single Font DICT.
//!
//! # Crate features
//!
//! ## `std`
//!
//! *(On by default)*
//!
//! Enables `std`-specific functionality, such as [`Error`](std::error::Error) implementations
//! for error types. Without this feature, the crate is `no_std`-compatible (but requires
//! an allocator).
//!
//! # Examples
//!
//! ```no_run
//! use cff_subset::{Cff, CffSubset};
//! use std::collections::BTreeSet;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cff_data = std::fs::read("font.cff")?;
//! let cff = Cff::new(&cff_data)?;
//! println!("{} glyphs", cff.fonts()[0].glyph_count());
//!
//! let glyphs = BTreeSet::from([3, 17, 42]);
//! let subset = CffSubset::new(&cff, 0, &glyphs)?;
//! let subset_data: Vec<u8> = subset.to_cff();
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![doc(html_root_url = "https://docs.rs/cff-subset/0.1.0")]

mod charstring;
mod errors;
mod font;
mod subset;
#[cfg(test)]
pub(crate) mod tests;
mod write;

pub use crate::{
    errors::{ParseError, ParseErrorKind, Structure, SubsetError},
    font::{Cff, CffFont},
    subset::CffSubset,
};

use crate::alloc::{BTreeSet, String, Vec};

// Polyfill for `alloc` types.
mod alloc {
    #[cfg(not(feature = "std"))]
    extern crate alloc as std;

    pub(crate) use std::{
        collections::{BTreeSet, VecDeque},
        string::String,
        vec,
        vec::Vec,
    };
}

/// Subsets the first font in the provided CFF table.
///
/// # Errors
///
/// Returns an error if the table cannot be parsed or doesn't contain fonts.
pub fn subset_cff(data: &[u8], glyphs: &BTreeSet<u16>) -> Result<Vec<u8>, SubsetError> {
    let cff = Cff::new(data)?;
    let subset = CffSubset::new(&cff, 0, glyphs)?;
    Ok(subset.to_cff())
}

/// Subsets the font with the specified name in the provided CFF table.
///
/// # Errors
///
/// Returns an error if the table cannot be parsed or doesn't contain a font with the specified name.
pub fn subset_cff_font(
    data: &[u8],
    font_name: &str,
    glyphs: &BTreeSet<u16>,
) -> Result<Vec<u8>, SubsetError> {
    let cff = Cff::new(data)?;
    let font_idx = cff
        .font_index(font_name)
        .ok_or_else(|| SubsetError::FontNotFound(String::from(font_name)))?;
    let subset = CffSubset::new(&cff, font_idx, glyphs)?;
    Ok(subset.to_cff())
}

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
