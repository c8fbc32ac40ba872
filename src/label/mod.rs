//! Page label rules and the PDF page label table.
//!
//! A page label table maps page indexes to ranges, each with a numbering
//! style, a prefix and a starting number. [`build`] turns configuration rules
//! into that table without reordering them.

mod style;
mod table;

pub use style::{NumberingStyle, MAX_SYMBOLIC_NUMBER};
pub use table::{build, LabelRule, PageLabelEntry, PageLabelStyle, PageLabelTable};
