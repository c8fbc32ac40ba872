//! Label rules and the page label table built from them.

use serde::{Deserialize, Serialize};

use super::style::{optional_style, NumberingStyle};

fn default_first_page_number() -> u32 {
    1
}

/// One labeling rule from the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelRule {
    /// 0-based index of the first page the rule applies to
    #[serde(rename = "startpage")]
    pub start_page: u32,

    /// Text placed before the number
    #[serde(default)]
    pub prefix: String,

    /// Numbering style (None = prefix only)
    #[serde(default, with = "optional_style")]
    pub style: Option<NumberingStyle>,

    /// Number shown on the first page of the range
    #[serde(rename = "firstpagenum", default = "default_first_page_number")]
    pub first_page_number: u32,
}

impl LabelRule {
    /// Create a rule starting at `start_page` numbered from 1 without prefix.
    pub fn new(start_page: u32, style: Option<NumberingStyle>) -> Self {
        Self {
            start_page,
            prefix: String::new(),
            style,
            first_page_number: 1,
        }
    }

    /// Set the prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the first page number.
    pub fn with_first_page_number(mut self, number: u32) -> Self {
        self.first_page_number = number;
        self
    }
}

/// The style descriptor of one label range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLabelStyle {
    /// `/S`, absent for prefix-only labels
    pub style: Option<NumberingStyle>,
    /// `/St`
    pub first_page_number: u32,
    /// `/P`
    pub prefix: String,
}

impl PageLabelStyle {
    /// The label of the page `offset` pages into the range.
    pub fn label_at(&self, offset: u32) -> String {
        match self.style {
            Some(style) => {
                let number = self.first_page_number.saturating_add(offset);
                format!("{}{}", self.prefix, style.format(number))
            }
            None => self.prefix.clone(),
        }
    }
}

/// A `(start page, style)` pair of the page label number tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLabelEntry {
    pub start_page: u32,
    pub style: PageLabelStyle,
}

/// Sparse mapping from page index to label range, in caller order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLabelTable {
    entries: Vec<PageLabelEntry>,
}

impl PageLabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry as-is.
    pub fn push(&mut self, start_page: u32, style: PageLabelStyle) {
        self.entries.push(PageLabelEntry { start_page, style });
    }

    pub fn entries(&self) -> &[PageLabelEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Positions whose start page does not exceed the previous entry's.
    ///
    /// Viewers expect strictly increasing start pages; an empty result means
    /// the table is well ordered.
    pub fn out_of_order(&self) -> Vec<usize> {
        self.entries
            .windows(2)
            .enumerate()
            .filter(|(_, pair)| pair[1].start_page <= pair[0].start_page)
            .map(|(i, _)| i + 1)
            .collect()
    }

    /// The label a viewer would show for the 0-based page `index`.
    ///
    /// Uses the range with the greatest start page not after `index`
    /// (later entries win ties). Returns `None` when no range covers it.
    pub fn label_for(&self, index: u32) -> Option<String> {
        let entry = self
            .entries
            .iter()
            .filter(|e| e.start_page <= index)
            .fold(None::<&PageLabelEntry>, |best, e| match best {
                Some(b) if b.start_page > e.start_page => Some(b),
                _ => Some(e),
            })?;
        Some(entry.style.label_at(index - entry.start_page))
    }
}

/// Convert rules into the page label table.
///
/// Order is preserved exactly; nothing is sorted, merged or validated.
pub fn build<'a, I>(rules: I) -> PageLabelTable
where
    I: IntoIterator<Item = &'a LabelRule>,
{
    let mut table = PageLabelTable::new();
    for rule in rules {
        table.push(
            rule.start_page,
            PageLabelStyle {
                style: rule.style,
                first_page_number: rule.first_page_number,
                prefix: rule.prefix.clone(),
            },
        );
    }
    table
}
