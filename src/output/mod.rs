//! Row emission.
//!
//! Matched rows go to stdout either tab-joined (the default, pipe-friendly)
//! or re-encoded into the source table's own fixed-width geometry. All
//! diagnostics go to stderr so data output stays pipeable.

use crate::table::Layout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowFormat {
    #[default]
    Tab,
    PreserveColumns,
}

impl RowFormat {
    pub fn format(&self, layout: &Layout, fields: &[String]) -> String {
        match self {
            RowFormat::Tab => fields.join("\t"),
            RowFormat::PreserveColumns => layout.encode(fields),
        }
    }
}
