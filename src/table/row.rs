// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Fixed-width row codec.
//!
//! Decoding splits a line at the byte offsets recorded in the [`Layout`] and
//! trims the trailing padding from every field but the last; the last column
//! takes the remainder of the line verbatim so multi-word status text is
//! never split. Encoding pads each field back out to its column width.
//! `decode(encode(fields)) == fields` holds whenever every field fits its
//! column; the exact padding bytes of the original line are not preserved.

use super::layout::Layout;

impl Layout {
    /// Split one data line into exactly `self.len()` fields.
    ///
    /// Lines shorter than the layout yield empty strings for the missing
    /// trailing fields; kubectl output can be ragged and that is not an
    /// error.
    pub fn decode(&self, line: &str) -> Vec<String> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        let columns = self.columns();
        let mut fields = Vec::with_capacity(columns.len());

        for (i, col) in columns.iter().enumerate() {
            if i + 1 == columns.len() {
                fields.push(rest.to_string());
            } else {
                let mut cut = col.width.min(rest.len());
                // Widths are byte counts; never split a multi-byte character.
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                let (field, tail) = rest.split_at(cut);
                fields.push(field.trim_end_matches(' ').to_string());
                rest = tail;
            }
        }
        fields
    }

    /// Re-encode fields into a fixed-width line using this layout's widths.
    /// The last field is appended verbatim. A field wider than its column
    /// simply shifts the rest of the line; content is never truncated.
    pub fn encode(&self, fields: &[String]) -> String {
        let columns = self.columns();
        let mut line = String::new();
        for (i, col) in columns.iter().enumerate() {
            let field = fields.get(i).map(String::as_str).unwrap_or("");
            if i + 1 == columns.len() {
                line.push_str(field);
            } else {
                line.push_str(&format!("{:<width$}", field, width = col.width));
            }
        }
        line
    }
}
