// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Column-layout detection for fixed-width kubectl tables.
//!
//! kubectl computes column widths per invocation from the widest value in
//! each column, so the widths cannot be known ahead of time. The header line
//! is the one place the current widths are encoded: each column name plus
//! its trailing padding spans exactly the column's on-screen field width.

use anyhow::{Result, bail};

/// One fixed-width column: header name plus its on-screen field width
/// (name + trailing padding). The last column of a layout is unbounded
/// regardless of its recorded width.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub name: String,
    pub width: usize,
}

/// Ordered column descriptors detected from a single header line.
/// Immutable once built; the decode/encode codec lives in [`super::row`].
#[derive(Debug, Clone)]
pub struct Layout {
    columns: Vec<ColumnDescriptor>,
}

/// Header column names match `[-A-Z0-9_]+`.
fn is_name_byte(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'0'..=b'9' | b'-' | b'_')
}

impl Layout {
    /// Detect the column layout from a header line.
    ///
    /// Repeatedly strips a leading `NAME` token and its run of padding
    /// spaces; the column width is the length of both together. Anything
    /// left over once no token matches (normally nothing) is not a column.
    /// A header that yields zero columns is malformed input.
    pub fn detect(header: &str) -> Result<Self> {
        let mut rest = header.trim_end_matches(['\r', '\n']);
        let mut columns = Vec::new();

        while !rest.is_empty() {
            let name_len = rest.bytes().take_while(|&b| is_name_byte(b)).count();
            if name_len == 0 {
                break;
            }
            let pad_len = rest[name_len..].bytes().take_while(|&b| b == b' ').count();
            columns.push(ColumnDescriptor {
                name: rest[..name_len].to_string(),
                width: name_len + pad_len,
            });
            rest = &rest[name_len + pad_len..];
        }

        if columns.is_empty() {
            bail!("malformed header line (no columns detected): {:?}", header);
        }
        Ok(Self { columns })
    }

    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// A listing is namespaced iff its first column is exactly `NAMESPACE`.
    /// Namespaced listings supply namespace from column 0 and name from
    /// column 1; everything else supplies name from column 0.
    pub fn is_namespaced(&self) -> bool {
        self.columns.first().is_some_and(|c| c.name == "NAMESPACE")
    }
}
