// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Fixed-width table handling: header-driven layout detection and the
//! row decode/encode codec derived from it.

pub mod layout;
mod row;

pub use layout::{ColumnDescriptor, Layout};
