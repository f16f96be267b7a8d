// Copyright (c) 2025 Nikolay Denev <ndenev@gmail.com>
// SPDX-License-Identifier: BSD-3-Clause

//! Per-column regex filtering.
//!
//! Filter expressions are comma-separated `INDEX=REGEX` pairs with 1-based
//! column indices; `INDEX=!REGEX` inverts the predicate and `\,` escapes a
//! comma inside a regex. All predicates must hold for a row to survive.

use anyhow::{Context, Result, bail};
use regex::Regex;

/// One column predicate: keep rows whose field matches (`Include`) or
/// rows whose field does not match (`Exclude`). Substring search, not a
/// full-line match.
#[derive(Debug, Clone)]
pub enum Pattern {
    Include(Regex),
    Exclude(Regex),
}

impl Pattern {
    pub fn matches(&self, field: &str) -> bool {
        match self {
            Pattern::Include(re) => re.is_match(field),
            Pattern::Exclude(re) => !re.is_match(field),
        }
    }
}

/// The complete filter set for one invocation: (1-based column index,
/// pattern) pairs, sorted by index so evaluation order is deterministic.
#[derive(Debug, Clone, Default)]
pub struct MatchSpec {
    entries: Vec<(usize, Pattern)>,
}

impl MatchSpec {
    /// Parse a comma-separated filter expression, e.g. `1=web,3=!Running`.
    pub fn parse(expr: &str) -> Result<Self> {
        let mut entries = Vec::new();

        for part in split_unescaped(expr) {
            if part.is_empty() {
                continue;
            }
            let (index, pattern) = part
                .split_once('=')
                .with_context(|| format!("invalid filter {:?} (expected INDEX=REGEX)", part))?;
            let index: usize = index
                .trim()
                .parse()
                .with_context(|| format!("invalid column index in filter {:?}", part))?;
            if index == 0 {
                bail!("column indices are 1-based; got 0 in filter {:?}", part);
            }

            let (negated, source) = match pattern.strip_prefix('!') {
                Some(rest) => (true, rest),
                None => (false, pattern),
            };
            let regex = Regex::new(source)
                .with_context(|| format!("invalid regex in filter {:?}", part))?;
            let pattern = if negated {
                Pattern::Exclude(regex)
            } else {
                Pattern::Include(regex)
            };
            entries.push((index, pattern));
        }

        entries.sort_by_key(|(index, _)| *index);
        Ok(Self { entries })
    }

    #[allow(dead_code)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Indices must resolve to a detected column; anything beyond the
    /// column count is a configuration error, not a per-row failure.
    pub fn validate(&self, column_count: usize) -> Result<()> {
        for (index, _) in &self.entries {
            if *index > column_count {
                bail!(
                    "filter column {} is out of range (the table has {} columns)",
                    index,
                    column_count
                );
            }
        }
        Ok(())
    }

    /// Logical AND over all predicates, short-circuiting on the first
    /// failure. An empty spec matches every row.
    pub fn matches(&self, row: &[String]) -> bool {
        self.entries.iter().all(|(index, pattern)| {
            row.get(index - 1)
                .is_some_and(|field| pattern.matches(field))
        })
    }
}

/// Split on commas, honoring `\,` as a literal comma. Other backslash
/// sequences pass through untouched so regex escapes like `\d` survive.
fn split_unescaped(expr: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut chars = expr.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&',') => {
                chars.next();
                current.push(',');
            }
            ',' => {
                parts.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    parts.push(current);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_single_include() {
        let spec = MatchSpec::parse("2=Running").unwrap();
        assert!(spec.matches(&row(&["ns1", "Running"])));
        assert!(!spec.matches(&row(&["ns1", "Pending"])));
    }

    #[test]
    fn test_parse_exclude() {
        let spec = MatchSpec::parse("2=!Running").unwrap();
        assert!(!spec.matches(&row(&["ns1", "Running"])));
        assert!(spec.matches(&row(&["ns1", "Pending"])));
    }

    #[test]
    fn test_include_and_exclude_on_pod_rows() {
        let running = row(&["ns1", "pod-a", "Running"]);
        let pending = row(&["ns1", "pod-b", "Pending"]);

        let include = MatchSpec::parse("3=Running").unwrap();
        assert!(include.matches(&running));
        assert!(!include.matches(&pending));

        let exclude = MatchSpec::parse("3=!Running").unwrap();
        assert!(!exclude.matches(&running));
        assert!(exclude.matches(&pending));
    }

    #[test]
    fn test_multiple_filters_are_anded() {
        let spec = MatchSpec::parse("1=default,3=Running").unwrap();
        assert!(spec.matches(&row(&["default", "pod-a", "Running"])));
        assert!(!spec.matches(&row(&["default", "pod-b", "Pending"])));
        assert!(!spec.matches(&row(&["kube-sys", "pod-c", "Running"])));
    }

    #[test]
    fn test_substring_search_not_full_match() {
        let spec = MatchSpec::parse("1=web").unwrap();
        assert!(spec.matches(&row(&["frontend-web-7d9f"])));
    }

    #[test]
    fn test_regex_syntax_supported() {
        let spec = MatchSpec::parse(r"1=^pod-[0-9]+$").unwrap();
        assert!(spec.matches(&row(&["pod-42"])));
        assert!(!spec.matches(&row(&["pod-a"])));
    }

    #[test]
    fn test_escaped_comma_in_regex() {
        let spec = MatchSpec::parse(r"1=a\,b,2=x").unwrap();
        assert!(spec.matches(&row(&["a,b", "x"])));
        assert!(!spec.matches(&row(&["a", "x"])));
    }

    #[test]
    fn test_empty_spec_matches_everything() {
        let spec = MatchSpec::parse("").unwrap();
        assert!(spec.is_empty());
        assert!(spec.matches(&row(&["anything"])));
    }

    #[test]
    fn test_parse_rejects_missing_equals() {
        assert!(MatchSpec::parse("Running").is_err());
    }

    #[test]
    fn test_parse_rejects_zero_index() {
        assert!(MatchSpec::parse("0=x").is_err());
    }

    #[test]
    fn test_parse_rejects_bad_regex() {
        assert!(MatchSpec::parse("1=[unclosed").is_err());
    }

    #[test]
    fn test_validate_out_of_range_index() {
        let spec = MatchSpec::parse("5=x").unwrap();
        assert!(spec.validate(3).is_err());
        assert!(spec.validate(5).is_ok());
    }

    #[test]
    fn test_missing_field_never_matches_include() {
        let spec = MatchSpec::parse("3=x").unwrap();
        assert!(!spec.matches(&row(&["a", "b"])));
    }
}
