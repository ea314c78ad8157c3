//! Page selection requests
//!
//! A selection is an ordered list of 1-based page numbers as the caller gave
//! them. Order and duplicates are significant. Bounds are checked against the
//! source document during extraction, not here.

use crate::error::{Error, Result};
use serde_json::Value;

/// Ordered, non-empty list of 1-based page numbers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageSelection {
    pages: Vec<i64>,
}

impl PageSelection {
    /// Build a selection from page numbers. Fails if `pages` is empty.
    pub fn new(pages: Vec<i64>) -> Result<Self> {
        if pages.is_empty() {
            return Err(Error::InvalidRequest {
                reason: "page selection is empty".to_string(),
            });
        }
        Ok(Self { pages })
    }

    /// Build a selection from a raw JSON request field.
    ///
    /// The value must be a non-empty array of integers. Strings, objects,
    /// scalars and floats are rejected as `InvalidRequest`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let items = match value {
            Value::Array(items) => items,
            Value::Null => {
                return Err(Error::InvalidRequest {
                    reason: "selected pages missing".to_string(),
                })
            }
            other => {
                return Err(Error::InvalidRequest {
                    reason: format!("selected pages must be an array, got {}", json_kind(other)),
                })
            }
        };

        let pages = items
            .iter()
            .map(|item| {
                item.as_i64().ok_or_else(|| Error::InvalidRequest {
                    reason: format!("selected page {} is not an integer", item),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(pages)
    }

    /// Parse a comma-separated page list such as `"1-3,7,9-8"`.
    ///
    /// Ranges are inclusive; a descending range expands in reverse order.
    pub fn parse(input: &str) -> Result<Self> {
        let mut pages = Vec::new();

        for part in input.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            match part.split_once('-') {
                Some((start, end)) => {
                    let start = parse_page_number(start, input)?;
                    let end = parse_page_number(end, input)?;
                    if start <= end {
                        pages.extend(start..=end);
                    } else {
                        pages.extend((end..=start).rev());
                    }
                }
                None => pages.push(parse_page_number(part, input)?),
            }
        }

        Self::new(pages)
    }

    /// Page numbers in request order
    pub fn pages(&self) -> &[i64] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Check every page against `total`, left to right, and convert to
    /// 0-based indices. The first out-of-range page wins.
    pub fn to_indices(&self, total: u32) -> Result<Vec<u32>> {
        self.pages
            .iter()
            .map(|&page| check_page(page, total))
            .collect()
    }
}

/// Validate a single 1-based page number and return its 0-based index
pub fn check_page(page: i64, total: u32) -> Result<u32> {
    if page < 1 || page > i64::from(total) {
        return Err(Error::PageOutOfRange { page, total });
    }
    Ok((page - 1) as u32)
}

fn parse_page_number(s: &str, input: &str) -> Result<i64> {
    s.trim().parse::<i64>().map_err(|_| Error::InvalidRequest {
        reason: format!("invalid page list: {}", input),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
