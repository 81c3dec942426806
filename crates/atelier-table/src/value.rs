//! Cell values resolved from records.
//!
//! A [`CellValue`] is what a column accessor yields for one record. It keeps
//! the JSON type of the underlying field so sorting can compare numbers
//! numerically and text lexicographically, and it distinguishes an
//! unresolvable field ([`CellValue::Missing`]) from an explicit `null`.

use std::cmp::Ordering;
use std::fmt;

/// A single field value as seen by the query engine.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    /// The field path did not resolve.
    Missing,
    /// The field exists and is `null`.
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// An object or array.
    Json(serde_json::Value),
}

impl CellValue {
    /// Convert a JSON value, keeping scalars typed.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Null,
            serde_json::Value::Bool(b) => CellValue::Bool(*b),
            serde_json::Value::Number(n) => n
                .as_f64()
                .map(CellValue::Number)
                .unwrap_or_else(|| CellValue::Text(n.to_string())),
            serde_json::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Json(other.clone()),
        }
    }

    /// `true` for [`CellValue::Missing`] and [`CellValue::Null`].
    pub fn is_absent(&self) -> bool {
        matches!(self, CellValue::Missing | CellValue::Null)
    }

    /// String form used for filter matching and option lists.
    ///
    /// Returns `None` only for [`CellValue::Missing`].
    pub fn to_text(&self) -> Option<String> {
        match self {
            CellValue::Missing => None,
            CellValue::Null => Some("null".to_string()),
            CellValue::Bool(b) => Some(b.to_string()),
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Json(v) => Some(v.to_string()),
        }
    }

    /// Total order used by the sort stage.
    ///
    /// Values of different kinds order by kind:
    /// `Bool < Number < Text < Json < Null < Missing`. Within a kind, booleans
    /// order `false < true`, numbers by [`f64::total_cmp`], text byte-wise and
    /// composites by their compact JSON text.
    ///
    /// Byte-wise UTF-8 order is Unicode code point order. It differs from
    /// UTF-16 code-unit order (what a browser's `<` on strings uses) only when
    /// a supplementary-plane character (U+10000 and up) is compared against
    /// one in U+E000..=U+FFFF: here the supplementary character sorts last.
    pub fn total_cmp(&self, other: &CellValue) -> Ordering {
        match (self, other) {
            (CellValue::Bool(a), CellValue::Bool(b)) => a.cmp(b),
            (CellValue::Number(a), CellValue::Number(b)) => a.total_cmp(b),
            (CellValue::Text(a), CellValue::Text(b)) => a.cmp(b),
            (CellValue::Json(a), CellValue::Json(b)) => a.to_string().cmp(&b.to_string()),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            CellValue::Bool(_) => 0,
            CellValue::Number(_) => 1,
            CellValue::Text(_) => 2,
            CellValue::Json(_) => 3,
            CellValue::Null => 4,
            CellValue::Missing => 5,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Some(text) => f.write_str(&text),
            None => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Number(value as f64)
    }
}

impl From<u32> for CellValue {
    fn from(value: u32) -> Self {
        CellValue::Number(value as f64)
    }
}

impl<T: Into<CellValue>> From<Option<T>> for CellValue {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(CellValue::Missing)
    }
}

/// Format a number the way a browser stringifies it: integral values carry
/// no fractional part.
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
