//! Interaction state: search term, per-column filters, sort.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TableError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    /// Orient an ascending comparison result.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = TableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(SortDirection::Ascending),
            "desc" | "descending" => Ok(SortDirection::Descending),
            _ => Err(TableError::InvalidDirection(s.to_string())),
        }
    }
}

/// The single active sort rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: SortDirection,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    pub fn ascending(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Ascending)
    }

    pub fn descending(key: impl Into<String>) -> Self {
        Self::new(key, SortDirection::Descending)
    }
}

/// Everything a user can change about a table.
///
/// A column without an entry in the filter map is unfiltered; there is no
/// sentinel "all" value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableState {
    search: String,
    filters: BTreeMap<String, String>,
    sort: Option<SortState>,
}

impl TableState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sort(sort: Option<SortState>) -> Self {
        Self {
            sort,
            ..Self::default()
        }
    }

    pub fn search(&self) -> &str {
        &self.search
    }

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.search = term.into();
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn filter(&self, key: &str) -> Option<&str> {
        self.filters.get(key).map(String::as_str)
    }

    /// Select a filter value for a column; `None` or an empty value clears it.
    pub fn set_filter(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        match value {
            Some(value) if !value.is_empty() => {
                self.filters.insert(key, value);
            }
            _ => {
                self.filters.remove(&key);
            }
        }
    }

    /// Returns `true` if a filter was removed.
    pub fn clear_filter(&mut self, key: &str) -> bool {
        self.filters.remove(key).is_some()
    }

    pub fn clear_all_filters(&mut self) {
        self.filters.clear();
    }

    pub fn sort(&self) -> Option<&SortState> {
        self.sort.as_ref()
    }

    pub fn set_sort(&mut self, sort: Option<SortState>) {
        self.sort = sort;
    }

    /// Header click on `key`: flip direction if it is already the sort
    /// column, otherwise sort ascending by it.
    pub fn toggle_sort(&mut self, key: &str) {
        self.sort = Some(match self.sort.take() {
            Some(current) if current.key == key => {
                SortState::new(current.key, current.direction.toggled())
            }
            _ => SortState::ascending(key),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_parse() {
        assert_eq!("asc".parse::<SortDirection>().unwrap(), SortDirection::Ascending);
        assert_eq!("DESC".parse::<SortDirection>().unwrap(), SortDirection::Descending);
        assert_eq!(
            "descending".parse::<SortDirection>().unwrap(),
            SortDirection::Descending
        );
        assert!(matches!(
            "sideways".parse::<SortDirection>(),
            Err(TableError::InvalidDirection(s)) if s == "sideways"
        ));
    }

    #[test]
    fn direction_serde_uses_short_names() {
        let json = serde_json::to_string(&SortState::descending("name")).unwrap();
        assert_eq!(json, r#"{"key":"name","direction":"desc"}"#);
    }

    #[test]
    fn toggle_same_column_flips() {
        let mut state = TableState::new();
        state.toggle_sort("name");
        assert_eq!(state.sort(), Some(&SortState::ascending("name")));
        state.toggle_sort("name");
        assert_eq!(state.sort(), Some(&SortState::descending("name")));
        state.toggle_sort("name");
        assert_eq!(state.sort(), Some(&SortState::ascending("name")));
    }

    #[test]
    fn toggle_other_column_resets_ascending() {
        let mut state = TableState::with_sort(Some(SortState::descending("name")));
        state.toggle_sort("namespace");
        assert_eq!(state.sort(), Some(&SortState::ascending("namespace")));
    }

    #[test]
    fn empty_filter_value_clears() {
        let mut state = TableState::new();
        state.set_filter("ns", Some("prod".into()));
        assert_eq!(state.filter("ns"), Some("prod"));
        state.set_filter("ns", Some("staging".into()));
        assert_eq!(state.filter("ns"), Some("staging"));
        state.set_filter("ns", Some(String::new()));
        assert_eq!(state.filter("ns"), None);

        state.set_filter("ns", Some("prod".into()));
        state.set_filter("ns", None);
        assert!(state.filters().is_empty());
    }

    #[test]
    fn clear_all_keeps_search_and_sort() {
        let mut state = TableState::with_sort(Some(SortState::ascending("name")));
        state.set_search("api");
        state.set_filter("ns", Some("prod".into()));
        state.set_filter("kind", Some("Deployment".into()));

        state.clear_all_filters();
        assert!(state.filters().is_empty());
        assert_eq!(state.search(), "api");
        assert_eq!(state.sort(), Some(&SortState::ascending("name")));
    }

    #[test]
    fn clear_filter_reports_removal() {
        let mut state = TableState::new();
        state.set_filter("ns", Some("prod".into()));
        assert!(state.clear_filter("ns"));
        assert!(!state.clear_filter("ns"));
    }
}
