//! Table state carried in the query string.
//!
//! A table's parameters are `q` (search), `sort`, `dir` and `f.<column>`
//! (one per active filter). Pages with more than one table give each a
//! prefix, so the namespace table on `/costs` reads `ns.q`, `ns.sort`, ...
//! Parameters that belong to other tables, or to the page itself, are kept
//! untouched in every link a table generates.

use atelier_table::{DataTable, Record, SortDirection, SortState, TableState};
use tracing::debug;

/// Decoded query-string pairs, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    /// First value of `name`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The state a request asks of `table`.
    ///
    /// Unknown or non-sortable sort keys fall back to the table's default
    /// sort; filters on unknown or non-filterable columns are dropped; a bad
    /// `dir` reads as ascending.
    pub fn table_state<R: Record>(&self, prefix: &str, table: &DataTable<R>) -> TableState {
        let names = ParamNames::new(prefix);
        let mut state = TableState::with_sort(table.default_sort_state().cloned());

        if let Some(term) = self.get(&names.search) {
            state.set_search(term);
        }

        if let Some(key) = self.get(&names.sort) {
            if table.column(key).is_some_and(|c| c.is_sortable()) {
                let direction = match self.get(&names.dir) {
                    Some(dir) => dir.parse().unwrap_or_else(|err| {
                        debug!(%err, "ignoring sort direction");
                        SortDirection::Ascending
                    }),
                    None => SortDirection::Ascending,
                };
                state.set_sort(Some(SortState::new(key, direction)));
            } else {
                debug!(key, "ignoring sort on unknown or unsortable column");
            }
        }

        for (name, value) in &self.pairs {
            let Some(key) = name.strip_prefix(&names.filter) else {
                continue;
            };
            if table.column(key).is_some_and(|c| c.is_filterable()) {
                state.set_filter(key, Some(value.clone()));
            }
        }

        state
    }

    /// Pairs that do not belong to the table at `prefix`.
    pub fn foreign_pairs(&self, prefix: &str) -> Vec<(String, String)> {
        let names = ParamNames::new(prefix);
        self.pairs
            .iter()
            .filter(|(k, _)| !names.owns(k))
            .cloned()
            .collect()
    }

    /// Link to `path` with the table at `prefix` in `state`.
    pub fn href(&self, path: &str, prefix: &str, state: &TableState) -> String {
        let mut pairs = self.foreign_pairs(prefix);
        pairs.extend(encode_state(prefix, state));
        with_query(path, &pairs)
    }

    /// Link to `path` with one page-level parameter replaced.
    pub fn href_with(&self, path: &str, name: &str, value: &str) -> String {
        let mut pairs: Vec<(String, String)> = self
            .pairs
            .iter()
            .filter(|(k, _)| k != name)
            .cloned()
            .collect();
        pairs.push((name.to_string(), value.to_string()));
        with_query(path, &pairs)
    }
}

/// Parameter names for one table.
#[derive(Debug, Clone)]
pub struct ParamNames {
    pub search: String,
    pub sort: String,
    pub dir: String,
    /// Prefix of filter parameters; the column key follows.
    pub filter: String,
}

impl ParamNames {
    pub fn new(prefix: &str) -> Self {
        let scoped = |name: &str| {
            if prefix.is_empty() {
                name.to_string()
            } else {
                format!("{prefix}.{name}")
            }
        };
        Self {
            search: scoped("q"),
            sort: scoped("sort"),
            dir: scoped("dir"),
            filter: scoped("f."),
        }
    }

    pub fn filter_param(&self, key: &str) -> String {
        format!("{}{key}", self.filter)
    }

    fn owns(&self, name: &str) -> bool {
        name == self.search || name == self.sort || name == self.dir || name.starts_with(&self.filter)
    }
}

/// Query pairs describing `state`. Empty search and absent sort are omitted.
pub fn encode_state(prefix: &str, state: &TableState) -> Vec<(String, String)> {
    let names = ParamNames::new(prefix);
    let mut pairs = Vec::new();
    if !state.search().is_empty() {
        pairs.push((names.search.clone(), state.search().to_string()));
    }
    if let Some(sort) = state.sort() {
        pairs.push((names.sort.clone(), sort.key.clone()));
        pairs.push((names.dir.clone(), sort.direction.as_str().to_string()));
    }
    for (key, value) in state.filters() {
        pairs.push((names.filter_param(key), value.clone()));
    }
    pairs
}

/// `path?k=v&...`, percent-encoded; bare `path` when there are no pairs.
pub fn with_query(path: &str, pairs: &[(String, String)]) -> String {
    if pairs.is_empty() {
        return path.to_string();
    }
    let query: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect();
    format!("{path}?{}", query.join("&"))
}
