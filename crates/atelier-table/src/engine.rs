//! The query pipeline: filter → search → sort.

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::column::Column;
use crate::error::TableError;
use crate::path::FieldPath;
use crate::record::Record;
use crate::state::{SortDirection, SortState, TableState};
use crate::value::CellValue;

pub const DEFAULT_SEARCH_PLACEHOLDER: &str = "Search...";

pub type RowCallback<R> = Arc<dyn Fn(&R) + Send + Sync>;

/// A table over records of type `R`: column descriptors plus the search,
/// filter and sort state a user manipulates.
///
/// Records are not owned by the table. Each call to [`DataTable::view`]
/// derives the visible rows from the slice it is given, so a table can be
/// kept across data refreshes or rebuilt per request.
pub struct DataTable<R> {
    columns: Vec<Column<R>>,
    index: HashMap<String, usize>,
    searchable: bool,
    search_placeholder: String,
    default_sort: Option<SortState>,
    on_row_select: Option<RowCallback<R>>,
    state: TableState,
}

impl<R: Record> DataTable<R> {
    /// Build a table. Column keys must be unique.
    pub fn new(columns: Vec<Column<R>>) -> Result<Self, TableError> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, column) in columns.iter().enumerate() {
            if index.insert(column.key().to_string(), i).is_some() {
                return Err(TableError::DuplicateColumn(column.key().to_string()));
            }
        }
        Ok(Self {
            columns,
            index,
            searchable: true,
            search_placeholder: DEFAULT_SEARCH_PLACEHOLDER.to_string(),
            default_sort: None,
            on_row_select: None,
            state: TableState::default(),
        })
    }

    pub fn searchable(mut self, searchable: bool) -> Self {
        self.searchable = searchable;
        self
    }

    pub fn search_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.search_placeholder = placeholder.into();
        self
    }

    /// Initial sort; also applied to the current state.
    pub fn default_sort(mut self, sort: SortState) -> Self {
        self.state.set_sort(Some(sort.clone()));
        self.default_sort = Some(sort);
        self
    }

    pub fn on_row_select<F>(mut self, callback: F) -> Self
    where
        F: Fn(&R) + Send + Sync + 'static,
    {
        self.on_row_select = Some(Arc::new(callback));
        self
    }

    /// Replace the interaction state wholesale (e.g. restored from a URL).
    pub fn with_state(mut self, state: TableState) -> Self {
        self.state = state;
        self
    }

    // ── Accessors ───────────────────────────────────────────────

    pub fn columns(&self) -> &[Column<R>] {
        &self.columns
    }

    pub fn column(&self, key: &str) -> Option<&Column<R>> {
        self.index.get(key).map(|&i| &self.columns[i])
    }

    pub fn state(&self) -> &TableState {
        &self.state
    }

    pub fn default_sort_state(&self) -> Option<&SortState> {
        self.default_sort.as_ref()
    }

    pub fn is_searchable(&self) -> bool {
        self.searchable
    }

    pub fn placeholder(&self) -> &str {
        &self.search_placeholder
    }

    // ── Interaction ─────────────────────────────────────────────

    pub fn set_search(&mut self, term: impl Into<String>) {
        self.state.set_search(term);
        debug!(term = self.state.search(), "search term changed");
    }

    pub fn set_filter(&mut self, key: impl Into<String>, value: Option<String>) {
        let key = key.into();
        debug!(%key, ?value, "filter changed");
        self.state.set_filter(key, value);
    }

    pub fn clear_filter(&mut self, key: &str) -> bool {
        let removed = self.state.clear_filter(key);
        debug!(key, removed, "filter cleared");
        removed
    }

    pub fn clear_all_filters(&mut self) {
        debug!(count = self.state.filters().len(), "all filters cleared");
        self.state.clear_all_filters();
    }

    /// Header click. Returns `false` (and changes nothing) for columns that
    /// are unknown or not sortable.
    pub fn toggle_sort(&mut self, key: &str) -> bool {
        match self.column(key) {
            Some(column) if column.is_sortable() => {
                self.state.toggle_sort(key);
                debug!(sort = ?self.state.sort(), "sort changed");
                true
            }
            _ => false,
        }
    }

    /// The state a header click on `key` would produce, without applying it.
    pub fn state_after_sort_click(&self, key: &str) -> Option<TableState> {
        let column = self.column(key)?;
        if !column.is_sortable() {
            return None;
        }
        let mut next = self.state.clone();
        next.toggle_sort(key);
        Some(next)
    }

    /// Row click.
    pub fn select(&self, record: &R) {
        if let Some(callback) = &self.on_row_select {
            callback(record);
        }
    }

    // ── Derivation ──────────────────────────────────────────────

    /// Sorted, de-duplicated filter choices derived from the data, per
    /// filterable column, in column order.
    pub fn derived_filter_options(&self, records: &[R]) -> Vec<(String, Vec<String>)> {
        self.columns
            .iter()
            .filter(|c| c.is_filterable())
            .map(|column| {
                let values: BTreeSet<String> = records
                    .iter()
                    .map(|r| column.filter_value(r))
                    .filter(|value| !value.is_absent())
                    .filter_map(|value| value.to_text())
                    .filter(|text| !text.is_empty())
                    .collect();
                (column.key().to_string(), values.into_iter().collect())
            })
            .collect()
    }

    /// The visible rows for the current state.
    pub fn rows<'a>(&self, records: &'a [R]) -> Vec<&'a R> {
        let mut rows: Vec<&'a R> = records.iter().collect();
        rows = self.apply_filters(rows);
        if self.searchable && !self.state.search().is_empty() {
            rows = self.apply_search(rows, self.state.search());
        }
        if let Some(sort) = self.state.sort() {
            rows = self.apply_sort(rows, sort);
        }
        trace!(total = records.len(), visible = rows.len(), "derived table rows");
        rows
    }

    /// Everything a renderer needs for one pass.
    pub fn view<'a>(&self, records: &'a [R]) -> TableView<'a, R> {
        let filters = self
            .derived_filter_options(records)
            .into_iter()
            .map(|(key, derived)| {
                // Keys come from our own columns.
                let column = &self.columns[self.index[&key]];
                let options = column
                    .explicit_filter_options()
                    .map(<[String]>::to_vec)
                    .unwrap_or_else(|| derived.clone());
                FilterControl {
                    selected: self.state.filter(&key).map(str::to_string),
                    label: column.label().to_string(),
                    key,
                    options,
                    derived,
                }
            })
            .collect();

        let active_filters = self
            .state
            .filters()
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(key, value)| ActiveFilter {
                label: self
                    .column(key)
                    .map(|c| c.label().to_string())
                    .unwrap_or_else(|| key.clone()),
                key: key.clone(),
                value: value.clone(),
            })
            .collect();

        TableView {
            rows: self.rows(records),
            total: records.len(),
            filters,
            active_filters,
            sort: self.state.sort().cloned(),
            search: self.state.search().to_string(),
            search_placeholder: self.search_placeholder.clone(),
            searchable: self.searchable,
        }
    }

    // ── Pipeline stages ─────────────────────────────────────────

    fn apply_filters<'a>(&self, mut rows: Vec<&'a R>) -> Vec<&'a R> {
        for (key, selected) in self.state.filters() {
            if selected.is_empty() {
                continue;
            }
            let value_of = self.accessor_for(key, Column::filter_value);
            rows.retain(|&r| value_of(r).to_text().as_deref() == Some(selected.as_str()));
        }
        rows
    }

    fn apply_search<'a>(&self, mut rows: Vec<&'a R>, term: &str) -> Vec<&'a R> {
        let needle = term.to_lowercase();
        rows.retain(|&r| {
            let raw_hit = self.columns.iter().any(|c| {
                let value = c.value(r);
                !value.is_absent() && value.to_string().to_lowercase().contains(&needle)
            });
            raw_hit
                || self
                    .columns
                    .iter()
                    .any(|c| c.display_text(r).is_some_and(|text| text.contains(&needle)))
        });
        rows
    }

    fn apply_sort<'a>(&self, rows: Vec<&'a R>, sort: &SortState) -> Vec<&'a R> {
        let value_of = self.accessor_for(&sort.key, Column::value);
        let mut keyed: Vec<(CellValue, &'a R)> = rows.into_iter().map(|r| (value_of(r), r)).collect();
        // `sort_by` is stable: equal keys keep their input order.
        keyed.sort_by(|(a, _), (b, _)| sort.direction.apply(a.total_cmp(b)));
        keyed.into_iter().map(|(_, r)| r).collect()
    }

    /// Resolve a key to a value function: the named column's accessor, or a
    /// plain path lookup when no column has that key.
    fn accessor_for<'s>(
        &'s self,
        key: &str,
        via_column: fn(&Column<R>, &R) -> CellValue,
    ) -> Box<dyn Fn(&R) -> CellValue + 's> {
        match self.column(key) {
            Some(column) => Box::new(move |r: &R| via_column(column, r)),
            None => {
                let path = FieldPath::parse(key);
                Box::new(move |r: &R| r.lookup(&path))
            }
        }
    }
}

impl<R> fmt::Debug for DataTable<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataTable")
            .field("columns", &self.columns)
            .field("searchable", &self.searchable)
            .field("search_placeholder", &self.search_placeholder)
            .field("state", &self.state)
            .finish()
    }
}

// ── View ────────────────────────────────────────────────────────

/// The result of one derivation pass.
#[derive(Debug)]
pub struct TableView<'a, R> {
    /// Visible records, in display order. Each is a reference into the input.
    pub rows: Vec<&'a R>,
    /// Number of input records.
    pub total: usize,
    pub filters: Vec<FilterControl>,
    pub active_filters: Vec<ActiveFilter>,
    pub sort: Option<SortState>,
    pub search: String,
    pub search_placeholder: String,
    pub searchable: bool,
}

impl<R> TableView<'_, R> {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` when the "no data" placeholder should be shown.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Header affordance for `key`: the active direction, if it is the sort column.
    pub fn sort_indicator(&self, key: &str) -> Option<SortDirection> {
        self.sort
            .as_ref()
            .filter(|s| s.key == key)
            .map(|s| s.direction)
    }
}

/// One filter dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterControl {
    pub key: String,
    pub label: String,
    /// Choices to display: the column's explicit list, else `derived`.
    pub options: Vec<String>,
    /// Choices derived from the data.
    pub derived: Vec<String>,
    pub selected: Option<String>,
}

/// One "currently applied" filter chip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveFilter {
    pub key: String,
    pub label: String,
    pub value: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::Cell;
    use serde_json::{Value, json};
    use std::sync::Mutex;

    fn records() -> Vec<Value> {
        vec![
            json!({"name": "b", "ns": "x"}),
            json!({"name": "a", "ns": "y"}),
            json!({"name": "c", "ns": "x"}),
        ]
    }

    fn table() -> DataTable<Value> {
        DataTable::new(vec![
            Column::new("name", "Name").sortable(),
            Column::new("ns", "Namespace").filterable(),
        ])
        .unwrap()
    }

    fn names(rows: &[&Value]) -> Vec<String> {
        rows.iter()
            .map(|r| r["name"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn duplicate_keys_rejected() {
        let err = DataTable::<Value>::new(vec![Column::new("a", "A"), Column::new("a", "Again")])
            .unwrap_err();
        assert_eq!(err, TableError::DuplicateColumn("a".into()));
    }

    #[test]
    fn defaults() {
        let t = table();
        assert!(t.is_searchable());
        assert_eq!(t.placeholder(), "Search...");
        assert_eq!(t.state(), &TableState::default());
    }

    #[test]
    fn no_state_preserves_input_order() {
        let data = records();
        let t = table();
        assert_eq!(names(&t.rows(&data)), vec!["b", "a", "c"]);
    }

    #[test]
    fn default_sort_initialises_state() {
        let data = records();
        let t = table().default_sort(SortState::ascending("name"));
        assert_eq!(t.default_sort_state(), Some(&SortState::ascending("name")));
        assert_eq!(names(&t.rows(&data)), vec!["a", "b", "c"]);
    }

    #[test]
    fn non_sortable_click_is_ignored() {
        let mut t = table();
        assert!(!t.toggle_sort("ns"));
        assert!(!t.toggle_sort("nope"));
        assert_eq!(t.state().sort(), None);
        assert!(t.state_after_sort_click("ns").is_none());

        assert!(t.toggle_sort("name"));
        assert_eq!(t.state().sort(), Some(&SortState::ascending("name")));
    }

    #[test]
    fn state_after_sort_click_does_not_mutate() {
        let t = table().default_sort(SortState::ascending("name"));
        let next = t.state_after_sort_click("name").unwrap();
        assert_eq!(next.sort(), Some(&SortState::descending("name")));
        assert_eq!(t.state().sort(), Some(&SortState::ascending("name")));
    }

    #[test]
    fn search_disabled_ignores_term() {
        let data = records();
        let mut t = table().searchable(false);
        t.set_search("zzz");
        assert_eq!(t.rows(&data).len(), 3);
    }

    #[test]
    fn search_matches_rendered_text_only() {
        let data = vec![json!({"ready": true}), json!({"ready": false})];
        let mut t = DataTable::new(vec![Column::new("ready", "Status").render(|r: &Value| {
            if r["ready"].as_bool() == Some(true) {
                Cell::text("Ready")
            } else {
                Cell::text("Not Ready")
            }
        })])
        .unwrap();

        t.set_search("not ready");
        let rows = t.rows(&data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["ready"], json!(false));

        // The raw value matches too.
        t.set_search("TRUE");
        let rows = t.rows(&data);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["ready"], json!(true));
    }

    #[test]
    fn search_skips_absent_raw_values() {
        let data = vec![json!({"name": null}), json!({})];
        let mut t = DataTable::new(vec![Column::new("name", "Name")]).unwrap();
        t.set_search("null");
        assert!(t.rows(&data).is_empty());
    }

    #[test]
    fn filter_uses_filter_accessor() {
        let data = vec![
            json!({"name": "a", "fitProfile": "balanced"}),
            json!({"name": "b", "intent": "balanced"}),
            json!({"name": "c", "fitProfile": "aggressive"}),
        ];
        let mut t = DataTable::new(vec![
            Column::new("name", "Name"),
            Column::new("fitProfile", "Fit Profile")
                .filterable()
                .filter_by(|r: &Value| {
                    CellValue::from(
                        r["fitProfile"]
                            .as_str()
                            .or_else(|| r["intent"].as_str())
                            .unwrap_or(""),
                    )
                }),
        ])
        .unwrap();

        t.set_filter("fitProfile", Some("balanced".into()));
        assert_eq!(names(&t.rows(&data)), vec!["a", "b"]);
    }

    #[test]
    fn filter_on_unknown_key_uses_path_lookup() {
        let data = vec![
            json!({"name": "a", "meta": {"team": "core"}}),
            json!({"name": "b", "meta": {"team": "edge"}}),
        ];
        let mut t = table();
        t.set_filter("meta.team", Some("edge".into()));
        assert_eq!(names(&t.rows(&data)), vec!["b"]);
    }

    #[test]
    fn filter_is_exact_and_case_sensitive() {
        let data = vec![
            json!({"name": "a", "ns": "prod"}),
            json!({"name": "b", "ns": "production"}),
            json!({"name": "c", "ns": "Prod"}),
        ];
        let mut t = table();
        t.set_filter("ns", Some("prod".into()));
        assert_eq!(names(&t.rows(&data)), vec!["a"]);
    }

    #[test]
    fn missing_value_never_matches_filter() {
        let data = vec![json!({"name": "a"}), json!({"name": "b", "ns": "undefined"})];
        let mut t = table();
        t.set_filter("ns", Some("undefined".into()));
        assert_eq!(names(&t.rows(&data)), vec!["b"]);
    }

    #[test]
    fn numeric_filter_matches_string_form() {
        let data = vec![json!({"name": "a", "ns": 3}), json!({"name": "b", "ns": 3.5})];
        let mut t = table();
        t.set_filter("ns", Some("3".into()));
        assert_eq!(names(&t.rows(&data)), vec!["a"]);
    }

    #[test]
    fn derived_options_are_sorted_unique_and_skip_empty() {
        let data = vec![
            json!({"ns": "y"}),
            json!({"ns": "x"}),
            json!({"ns": ""}),
            json!({"ns": null}),
            json!({}),
            json!({"ns": "x"}),
        ];
        let t = table();
        assert_eq!(
            t.derived_filter_options(&data),
            vec![("ns".to_string(), vec!["x".to_string(), "y".to_string()])]
        );
    }

    #[test]
    fn explicit_options_override_display_but_keep_derived() {
        let data = records();
        let t = DataTable::new(vec![
            Column::new("ns", "Namespace")
                .filterable()
                .filter_options(["x", "y", "z"]),
        ])
        .unwrap();
        let view = t.view(&data);
        assert_eq!(view.filters.len(), 1);
        assert_eq!(view.filters[0].options, vec!["x", "y", "z"]);
        assert_eq!(view.filters[0].derived, vec!["x", "y"]);
    }

    #[test]
    fn view_reports_active_filters_and_indicator() {
        let data = records();
        let mut t = table().default_sort(SortState::descending("name"));
        t.set_filter("ns", Some("x".into()));

        let view = t.view(&data);
        assert_eq!(view.total, 3);
        assert_eq!(view.len(), 2);
        assert_eq!(
            view.active_filters,
            vec![ActiveFilter {
                key: "ns".into(),
                label: "Namespace".into(),
                value: "x".into(),
            }]
        );
        assert_eq!(view.filters[0].selected.as_deref(), Some("x"));
        assert_eq!(view.sort_indicator("name"), Some(SortDirection::Descending));
        assert_eq!(view.sort_indicator("ns"), None);
        assert_eq!(names(&view.rows), vec!["c", "b"]);
    }

    #[test]
    fn select_invokes_callback() {
        let picked = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&picked);
        let t = table().on_row_select(move |r: &Value| {
            sink.lock().unwrap().push(r["name"].as_str().unwrap_or_default().to_string());
        });
        let data = records();
        for row in t.rows(&data) {
            t.select(row);
        }
        assert_eq!(*picked.lock().unwrap(), vec!["b", "a", "c"]);
    }

    #[test]
    fn select_without_callback_is_noop() {
        let t = table();
        t.select(&json!({"name": "a"}));
    }
}
