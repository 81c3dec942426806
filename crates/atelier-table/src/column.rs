//! Column descriptors.
//!
//! A [`Column`] says how to pull a value out of a record for sorting,
//! filtering and search, and optionally how to display it. All accessors are
//! closures built once per column; the dotted key is parsed once into a
//! [`FieldPath`] when the column is created.

use std::fmt;
use std::sync::Arc;

use crate::path::FieldPath;
use crate::record::Record;
use crate::value::CellValue;

pub type Accessor<R> = Arc<dyn Fn(&R) -> CellValue + Send + Sync>;
pub type Renderer<R> = Arc<dyn Fn(&R) -> Cell + Send + Sync>;
pub type TextExtractor<R> = Arc<dyn Fn(&R) -> String + Send + Sync>;

// ── Cell ────────────────────────────────────────────────────────

/// The displayed representation of one column for one record.
///
/// Renderers use `tone` as a style key (badge colour and the like) and
/// `href` for cells that link elsewhere. Only `text` and `secondary` are
/// visible text, so only they take part in search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub secondary: Option<String>,
    pub tone: Option<&'static str>,
    pub href: Option<String>,
}

impl Cell {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_secondary(mut self, secondary: impl Into<String>) -> Self {
        self.secondary = Some(secondary.into());
        self
    }

    pub fn with_tone(mut self, tone: &'static str) -> Self {
        self.tone = Some(tone);
        self
    }

    pub fn with_href(mut self, href: impl Into<String>) -> Self {
        self.href = Some(href.into());
        self
    }

    /// Lowercase, space-joined visible text.
    pub fn search_text(&self) -> String {
        let mut out = self.text.to_lowercase();
        if let Some(secondary) = &self.secondary {
            out.push(' ');
            out.push_str(&secondary.to_lowercase());
        }
        out
    }
}

impl From<CellValue> for Cell {
    fn from(value: CellValue) -> Self {
        match value {
            CellValue::Missing | CellValue::Null => Cell::default(),
            other => Cell::text(other.to_string()),
        }
    }
}

// ── Column ──────────────────────────────────────────────────────

pub struct Column<R> {
    key: String,
    path: FieldPath,
    label: String,
    sortable: bool,
    filterable: bool,
    value: Accessor<R>,
    filter_value: Option<Accessor<R>>,
    render: Option<Renderer<R>>,
    search_text: Option<TextExtractor<R>>,
    filter_options: Option<Vec<String>>,
}

impl<R: Record + 'static> Column<R> {
    /// A column whose raw value is the dotted-path lookup of `key`.
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        let key = key.into();
        let path = FieldPath::parse(key.clone());
        let lookup = path.clone();
        Self::build(key, path, label.into(), Arc::new(move |r: &R| r.lookup(&lookup)))
    }
}

impl<R> Column<R> {
    /// A column whose raw value comes from a typed accessor instead of the
    /// path lookup.
    pub fn with_accessor<F>(key: impl Into<String>, label: impl Into<String>, accessor: F) -> Self
    where
        F: Fn(&R) -> CellValue + Send + Sync + 'static,
    {
        let key = key.into();
        let path = FieldPath::parse(key.clone());
        Self::build(key, path, label.into(), Arc::new(accessor))
    }

    fn build(key: String, path: FieldPath, label: String, value: Accessor<R>) -> Self {
        Self {
            key,
            path,
            label,
            sortable: false,
            filterable: false,
            value,
            filter_value: None,
            render: None,
            search_text: None,
            filter_options: None,
        }
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }

    /// Override the value used for filtering and filter-option derivation.
    pub fn filter_by<F>(mut self, accessor: F) -> Self
    where
        F: Fn(&R) -> CellValue + Send + Sync + 'static,
    {
        self.filter_value = Some(Arc::new(accessor));
        self
    }

    /// Fixed filter choices, shown instead of the derived ones.
    pub fn filter_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter_options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn render<F>(mut self, render: F) -> Self
    where
        F: Fn(&R) -> Cell + Send + Sync + 'static,
    {
        self.render = Some(Arc::new(render));
        self
    }

    /// Text matched by free-text search in addition to the raw value.
    pub fn search_text<F>(mut self, extract: F) -> Self
    where
        F: Fn(&R) -> String + Send + Sync + 'static,
    {
        self.search_text = Some(Arc::new(extract));
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_sortable(&self) -> bool {
        self.sortable
    }

    pub fn is_filterable(&self) -> bool {
        self.filterable
    }

    pub fn explicit_filter_options(&self) -> Option<&[String]> {
        self.filter_options.as_deref()
    }

    /// Raw value, used for sorting and raw-value search.
    pub fn value(&self, record: &R) -> CellValue {
        (self.value)(record)
    }

    /// Value used for filtering: the filter accessor if set, else the raw value.
    pub fn filter_value(&self, record: &R) -> CellValue {
        match &self.filter_value {
            Some(accessor) => accessor(record),
            None => self.value(record),
        }
    }

    /// Displayed cell: the renderer's output, or the raw value as text.
    pub fn cell(&self, record: &R) -> Cell {
        match &self.render {
            Some(render) => render(record),
            None => Cell::from(self.value(record)),
        }
    }

    pub fn has_render(&self) -> bool {
        self.render.is_some()
    }

    /// Lowercase display text for search, for columns that define one.
    ///
    /// An explicit search-text extractor wins over the renderer.
    pub fn display_text(&self, record: &R) -> Option<String> {
        if let Some(extract) = &self.search_text {
            return Some(extract(record).to_lowercase());
        }
        self.render.as_ref().map(|render| render(record).search_text())
    }
}

impl<R> Clone for Column<R> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            path: self.path.clone(),
            label: self.label.clone(),
            sortable: self.sortable,
            filterable: self.filterable,
            value: Arc::clone(&self.value),
            filter_value: self.filter_value.clone(),
            render: self.render.clone(),
            search_text: self.search_text.clone(),
            filter_options: self.filter_options.clone(),
        }
    }
}

impl<R> fmt::Debug for Column<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Column")
            .field("key", &self.key)
            .field("label", &self.label)
            .field("sortable", &self.sortable)
            .field("filterable", &self.filterable)
            .field("render", &self.render.is_some())
            .field("filter_options", &self.filter_options)
            .finish()
    }
}
