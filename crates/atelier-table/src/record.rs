//! Record access.
//!
//! The engine never inspects records directly: every lookup goes through
//! [`Record::lookup`] or a column accessor. JSON documents implement the
//! trait natively; typed payloads are wrapped in a [`Snapshot`], which keeps
//! the typed value for rendering next to its JSON form for path lookups.

use std::ops::Deref;
use std::sync::Arc;

use serde::Serialize;

use crate::path::FieldPath;
use crate::value::CellValue;

/// A row the query engine can resolve dotted paths against.
pub trait Record {
    fn lookup(&self, path: &FieldPath) -> CellValue;
}

impl Record for serde_json::Value {
    fn lookup(&self, path: &FieldPath) -> CellValue {
        path.resolve(self)
            .map(CellValue::from_json)
            .unwrap_or(CellValue::Missing)
    }
}

impl<T: Record + ?Sized> Record for &T {
    fn lookup(&self, path: &FieldPath) -> CellValue {
        (**self).lookup(path)
    }
}

impl<T: Record + ?Sized> Record for Box<T> {
    fn lookup(&self, path: &FieldPath) -> CellValue {
        (**self).lookup(path)
    }
}

impl<T: Record + ?Sized> Record for Arc<T> {
    fn lookup(&self, path: &FieldPath) -> CellValue {
        (**self).lookup(path)
    }
}

/// A typed record paired with its JSON document.
///
/// The document is produced once, when the snapshot is taken, so repeated
/// derivations never re-serialize the item.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    item: T,
    doc: serde_json::Value,
}

impl<T: Serialize> Snapshot<T> {
    pub fn new(item: T) -> Result<Self, serde_json::Error> {
        let doc = serde_json::to_value(&item)?;
        Ok(Self { item, doc })
    }

    /// Snapshot every item of a collection, preserving order.
    pub fn collect<I>(items: I) -> Result<Vec<Self>, serde_json::Error>
    where
        I: IntoIterator<Item = T>,
    {
        items.into_iter().map(Snapshot::new).collect()
    }
}

impl<T> Snapshot<T> {
    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn doc(&self) -> &serde_json::Value {
        &self.doc
    }

    pub fn into_inner(self) -> T {
        self.item
    }
}

impl<T> Deref for Snapshot<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

impl<T> Record for Snapshot<T> {
    fn lookup(&self, path: &FieldPath) -> CellValue {
        self.doc.lookup(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    #[serde(rename_all = "camelCase")]
    struct Workload {
        target_name: String,
        container_count: u32,
        pr_state: Option<String>,
    }

    #[test]
    fn json_lookup_missing_vs_null() {
        let doc = json!({"a": null});
        assert_eq!(doc.lookup(&"a".into()), CellValue::Null);
        assert_eq!(doc.lookup(&"b".into()), CellValue::Missing);
    }

    #[test]
    fn snapshot_looks_up_serialized_names() {
        let snap = Snapshot::new(Workload {
            target_name: "api".into(),
            container_count: 2,
            pr_state: None,
        })
        .unwrap();

        assert_eq!(snap.lookup(&"targetName".into()), CellValue::from("api"));
        assert_eq!(snap.lookup(&"containerCount".into()), CellValue::Number(2.0));
        assert_eq!(snap.lookup(&"prState".into()), CellValue::Null);
        assert_eq!(snap.container_count, 2);
    }

    #[test]
    fn snapshot_collect_preserves_order() {
        let snaps = Snapshot::collect(vec![json!({"n": 1}), json!({"n": 2})]).unwrap();
        let ns: Vec<_> = snaps.iter().map(|s| s.lookup(&"n".into())).collect();
        assert_eq!(ns, vec![CellValue::Number(1.0), CellValue::Number(2.0)]);
    }
}
