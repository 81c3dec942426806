//! Dotted field paths (`"metadata.name"`).

use std::fmt;

/// A field path split on `.` once, at construction.
///
/// Segments descend into JSON objects by key and into arrays by index.
/// A path that runs into a scalar, `null` or an absent key does not resolve.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    raw: String,
    segments: Vec<String>,
}

impl FieldPath {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = raw.split('.').map(str::to_string).collect();
        Self { raw, segments }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolve this path against a JSON document.
    pub fn resolve<'v>(&self, root: &'v serde_json::Value) -> Option<&'v serde_json::Value> {
        self.segments
            .iter()
            .try_fold(root, |node, segment| step(node, segment))
    }
}

fn step<'v>(node: &'v serde_json::Value, segment: &str) -> Option<&'v serde_json::Value> {
    match node {
        serde_json::Value::Object(map) => map.get(segment),
        serde_json::Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for FieldPath {
    fn from(raw: &str) -> Self {
        FieldPath::parse(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_segment() {
        let doc = json!({"name": "a"});
        assert_eq!(FieldPath::parse("name").resolve(&doc), Some(&json!("a")));
    }

    #[test]
    fn nested_segments() {
        let doc = json!({"metadata": {"name": "web", "labels": {"tier": "fe"}}});
        assert_eq!(
            FieldPath::parse("metadata.labels.tier").resolve(&doc),
            Some(&json!("fe"))
        );
    }

    #[test]
    fn array_index_segment() {
        let doc = json!({"containers": [{"name": "app"}, {"name": "sidecar"}]});
        assert_eq!(
            FieldPath::parse("containers.1.name").resolve(&doc),
            Some(&json!("sidecar"))
        );
        assert_eq!(FieldPath::parse("containers.9.name").resolve(&doc), None);
        assert_eq!(FieldPath::parse("containers.x").resolve(&doc), None);
    }

    #[test]
    fn malformed_paths_do_not_resolve() {
        let doc = json!({"a": {"b": null}, "s": "text"});
        assert_eq!(FieldPath::parse("a.b.c").resolve(&doc), None);
        assert_eq!(FieldPath::parse("s.len").resolve(&doc), None);
        assert_eq!(FieldPath::parse("a..b").resolve(&doc), None);
        assert_eq!(FieldPath::parse("").resolve(&doc), None);
    }

    #[test]
    fn null_leaf_resolves() {
        let doc = json!({"a": {"b": null}});
        assert_eq!(FieldPath::parse("a.b").resolve(&doc), Some(&json!(null)));
    }
}
