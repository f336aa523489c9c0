use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::report::{FIELD_NAMESPACES, FIELDS_KEY};
use crate::types::{FormName, Quantity};
use crate::utils::coerce_quantity;

pub use crate::types::{ItemName, ReportId};

/// A submitted report (document) as supplied by the host.
///
/// Workflow forms keep their values under `fields` (often nested in groups
/// such as `out` or `s_reported`); additional documents carry them at the
/// top level. Everything besides the envelope keys is kept in `content`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Stable document identifier.
    #[serde(rename = "_id", default)]
    pub id: ReportId,
    /// Form identifier naming the workflow this report belongs to.
    #[serde(default)]
    pub form: FormName,
    /// Native creation time in epoch milliseconds (number or numeric string).
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub reported_date: Value,
    /// Form the report was created from (additional documents only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_from_name: Option<FormName>,
    /// Remaining document content, including `fields`.
    #[serde(flatten)]
    pub content: Map<String, Value>,
}

impl Report {
    /// Create an empty report for `form`.
    pub fn new(id: impl Into<ReportId>, form: impl Into<FormName>) -> Self {
        Self {
            id: id.into(),
            form: form.into(),
            ..Self::default()
        }
    }

    /// Set the native reported date (epoch milliseconds).
    pub fn with_reported_date(mut self, millis: i64) -> Self {
        self.reported_date = Value::from(millis);
        self
    }

    /// Set the form this report was created from.
    pub fn with_created_from(mut self, form: impl Into<FormName>) -> Self {
        self.created_from_name = Some(form.into());
        self
    }

    /// Insert a value under `fields`, creating intermediate groups for dotted paths.
    pub fn with_field(mut self, path: &str, value: impl Into<Value>) -> Self {
        let fields = self
            .content
            .entry(FIELDS_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        insert_path(fields, path, value.into());
        self
    }

    /// Insert a top-level value (the layout used by additional documents).
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.content.insert(key.into(), value.into());
        self
    }

    /// Look up a field by name or dotted path.
    ///
    /// Search order: document top level, `fields`, then the known groups
    /// below `fields`. The first hit that is not `null` wins.
    pub fn field(&self, path: &str) -> Option<&Value> {
        let top = lookup_path_in_map(&self.content, path);
        if top.is_some() {
            return top;
        }
        let fields = self.content.get(FIELDS_KEY)?;
        lookup_path(fields, path).or_else(|| {
            FIELD_NAMESPACES
                .iter()
                .filter_map(|namespace| fields.get(*namespace))
                .find_map(|group| lookup_path(group, path))
        })
    }

    /// Numeric value of a field with zero fallback.
    pub fn quantity(&self, path: &str) -> Quantity {
        coerce_quantity(self.field(path))
    }
}

fn lookup_path_in_map<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    let (head, rest) = match path.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    };
    let value = map.get(head)?;
    match rest {
        Some(rest) => lookup_path(value, rest),
        None => Some(value).filter(|value| !value.is_null()),
    }
}

fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    match value {
        Value::Object(map) => lookup_path_in_map(map, path),
        _ => None,
    }
}

fn insert_path(target: &mut Value, path: &str, value: Value) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(map) = target else {
        return;
    };
    match path.split_once('.') {
        Some((head, rest)) => {
            let child = map
                .entry(head)
                .or_insert_with(|| Value::Object(Map::new()));
            insert_path(child, rest, value);
        }
        None => {
            map.insert(path.to_string(), value);
        }
    }
}
