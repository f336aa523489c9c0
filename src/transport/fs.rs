use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::config::StockConfig;
use crate::data::Report;
use crate::errors::StockError;

/// Read a deployment configuration file.
pub fn read_config(path: &Path) -> Result<StockConfig, StockError> {
    let raw = fs::read_to_string(path)?;
    StockConfig::from_json_str(&raw).map_err(|source| StockError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a report dump.
///
/// Accepts a JSON array of documents, an object with a `docs` array, or a
/// CouchDB `_all_docs?include_docs=true` response (`rows[].doc`).
pub fn read_reports(path: &Path) -> Result<Vec<Report>, StockError> {
    let raw = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&raw).map_err(|source| StockError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    let reports = reports_from_value(value);
    debug!(path = %path.display(), reports = reports.len(), "loaded reports");
    Ok(reports)
}

/// Extract report documents from a parsed dump.
///
/// Documents that do not deserialize as a [`Report`] are logged and skipped.
pub fn reports_from_value(value: Value) -> Vec<Report> {
    let documents = match value {
        Value::Array(documents) => documents,
        Value::Object(mut object) => {
            if let Some(Value::Array(documents)) = object.remove("docs") {
                documents
            } else if let Some(Value::Array(rows)) = object.remove("rows") {
                rows.into_iter()
                    .filter_map(|mut row| row.get_mut("doc").map(Value::take))
                    .collect()
            } else {
                vec![Value::Object(object)]
            }
        }
        other => {
            warn!(kind = json_kind(&other), "report dump is not an array or object");
            Vec::new()
        }
    };

    let mut reports = Vec::with_capacity(documents.len());
    for document in documents {
        if !document.is_object() {
            warn!(kind = json_kind(&document), "skipping non-object document");
            continue;
        }
        let id = document.get("_id").and_then(Value::as_str).map(str::to_owned);
        let report: Report = match serde_json::from_value(document) {
            Ok(report) => report,
            Err(err) => {
                warn!(
                    id = id.as_deref().unwrap_or("<none>"),
                    error = %err,
                    "skipping malformed document"
                );
                continue;
            }
        };
        if report.id.starts_with("_design/") {
            continue;
        }
        reports.push(report);
    }
    reports
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn reports_from_value_accepts_all_dump_layouts() {
        let plain = reports_from_value(json!([{"_id": "a", "form": "stock_count"}]));
        assert_eq!(plain.len(), 1);

        let docs = reports_from_value(json!({"docs": [{"_id": "a"}, {"_id": "b"}]}));
        assert_eq!(docs.len(), 2);

        let rows = reports_from_value(json!({
            "total_rows": 3,
            "rows": [
                {"id": "a", "doc": {"_id": "a", "form": "stock_count"}},
                {"id": "b", "value": {"rev": "1-x"}},
                {"id": "_design/medic", "doc": {"_id": "_design/medic"}}
            ]
        }));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].form, "stock_count");

        let single = reports_from_value(json!({"_id": "solo", "form": "stock_logs"}));
        assert_eq!(single[0].id, "solo");
    }

    #[test]
    fn non_object_documents_are_skipped() {
        let reports = reports_from_value(json!([1, "two", {"_id": "three"}]));
        assert_eq!(reports.len(), 1);
        assert!(reports_from_value(json!("nope")).is_empty());
    }

    #[test]
    fn malformed_documents_do_not_hide_valid_ones() {
        let reports = reports_from_value(json!([
            {"_id": "count", "form": "stock_count", "fields": {"out": {"ors_available": 5}}},
            {"_id": "bad-form", "form": null},
            {"_id": "bad-origin", "form": "stock-consumption-doc", "created_from_name": 7},
            {"_id": "usage", "form": "stock-consumption-doc", "created_from_name": "pnc_visit"}
        ]));
        let ids: Vec<&str> = reports.iter().map(|report| report.id.as_str()).collect();
        assert_eq!(ids, ["count", "usage"]);
    }

    #[test]
    fn read_helpers_report_the_failing_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        let err = read_reports(&path).unwrap_err();
        assert!(matches!(err, StockError::Json { ref path, .. } if path.ends_with("broken.json")));
        let err = read_config(&path).unwrap_err();
        assert!(err.to_string().contains("broken.json"));

        let missing = dir.path().join("missing.json");
        assert!(matches!(read_config(&missing), Err(StockError::Io(_))));
    }
}
