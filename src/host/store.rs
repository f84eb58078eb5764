//! Structured store queries.
//!
//! A store is addressed by a `content://` URI and answers row queries. The
//! real platform store lives behind [`MediaHost::query`](super::MediaHost::query);
//! [`StoreIndex`] is the in-memory stand-in that [`LocalHost`](super::LocalHost)
//! loads from JSON:
//!
//! ```json
//! {
//!   "content://media/external/images/media": [
//!     { "_id": "42", "_data": "/storage/emulated/0/DCIM/a.jpg" }
//!   ],
//!   "content://downloads/public_downloads": [
//!     { "_id": "17", "_data": "/storage/emulated/0/Download/b.jpg" }
//!   ]
//! }
//! ```
//!
//! ## Selections
//!
//! Only equality selections are understood: `col=?`, optionally joined with
//! `AND`, one `?` per clause, bound positionally from the query args. A query
//! against `<store>/<n>` with no matching store key is treated as
//! `<store>` filtered by `_id = n`, which is how appended-id URIs address rows.

use super::HostError;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Row id column.
pub const ID_COLUMN: &str = "_id";

/// Column holding the filesystem path of a stored item.
pub const DATA_COLUMN: &str = "_data";

/// A single-store query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub store: String,
    pub projection: Vec<String>,
    pub selection: Option<String>,
    pub args: Vec<String>,
}

impl StoreQuery {
    /// Query for the data column only.
    pub fn data_column(store: impl Into<String>, selection: Option<&str>, args: &[&str]) -> Self {
        Self {
            store: store.into(),
            projection: vec![DATA_COLUMN.to_string()],
            selection: selection.map(str::to_string),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }
}

/// One result row, holding the projected columns in projection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreRow {
    columns: Vec<(String, Option<String>)>,
}

impl StoreRow {
    pub fn new(columns: Vec<(String, Option<String>)>) -> Self {
        Self { columns }
    }

    /// Value of `column`. A null value is `Ok(None)`; a column that was not
    /// projected is an error.
    pub fn get_string(&self, column: &str) -> Result<Option<&str>, HostError> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_deref())
            .ok_or_else(|| HostError::MissingColumn(column.to_string()))
    }
}

/// Forward-only cursor over query results. Released on drop.
pub trait StoreCursor {
    fn next_row(&mut self) -> Result<Option<StoreRow>, HostError>;
}

/// Cursor over rows already materialized in memory.
pub struct VecCursor {
    rows: std::vec::IntoIter<StoreRow>,
}

impl VecCursor {
    pub fn new(rows: Vec<StoreRow>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }
}

impl StoreCursor for VecCursor {
    fn next_row(&mut self) -> Result<Option<StoreRow>, HostError> {
        Ok(self.rows.next())
    }
}

/// In-memory stores keyed by store URI.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct StoreIndex {
    stores: HashMap<String, Vec<HashMap<String, Option<String>>>>,
}

impl StoreIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self, HostError> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| HostError::Query(e.to_string()))
    }

    /// Add a row to a store, creating the store on first use.
    pub fn insert_row(&mut self, store: &str, row: &[(&str, &str)]) {
        self.stores.entry(store.to_string()).or_default().push(
            row.iter()
                .map(|(k, v)| (k.to_string(), Some(v.to_string())))
                .collect(),
        );
    }

    /// Run a query, returning the projected matching rows.
    pub fn query(&self, query: &StoreQuery) -> Result<Vec<StoreRow>, HostError> {
        let mut filters = parse_selection(query.selection.as_deref(), &query.args)?;

        let rows = match self.stores.get(&query.store) {
            Some(rows) => rows,
            None => {
                let (parent, id) = split_appended_id(&query.store)
                    .ok_or_else(|| HostError::UnknownStore(query.store.clone()))?;
                filters.push((ID_COLUMN.to_string(), id.to_string()));
                self.stores
                    .get(parent)
                    .ok_or_else(|| HostError::UnknownStore(query.store.clone()))?
            }
        };

        Ok(rows
            .iter()
            .filter(|row| {
                filters
                    .iter()
                    .all(|(col, want)| row.get(col).and_then(Option::as_deref) == Some(want.as_str()))
            })
            .map(|row| {
                StoreRow::new(
                    query
                        .projection
                        .iter()
                        .map(|col| (col.clone(), row.get(col).cloned().flatten()))
                        .collect(),
                )
            })
            .collect())
    }
}

/// Split `content://store/path/<n>` into the parent store and the numeric id.
fn split_appended_id(store: &str) -> Option<(&str, &str)> {
    let (parent, last) = store.rsplit_once('/')?;
    (!last.is_empty() && last.bytes().all(|b| b.is_ascii_digit())).then_some((parent, last))
}

/// Parse `a=? AND b=?` into bound `(column, value)` pairs.
fn parse_selection(
    selection: Option<&str>,
    args: &[String],
) -> Result<Vec<(String, String)>, HostError> {
    let Some(selection) = selection.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(Vec::new());
    };

    let clauses: Vec<&str> = selection.split(" AND ").map(str::trim).collect();
    if clauses.len() != args.len() {
        return Err(HostError::Query(format!(
            "selection {selection:?} expects {} args, got {}",
            clauses.len(),
            args.len()
        )));
    }

    clauses
        .iter()
        .zip(args)
        .map(|(clause, arg)| {
            match clause.split_once('=').map(|(c, v)| (c.trim(), v.trim())) {
                Some((col, "?")) if !col.is_empty() => Ok((col.to_string(), arg.clone())),
                _ => Err(HostError::Query(format!("unsupported clause {clause:?}"))),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IMAGES: &str = "content://media/external/images/media";

    fn index() -> StoreIndex {
        let mut idx = StoreIndex::empty();
        idx.insert_row(IMAGES, &[("_id", "1"), ("_data", "/sdcard/one.jpg")]);
        idx.insert_row(IMAGES, &[("_id", "2"), ("_data", "/sdcard/two.jpg")]);
        idx
    }

    fn data_of(rows: &[StoreRow]) -> Vec<Option<&str>> {
        rows.iter()
            .map(|r| r.get_string(DATA_COLUMN).unwrap())
            .collect()
    }

    #[test]
    fn query_without_selection_returns_all_rows() {
        let rows = index()
            .query(&StoreQuery::data_column(IMAGES, None, &[]))
            .unwrap();
        assert_eq!(data_of(&rows), [Some("/sdcard/one.jpg"), Some("/sdcard/two.jpg")]);
    }

    #[test]
    fn query_with_id_selection() {
        let rows = index()
            .query(&StoreQuery::data_column(IMAGES, Some("_id=?"), &["2"]))
            .unwrap();
        assert_eq!(data_of(&rows), [Some("/sdcard/two.jpg")]);
    }

    #[test]
    fn query_appended_id_uri() {
        let rows = index()
            .query(&StoreQuery::data_column(format!("{IMAGES}/1"), None, &[]))
            .unwrap();
        assert_eq!(data_of(&rows), [Some("/sdcard/one.jpg")]);
    }

    #[test]
    fn query_deleted_row_is_empty() {
        let rows = index()
            .query(&StoreQuery::data_column(format!("{IMAGES}/99"), None, &[]))
            .unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn query_unknown_store_errors() {
        let result = index().query(&StoreQuery::data_column("content://nope", None, &[]));
        assert!(matches!(result, Err(HostError::UnknownStore(_))));
    }

    #[test]
    fn query_arg_count_mismatch_errors() {
        let result = index().query(&StoreQuery::data_column(IMAGES, Some("_id=?"), &[]));
        assert!(matches!(result, Err(HostError::Query(_))));
    }

    #[test]
    fn query_unsupported_clause_errors() {
        let result = index().query(&StoreQuery::data_column(IMAGES, Some("_id>?"), &["1"]));
        assert!(matches!(result, Err(HostError::Query(_))));
    }

    #[test]
    fn projection_of_absent_column_is_null() {
        let query = StoreQuery {
            store: IMAGES.into(),
            projection: vec!["title".into()],
            selection: None,
            args: vec![],
        };
        let rows = index().query(&query).unwrap();
        assert_eq!(rows[0].get_string("title").unwrap(), None);
    }

    #[test]
    fn row_without_projected_column_errors() {
        let row = StoreRow::new(vec![("_id".into(), Some("1".into()))]);
        assert!(matches!(
            row.get_string(DATA_COLUMN),
            Err(HostError::MissingColumn(_))
        ));
    }

    #[test]
    fn store_index_from_json() {
        let json = r#"{
            "content://downloads/public_downloads": [
                { "_id": "17", "_data": "/sdcard/Download/b.jpg" },
                { "_id": "18", "_data": null }
            ]
        }"#;
        let idx: StoreIndex = serde_json::from_str(json).unwrap();
        let rows = idx
            .query(&StoreQuery::data_column(
                "content://downloads/public_downloads/18",
                None,
                &[],
            ))
            .unwrap();
        assert_eq!(data_of(&rows), [None::<&str>]);
    }

    #[test]
    fn vec_cursor_yields_in_order() {
        let mut cursor = VecCursor::new(vec![StoreRow::default(), StoreRow::default()]);
        assert!(cursor.next_row().unwrap().is_some());
        assert!(cursor.next_row().unwrap().is_some());
        assert!(cursor.next_row().unwrap().is_none());
    }
}
