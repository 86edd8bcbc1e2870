#![forbid(unsafe_code)]

use crate::column::Column;
use crate::error::{ColumnarError, ColumnarResult};
use crate::types::ColumnType;
use std::borrow::Cow;
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSchema {
    pub name: String,
    pub column_type: ColumnType,
}

/// Read-only source of named, equal-length columns.
///
/// Predicates are evaluated against this trait so the same filter code runs over
/// a raw [`ColumnStore`] and over already-filtered views.
pub trait ColumnLookup {
    fn row_count(&self) -> usize;

    fn column(&self, name: &str) -> ColumnarResult<Cow<'_, Column>>;
}

/// Immutable in-memory table: unique column names mapped to equal-length columns.
///
/// Build one with [`ColumnStoreBuilder`] or [`ColumnStore::from_columns`].
#[derive(Clone, Debug, Default)]
pub struct ColumnStore {
    schema: Vec<ColumnSchema>,
    columns: Vec<Column>,
    column_index: HashMap<String, usize>,
    rows: usize,
}

impl ColumnStore {
    pub fn from_columns<S: Into<String>>(
        columns: impl IntoIterator<Item = (S, Column)>,
    ) -> ColumnarResult<Self> {
        let mut builder = ColumnStoreBuilder::new();
        for (name, column) in columns {
            builder.add_column(name, column)?;
        }
        Ok(builder.finish())
    }

    pub fn schema(&self) -> &[ColumnSchema] {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.schema.iter().map(|c| c.name.as_str())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.column_index.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.column_index.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&Column> {
        self.columns.get(self.column_index(name)?)
    }

    pub fn try_get(&self, name: &str) -> ColumnarResult<&Column> {
        self.get(name)
            .ok_or_else(|| ColumnarError::UnknownColumn(name.to_owned()))
    }
}

impl ColumnLookup for ColumnStore {
    fn row_count(&self) -> usize {
        self.rows
    }

    fn column(&self, name: &str) -> ColumnarResult<Cow<'_, Column>> {
        self.try_get(name).map(Cow::Borrowed)
    }
}

#[derive(Debug, Default)]
pub struct ColumnStoreBuilder {
    store: ColumnStore,
}

impl ColumnStoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column. The first column fixes the row count; later columns must match it.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        column: Column,
    ) -> ColumnarResult<&mut Self> {
        let name = name.into();
        let store = &mut self.store;
        if store.column_index.contains_key(&name) {
            return Err(ColumnarError::DuplicateColumn(name));
        }
        if !store.columns.is_empty() && column.len() != store.rows {
            return Err(ColumnarError::LengthMismatch {
                context: format!("column {name}"),
                expected: store.rows,
                actual: column.len(),
            });
        }

        store.rows = column.len();
        store.column_index.insert(name.clone(), store.columns.len());
        store.schema.push(ColumnSchema {
            name,
            column_type: column.column_type(),
        });
        store.columns.push(column);
        Ok(self)
    }

    pub fn finish(self) -> ColumnStore {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_rejects_duplicates_and_ragged_columns() {
        let mut builder = ColumnStoreBuilder::new();
        builder.add_column("x", Column::from_i64(vec![1, 2, 3])).unwrap();

        let err = builder
            .add_column("x", Column::from_i64(vec![4, 5, 6]))
            .unwrap_err();
        assert_eq!(err, ColumnarError::DuplicateColumn("x".to_owned()));

        let err = builder
            .add_column("y", Column::from_f64(vec![1.0]))
            .unwrap_err();
        assert!(matches!(
            err,
            ColumnarError::LengthMismatch {
                expected: 3,
                actual: 1,
                ..
            }
        ));

        let store = builder.finish();
        assert_eq!(store.row_count(), 3);
        assert_eq!(store.column_count(), 1);
    }

    #[test]
    fn lookup_by_name() {
        let store = ColumnStore::from_columns([
            ("a", Column::from_i64(vec![1, 2])),
            ("b", Column::from_strings(["p", "q"])),
        ])
        .unwrap();

        assert_eq!(store.column_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(store.schema()[1].column_type, ColumnType::String);
        assert_eq!(store.column_index("b"), Some(1));
        assert!(store.get("c").is_none());
        assert_eq!(
            store.column("c").unwrap_err(),
            ColumnarError::UnknownColumn("c".to_owned())
        );
    }
}
