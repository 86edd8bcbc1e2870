#![forbid(unsafe_code)]

use crate::bitmap::BitVec;
use crate::error::{ColumnarError, ColumnarResult};
use crate::types::{ColumnType, Value};
use std::sync::Arc;

/// Dense storage for one column. Null slots hold a placeholder value and are
/// marked invalid in the owning [`Column`]'s validity bitmap.
#[derive(Clone, Debug)]
pub enum ColumnData {
    Int(Vec<i64>),
    Float(Vec<f64>),
    Boolean(Vec<bool>),
    String(Vec<Arc<str>>),
}

impl ColumnData {
    fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Boolean(v) => v.len(),
            ColumnData::String(v) => v.len(),
        }
    }

    fn column_type(&self) -> ColumnType {
        match self {
            ColumnData::Int(_) => ColumnType::Int,
            ColumnData::Float(_) => ColumnType::Float,
            ColumnData::Boolean(_) => ColumnType::Boolean,
            ColumnData::String(_) => ColumnType::String,
        }
    }

    fn empty(column_type: ColumnType, capacity: usize) -> Self {
        match column_type {
            ColumnType::Int => ColumnData::Int(Vec::with_capacity(capacity)),
            ColumnType::Float => ColumnData::Float(Vec::with_capacity(capacity)),
            ColumnType::Boolean => ColumnData::Boolean(Vec::with_capacity(capacity)),
            ColumnType::String => ColumnData::String(Vec::with_capacity(capacity)),
        }
    }

    fn gather(&self, rows: &[usize]) -> Self {
        match self {
            ColumnData::Int(v) => ColumnData::Int(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Float(v) => ColumnData::Float(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::Boolean(v) => ColumnData::Boolean(rows.iter().map(|&r| v[r]).collect()),
            ColumnData::String(v) => {
                ColumnData::String(rows.iter().map(|&r| v[r].clone()).collect())
            }
        }
    }
}

/// A typed, fixed-length column with optional validity.
///
/// `validity` is `None` when every slot holds a value.
#[derive(Clone, Debug)]
pub struct Column {
    data: ColumnData,
    validity: Option<BitVec>,
}

impl Column {
    pub fn from_i64(values: Vec<i64>) -> Self {
        Self::from_data(ColumnData::Int(values))
    }

    pub fn from_f64(values: Vec<f64>) -> Self {
        Self::from_data(ColumnData::Float(values))
    }

    pub fn from_bools(values: Vec<bool>) -> Self {
        Self::from_data(ColumnData::Boolean(values))
    }

    pub fn from_strings<S: Into<Arc<str>>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::from_data(ColumnData::String(
            values.into_iter().map(Into::into).collect(),
        ))
    }

    pub fn from_data(data: ColumnData) -> Self {
        Self {
            data,
            validity: None,
        }
    }

    /// Attach a validity bitmap (`true` = value present).
    pub fn with_validity(mut self, validity: BitVec) -> ColumnarResult<Self> {
        if validity.len() != self.len() {
            return Err(ColumnarError::LengthMismatch {
                context: "column validity".to_owned(),
                expected: self.len(),
                actual: validity.len(),
            });
        }
        self.validity = (!validity.all_true()).then_some(validity);
        Ok(self)
    }

    /// Build a column of `column_type` from scalar values.
    ///
    /// `Value::Null` produces an invalid slot. Int values are accepted by Float
    /// columns; any other type disagreement is an error.
    pub fn from_values(
        column_type: ColumnType,
        values: impl IntoIterator<Item = Value>,
    ) -> ColumnarResult<Self> {
        let values = values.into_iter();
        let mut data = ColumnData::empty(column_type, values.size_hint().0);
        let mut validity = BitVec::new();

        for value in values {
            let valid = !value.is_null();
            match (&mut data, value) {
                (ColumnData::Int(out), Value::Int(v)) => out.push(v),
                (ColumnData::Int(out), Value::Null) => out.push(0),
                (ColumnData::Float(out), Value::Float(v)) => out.push(v),
                (ColumnData::Float(out), Value::Int(v)) => out.push(v as f64),
                (ColumnData::Float(out), Value::Null) => out.push(0.0),
                (ColumnData::Boolean(out), Value::Boolean(v)) => out.push(v),
                (ColumnData::Boolean(out), Value::Null) => out.push(false),
                (ColumnData::String(out), Value::String(v)) => out.push(v),
                (ColumnData::String(out), Value::Null) => out.push(Arc::from("")),
                (_, other) => {
                    return Err(ColumnarError::TypeMismatch {
                        context: "column values".to_owned(),
                        expected: column_type.to_string(),
                        actual: other
                            .column_type()
                            .map(|t| t.to_string())
                            .unwrap_or_else(|| "null".to_owned()),
                    });
                }
            }
            validity.push(valid);
        }

        Self::from_data(data).with_validity(validity)
    }

    /// Build a column whose type is inferred from the values.
    ///
    /// The first non-null value decides the type and every later non-null value
    /// must have exactly that type. An all-null (or empty) input yields a Float
    /// column.
    pub fn from_values_inferred(values: Vec<Value>) -> ColumnarResult<Self> {
        let mut inferred: Option<ColumnType> = None;
        for (row, value) in values.iter().enumerate() {
            let Some(actual) = value.column_type() else {
                continue;
            };
            match inferred {
                None => inferred = Some(actual),
                Some(expected) if expected != actual => {
                    return Err(ColumnarError::TypeMismatch {
                        context: format!("inferred column value at row {row}"),
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }
                Some(_) => {}
            }
        }
        Self::from_values(inferred.unwrap_or(ColumnType::Float), values)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn column_type(&self) -> ColumnType {
        self.data.column_type()
    }

    pub fn data(&self) -> &ColumnData {
        &self.data
    }

    pub fn validity(&self) -> Option<&BitVec> {
        self.validity.as_ref()
    }

    pub fn null_count(&self) -> usize {
        self.validity
            .as_ref()
            .map(|v| v.len() - v.count_ones())
            .unwrap_or(0)
    }

    pub fn is_valid(&self, row: usize) -> bool {
        self.validity.as_ref().map_or(true, |v| v.get(row))
    }

    /// Value at `row`, or `Value::Null` for invalid or out-of-range rows.
    pub fn get(&self, row: usize) -> Value {
        if row >= self.len() || !self.is_valid(row) {
            return Value::Null;
        }
        match &self.data {
            ColumnData::Int(v) => Value::Int(v[row]),
            ColumnData::Float(v) => Value::Float(v[row]),
            ColumnData::Boolean(v) => Value::Boolean(v[row]),
            ColumnData::String(v) => Value::String(v[row].clone()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = Value> + '_ {
        (0..self.len()).map(move |row| self.get(row))
    }

    pub fn to_values(&self) -> Vec<Value> {
        self.iter().collect()
    }

    /// Gather the given rows (in the given order) into a new column.
    ///
    /// Panics if a row index is out of bounds.
    pub fn take(&self, rows: &[usize]) -> Column {
        let validity = self
            .validity
            .as_ref()
            .map(|v| rows.iter().map(|&r| v.get(r)).collect::<BitVec>())
            .filter(|v| !v.all_true());
        Column {
            data: self.data.gather(rows),
            validity,
        }
    }

    pub fn as_i64(&self) -> Option<&[i64]> {
        match &self.data {
            ColumnData::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<&[f64]> {
        match &self.data {
            ColumnData::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<&[bool]> {
        match &self.data {
            ColumnData::Boolean(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&[Arc<str>]> {
        match &self.data {
            ColumnData::String(v) => Some(v),
            _ => None,
        }
    }

    /// Apply `f` to every slot of an Int column, keeping validity.
    pub fn map_i64(&self, f: impl Fn(i64) -> i64) -> Option<Column> {
        let values = self.as_i64()?;
        Some(Column {
            data: ColumnData::Int(values.iter().map(|&v| f(v)).collect()),
            validity: self.validity.clone(),
        })
    }

    /// Apply `f` to every slot of a numeric column, producing a Float column and
    /// keeping validity.
    pub fn map_f64(&self, f: impl Fn(f64) -> f64) -> Option<Column> {
        let data = match &self.data {
            ColumnData::Float(v) => v.iter().map(|&x| f(x)).collect(),
            ColumnData::Int(v) => v.iter().map(|&x| f(x as f64)).collect(),
            _ => return None,
        };
        Some(Column {
            data: ColumnData::Float(data),
            validity: self.validity.clone(),
        })
    }
}

impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        self.column_type() == other.column_type()
            && self.len() == other.len()
            && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}
