#![forbid(unsafe_code)]

//! Row predicates and the masks they produce.
//!
//! A [`FilterExpr`] is evaluated once against a [`ColumnLookup`] and yields a
//! [`FilterMask`]: one bit per row, `true` meaning the row stays visible.
//!
//! Comparison semantics:
//! - null cells never satisfy a comparison, for `Ne` as well as `Eq`
//! - Int and Float compare numerically, without rounding the integer; equality
//!   treats `-0.0 == 0.0` and groups all NaNs together, while range comparisons
//!   against NaN are always false
//! - strings compare by byte order (case sensitive)
//! - booleans only support `Eq` / `Ne`

use crate::bitmap::BitVec;
use crate::column::{Column, ColumnData};
use crate::error::{ColumnarError, ColumnarResult};
use crate::store::ColumnLookup;
use crate::types::ColumnType;
use ordered_float::OrderedFloat;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

impl CmpOp {
    fn matches(self, ord: Ordering) -> bool {
        match self {
            CmpOp::Eq => ord == Ordering::Equal,
            CmpOp::Ne => ord != Ordering::Equal,
            CmpOp::Lt => ord == Ordering::Less,
            CmpOp::Lte => ord != Ordering::Greater,
            CmpOp::Gt => ord == Ordering::Greater,
            CmpOp::Gte => ord != Ordering::Less,
        }
    }

    fn is_equality(self) -> bool {
        matches!(self, CmpOp::Eq | CmpOp::Ne)
    }
}

/// Scalar literal on the right-hand side of a comparison.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Float(f64),
    Boolean(bool),
    String(Arc<str>),
}

impl FilterValue {
    fn type_name(&self) -> &'static str {
        match self {
            FilterValue::Int(_) => "int",
            FilterValue::Float(_) => "float",
            FilterValue::Boolean(_) => "boolean",
            FilterValue::String(_) => "string",
        }
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        FilterValue::Int(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        FilterValue::Int(v.into())
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Float(v)
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        FilterValue::Boolean(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::String(Arc::from(v))
    }
}

/// Boolean row predicate over named columns.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterExpr {
    Cmp {
        col: String,
        op: CmpOp,
        value: FilterValue,
    },
    /// A boolean column used directly as the predicate.
    Column {
        col: String,
    },
    IsNull {
        col: String,
    },
    IsNotNull {
        col: String,
    },
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
    Not(Box<FilterExpr>),
}

impl FilterExpr {
    pub fn cmp(col: impl Into<String>, op: CmpOp, value: impl Into<FilterValue>) -> Self {
        FilterExpr::Cmp {
            col: col.into(),
            op,
            value: value.into(),
        }
    }

    pub fn eq(col: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::cmp(col, CmpOp::Eq, value)
    }

    pub fn ne(col: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::cmp(col, CmpOp::Ne, value)
    }

    pub fn lt(col: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::cmp(col, CmpOp::Lt, value)
    }

    pub fn lte(col: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::cmp(col, CmpOp::Lte, value)
    }

    pub fn gt(col: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::cmp(col, CmpOp::Gt, value)
    }

    pub fn gte(col: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::cmp(col, CmpOp::Gte, value)
    }

    pub fn column(col: impl Into<String>) -> Self {
        FilterExpr::Column { col: col.into() }
    }

    pub fn is_null(col: impl Into<String>) -> Self {
        FilterExpr::IsNull { col: col.into() }
    }

    pub fn is_not_null(col: impl Into<String>) -> Self {
        FilterExpr::IsNotNull { col: col.into() }
    }

    pub fn and(self, other: FilterExpr) -> Self {
        FilterExpr::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: FilterExpr) -> Self {
        FilterExpr::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        FilterExpr::Not(Box::new(self))
    }

    /// Names of every column the predicate reads, in first-use order.
    pub fn referenced_columns(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_columns(&mut out);
        out
    }

    fn collect_columns<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            FilterExpr::Cmp { col, .. }
            | FilterExpr::Column { col }
            | FilterExpr::IsNull { col }
            | FilterExpr::IsNotNull { col } => {
                if !out.contains(&col.as_str()) {
                    out.push(col.as_str());
                }
            }
            FilterExpr::And(a, b) | FilterExpr::Or(a, b) => {
                a.collect_columns(out);
                b.collect_columns(out);
            }
            FilterExpr::Not(inner) => inner.collect_columns(out),
        }
    }
}

/// Immutable row selection over a store: one bit per row.
///
/// Cloning is cheap; the bits are shared.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterMask {
    bits: Arc<BitVec>,
}

impl FilterMask {
    pub fn from_bits(bits: BitVec) -> Self {
        Self {
            bits: Arc::new(bits),
        }
    }

    pub fn from_bools(bits: impl IntoIterator<Item = bool>) -> Self {
        Self::from_bits(BitVec::from_bools(bits))
    }

    /// A mask over `rows` rows with every row selected.
    pub fn all(rows: usize) -> Self {
        Self::from_bits(BitVec::with_len_all_true(rows))
    }

    /// Total number of rows covered (selected or not).
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    /// Number of selected rows.
    pub fn count(&self) -> usize {
        self.bits.count_ones()
    }

    pub fn is_selected(&self, row: usize) -> bool {
        row < self.len() && self.bits.get(row)
    }

    pub fn bits(&self) -> &BitVec {
        &self.bits
    }

    /// Selected row indices in ascending order.
    pub fn iter_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    pub fn indices(&self) -> Vec<usize> {
        self.iter_indices().collect()
    }

    pub fn and(&self, other: &FilterMask) -> ColumnarResult<FilterMask> {
        self.combine(other, BitVec::and_inplace)
    }

    pub fn or(&self, other: &FilterMask) -> ColumnarResult<FilterMask> {
        self.combine(other, BitVec::or_inplace)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(&self) -> FilterMask {
        let mut bits = (*self.bits).clone();
        bits.not_inplace();
        Self::from_bits(bits)
    }

    fn combine(
        &self,
        other: &FilterMask,
        op: fn(&mut BitVec, &BitVec),
    ) -> ColumnarResult<FilterMask> {
        if self.len() != other.len() {
            return Err(ColumnarError::LengthMismatch {
                context: "filter mask".to_owned(),
                expected: self.len(),
                actual: other.len(),
            });
        }
        let mut bits = (*self.bits).clone();
        op(&mut bits, &other.bits);
        Ok(Self::from_bits(bits))
    }
}

/// Evaluate `predicate` over every row of `source`.
pub fn apply_predicate(
    source: &impl ColumnLookup,
    predicate: &FilterExpr,
) -> ColumnarResult<FilterMask> {
    evaluate_predicate(source, predicate).map(FilterMask::from_bits)
}

/// Evaluate `predicate` into a raw bit vector of `source.row_count()` bits.
pub fn evaluate_predicate(
    source: &impl ColumnLookup,
    predicate: &FilterExpr,
) -> ColumnarResult<BitVec> {
    match predicate {
        FilterExpr::Cmp { col, op, value } => {
            let column = source.column(col)?;
            compare_column(col, &column, *op, value)
        }
        FilterExpr::Column { col } => {
            let column = source.column(col)?;
            let Some(values) = column.as_bool() else {
                return Err(ColumnarError::type_mismatch(
                    format!("predicate column {col}"),
                    ColumnType::Boolean,
                    column.column_type(),
                ));
            };
            Ok(values
                .iter()
                .enumerate()
                .map(|(row, &v)| v && column.is_valid(row))
                .collect())
        }
        FilterExpr::IsNull { col } => {
            let column = source.column(col)?;
            Ok((0..column.len()).map(|row| !column.is_valid(row)).collect())
        }
        FilterExpr::IsNotNull { col } => {
            let column = source.column(col)?;
            Ok((0..column.len()).map(|row| column.is_valid(row)).collect())
        }
        FilterExpr::And(a, b) => {
            let mut bits = evaluate_predicate(source, a)?;
            bits.and_inplace(&evaluate_predicate(source, b)?);
            Ok(bits)
        }
        FilterExpr::Or(a, b) => {
            let mut bits = evaluate_predicate(source, a)?;
            bits.or_inplace(&evaluate_predicate(source, b)?);
            Ok(bits)
        }
        FilterExpr::Not(inner) => {
            let mut bits = evaluate_predicate(source, inner)?;
            bits.not_inplace();
            Ok(bits)
        }
    }
}

fn compare_column(
    col: &str,
    column: &Column,
    op: CmpOp,
    value: &FilterValue,
) -> ColumnarResult<BitVec> {
    let mismatch = || ColumnarError::TypeMismatch {
        context: format!("comparison on column {col}"),
        expected: column.column_type().to_string(),
        actual: value.type_name().to_owned(),
    };

    let matches: BitVec = match (column.data(), value) {
        (ColumnData::Int(values), FilterValue::Int(rhs)) => {
            values.iter().map(|v| op.matches(v.cmp(rhs))).collect()
        }
        (ColumnData::Int(values), FilterValue::Float(rhs)) => values
            .iter()
            .map(|&v| matches_ordering(op, cmp_int_float(v, *rhs)))
            .collect(),
        (ColumnData::Float(values), FilterValue::Int(rhs)) => values
            .iter()
            .map(|&v| matches_ordering(op, cmp_int_float(*rhs, v).map(Ordering::reverse)))
            .collect(),
        (ColumnData::Float(values), FilterValue::Float(rhs)) => {
            values.iter().map(|&v| compare_f64(v, op, *rhs)).collect()
        }
        (ColumnData::Boolean(values), FilterValue::Boolean(rhs)) => {
            if !op.is_equality() {
                return Err(ColumnarError::TypeMismatch {
                    context: format!("ordering comparison {op:?} on column {col}"),
                    expected: "int, float or string".to_owned(),
                    actual: ColumnType::Boolean.to_string(),
                });
            }
            values.iter().map(|v| op.matches(v.cmp(rhs))).collect()
        }
        (ColumnData::String(values), FilterValue::String(rhs)) => values
            .iter()
            .map(|v| op.matches(v.as_bytes().cmp(rhs.as_bytes())))
            .collect(),
        _ => return Err(mismatch()),
    };

    match column.validity() {
        Some(validity) => {
            let mut matches = matches;
            matches.and_inplace(validity);
            Ok(matches)
        }
        None => Ok(matches),
    }
}

/// Exact ordering of an integer against a float. `None` when `rhs` is NaN.
fn cmp_int_float(lhs: i64, rhs: f64) -> Option<Ordering> {
    // 2^63; every float at or above it exceeds i64::MAX.
    const LIMIT: f64 = 9_223_372_036_854_775_808.0;
    if rhs.is_nan() {
        return None;
    }
    if rhs >= LIMIT {
        return Some(Ordering::Less);
    }
    if rhs < -LIMIT {
        return Some(Ordering::Greater);
    }
    let whole = rhs.trunc();
    let ord = lhs
        .cmp(&(whole as i64))
        .then_with(|| 0.0_f64.partial_cmp(&(rhs - whole)).unwrap_or(Ordering::Equal));
    Some(ord)
}

/// Unordered pairs (NaN) only satisfy `Ne`.
fn matches_ordering(op: CmpOp, ord: Option<Ordering>) -> bool {
    match ord {
        Some(ord) => op.matches(ord),
        None => op == CmpOp::Ne,
    }
}

fn compare_f64(lhs: f64, op: CmpOp, rhs: f64) -> bool {
    if op.is_equality() {
        let equal = OrderedFloat(lhs) == OrderedFloat(rhs);
        return equal == (op == CmpOp::Eq);
    }
    lhs.partial_cmp(&rhs).is_some_and(|ord| op.matches(ord))
}
