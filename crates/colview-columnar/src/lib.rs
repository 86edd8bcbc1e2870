//! In-memory columnar storage for colview.
//!
//! This crate focuses on:
//! - Typed, fixed-length columns with optional validity bitmaps.
//! - Immutable column stores that can be shared between many views.
//! - Row predicates evaluated into reusable [`FilterMask`]s without copying column data.

#![forbid(unsafe_code)]

mod bitmap;
mod column;
mod error;
mod filter;
mod store;
mod types;

pub use crate::bitmap::{BitVec, IterOnes};
pub use crate::column::{Column, ColumnData};
pub use crate::error::{ColumnarError, ColumnarResult};
pub use crate::filter::{
    apply_predicate, evaluate_predicate, CmpOp, FilterExpr, FilterMask, FilterValue,
};
pub use crate::store::{ColumnLookup, ColumnSchema, ColumnStore, ColumnStoreBuilder};
pub use crate::types::{ColumnType, Value};
