//! Filter-aware lazy evaluation over colview column stores.
//!
//! A [`FilteredView`] pairs a shared [`ColumnStore`] with an optional [`FilterMask`].
//! Functions registered on the view can be bound to columns as virtual columns; when
//! one is evaluated, the function is called only with the rows the mask keeps, and the
//! result lines up one-to-one with those rows.
//!
//! ```
//! use colview_columnar::{apply_predicate, Column, ColumnStore, FilterExpr, Value};
//! use colview_eval::FilteredView;
//!
//! let store = ColumnStore::from_columns([("x", Column::from_i64((0..10).collect()))]).unwrap();
//! let mask = apply_predicate(&store, &FilterExpr::ne("x", 4)).unwrap();
//! let mut view = FilteredView::with_mask(store, mask).unwrap();
//!
//! view.register_function("square", |args: &[Column]| {
//!     Ok(args[0].map_i64(|v| v * v).ok_or("expected an int column")?)
//! })
//! .unwrap();
//! view.define_virtual_column("y", "square", ["x"]).unwrap();
//!
//! let y: Vec<Value> = view.materialize("y").unwrap();
//! assert_eq!(y.len(), 9);
//! assert_eq!(y[4], Value::Int(25));
//! ```

#![forbid(unsafe_code)]

mod error;
mod evaluator;
mod function;
mod options;
pub mod strings;
mod view;
mod virtual_column;

pub use crate::error::{BoxError, EvalError, EvalResult};
pub use crate::evaluator::Evaluator;
pub use crate::function::{elementwise, ColumnFunction, Elementwise, FunctionRegistry, FunctionResult};
pub use crate::options::EvalOptions;
pub use crate::view::FilteredView;
pub use crate::virtual_column::VirtualColumn;

pub use colview_columnar::{
    apply_predicate, Column, ColumnStore, ColumnType, FilterExpr, FilterMask, Value,
};
