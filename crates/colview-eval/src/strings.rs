//! Built-in functions over string columns.
//!
//! Each function takes exactly one string column and keeps its null slots: a
//! null input row is a null output row. Lengths and slice bounds count Unicode
//! scalar values, not bytes.
//!
//! The parameterless functions can be registered in one go with
//! [`crate::FilteredView::register_string_functions`]. Functions that need an
//! argument (a pattern, a prefix, bounds) are built here and registered under a
//! name of the caller's choosing:
//!
//! ```
//! use colview_eval::{strings, Column, ColumnStore, FilteredView, Value};
//!
//! let store = ColumnStore::from_columns([("s", Column::from_strings(["apple", "Banana"]))]).unwrap();
//! let mut view = FilteredView::new(store);
//! view.register("starts_with_a", strings::starts_with("a")).unwrap();
//! view.define_virtual_column("a", "starts_with_a", ["s"]).unwrap();
//! assert_eq!(
//!     view.materialize("a").unwrap(),
//!     vec![Value::Boolean(true), Value::Boolean(false)]
//! );
//! ```

use crate::function::{ColumnFunction, FunctionResult};
use colview_columnar::Column;
use std::sync::Arc;

/// Names used by [`crate::FilteredView::register_string_functions`].
pub const STR_UPPER: &str = "str_upper";
pub const STR_LOWER: &str = "str_lower";
pub const STR_STRIP: &str = "str_strip";
pub const STR_LEN: &str = "str_len";

#[derive(Clone, Debug, PartialEq, Eq)]
enum StringOp {
    Upper,
    Lower,
    Strip,
    Len,
    Contains(Arc<str>),
    StartsWith(Arc<str>),
    EndsWith(Arc<str>),
    Find(Arc<str>),
    Slice { start: usize, end: Option<usize> },
}

/// A string kernel usable as a [`ColumnFunction`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StringFunction {
    op: StringOp,
}

pub fn upper() -> StringFunction {
    StringFunction { op: StringOp::Upper }
}

pub fn lower() -> StringFunction {
    StringFunction { op: StringOp::Lower }
}

/// Trim leading and trailing whitespace.
pub fn strip() -> StringFunction {
    StringFunction { op: StringOp::Strip }
}

/// Character count, as an Int column.
pub fn len() -> StringFunction {
    StringFunction { op: StringOp::Len }
}

pub fn contains(pattern: impl Into<Arc<str>>) -> StringFunction {
    StringFunction {
        op: StringOp::Contains(pattern.into()),
    }
}

pub fn starts_with(prefix: impl Into<Arc<str>>) -> StringFunction {
    StringFunction {
        op: StringOp::StartsWith(prefix.into()),
    }
}

pub fn ends_with(suffix: impl Into<Arc<str>>) -> StringFunction {
    StringFunction {
        op: StringOp::EndsWith(suffix.into()),
    }
}

/// Character offset of the first occurrence of `pattern`, or -1.
pub fn find(pattern: impl Into<Arc<str>>) -> StringFunction {
    StringFunction {
        op: StringOp::Find(pattern.into()),
    }
}

/// Characters `start..end` of each value; `end: None` runs to the end. Bounds past
/// the end of a value are clamped.
pub fn slice(start: usize, end: Option<usize>) -> StringFunction {
    StringFunction {
        op: StringOp::Slice { start, end },
    }
}

impl StringFunction {
    fn name(&self) -> &'static str {
        match self.op {
            StringOp::Upper => "upper",
            StringOp::Lower => "lower",
            StringOp::Strip => "strip",
            StringOp::Len => "len",
            StringOp::Contains(_) => "contains",
            StringOp::StartsWith(_) => "starts_with",
            StringOp::EndsWith(_) => "ends_with",
            StringOp::Find(_) => "find",
            StringOp::Slice { .. } => "slice",
        }
    }
}

impl ColumnFunction for StringFunction {
    fn call(&self, args: &[Column]) -> FunctionResult {
        let [input] = args else {
            return Err(format!(
                "{} takes exactly one column, got {}",
                self.name(),
                args.len()
            )
            .into());
        };
        let values = input.as_str().ok_or_else(|| {
            format!(
                "{} expects a string column, got {}",
                self.name(),
                input.column_type()
            )
        })?;

        let output = match &self.op {
            StringOp::Upper => Column::from_strings(values.iter().map(|s| s.to_uppercase())),
            StringOp::Lower => Column::from_strings(values.iter().map(|s| s.to_lowercase())),
            StringOp::Strip => Column::from_strings(values.iter().map(|s| s.trim())),
            StringOp::Len => {
                Column::from_i64(values.iter().map(|s| s.chars().count() as i64).collect())
            }
            StringOp::Contains(pattern) => {
                Column::from_bools(values.iter().map(|s| s.contains(&**pattern)).collect())
            }
            StringOp::StartsWith(prefix) => {
                Column::from_bools(values.iter().map(|s| s.starts_with(&**prefix)).collect())
            }
            StringOp::EndsWith(suffix) => {
                Column::from_bools(values.iter().map(|s| s.ends_with(&**suffix)).collect())
            }
            StringOp::Find(pattern) => Column::from_i64(
                values
                    .iter()
                    .map(|s| match s.find(&**pattern) {
                        Some(byte) => s[..byte].chars().count() as i64,
                        None => -1,
                    })
                    .collect(),
            ),
            StringOp::Slice { start, end } => {
                Column::from_strings(values.iter().map(|s| slice_chars(s, *start, *end)))
            }
        };

        match input.validity() {
            Some(validity) => Ok(output.with_validity(validity.clone())?),
            None => Ok(output),
        }
    }
}

fn slice_chars(s: &str, start: usize, end: Option<usize>) -> String {
    let take = end.map_or(usize::MAX, |end| end.saturating_sub(start));
    s.chars().skip(start).take(take).collect()
}
