use crate::error::{BoxError, EvalError, EvalResult};
use colview_columnar::{Column, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub type FunctionResult = Result<Column, BoxError>;

/// A user function bound into a view.
///
/// `call` receives the already-filtered source columns, aligned row for row and
/// in ascending original row order. It must return exactly one value per input
/// row. Implementations never see the original row indices.
pub trait ColumnFunction: Send + Sync {
    fn call(&self, args: &[Column]) -> FunctionResult;
}

struct BlockFn<F>(F);

impl<F> ColumnFunction for BlockFn<F>
where
    F: Fn(&[Column]) -> FunctionResult + Send + Sync,
{
    fn call(&self, args: &[Column]) -> FunctionResult {
        (self.0)(args)
    }
}

/// Lifts a per-row closure into a [`ColumnFunction`].
///
/// The closure is called once per row with that row's argument values. The
/// output column takes the type of the first non-null returned value; any other
/// non-null type is an error (see [`Column::from_values_inferred`]).
pub struct Elementwise<F>(F);

pub fn elementwise<F>(f: F) -> Elementwise<F>
where
    F: Fn(&[Value]) -> Value + Send + Sync,
{
    Elementwise(f)
}

impl<F> ColumnFunction for Elementwise<F>
where
    F: Fn(&[Value]) -> Value + Send + Sync,
{
    fn call(&self, args: &[Column]) -> FunctionResult {
        let Some(first) = args.first() else {
            return Err("elementwise function needs at least one argument".into());
        };
        let rows = first.len();
        let mut row_values = Vec::with_capacity(args.len());
        let mut out = Vec::with_capacity(rows);
        for row in 0..rows {
            row_values.clear();
            row_values.extend(args.iter().map(|col| col.get(row)));
            out.push((self.0)(&row_values));
        }
        Ok(Column::from_values_inferred(out)?)
    }
}

impl<F> fmt::Debug for Elementwise<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Elementwise")
    }
}

/// Name -> function mapping owned by a single view.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn ColumnFunction>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("functions", &names)
            .finish()
    }
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `function` under `name`. Names are never silently overwritten.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: impl ColumnFunction + 'static,
    ) -> EvalResult<()> {
        self.register_arc(name, Arc::new(function))
    }

    pub fn register_fn<F>(&mut self, name: impl Into<String>, f: F) -> EvalResult<()>
    where
        F: Fn(&[Column]) -> FunctionResult + Send + Sync + 'static,
    {
        self.register(name, BlockFn(f))
    }

    pub fn register_arc(
        &mut self,
        name: impl Into<String>,
        function: Arc<dyn ColumnFunction>,
    ) -> EvalResult<()> {
        let name = name.into();
        if self.functions.contains_key(&name) {
            return Err(EvalError::DuplicateFunctionName(name));
        }
        self.functions.insert(name, function);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn ColumnFunction>> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
