use crate::error::{EvalError, EvalResult};
use crate::evaluator::Evaluator;
use crate::function::{ColumnFunction, FunctionRegistry, FunctionResult};
use crate::options::EvalOptions;
use crate::strings;
use crate::virtual_column::VirtualColumn;
use colview_columnar::{
    evaluate_predicate, BitVec, Column, ColumnLookup, ColumnStore, ColumnStoreBuilder,
    ColumnarError, ColumnarResult, FilterExpr, FilterMask, Value,
};
use log::debug;
use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

/// A shared [`ColumnStore`] seen through an optional row filter, plus the functions
/// and virtual columns declared on this view.
///
/// Views never modify the store. Functions and virtual columns belong to the view
/// they were declared on: declaring on one view does not affect any other view over
/// the same store, including views derived with [`FilteredView::filter`].
#[derive(Clone, Debug)]
pub struct FilteredView {
    store: Arc<ColumnStore>,
    mask: Option<FilterMask>,
    functions: FunctionRegistry,
    virtual_columns: Vec<VirtualColumn>,
    virtual_index: HashMap<String, usize>,
    options: EvalOptions,
}

impl FilteredView {
    /// An unfiltered view: every row of `store` is visible.
    pub fn new(store: impl Into<Arc<ColumnStore>>) -> Self {
        Self {
            store: store.into(),
            mask: None,
            functions: FunctionRegistry::new(),
            virtual_columns: Vec::new(),
            virtual_index: HashMap::new(),
            options: EvalOptions::default(),
        }
    }

    /// A view showing only the rows selected by `mask`.
    pub fn with_mask(store: impl Into<Arc<ColumnStore>>, mask: FilterMask) -> EvalResult<Self> {
        let mut view = Self::new(store);
        let rows = view.store.row_count();
        if mask.len() != rows {
            return Err(EvalError::LengthMismatch {
                context: "filter mask".to_owned(),
                expected: rows,
                actual: mask.len(),
            });
        }
        debug!("filtered view: {} of {rows} rows visible", mask.count());
        view.mask = Some(mask);
        Ok(view)
    }

    pub fn with_options(mut self, options: EvalOptions) -> Self {
        self.options = options;
        self
    }

    pub fn store(&self) -> &Arc<ColumnStore> {
        &self.store
    }

    pub fn mask(&self) -> Option<&FilterMask> {
        self.mask.as_ref()
    }

    pub fn is_filtered(&self) -> bool {
        self.mask.is_some()
    }

    pub fn options(&self) -> &EvalOptions {
        &self.options
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    pub fn visible_row_count(&self) -> usize {
        match &self.mask {
            Some(mask) => mask.count(),
            None => self.store.row_count(),
        }
    }

    /// Original row indices of the visible rows, ascending.
    pub fn row_indices(&self) -> Vec<usize> {
        match &self.mask {
            Some(mask) => mask.indices(),
            None => (0..self.store.row_count()).collect(),
        }
    }

    /// Register a block function: it receives the filtered source columns and
    /// returns one output column.
    pub fn register_function<F>(&mut self, name: impl Into<String>, f: F) -> EvalResult<()>
    where
        F: Fn(&[Column]) -> FunctionResult + Send + Sync + 'static,
    {
        self.functions.register_fn(name, f)
    }

    /// Register any [`ColumnFunction`] implementation, e.g. [`crate::elementwise`].
    pub fn register(
        &mut self,
        name: impl Into<String>,
        function: impl ColumnFunction + 'static,
    ) -> EvalResult<()> {
        self.functions.register(name, function)
    }

    /// Register the parameterless string kernels under their `str_*` names
    /// ([`strings::STR_UPPER`], [`strings::STR_LOWER`], [`strings::STR_STRIP`],
    /// [`strings::STR_LEN`]).
    pub fn register_string_functions(&mut self) -> EvalResult<()> {
        self.register(strings::STR_UPPER, strings::upper())?;
        self.register(strings::STR_LOWER, strings::lower())?;
        self.register(strings::STR_STRIP, strings::strip())?;
        self.register(strings::STR_LEN, strings::len())
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains(name)
    }

    /// Declare `output_name = function_name(source_column_names...)`.
    ///
    /// Nothing is evaluated here. Every source must already be a stored column or a
    /// virtual column of this view, and `output_name` must be unused.
    pub fn define_virtual_column<S: AsRef<str>>(
        &mut self,
        output_name: impl Into<String>,
        function_name: impl Into<String>,
        source_column_names: impl IntoIterator<Item = S>,
    ) -> EvalResult<()> {
        let output_name = output_name.into();
        let function_name = function_name.into();

        if self.contains_column(&output_name) {
            return Err(EvalError::DuplicateColumn(output_name));
        }
        if !self.functions.contains(&function_name) {
            return Err(EvalError::UnknownFunction(function_name));
        }

        let mut sources = Vec::new();
        for source in source_column_names {
            let source = source.as_ref();
            if !self.contains_column(source) {
                return Err(EvalError::UnknownColumn(source.to_owned()));
            }
            sources.push(source.to_owned());
        }

        debug!("declared virtual column {output_name} = {function_name}({sources:?})");
        self.insert_virtual_column(VirtualColumn {
            name: output_name,
            function: function_name,
            sources,
        });
        Ok(())
    }

    fn insert_virtual_column(&mut self, column: VirtualColumn) {
        self.virtual_index
            .insert(column.name.clone(), self.virtual_columns.len());
        self.virtual_columns.push(column);
    }

    pub fn virtual_column(&self, name: &str) -> Option<&VirtualColumn> {
        self.virtual_columns.get(*self.virtual_index.get(name)?)
    }

    pub fn virtual_columns(&self) -> &[VirtualColumn] {
        &self.virtual_columns
    }

    pub fn contains_column(&self, name: &str) -> bool {
        self.store.contains(name) || self.virtual_index.contains_key(name)
    }

    /// Stored columns in store order, then virtual columns in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.store
            .column_names()
            .chain(self.virtual_columns.iter().map(|c| c.name.as_str()))
            .collect()
    }

    /// An evaluator that shares resolved columns across several requests.
    pub fn evaluator(&self) -> Evaluator<'_> {
        Evaluator::new(self)
    }

    /// Compute `column_name` over the visible rows.
    ///
    /// The result has [`Self::visible_row_count`] rows in ascending original row order.
    pub fn evaluate(&self, column_name: &str) -> EvalResult<Column> {
        self.evaluator().into_column(column_name)
    }

    pub fn materialize(&self, column_name: &str) -> EvalResult<Vec<Value>> {
        Ok(self.evaluate(column_name)?.to_values())
    }

    /// Derive a view that additionally requires `predicate`.
    ///
    /// The predicate may read virtual columns. It is evaluated over the visible rows
    /// only, so functions still never see rows this view hides. The derived view
    /// starts with copies of this view's functions and virtual columns.
    ///
    /// Every column the predicate names must exist on this view; that is checked
    /// before any function runs.
    pub fn filter(&self, predicate: &FilterExpr) -> EvalResult<FilteredView> {
        if let Some(missing) = predicate
            .referenced_columns()
            .into_iter()
            .find(|name| !self.contains_column(name))
        {
            return Err(EvalError::UnknownColumn(missing.to_owned()));
        }

        let lookup = VisibleColumns {
            evaluator: RefCell::new(self.evaluator()),
            error: RefCell::new(None),
        };
        let local = match evaluate_predicate(&lookup, predicate) {
            Ok(bits) => bits,
            Err(err) => return Err(lookup.error.into_inner().unwrap_or_else(|| err.into())),
        };

        let evaluator = lookup.evaluator.into_inner();
        let bits = match evaluator.rows() {
            None => local,
            Some(rows) => {
                let mut bits = BitVec::with_len_all_false(self.store.row_count());
                for visible in local.iter_ones() {
                    bits.set(rows[visible], true);
                }
                bits
            }
        };

        let mask = FilterMask::from_bits(bits);
        debug!(
            "derived view: {} of {} rows visible",
            mask.count(),
            self.store.row_count()
        );
        Ok(FilteredView {
            mask: Some(mask),
            ..self.clone()
        })
    }

    /// Copy every stored and virtual column, restricted to the visible rows, into a
    /// new store.
    pub fn extract(&self) -> EvalResult<ColumnStore> {
        let mut evaluator = self.evaluator();
        let mut builder = ColumnStoreBuilder::new();
        for name in self.column_names() {
            builder.add_column(name, evaluator.evaluate(name)?)?;
        }
        Ok(builder.finish())
    }
}

/// Adapts a view's evaluator to [`ColumnLookup`] so predicates can read virtual
/// columns. Errors that have no columnar equivalent are parked in `error`.
struct VisibleColumns<'v> {
    evaluator: RefCell<Evaluator<'v>>,
    error: RefCell<Option<EvalError>>,
}

impl ColumnLookup for VisibleColumns<'_> {
    fn row_count(&self) -> usize {
        self.evaluator.borrow().row_count()
    }

    fn column(&self, name: &str) -> ColumnarResult<Cow<'_, Column>> {
        let result = self.evaluator.borrow_mut().evaluate(name);
        result.map(Cow::Owned).map_err(|err| {
            let placeholder = ColumnarError::UnknownColumn(name.to_owned());
            self.error.borrow_mut().get_or_insert(err);
            placeholder
        })
    }
}
