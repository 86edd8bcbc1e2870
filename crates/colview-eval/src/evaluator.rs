//! Column resolution against a [`FilteredView`].
//!
//! The evaluator computes the view's visible row indices once and threads that same
//! index list through every column it touches: stored columns are gathered at those
//! rows, and virtual columns are computed from sources that were gathered first. A
//! user function therefore only ever sees surviving rows, in ascending original row
//! order, and must return one value per surviving row.
//!
//! Within one evaluator each column is resolved at most once, so a source shared by
//! several virtual columns is gathered (or computed) a single time. Nothing outlives
//! the evaluator.

use crate::error::{EvalError, EvalResult};
use crate::view::FilteredView;
use crate::virtual_column::VirtualColumn;
use colview_columnar::{Column, FilterMask};
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::Arc;

pub struct Evaluator<'v> {
    view: &'v FilteredView,
    rows: Option<Vec<usize>>,
    resolved: HashMap<String, Arc<Column>>,
    stack: Vec<String>,
}

impl<'v> Evaluator<'v> {
    pub fn new(view: &'v FilteredView) -> Self {
        Self {
            view,
            rows: view.mask().map(FilterMask::indices),
            resolved: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Number of rows every resolved column has.
    pub fn row_count(&self) -> usize {
        match &self.rows {
            Some(rows) => rows.len(),
            None => self.view.store().row_count(),
        }
    }

    /// Surviving original row indices, or `None` when the view is unfiltered.
    pub fn rows(&self) -> Option<&[usize]> {
        self.rows.as_deref()
    }

    /// Resolve `name`, keeping it (and everything it depended on) for later
    /// requests on this evaluator.
    pub fn evaluate(&mut self, name: &str) -> EvalResult<Column> {
        let column = self.resolve(name)?;
        Ok(Column::clone(&column))
    }

    /// Resolve `name` and hand back the result without copying it out of the
    /// evaluator's memo.
    pub fn into_column(mut self, name: &str) -> EvalResult<Column> {
        let column = self.resolve(name)?;
        self.resolved.clear();
        Ok(Arc::try_unwrap(column).unwrap_or_else(|shared| Column::clone(&shared)))
    }

    fn resolve(&mut self, name: &str) -> EvalResult<Arc<Column>> {
        if let Some(hit) = self.resolved.get(name) {
            return Ok(Arc::clone(hit));
        }

        let view = self.view;
        let column = if let Some(def) = view.virtual_column(name) {
            self.compute_virtual(def)?
        } else if let Some(stored) = view.store().get(name) {
            trace!("gathering stored column {name}");
            match &self.rows {
                Some(rows) => stored.take(rows),
                None => stored.clone(),
            }
        } else {
            return Err(EvalError::UnknownColumn(name.to_owned()));
        };

        let column = Arc::new(column);
        self.resolved.insert(name.to_owned(), Arc::clone(&column));
        Ok(column)
    }

    fn compute_virtual(&mut self, def: &VirtualColumn) -> EvalResult<Column> {
        if let Some(pos) = self.stack.iter().position(|n| *n == def.name) {
            let mut path = self.stack[pos..].to_vec();
            path.push(def.name.clone());
            return Err(EvalError::CyclicColumnDefinition { path });
        }

        let limit = self.view.options().max_definition_depth;
        if self.stack.len() >= limit {
            return Err(EvalError::DefinitionTooDeep {
                column: def.name.clone(),
                limit,
            });
        }

        let function = self
            .view
            .functions()
            .get(&def.function)
            .cloned()
            .ok_or_else(|| EvalError::UnknownFunction(def.function.clone()))?;

        trace!("resolving sources of {}: {:?}", def.name, def.sources);
        self.stack.push(def.name.clone());
        let args: EvalResult<Vec<Column>> = def
            .sources
            .iter()
            .map(|source| self.resolve(source).map(|c| Column::clone(&c)))
            .collect();
        self.stack.pop();
        let args = args?;

        let expected = self.row_count();
        debug!(
            "calling function {} for column {} over {expected} rows",
            def.function, def.name
        );
        let output = function
            .call(&args)
            .map_err(|source| EvalError::Function {
                function: def.function.clone(),
                column: def.name.clone(),
                source,
            })?;

        if output.len() != expected {
            return Err(EvalError::ArityMismatch {
                column: def.name.clone(),
                function: def.function.clone(),
                expected,
                actual: output.len(),
            });
        }
        Ok(output)
    }
}
