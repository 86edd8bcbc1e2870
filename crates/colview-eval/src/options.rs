/// Evaluation settings carried by a view and inherited by views derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalOptions {
    /// Maximum nesting of virtual columns resolved for a single request.
    pub max_definition_depth: usize,
}

impl Default for EvalOptions {
    fn default() -> Self {
        Self {
            max_definition_depth: 64,
        }
    }
}
