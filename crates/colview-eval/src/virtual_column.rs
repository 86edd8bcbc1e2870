/// A column computed on demand as `function(sources...)`.
///
/// Holds no values; every evaluation recomputes it from the view's visible rows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VirtualColumn {
    pub name: String,
    pub function: String,
    pub sources: Vec<String>,
}

impl VirtualColumn {
    pub fn new(
        name: impl Into<String>,
        function: impl Into<String>,
        sources: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            name: name.into(),
            function: function.into(),
            sources: sources.into_iter().map(Into::into).collect(),
        }
    }
}
