//! Error types raised while declaring a grid or decorating its rows.

/// Fatal configuration error raised while building a grid.
///
/// No partial grid is usable once one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    #[error("when using views() there should be at least one layout specified")]
    NoLayouts,
    #[error("only one layout can be set as the default layout")]
    MultipleDefaultLayouts,
    #[error("layout \"{layout}\" references column \"{value}\" which does not exist on the grid")]
    UnknownLayoutColumn { layout: String, value: String },
    #[error("column \"{value}\" is declared more than once")]
    DuplicateColumn { value: String },
    #[error("\"{alias}\" is not a valid column alias")]
    InvalidAlias { alias: String },
}

/// Icon selection failure for one row.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IconError {
    #[error("no icon rule matched for column \"{column}\" and no rule is flagged default")]
    NoMatchingRule { column: String },
}
