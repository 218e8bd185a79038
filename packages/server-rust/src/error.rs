//! Errors surfaced by the grid pipeline and the layout service.

use gridshape_core::{BuildError, IconError};

/// Errors returned while building or serving a grid.
#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("grid configuration error: {0}")]
    Build(#[from] BuildError),
    #[error("icon resolution failed: {0}")]
    Icon(#[from] IconError),
    #[error("unknown layout: {id}")]
    UnknownLayout { id: String },
    /// Failure from a data source or store, passed through untranslated.
    #[error(transparent)]
    Execution(#[from] anyhow::Error),
}

impl GridError {
    /// Whether the error stems from how the grid was declared rather than
    /// from a collaborator failure.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Build(_) | Self::Icon(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_errors_convert_and_classify() {
        let err: GridError = BuildError::NoLayouts.into();
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "grid configuration error: when using views() there should be at least one layout specified"
        );
    }

    #[test]
    fn execution_errors_pass_through_message() {
        let err: GridError = anyhow::anyhow!("connection refused").into();
        assert!(!err.is_configuration());
        assert_eq!(err.to_string(), "connection refused");
    }
}
