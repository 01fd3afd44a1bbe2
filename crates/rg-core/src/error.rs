//! Errors raised while validating generation inputs
//!
//! Only input and programmer errors live here. A placement run that cannot
//! find room for everything is reported as a normal outcome, not an error.

use thiserror::Error;

/// Layout generation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    #[error("Graph has no nodes")]
    EmptyGraph,

    #[error("Graph is not fully connected: {unreachable} node(s) unreachable from node {start}")]
    GraphNotFullyConnected { start: u32, unreachable: usize },

    #[error("Duplicate or self-referencing id: {0}")]
    DuplicateId(String),

    #[error("Unknown id: {0}")]
    InvalidId(String),

    #[error("Invalid chain order: {0}")]
    InvalidChainOrder(String),

    #[error("Template '{template}' has no doors")]
    NoDoorsExist { template: String },

    #[error("No template group assigned to {source_name}: '{group}'")]
    NoTemplateGroupAssigned { source_name: String, group: String },

    #[error("No collectable spot found for group '{group}'")]
    CollectableSpotNotFound { group: String },

    #[error("Cells of template '{template}' are not fully connected")]
    CellsNotFullyConnected { template: String },

    #[error("Invalid quantity for template '{template}': min {min} > max {max}")]
    InvalidQuantity { template: String, min: u32, max: u32 },

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Missing pipeline input '{0}'")]
    MissingInput(String),

    #[error("Unhandled case: {0}")]
    UnhandledCase(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, LayoutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = LayoutError::GraphNotFullyConnected {
            start: 1,
            unreachable: 3,
        };
        assert!(err.to_string().contains("not fully connected"));
        assert!(err.to_string().contains("node 1"));

        let err = LayoutError::NoTemplateGroupAssigned {
            source_name: "node 4".to_string(),
            group: "Hub".to_string(),
        };
        assert!(err.to_string().contains("node 4"));
        assert!(err.to_string().contains("'Hub'"));
    }

    #[test]
    fn test_errors_compare() {
        assert_eq!(LayoutError::EmptyGraph, LayoutError::EmptyGraph);
        assert_ne!(
            LayoutError::InvalidId("1".into()),
            LayoutError::DuplicateId("1".into())
        );
    }
}
