//! Error types for the morph engine

use thiserror::Error;

/// Errors that can occur while preparing or computing a morph
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MorphError {
    /// No frame corner and drawing node are visible from each other in both drawings
    #[error("no frame corner is visible from a drawing node in both drawings")]
    NoVisibleBridge,

    /// The Steiner insertion loop kept adding nodes past its pass limit
    #[error("compatible triangulation did not converge after {passes} passes")]
    TriangulationDidNotConverge { passes: usize },

    /// The finished triangulation left faces open or triangles that disagree between drawings
    #[error(
        "compatible triangulation is degenerate: {faces} faces left untriangulated, {flipped} triangles flat or flipped"
    )]
    DegenerateTriangulation { faces: usize, flipped: usize },

    /// The least-squares normal equations are degenerate
    #[error("rigid alignment is singular (determinant {determinant:e})")]
    SingularAlignment { determinant: f64 },

    /// Gaussian elimination hit a vanishing pivot or an empty system
    #[error("linear system cannot be solved: {reason}")]
    NonConvergentLinearSystem { reason: String },

    /// Node or edge arrays that cannot form a graph pair
    #[error("invalid graph: {reason}")]
    InvalidGraph { reason: String },

    /// A configured size guard was exceeded
    #[error("too many {what}: {actual} exceeds the limit of {limit}")]
    CapacityExceeded {
        what: &'static str,
        limit: usize,
        actual: usize,
    },

    /// A boundary count that does not cover the outer ring
    #[error("boundary count {requested} does not match the {ring}-node boundary ring")]
    BoundaryMismatch { requested: usize, ring: usize },

    /// A scheduler action that needs precomputed motion data
    #[error("cannot {action}: the session is not armed")]
    NotArmed { action: &'static str },
}

impl MorphError {
    pub fn invalid_graph(reason: impl Into<String>) -> Self {
        Self::InvalidGraph {
            reason: reason.into(),
        }
    }

    pub fn linear_system(reason: impl Into<String>) -> Self {
        Self::NonConvergentLinearSystem {
            reason: reason.into(),
        }
    }

    /// Whether the caller can keep going with a different motion mode
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NoVisibleBridge
                | Self::TriangulationDidNotConverge { .. }
                | Self::DegenerateTriangulation { .. }
                | Self::SingularAlignment { .. }
                | Self::NonConvergentLinearSystem { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capacity_display() {
        let err = MorphError::CapacityExceeded {
            what: "nodes",
            limit: 200,
            actual: 201,
        };
        insta::assert_snapshot!(err.to_string(), @"too many nodes: 201 exceeds the limit of 200");
    }

    #[test]
    fn test_not_converged_display() {
        let err = MorphError::TriangulationDidNotConverge { passes: 16 };
        assert!(err.to_string().contains("16 passes"));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_degenerate_display() {
        let err = MorphError::DegenerateTriangulation { faces: 1, flipped: 0 };
        insta::assert_snapshot!(
            err.to_string(),
            @"compatible triangulation is degenerate: 1 faces left untriangulated, 0 triangles flat or flipped"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_boundary_mismatch_not_recoverable() {
        let err = MorphError::BoundaryMismatch { requested: 3, ring: 4 };
        assert_eq!(err.to_string(), "boundary count 3 does not match the 4-node boundary ring");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_invalid_graph_not_recoverable() {
        let err = MorphError::invalid_graph("self loop on node 3");
        assert_eq!(err.to_string(), "invalid graph: self loop on node 3");
        assert!(!err.is_recoverable());
    }
}
