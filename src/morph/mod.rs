//! Intersection-free morphing between two drawings of the same graph
//!
//! The pipeline: [`stitch`] wraps both drawings in a frame, [`compatible`]
//! refines the faces until both drawings share one triangulation, and the
//! [`scheduler`] drives one of four motion models ([`MotionMode`]) frame by
//! frame.

pub mod compatible;
pub mod config;
pub mod convex;
pub mod error;
pub mod faces;
pub mod geometry;
pub mod rigid;
pub mod scheduler;
pub mod stitch;
pub mod triangulate;
pub mod types;

pub use compatible::{CompatibleTriangulation, PassReport};
pub use config::{ConfigError, MorphConfig};
pub use convex::ConvexModel;
pub use error::MorphError;
pub use rigid::RigidModel;
pub use scheduler::{Direction, FrameSnapshot, FrameState, MorphSession, PlayState};
pub use types::{
    BoundaryRing, BoundingBox, Edge, EdgeKind, Graph, GraphPair, MotionMode, Node, NodeOrigin,
    Point, Rgb, Triangle,
};
