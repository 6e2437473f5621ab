//! Wrap both drawings in a rectangular frame joined to the drawing by one bridge edge

use log::{debug, warn};

use super::error::MorphError;
use super::geometry::{on_segment, segments_cross};
use super::types::{BoundaryRing, Edge, GraphPair, NodeOrigin, Point};

/// A graph pair with its frame, bridge and new outer ring
#[derive(Debug, Clone)]
pub struct Stitched {
    pub pair: GraphPair,
    pub ring: BoundaryRing,
    pub bridge: Edge,
}

/// Quarter-turn offset between the frame corners of the two drawings
pub fn corner_offset(rotation: f64) -> usize {
    let degrees = rotation.to_degrees().rem_euclid(360.0);
    (degrees * 4.0 / 360.0).floor() as usize % 4
}

const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Whether the segment from `from` to node `node` crosses no edge of the drawing
///
/// A bridge that runs through another node is not visible either.
fn visible(from: Point, node: usize, positions: &[Point], edges: &[Edge]) -> bool {
    let target = positions[node];
    let passes_node = positions
        .iter()
        .enumerate()
        .any(|(i, &p)| i != node && on_segment(p, from, target, COLLINEAR_TOLERANCE));
    if passes_node {
        return false;
    }
    edges.iter().filter(|e| !e.touches(node)).all(|e| {
        !segments_cross(from, positions[node], positions[e.from], positions[e.to])
    })
}

/// Add the frame and the shortest bridge that is visible in both drawings
///
/// `rotation` is the rigid rotation between the drawings; it fixes which frame
/// corner of the final drawing receives the bridge.
pub fn stitch(pair: &GraphPair, rotation: f64, margin: f64) -> Result<Stitched, MorphError> {
    let n = pair.node_count();
    let (Some(bounds0), Some(bounds1)) = (pair.initial().bounding_box(), pair.target().bounding_box())
    else {
        return Err(MorphError::invalid_graph("cannot frame an empty drawing"));
    };
    let rect0 = bounds0.expand(margin).corners();
    let rect1 = bounds1.expand(margin).corners();
    let offset = corner_offset(rotation);

    let positions0 = pair.initial().positions();
    let positions1 = pair.target().positions();
    let edges = pair.edges();

    let mut best: Option<(f64, usize, usize)> = None;
    for (corner, &c0) in rect0.iter().enumerate() {
        for node in 0..n {
            if !visible(c0, node, &positions0, edges)
                || !visible(rect1[offset], node, &positions1, edges)
            {
                continue;
            }
            let length = c0.distance(positions0[node]) + rect1[offset].distance(positions1[node]);
            if best.map_or(true, |(shortest, _, _)| length < shortest) {
                best = Some((length, corner, node));
            }
        }
    }

    let Some((length, corner, node)) = best else {
        warn!("no frame corner sees the drawing in both graphs, giving up on triangulation");
        return Err(MorphError::NoVisibleBridge);
    };
    debug!(
        "bridge from frame corner {} to node {} (length {:.2}, corner offset {})",
        corner, node, length, offset
    );

    let frame: Vec<(Point, Point)> = (0..4)
        .map(|k| (rect0[k], rect1[(k + 4 - corner + offset) % 4]))
        .collect();
    let bridge = Edge::steiner(n + corner, node);
    let mut new_edges: Vec<Edge> = (0..4).map(|k| Edge::steiner(n + k, n + (k + 1) % 4)).collect();
    new_edges.push(bridge);

    Ok(Stitched {
        pair: pair.with_insertions(&frame, NodeOrigin::Frame, &new_edges),
        ring: BoundaryRing((n..n + 4).collect()),
        bridge,
    })
}
