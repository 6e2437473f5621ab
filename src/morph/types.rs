//! Core types for the morph engine

use std::collections::HashSet;
use std::fmt;
use std::ops::{Add, Mul, Sub};
use std::str::FromStr;

use serde::Deserialize;

use super::error::MorphError;

/// A 2D point in drawing coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Z component of the cross product of two vectors
    pub fn cross(self, other: Point) -> f64 {
        self.x * other.y - self.y * other.x
    }

    pub fn dot(self, other: Point) -> f64 {
        self.x * other.x + self.y * other.y
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other - self).length()
    }

    /// Linear interpolation from `self` (t = 0) to `other` (t = 1)
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point {
            x: self.x + (other.x - self.x) * t,
            y: self.y + (other.y - self.y) * t,
        }
    }

    /// Arithmetic mean of a set of points, `None` when empty
    pub fn centroid(points: impl IntoIterator<Item = Point>) -> Option<Point> {
        let mut count = 0usize;
        let mut sum = Point::default();
        for p in points {
            sum = sum + p;
            count += 1;
        }
        (count > 0).then(|| sum * (1.0 / count as f64))
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, rhs: Point) -> Point {
        Point::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, rhs: Point) -> Point {
        Point::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Point {
    type Output = Point;

    fn mul(self, rhs: f64) -> Point {
        Point::new(self.x * rhs, self.y * rhs)
    }
}

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest box containing every point, `None` for an empty set
    pub fn from_points(points: impl IntoIterator<Item = Point>) -> Option<BoundingBox> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in iter {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(BoundingBox::new(min_x, min_y, max_x - min_x, max_y - min_y))
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Grow the box by `margin` on every side
    pub fn expand(&self, margin: f64) -> BoundingBox {
        BoundingBox::new(
            self.x - margin,
            self.y - margin,
            self.width + 2.0 * margin,
            self.height + 2.0 * margin,
        )
    }

    /// Corners in ring order: (min, min), (max, min), (max, max), (min, max)
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.x, self.y),
            Point::new(self.right(), self.y),
            Point::new(self.right(), self.bottom()),
            Point::new(self.x, self.bottom()),
        ]
    }

    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        BoundingBox::new(x, y, right - x, bottom - y)
    }
}

/// Display colour of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// Colour given to frame and Steiner nodes
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Per-channel linear blend, rounded to the nearest integer
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let channel = |a: u8, b: u8| -> u8 {
            let v = a as f64 + (b as f64 - a as f64) * t;
            v.round().clamp(0.0, 255.0) as u8
        };
        Rgb::new(
            channel(self.r, other.r),
            channel(self.g, other.g),
            channel(self.b, other.b),
        )
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::WHITE
    }
}

/// Who put a node into the graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrigin {
    /// Drawn by the user
    Authored,
    /// Corner of the rectangular frame added by the stitcher
    Frame,
    /// Subdivision point added by the compatible triangulation
    Steiner,
}

/// A node of one drawing
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Stable id, identical to the node's index in both drawings
    pub id: usize,
    pub position: Point,
    pub color: Rgb,
    pub origin: NodeOrigin,
}

impl Node {
    pub fn authored(id: usize, position: Point, color: Rgb) -> Self {
        Self {
            id,
            position,
            color,
            origin: NodeOrigin::Authored,
        }
    }
}

/// Structural edges are authored; Steiner edges come from the triangulation builder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Structural,
    Steiner,
}

/// An edge between two node indices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub from: usize,
    pub to: usize,
    pub kind: EdgeKind,
}

impl Edge {
    pub fn structural(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            kind: EdgeKind::Structural,
        }
    }

    pub fn steiner(from: usize, to: usize) -> Self {
        Self {
            from,
            to,
            kind: EdgeKind::Steiner,
        }
    }

    /// Unordered node pair, smaller index first
    pub fn key(&self) -> (usize, usize) {
        if self.from <= self.to {
            (self.from, self.to)
        } else {
            (self.to, self.from)
        }
    }

    pub fn touches(&self, node: usize) -> bool {
        self.from == node || self.to == node
    }

    pub fn shares_endpoint(&self, other: &Edge) -> bool {
        self.touches(other.from) || self.touches(other.to)
    }
}

/// One drawing: nodes plus edges
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

impl Graph {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self { nodes, edges }
    }

    pub fn positions(&self) -> Vec<Point> {
        self.nodes.iter().map(|n| n.position).collect()
    }

    pub fn colors(&self) -> Vec<Rgb> {
        self.nodes.iter().map(|n| n.color).collect()
    }

    pub fn structural_edge_count(&self) -> usize {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Structural)
            .count()
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::from_points(self.nodes.iter().map(|n| n.position))
    }
}

/// The initial and final drawing of the same labelled graph
///
/// Node `i` of the initial drawing and node `i` of the final drawing are the
/// same logical node. Both drawings carry the same edge set.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphPair {
    graphs: [Graph; 2],
}

impl GraphPair {
    /// Pair two drawings, rejecting inputs that do not share node identity
    pub fn new(initial: Graph, target: Graph) -> Result<Self, MorphError> {
        if initial.nodes.len() != target.nodes.len() {
            return Err(MorphError::invalid_graph(format!(
                "initial drawing has {} nodes, final drawing has {}",
                initial.nodes.len(),
                target.nodes.len()
            )));
        }
        let n = initial.nodes.len();
        let mut keys = [HashSet::new(), HashSet::new()];
        for (side, graph) in [&initial, &target].into_iter().enumerate() {
            for (i, node) in graph.nodes.iter().enumerate() {
                if node.id != i {
                    return Err(MorphError::invalid_graph(format!(
                        "node at index {} carries id {}",
                        i, node.id
                    )));
                }
            }
            for edge in &graph.edges {
                if edge.from >= n || edge.to >= n {
                    return Err(MorphError::invalid_graph(format!(
                        "edge {}-{} references a node outside 0..{}",
                        edge.from, edge.to, n
                    )));
                }
                if edge.from == edge.to {
                    return Err(MorphError::invalid_graph(format!(
                        "self loop on node {}",
                        edge.from
                    )));
                }
                if !keys[side].insert(edge.key()) {
                    return Err(MorphError::invalid_graph(format!(
                        "duplicate edge {}-{} in drawing {}",
                        edge.from, edge.to, side
                    )));
                }
            }
        }
        if keys[0] != keys[1] {
            return Err(MorphError::invalid_graph(
                "the two drawings do not have the same edge set",
            ));
        }
        Ok(Self {
            graphs: [initial, target],
        })
    }

    pub fn initial(&self) -> &Graph {
        &self.graphs[0]
    }

    pub fn target(&self) -> &Graph {
        &self.graphs[1]
    }

    pub fn graphs(&self) -> &[Graph; 2] {
        &self.graphs
    }

    pub fn node_count(&self) -> usize {
        self.graphs[0].nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.graphs[0].edges.len()
    }

    /// Edges shared by both drawings, in the initial drawing's order
    pub fn edges(&self) -> &[Edge] {
        &self.graphs[0].edges
    }

    /// Sorted neighbour lists for every node
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut neighbors = vec![Vec::new(); self.node_count()];
        for edge in self.edges() {
            neighbors[edge.from].push(edge.to);
            neighbors[edge.to].push(edge.from);
        }
        for list in &mut neighbors {
            list.sort_unstable();
            list.dedup();
        }
        neighbors
    }

    /// True when every node can reach every other through the edges
    pub fn is_connected(&self) -> bool {
        let n = self.node_count();
        if n == 0 {
            return true;
        }
        let adjacency = self.adjacency();
        let mut seen = vec![false; n];
        let mut stack = vec![0];
        seen[0] = true;
        while let Some(v) = stack.pop() {
            for &w in &adjacency[v] {
                if !seen[w] {
                    seen[w] = true;
                    stack.push(w);
                }
            }
        }
        seen.into_iter().all(|s| s)
    }

    /// Copy of the pair with extra nodes and edges appended to both drawings
    ///
    /// `nodes` holds (initial position, final position) pairs; they receive ids
    /// continuing after the current node count. Edges already present (as an
    /// unordered pair) and self loops are dropped.
    pub(crate) fn with_insertions(
        &self,
        nodes: &[(Point, Point)],
        origin: NodeOrigin,
        edges: &[Edge],
    ) -> GraphPair {
        let mut graphs = self.graphs.clone();
        for (side, graph) in graphs.iter_mut().enumerate() {
            for &(p0, p1) in nodes {
                let id = graph.nodes.len();
                graph.nodes.push(Node {
                    id,
                    position: if side == 0 { p0 } else { p1 },
                    color: Rgb::WHITE,
                    origin,
                });
            }
            graph.edges.extend_from_slice(edges);
            graph.edges = crate::morph::compatible::remove_repeated(&graph.edges);
        }
        GraphPair { graphs }
    }

    /// Replace node positions of the initial drawing
    pub(crate) fn with_initial_positions(&self, positions: &[Point]) -> GraphPair {
        let mut graphs = self.graphs.clone();
        for (node, &p) in graphs[0].nodes.iter_mut().zip(positions) {
            node.position = p;
        }
        GraphPair { graphs }
    }
}

/// Ordered node indices forming the outer face of a stitched drawing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoundaryRing(pub Vec<usize>);

impl BoundaryRing {
    pub fn nodes(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, node: usize) -> bool {
        self.0.contains(&node)
    }

    /// The whole ring, checked against a requested boundary size
    ///
    /// Pinning only part of the ring would leave the rest free to fold over the
    /// frame, so any count other than the ring length is rejected.
    pub fn select(&self, count: Option<usize>) -> Result<&[usize], MorphError> {
        match count {
            Some(requested) if requested != self.0.len() => Err(MorphError::BoundaryMismatch {
                requested,
                ring: self.0.len(),
            }),
            _ => Ok(&self.0),
        }
    }

    /// Cyclic comparison against a face, in either traversal direction
    pub fn matches_cycle(&self, cycle: &[usize]) -> bool {
        let ring = &self.0;
        let n = ring.len();
        if n == 0 || cycle.len() != n {
            return false;
        }
        let Some(start) = cycle.iter().position(|&v| v == ring[0]) else {
            return false;
        };
        let forward = (0..n).all(|k| cycle[(start + k) % n] == ring[k]);
        let backward = (0..n).all(|k| cycle[(start + n - k) % n] == ring[k]);
        forward || backward
    }
}

/// Three node indices of one triangle
pub type Triangle = [usize; 3];

/// Motion model driving the frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionMode {
    /// Straight cartesian interpolation of every node
    #[default]
    Linear,
    /// Two-phase rigid alignment
    Rigid,
    /// Convex-combination (Tutte) interpolation over the compatible triangulation
    Convex,
    /// Rigid alignment for the first half, convex interpolation for the second
    Hybrid,
}

impl MotionMode {
    /// Whether the mode needs the compatible triangulation
    pub fn needs_triangulation(self) -> bool {
        matches!(self, MotionMode::Convex | MotionMode::Hybrid)
    }
}

impl fmt::Display for MotionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MotionMode::Linear => "linear",
            MotionMode::Rigid => "rigid",
            MotionMode::Convex => "convex",
            MotionMode::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

impl FromStr for MotionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "linear" => Ok(MotionMode::Linear),
            "rigid" => Ok(MotionMode::Rigid),
            "convex" => Ok(MotionMode::Convex),
            "hybrid" => Ok(MotionMode::Hybrid),
            other => Err(format!(
                "unknown motion mode '{}' (expected linear, rigid, convex or hybrid)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_graph(points: &[(f64, f64)]) -> Graph {
        let nodes = points
            .iter()
            .enumerate()
            .map(|(i, &(x, y))| Node::authored(i, Point::new(x, y), Rgb::new(200, 0, 0)))
            .collect();
        let edges = (1..points.len()).map(|i| Edge::structural(i - 1, i)).collect();
        Graph::new(nodes, edges)
    }

    #[test]
    fn test_bounding_box_corners_in_ring_order() {
        let bbox = BoundingBox::from_points([Point::new(1.0, 2.0), Point::new(5.0, -1.0)]).unwrap();
        let corners = bbox.expand(1.0).corners();
        assert_eq!(corners[0], Point::new(0.0, -2.0));
        assert_eq!(corners[1], Point::new(6.0, -2.0));
        assert_eq!(corners[2], Point::new(6.0, 3.0));
        assert_eq!(corners[3], Point::new(0.0, 3.0));
    }

    #[test]
    fn test_rgb_lerp_rounds() {
        let a = Rgb::new(0, 100, 255);
        let b = Rgb::new(255, 100, 0);
        assert_eq!(a.lerp(b, 0.5), Rgb::new(128, 100, 128));
        assert_eq!(a.lerp(b, 0.0), a);
        assert_eq!(a.lerp(b, 1.0), b);
        assert_eq!(Rgb::new(255, 0, 16).to_hex(), "#ff0010");
    }

    #[test]
    fn test_pair_rejects_node_count_mismatch() {
        let g0 = path_graph(&[(0.0, 0.0), (1.0, 0.0)]);
        let g1 = path_graph(&[(0.0, 0.0)]);
        assert!(matches!(
            GraphPair::new(g0, g1),
            Err(MorphError::InvalidGraph { .. })
        ));
    }

    #[test]
    fn test_pair_rejects_different_edge_sets() {
        let g0 = path_graph(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let mut g1 = g0.clone();
        g1.edges[1] = Edge::structural(0, 2);
        assert!(GraphPair::new(g0, g1).is_err());
    }

    #[test]
    fn test_pair_accepts_reversed_edges() {
        let g0 = path_graph(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        let mut g1 = g0.clone();
        g1.edges.reverse();
        g1.edges[0] = Edge::structural(2, 1);
        let pair = GraphPair::new(g0, g1).unwrap();
        assert_eq!(pair.adjacency()[1], vec![0, 2]);
        assert!(pair.is_connected());
    }

    #[test]
    fn test_ring_matches_cycle_both_directions() {
        let ring = BoundaryRing(vec![4, 5, 6, 7]);
        assert!(ring.matches_cycle(&[6, 7, 4, 5]));
        assert!(ring.matches_cycle(&[5, 4, 7, 6]));
        assert!(!ring.matches_cycle(&[4, 6, 5, 7]));
        assert!(!ring.matches_cycle(&[4, 5, 6]));
    }

    #[test]
    fn test_ring_select_checks_count() {
        let ring = BoundaryRing(vec![4, 5, 6, 7]);
        assert_eq!(ring.select(None), Ok(&[4, 5, 6, 7][..]));
        assert_eq!(ring.select(Some(4)), Ok(&[4, 5, 6, 7][..]));
        assert_eq!(
            ring.select(Some(3)),
            Err(MorphError::BoundaryMismatch { requested: 3, ring: 4 })
        );
        assert!(ring.select(Some(10)).is_err());
    }

    #[test]
    fn test_motion_mode_parsing() {
        assert_eq!("Convex".parse::<MotionMode>(), Ok(MotionMode::Convex));
        assert!("bouncy".parse::<MotionMode>().is_err());
        assert_eq!(MotionMode::Hybrid.to_string(), "hybrid");
        assert!(MotionMode::Hybrid.needs_triangulation());
        assert!(!MotionMode::Rigid.needs_triangulation());
    }
}
