//! Face enumeration of a planar straight-line drawing
//!
//! Every directed half-edge `u -> v` belongs to exactly one face. Walking a face
//! means arriving at `v` from `u` and leaving along the neighbour of `v` that
//! comes just before `u` in counter-clockwise order. Bounded faces come out
//! counter-clockwise, the unbounded face clockwise.

use super::types::{BoundaryRing, Edge, Point};

/// A slot of a face that repeats a node already seen on the same face
///
/// Cut vertices (and both ends of a bridge) are visited more than once when a
/// face is walked. Each later visit becomes its own slot so the triangulator
/// always sees a simple cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtraNode {
    /// Slot index on the face
    pub local: usize,
    /// Node id the slot duplicates
    pub original: usize,
}

/// One face, as a cycle of slots with their node ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FacePolygon {
    slots: Vec<usize>,
    extras: Vec<ExtraNode>,
}

impl FacePolygon {
    pub fn from_cycle(cycle: Vec<usize>) -> Self {
        let mut extras = Vec::new();
        for (local, &node) in cycle.iter().enumerate() {
            if cycle[..local].contains(&node) {
                extras.push(ExtraNode {
                    local,
                    original: node,
                });
            }
        }
        Self {
            slots: cycle,
            extras,
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[usize] {
        &self.slots
    }

    pub fn extras(&self) -> &[ExtraNode] {
        &self.extras
    }

    /// Node id behind a slot, folding duplicates back onto their original
    pub fn node(&self, local: usize) -> Option<usize> {
        if let Some(extra) = self.extras.iter().find(|e| e.local == local) {
            return Some(extra.original);
        }
        self.slots.get(local).copied()
    }

    /// Slot coordinates taken from one drawing
    pub fn points(&self, positions: &[Point]) -> Vec<Point> {
        self.slots.iter().map(|&node| positions[node]).collect()
    }
}

/// Neighbours of every node, sorted by angle around it
fn angular_adjacency(positions: &[Point], edges: &[Edge]) -> Vec<Vec<usize>> {
    let mut neighbors = vec![Vec::new(); positions.len()];
    for edge in edges {
        if edge.from == edge.to {
            continue;
        }
        neighbors[edge.from].push(edge.to);
        neighbors[edge.to].push(edge.from);
    }
    for (node, list) in neighbors.iter_mut().enumerate() {
        list.sort_unstable();
        list.dedup();
        let center = positions[node];
        list.sort_by(|&a, &b| {
            let da = positions[a] - center;
            let db = positions[b] - center;
            da.y.atan2(da.x).total_cmp(&db.y.atan2(db.x))
        });
    }
    neighbors
}

/// Every face of the drawing as a cycle of node ids
pub fn trace_faces(positions: &[Point], edges: &[Edge]) -> Vec<Vec<usize>> {
    let neighbors = angular_adjacency(positions, edges);
    let mut visited: Vec<Vec<bool>> = neighbors.iter().map(|l| vec![false; l.len()]).collect();
    let mut faces = Vec::new();

    for start in 0..neighbors.len() {
        for first in 0..neighbors[start].len() {
            if visited[start][first] {
                continue;
            }
            let mut cycle = Vec::new();
            let (mut node, mut slot) = (start, first);
            while !visited[node][slot] {
                visited[node][slot] = true;
                cycle.push(node);
                let next = neighbors[node][slot];
                let around = &neighbors[next];
                let Some(back) = around.iter().position(|&w| w == node) else {
                    break;
                };
                slot = (back + around.len() - 1) % around.len();
                node = next;
            }
            faces.push(cycle);
        }
    }
    faces
}

/// Faces other than the one bounded by `ring`
pub fn inner_faces(positions: &[Point], edges: &[Edge], ring: &BoundaryRing) -> Vec<Vec<usize>> {
    trace_faces(positions, edges)
        .into_iter()
        .filter(|face| !ring.matches_cycle(face))
        .collect()
}
