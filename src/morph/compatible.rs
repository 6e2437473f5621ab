//! Compatible triangulation of two drawings of the same graph.
//!
//! ## Pipeline
//!
//! 1. Fit the rigid rotation between the drawings (zero when the fit is singular)
//! 2. Stitch both drawings into a rectangular frame
//! 3. Refine: trace every face of the initial drawing and triangulate it in both
//!    drawings, inserting Steiner nodes where the two triangulations disagree.
//!    Repeat until a pass adds nothing.
//!
//! ## Reconciling two triangulations of a face
//!
//! A face triangulated in the initial drawing keeps its triangulation when every
//! triangle keeps its winding in the final drawing, and the same check is then
//! tried the other way round. A face that is strictly convex in one drawing
//! always takes the other drawing's triangulation.
//!
//! Otherwise the face's slots are laid out on a unit circle and every diagonal
//! of one triangulation that crosses a diagonal of the other there gets a
//! Steiner node. Its initial position is on the initial drawing's diagonal and
//! its final position on the final drawing's diagonal, at the crossing
//! parameters found on the circle. Both diagonals are then split at all of their
//! Steiner nodes, in parameter order.

use std::collections::HashSet;
use std::f64::consts::TAU;

use log::{debug, info, warn};

use super::config::MorphConfig;
use super::error::MorphError;
use super::faces::{inner_faces, FacePolygon};
use super::geometry::{crossing_parameters, is_strictly_convex, signed_area2};
use super::rigid::RigidModel;
use super::stitch::stitch;
use super::triangulate::{triangulate_polygon, Diagonal};
use super::types::{BoundaryRing, Edge, GraphPair, NodeOrigin, Point, Triangle};

/// Result of reconciling one face: new nodes and new edges, in face slots
///
/// Slots `0..face.len()` are the face's own; slot `face.len() + k` is the
/// `k`-th Steiner node.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceSubdivision {
    /// (initial, final) position of each Steiner node
    pub steiner: Vec<(Point, Point)>,
    pub edges: Vec<Diagonal>,
}

/// Insert Steiner nodes where `t0` and `t1` cross on the circle layout
pub fn find_steiner(
    slot_count: usize,
    t0: &[Diagonal],
    t1: &[Diagonal],
    points0: &[Point],
    points1: &[Point],
) -> FaceSubdivision {
    let circle: Vec<Point> = (0..slot_count)
        .map(|k| {
            let angle = TAU * k as f64 / slot_count as f64;
            Point::new(angle.cos(), angle.sin())
        })
        .collect();

    let mut steiner = Vec::new();
    let mut splits0: Vec<Vec<(f64, usize)>> = vec![Vec::new(); t0.len()];
    let mut splits1: Vec<Vec<(f64, usize)>> = vec![Vec::new(); t1.len()];
    for (a, &(p, q)) in t0.iter().enumerate() {
        for (b, &(r, s)) in t1.iter().enumerate() {
            if p == r || p == s || q == r || q == s {
                continue;
            }
            let Some((along0, along1)) = crossing_parameters(circle[p], circle[q], circle[r], circle[s])
            else {
                continue;
            };
            let local = slot_count + steiner.len();
            steiner.push((
                points0[p].lerp(points0[q], along0),
                points1[r].lerp(points1[s], along1),
            ));
            splits0[a].push((along0, local));
            splits1[b].push((along1, local));
        }
    }

    let mut edges = Vec::new();
    for (diagonals, splits) in [(t0, &mut splits0), (t1, &mut splits1)] {
        for (&(from, to), cuts) in diagonals.iter().zip(splits.iter_mut()) {
            cuts.sort_by(|x, y| x.0.total_cmp(&y.0));
            let mut previous = from;
            for &(_, local) in cuts.iter() {
                edges.push((previous, local));
                previous = local;
            }
            edges.push((previous, to));
        }
    }
    FaceSubdivision { steiner, edges }
}

/// Triangulate a face in both drawings and reconcile the results
pub fn subdivide_face(
    face: &FacePolygon,
    positions0: &[Point],
    positions1: &[Point],
    tolerance: f64,
) -> FaceSubdivision {
    let points0 = face.points(positions0);
    let points1 = face.points(positions1);
    let ring: Vec<usize> = (0..face.len()).collect();
    let t0 = triangulate_polygon(&ring, &points0, tolerance);
    let t1 = triangulate_polygon(&ring, &points1, tolerance);

    let keys = |diagonals: &[Diagonal]| -> HashSet<Diagonal> {
        diagonals.iter().map(|&(a, b)| (a.min(b), a.max(b))).collect()
    };
    if keys(&t0.diagonals) == keys(&t1.diagonals)
        || is_strictly_convex(&points1)
        || t0.preserves_orientation(&points0, &points1)
    {
        return FaceSubdivision {
            steiner: Vec::new(),
            edges: t0.diagonals,
        };
    }
    if is_strictly_convex(&points0) || t1.preserves_orientation(&points1, &points0) {
        return FaceSubdivision {
            steiner: Vec::new(),
            edges: t1.diagonals,
        };
    }
    find_steiner(face.len(), &t0.diagonals, &t1.diagonals, &points0, &points1)
}

/// Rewrite face-slot edges as node-id edges
///
/// Duplicated slots fold back onto their original node; Steiner slots map to
/// consecutive ids starting at `steiner_base`.
pub fn correct_edges(face: &FacePolygon, edges: &[Diagonal], steiner_base: usize) -> Vec<Edge> {
    let resolve = |local: usize| face.node(local).unwrap_or_else(|| steiner_base + local - face.len());
    edges
        .iter()
        .map(|&(a, b)| Edge::steiner(resolve(a), resolve(b)))
        .collect()
}

/// Drop self loops and repeated unordered pairs, keeping the first occurrence
pub fn remove_repeated(edges: &[Edge]) -> Vec<Edge> {
    let mut seen = HashSet::with_capacity(edges.len());
    edges
        .iter()
        .filter(|e| e.from != e.to && seen.insert(e.key()))
        .copied()
        .collect()
}

/// Outcome of one refinement pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PassReport {
    pub faces: usize,
    pub steiner_nodes: usize,
    pub edges: usize,
}

/// Run one refinement pass over every inner face
pub fn refine_pass(
    pair: &GraphPair,
    ring: &BoundaryRing,
    tolerance: f64,
) -> (GraphPair, PassReport) {
    let positions0 = pair.initial().positions();
    let positions1 = pair.target().positions();
    let mut steiner: Vec<(Point, Point)> = Vec::new();
    let mut edges: Vec<Edge> = Vec::new();
    let mut faces = 0;

    for cycle in inner_faces(&positions0, pair.edges(), ring) {
        if cycle.len() <= 3 {
            continue;
        }
        faces += 1;
        let face = FacePolygon::from_cycle(cycle);
        let subdivision = subdivide_face(&face, &positions0, &positions1, tolerance);
        let base = pair.node_count() + steiner.len();
        edges.extend(correct_edges(&face, &subdivision.edges, base));
        steiner.extend(subdivision.steiner);
    }

    let next = pair.with_insertions(&steiner, NodeOrigin::Steiner, &edges);
    let report = PassReport {
        faces,
        steiner_nodes: steiner.len(),
        edges: next.edge_count() - pair.edge_count(),
    };
    (next, report)
}

/// Refine until a pass inserts nothing
///
/// Returns the refined pair and the number of passes run, including the final
/// pass that found nothing to do.
pub fn refine(
    pair: &GraphPair,
    ring: &BoundaryRing,
    config: &MorphConfig,
) -> Result<(GraphPair, usize), MorphError> {
    let mut current = pair.clone();
    for pass in 1..=config.max_steiner_passes {
        let (next, report) = refine_pass(&current, ring, config.inside_tolerance);
        debug!(
            "pass {}: {} faces split, {} Steiner nodes, {} edges added",
            pass, report.faces, report.steiner_nodes, report.edges
        );
        if report.steiner_nodes == 0 && report.edges == 0 {
            return Ok((current, pass));
        }
        check_capacity(&next, config)?;
        current = next;
    }
    warn!(
        "Steiner insertion still adding nodes after {} passes",
        config.max_steiner_passes
    );
    Err(MorphError::TriangulationDidNotConverge {
        passes: config.max_steiner_passes,
    })
}

/// Reject pairs that outgrew the configured guards
pub fn check_capacity(pair: &GraphPair, config: &MorphConfig) -> Result<(), MorphError> {
    if pair.node_count() > config.max_nodes {
        return Err(MorphError::CapacityExceeded {
            what: "nodes",
            limit: config.max_nodes,
            actual: pair.node_count(),
        });
    }
    if pair.edge_count() > config.max_edges {
        return Err(MorphError::CapacityExceeded {
            what: "edges",
            limit: config.max_edges,
            actual: pair.edge_count(),
        });
    }
    Ok(())
}

/// Triangular inner faces of a refined pair
pub fn collect_triangles(pair: &GraphPair, ring: &BoundaryRing) -> Vec<Triangle> {
    inner_faces(&pair.initial().positions(), pair.edges(), ring)
        .into_iter()
        .filter_map(|face| match face[..] {
            [a, b, c] if a != b && b != c && a != c => Some([a, b, c]),
            _ => None,
        })
        .collect()
}

/// Check that every inner face is a triangle with the same non-zero winding in both drawings
pub fn verify(pair: &GraphPair, ring: &BoundaryRing) -> Result<(), MorphError> {
    let positions0 = pair.initial().positions();
    let positions1 = pair.target().positions();
    let mut faces = 0;
    let mut flipped = 0;
    for face in inner_faces(&positions0, pair.edges(), ring) {
        let [a, b, c] = face[..] else {
            faces += 1;
            continue;
        };
        if a == b || b == c || a == c {
            faces += 1;
            continue;
        }
        let before = signed_area2(&[positions0[a], positions0[b], positions0[c]]);
        let after = signed_area2(&[positions1[a], positions1[b], positions1[c]]);
        if before == 0.0 || after == 0.0 || before.signum() != after.signum() {
            flipped += 1;
        }
    }
    if faces > 0 || flipped > 0 {
        warn!(
            "triangulation check failed: {} faces untriangulated, {} triangles flat or flipped",
            faces, flipped
        );
        return Err(MorphError::DegenerateTriangulation { faces, flipped });
    }
    Ok(())
}

/// Two triangulations with identical triangle/vertex correspondence
#[derive(Debug, Clone, PartialEq)]
pub struct CompatibleTriangulation {
    /// Authored nodes followed by frame and Steiner nodes, in both drawings
    pub pair: GraphPair,
    /// Frame ring, empty when there was nothing to triangulate
    pub ring: BoundaryRing,
    /// Triangle lists of the initial and final drawing, index for index
    pub triangles: [Vec<Triangle>; 2],
    /// Number of nodes that came from the input pair
    pub authored_nodes: usize,
    /// Rotation used to match the frame corners
    pub rotation: f64,
    /// Refinement passes run
    pub passes: usize,
}

impl CompatibleTriangulation {
    /// Build the compatible triangulation of a graph pair
    pub fn build(pair: &GraphPair, config: &MorphConfig) -> Result<Self, MorphError> {
        let authored_nodes = pair.node_count();
        if authored_nodes < 3 {
            debug!("{} nodes, nothing to triangulate", authored_nodes);
            return Ok(Self {
                pair: pair.clone(),
                ring: BoundaryRing::default(),
                triangles: [Vec::new(), Vec::new()],
                authored_nodes,
                rotation: 0.0,
                passes: 0,
            });
        }
        if !pair.is_connected() {
            return Err(MorphError::invalid_graph(
                "the graph must be connected to be triangulated",
            ));
        }

        let rotation = match RigidModel::fit(&pair.initial().positions(), &pair.target().positions()) {
            Ok(model) => model.rotation(),
            Err(err) => {
                debug!("frame corners matched without rotation: {}", err);
                0.0
            }
        };
        let stitched = stitch(pair, rotation, config.frame_margin)?;
        check_capacity(&stitched.pair, config)?;

        let (refined, passes) = refine(&stitched.pair, &stitched.ring, config)?;
        verify(&refined, &stitched.ring)?;
        let triangles = collect_triangles(&refined, &stitched.ring);
        info!(
            "compatible triangulation: {} nodes ({} Steiner), {} triangles after {} passes",
            refined.node_count(),
            refined.node_count() - authored_nodes - 4,
            triangles.len(),
            passes
        );
        Ok(Self {
            pair: refined,
            ring: stitched.ring,
            triangles: [triangles.clone(), triangles],
            authored_nodes,
            rotation,
            passes,
        })
    }

    /// Ids of the Steiner nodes inserted by refinement
    pub fn steiner_nodes(&self) -> Vec<usize> {
        self.pair
            .initial()
            .nodes
            .iter()
            .filter(|n| n.origin == NodeOrigin::Steiner)
            .map(|n| n.id)
            .collect()
    }

    /// Run one more refinement pass and report what it would add
    pub fn recheck(&self, config: &MorphConfig) -> PassReport {
        refine_pass(&self.pair, &self.ring, config.inside_tolerance).1
    }
}
