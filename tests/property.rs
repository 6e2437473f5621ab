//! Convex-mode frames never cross themselves on triangulated inputs
//!
//! Inputs are stacked triangulations: start from an outer triangle and keep
//! inserting a node inside one of the current triangles, joined to its three
//! corners. Both drawings share the insertion sequence but place every node
//! at their own barycentric coordinates, so each drawing is a planar
//! triangulation with the outer triangle as convex boundary.

use graph_morph::morph::convex::ConvexModel;
use graph_morph::morph::geometry::segments_cross;
use graph_morph::morph::{BoundaryRing, Edge, Graph, GraphPair, Node, Point, Rgb};
use proptest::prelude::*;

/// Triangle to split and the barycentric weights of the new node in each drawing
type Insertion = (usize, (f64, f64), (f64, f64));

fn stacked_pair(insertions: &[Insertion]) -> GraphPair {
    let mut drawings = [
        vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0), Point::new(50.0, 90.0)],
        vec![Point::new(10.0, 20.0), Point::new(90.0, -10.0), Point::new(70.0, 80.0)],
    ];
    let mut edges = vec![(0, 1), (1, 2), (2, 0)];
    let mut triangles: Vec<[usize; 3]> = vec![[0, 1, 2]];

    for &(pick, first, second) in insertions {
        let slot = pick % triangles.len();
        let [a, b, c] = triangles[slot];
        let node = drawings[0].len();
        for (positions, (u, v)) in drawings.iter_mut().zip([first, second]) {
            let w = 1.0 - u - v;
            let p = positions[a] * u + positions[b] * v + positions[c] * w;
            positions.push(p);
        }
        edges.extend([(a, node), (b, node), (c, node)]);
        triangles[slot] = [a, b, node];
        triangles.push([b, c, node]);
        triangles.push([c, a, node]);
    }

    let build = |positions: &[Point]| {
        Graph::new(
            positions
                .iter()
                .enumerate()
                .map(|(i, &p)| Node::authored(i, p, Rgb::WHITE))
                .collect(),
            edges.iter().map(|&(a, b)| Edge::structural(a, b)).collect(),
        )
    };
    GraphPair::new(build(&drawings[0]), build(&drawings[1])).unwrap()
}

fn insertion() -> impl Strategy<Value = Insertion> {
    (
        0usize..1000,
        (0.2f64..0.4, 0.2f64..0.4),
        (0.2f64..0.4, 0.2f64..0.4),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_convex_frames_have_no_crossings(insertions in prop::collection::vec(insertion(), 1..12)) {
        let pair = stacked_pair(&insertions);
        let model = ConvexModel::new(&pair, &BoundaryRing(vec![0, 1, 2]), None, 1e-12).unwrap();
        let edges = pair.edges();

        for step in 0..=8 {
            let t = step as f64 / 8.0;
            let positions = model.positions(t).unwrap();
            for (i, e) in edges.iter().enumerate() {
                for f in &edges[i + 1..] {
                    if e.shares_endpoint(f) {
                        continue;
                    }
                    prop_assert!(
                        !segments_cross(positions[e.from], positions[e.to], positions[f.from], positions[f.to]),
                        "edges {:?} and {:?} cross at t = {}", e.key(), f.key(), t
                    );
                }
            }
        }
    }

    #[test]
    fn test_convex_frames_hit_both_drawings(insertions in prop::collection::vec(insertion(), 1..8)) {
        let pair = stacked_pair(&insertions);
        let model = ConvexModel::new(&pair, &BoundaryRing(vec![0, 1, 2]), None, 1e-12).unwrap();
        for (t, graph) in [(0.0, pair.initial()), (1.0, pair.target())] {
            let positions = model.positions(t).unwrap();
            for (p, node) in positions.iter().zip(&graph.nodes) {
                prop_assert!(p.distance(node.position) < 1e-6);
            }
        }
    }
}
