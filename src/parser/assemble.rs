//! Turn parsed records into a validated graph pair
//!
//! Records may arrive in any order. Everything that would make the pair
//! unusable is rejected here, with the offending record's span, before it
//! reaches the morphing core.

use std::collections::BTreeMap;

use crate::error::ParseError;
use crate::morph::{Edge, Graph, GraphPair, Node, Point, Rgb};
use crate::parser::ast::{Document, Span, Spanned};

#[derive(Default)]
struct GraphRecords {
    nodes: BTreeMap<usize, (Point, Rgb, Span)>,
    edges: BTreeMap<usize, (usize, usize, Span)>,
}

fn record_error(span: &Span, message: impl Into<String>) -> ParseError {
    ParseError::Record {
        span: span.clone(),
        message: message.into(),
    }
}

fn graph_index(value: &Spanned<i64>, errors: &mut Vec<ParseError>) -> Option<usize> {
    match value.node {
        0 | 1 => Some(value.node as usize),
        other => {
            errors.push(record_error(
                &value.span,
                format!("graph index must be 0 or 1, found {}", other),
            ));
            None
        }
    }
}

fn node_id(value: &Spanned<i64>, errors: &mut Vec<ParseError>) -> Option<usize> {
    match usize::try_from(value.node) {
        Ok(id) => Some(id),
        Err(_) => {
            errors.push(record_error(&value.span, format!("negative node id {}", value.node)));
            None
        }
    }
}

fn component(value: &Spanned<i64>, errors: &mut Vec<ParseError>) -> Option<u8> {
    match u8::try_from(value.node) {
        Ok(c) => Some(c),
        Err(_) => {
            errors.push(record_error(
                &value.span,
                format!("colour component {} is outside 0..=255", value.node),
            ));
            None
        }
    }
}

/// Build the graph pair described by a record document
pub fn assemble(document: &Document) -> Result<GraphPair, Vec<ParseError>> {
    let mut errors = Vec::new();
    let mut graphs: [GraphRecords; 2] = Default::default();

    for (record, span) in document.nodes() {
        let graph = graph_index(&record.graph, &mut errors);
        let id = node_id(&record.id, &mut errors);
        let [r, g, b] = &record.color;
        let color = match (
            component(r, &mut errors),
            component(g, &mut errors),
            component(b, &mut errors),
        ) {
            (Some(r), Some(g), Some(b)) => Some(Rgb::new(r, g, b)),
            _ => None,
        };
        let (Some(graph), Some(id), Some(color)) = (graph, id, color) else {
            continue;
        };
        let position = Point::new(record.x, record.y);
        if graphs[graph].nodes.insert(id, (position, color, span.clone())).is_some() {
            errors.push(record_error(
                &record.id.span,
                format!("duplicate node id {} in graph {}", id, graph),
            ));
        }
    }

    for (graph, records) in graphs.iter().enumerate() {
        // keys are sorted, so the first gap is the smallest missing id
        let missing = records.nodes.keys().enumerate().find(|&(i, &id)| i != id);
        if let Some((missing, _)) = missing {
            let span = records
                .nodes
                .values()
                .next_back()
                .map(|(_, _, span)| span.clone())
                .unwrap_or_default();
            errors.push(record_error(
                &span,
                format!(
                    "node ids of graph {} are not contiguous from 0: missing {}",
                    graph, missing
                ),
            ));
        }
    }

    for (record, span) in document.edges() {
        let graph = graph_index(&record.graph, &mut errors);
        let id = node_id(&record.id, &mut errors);
        let from = node_id(&record.from, &mut errors);
        let to = node_id(&record.to, &mut errors);
        let (Some(graph), Some(id), Some(from), Some(to)) = (graph, id, from, to) else {
            continue;
        };
        let records = &mut graphs[graph];
        let mut known = true;
        for (end, value) in [(from, &record.from), (to, &record.to)] {
            if !records.nodes.contains_key(&end) {
                errors.push(record_error(
                    &value.span,
                    format!("edge {} references unknown node {} in graph {}", id, end, graph),
                ));
                known = false;
            }
        }
        if from == to {
            errors.push(record_error(span, format!("edge {} is a self loop on node {}", id, from)));
            continue;
        }
        if known && records.edges.insert(id, (from, to, span.clone())).is_some() {
            errors.push(record_error(
                &record.id.span,
                format!("duplicate edge id {} in graph {}", id, graph),
            ));
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    let [first, second] = graphs.map(|records| {
        let nodes = records
            .nodes
            .into_iter()
            .map(|(id, (position, color, _))| Node::authored(id, position, color))
            .collect();
        let edges = records
            .edges
            .into_values()
            .map(|(from, to, _)| Edge::structural(from, to))
            .collect();
        Graph::new(nodes, edges)
    });

    GraphPair::new(first, second)
        .map_err(|err| vec![record_error(&document.span(), err.to_string())])
}

/// Serialise a pair back into records
///
/// Node records of the initial graph come first, then the final graph, then
/// the edges of both; edge ids are list positions.
pub fn write_records(pair: &GraphPair) -> String {
    let mut out = String::new();
    for (index, graph) in pair.graphs().iter().enumerate() {
        for node in &graph.nodes {
            out.push_str(&format!(
                "node {} {} {} {} {} {} {}\n",
                node.id, node.position.x, node.position.y, node.color.r, node.color.g, node.color.b, index
            ));
        }
    }
    for (index, graph) in pair.graphs().iter().enumerate() {
        for (id, edge) in graph.edges.iter().enumerate() {
            out.push_str(&format!("edge {} {} {} {}\n", index, edge.from, edge.to, id));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use pretty_assertions::assert_eq;

    const TRIANGLES: &str = "\
edge 1 2 0 2
node 2 5 10 0 0 255 0
node 0 0 0 255 0 0 0
node 1 10 0 0 255 0 0
edge 0 0 1 0
edge 0 1 2 1
edge 0 2 0 2
node 0 0 0 255 0 0 1
node 1 0 10 0 255 0 1
node 2 10 5 0 0 255 1
edge 1 0 1 0
edge 1 1 2 1
";

    fn load(source: &str) -> Result<GraphPair, Vec<ParseError>> {
        assemble(&parse(source)?)
    }

    fn messages(errors: &[ParseError]) -> Vec<String> {
        errors.iter().map(|e| e.to_string()).collect()
    }

    #[test]
    fn test_records_in_any_order() {
        let pair = load(TRIANGLES).unwrap();
        assert_eq!(pair.node_count(), 3);
        assert_eq!(pair.target().nodes[2].position, Point::new(10.0, 5.0));
        assert_eq!(pair.initial().nodes[0].color, Rgb::new(255, 0, 0));
        assert_eq!(
            pair.edges().iter().map(|e| (e.from, e.to)).collect::<Vec<_>>(),
            vec![(0, 1), (1, 2), (2, 0)]
        );
    }

    #[test]
    fn test_written_records_load_back() {
        let pair = load(TRIANGLES).unwrap();
        let written = write_records(&pair);
        assert!(written.starts_with("node 0 0 0 255 0 0 0\n"));
        assert_eq!(load(&written).unwrap(), pair);
    }

    #[test]
    fn test_duplicate_node_id() {
        let errors = load("node 0 0 0 0 0 0 0\nnode 0 1 1 0 0 0 0").unwrap_err();
        assert!(messages(&errors)[0].contains("duplicate node id 0 in graph 0"));
    }

    #[test]
    fn test_non_contiguous_ids() {
        let errors = load("node 0 0 0 0 0 0 0\nnode 2 1 1 0 0 0 0\nnode 0 0 0 0 0 0 1\nnode 1 1 1 0 0 0 1")
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(messages(&errors)[0].contains("not contiguous from 0: missing 1"));
    }

    #[test]
    fn test_bad_graph_index_and_colour() {
        let errors = load("node 0 0 0 300 0 0 2").unwrap_err();
        let messages = messages(&errors);
        assert_eq!(messages.len(), 2);
        assert!(messages.iter().any(|m| m.contains("graph index must be 0 or 1, found 2")));
        assert!(messages.iter().any(|m| m.contains("colour component 300")));
    }

    #[test]
    fn test_edge_to_unknown_node() {
        let errors = load("node 0 0 0 0 0 0 0\nnode 0 0 0 0 0 0 1\nedge 0 0 4 0").unwrap_err();
        assert!(messages(&errors)[0].contains("references unknown node 4"));
        match &errors[0] {
            ParseError::Record { span, .. } => assert_eq!(span, &(47..48)),
            other => panic!("Expected record error, got {:?}", other),
        }
    }

    #[test]
    fn test_self_loop_and_duplicate_edge_id() {
        let source = "node 0 0 0 0 0 0 0\nnode 1 1 0 0 0 0 0\nedge 0 1 1 0\nedge 0 0 1 3\nedge 0 1 0 3";
        let messages = messages(&load(source).unwrap_err());
        assert!(messages.iter().any(|m| m.contains("self loop on node 1")));
        assert!(messages.iter().any(|m| m.contains("duplicate edge id 3")));
    }

    #[test]
    fn test_mismatched_graphs() {
        let counts = "node 0 0 0 0 0 0 0\nnode 1 1 0 0 0 0 0\nnode 0 0 0 0 0 0 1";
        assert!(messages(&load(counts).unwrap_err())[0].contains("initial drawing has 2 nodes, final drawing has 1"));

        let edges = "node 0 0 0 0 0 0 0\nnode 1 1 0 0 0 0 0\nnode 0 0 0 0 0 0 1\nnode 1 1 0 0 0 0 1\nedge 0 0 1 0";
        assert!(load(edges).is_err());
    }
}
