//! Syntax tree of a record file

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// A value with its source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// `node <id> <x> <y> <r> <g> <b> <graphIndex>`
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: Spanned<i64>,
    pub x: f64,
    pub y: f64,
    pub color: [Spanned<i64>; 3],
    pub graph: Spanned<i64>,
}

/// `edge <graphIndex> <fromId> <toId> <edgeId>`
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeRecord {
    pub graph: Spanned<i64>,
    pub from: Spanned<i64>,
    pub to: Spanned<i64>,
    pub id: Spanned<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Node(NodeRecord),
    Edge(EdgeRecord),
}

/// Records in file order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub records: Vec<Spanned<Record>>,
}

impl Document {
    pub fn nodes(&self) -> impl Iterator<Item = (&NodeRecord, &Span)> {
        self.records.iter().filter_map(|r| match &r.node {
            Record::Node(node) => Some((node, &r.span)),
            Record::Edge(_) => None,
        })
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeRecord, &Span)> {
        self.records.iter().filter_map(|r| match &r.node {
            Record::Edge(edge) => Some((edge, &r.span)),
            Record::Node(_) => None,
        })
    }

    /// Span from the first record to the last
    pub fn span(&self) -> Span {
        match (self.records.first(), self.records.last()) {
            (Some(first), Some(last)) => first.span.start..last.span.end,
            _ => 0..0,
        }
    }
}
