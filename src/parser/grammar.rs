//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::*;
use crate::parser::lexer::Token;

/// Parse record source into a document
pub fn parse(input: &str) -> Result<Document, Vec<crate::ParseError>> {
    let len = input.len();

    let token_iter = crate::parser::lexer::lex(input).map(|(tok, span)| (tok, span.into()));

    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Document, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let integer = select! {
        Token::Integer(n) => n,
    }
    .labelled("integer")
    .map_with(|n, e| Spanned::new(n, span_range(&e.span())));

    let coordinate = select! {
        Token::Integer(n) => n as f64,
        Token::Float(f) => f,
    }
    .labelled("coordinate");

    // node <id> <x> <y> <r> <g> <b> <graphIndex>
    let node_record = just(Token::Node)
        .ignore_then(integer)
        .then(coordinate)
        .then(coordinate)
        .then(integer)
        .then(integer)
        .then(integer)
        .then(integer)
        .map(|((((((id, x), y), r), g), b), graph)| {
            Record::Node(NodeRecord {
                id,
                x,
                y,
                color: [r, g, b],
                graph,
            })
        });

    // edge <graphIndex> <fromId> <toId> <edgeId>
    let edge_record = just(Token::Edge)
        .ignore_then(integer)
        .then(integer)
        .then(integer)
        .then(integer)
        .map(|(((graph, from), to), id)| Record::Edge(EdgeRecord { graph, from, to, id }));

    choice((node_record, edge_record))
        .map_with(|r, e| Spanned::new(r, span_range(&e.span())))
        .repeated()
        .collect()
        .then_ignore(end())
        .map(|records| Document { records })
}
