//! Lexer for node/edge records using logos

use logos::Logos;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token {
    // Record keywords
    #[token("node")]
    Node,
    #[token("edge")]
    Edge,

    // Literals (longest match keeps "1.5" a single float)
    #[regex(r"-?[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Integer(i64),

    #[regex(r"-?[0-9]+\.[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Float(f64),

    // Comments (skip)
    #[regex(r"#[^\n]*", logos::skip)]
    HashComment,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    /// Anything the lexer could not read; the grammar reports it
    Invalid,
}

/// Lex input string into tokens with spans
pub fn lex(input: &str) -> impl Iterator<Item = (Token, Span)> + '_ {
    Token::lexer(input)
        .spanned()
        .map(|(tok, span)| (tok.unwrap_or(Token::Invalid), span))
}
