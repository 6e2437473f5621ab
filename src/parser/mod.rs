//! Reader and writer for node/edge record files

mod assemble;
pub mod ast;
mod grammar;
pub mod lexer;

pub use assemble::{assemble, write_records};
pub use ast::*;
pub use grammar::parse;

use crate::morph::GraphPair;
use crate::ParseError;

/// Parse and validate a record file in one step
pub fn read_records(source: &str) -> Result<GraphPair, Vec<ParseError>> {
    assemble(&parse(source)?)
}
