//! Filter expressions: parsing and evaluation.
//!
//! * [`parse`] / [`parse_with_config`] - text to [`Filter`] AST
//! * [`matches`] - evaluate an AST against a resource
//! * [`matches_element`] - evaluate against one element of a multi-valued attribute

pub mod ast;
pub mod evaluator;
pub mod lexer;
pub mod parser;

pub use ast::{CompareOp, Filter, FilterValue};
pub use evaluator::{matches, matches_element};
pub use parser::{parse, parse_path, parse_with_config};
