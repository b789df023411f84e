//! Parsing and rebuilding of copied `curl` command lines.

mod builder;
mod parser;
pub mod tokenizer;

pub use builder::{build, CommandBuilder};
pub use parser::{parse, parse_query, StructuredRequest};
