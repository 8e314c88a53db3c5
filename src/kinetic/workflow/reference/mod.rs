// SPDX-License-Identifier: MIT

//! Input assignments for flow nodes
//!
//! Node inputs and condition operands are either literals or references:
//! - `${inputs.text}` reads a flow input
//! - `${classify.output}` reads a node output
//! - `${classify.output.choices[0].text}` reads into a node output

mod ast;
mod parser;
mod resolver;

pub use ast::{InputAssignment, PathSegment};
pub use parser::{parse, parse_value};
pub use resolver::{resolve_path, values_equal};
