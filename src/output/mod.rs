//! Result output
//!
//! - `text`: the plain result line, or a summary with every partial result
//! - `json`: machine-readable document for stdout or a file

pub mod json;
pub mod text;
