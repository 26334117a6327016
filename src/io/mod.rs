//! File I/O for evaluation requests, results and massing geometry.

pub mod json;
pub mod stl;

pub use json::{read_evaluation, read_request, write_evaluation, write_request};
pub use stl::{StlFormat, read_stl, write_stl};
