//! Abstract syntax tree for Dino queries.
//!
//! Nodes are built bottom-up by the parser and never mutated afterwards.

pub mod expr;
pub mod operators;
pub mod query;
pub mod values;
pub mod visit;

pub use expr::*;
pub use operators::*;
pub use query::*;
pub use values::*;
pub use visit::{Visit, Visitor};
