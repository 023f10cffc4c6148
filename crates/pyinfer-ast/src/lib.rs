//! Abstract syntax tree of the analyzed language.
//!
//! The parser that produces this tree is an external collaborator; this crate
//! only defines the node types and an [`AstBuilder`] that allocates them in a
//! [`bumpalo::Bump`] arena. All nodes borrow from that arena (`'ast`) and are
//! never mutated after construction.

pub mod builder;
pub mod expr;
pub mod ops;
pub mod stmt;

pub use builder::{AstBuilder, ClassDefBuilder, FunctionDefBuilder};
pub use expr::*;
pub use ops::{BinaryOp, UnaryOp};
pub use stmt::*;
