//! Nested boolean condition language
//!
//! Conditions filter hierarchical records. They are compiled here into a
//! structurally validated tree; evaluation belongs to the storage engine.

mod compiler;
mod expr;
mod operator;

pub use compiler::{ConditionCompiler, MAX_NESTING};
pub use expr::{Clause, ConditionExpr, ConditionValue, Group, Sequence, Triplet};
pub use operator::{Connector, Operator};
