pub mod ast;
pub mod modifiers;
pub mod sexpr;
pub mod span;
pub mod visitor;

pub use ast::*;
pub use modifiers::{Modifiers, Visibility};
pub use span::{Position, Span};
