//! A tree-walking interpreter for the statement-and-expression core of Lox:
//! variables, blocks, `if`, `while`, `for` and `print`.
//!
//! Source goes through [`scanner::Scanner`], then [`parser::Parser`], then
//! [`interpreter::Interpreter`]. [`lox::Lox`] strings the three together and
//! keeps the [`diagnostics::Diagnostics`] for the run.
//!
//! ```
//! let (output, diagnostics) = lox_treewalk::run_source("var a = 1; { var a = 2; print a; } print a;");
//! assert_eq!("2\n1\n", output);
//! assert!(!diagnostics.had_error());
//! ```

mod ast;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod expr;
pub mod interpreter;
pub mod lox;
pub mod parser;
pub mod printer;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

pub use crate::error::{Error, Fault, Result};
pub use crate::lox::{run_source, Lox};
