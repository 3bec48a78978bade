use crate::ast::generate_ast;
use crate::token::Token;
use crate::value::Value;

generate_ast!(
    Expr,
    [
        Assign   => { name: Token, value: Box<Expr> };
        Binary   => { left: Box<Expr>, op: Token, right: Box<Expr> };
        Grouping => { expression: Box<Expr> };
        Literal  => { value: Value };
        Logical  => { left: Box<Expr>, op: Token, right: Box<Expr> };
        Unary    => { op: Token, right: Box<Expr> };
        Variable => { name: Token };
    ]
);

impl Expr {
    pub fn literal<V: Into<Value>>(value: V) -> Self {
        Literal { value: value.into() }.into()
    }
}
