use crate::{
    expr::Expr,
    stmt::Stmt,
    value::Value,
};

/// Renders an expression in parenthesised prefix form, e.g. `(* (- 123) (group 45.67))`.
pub fn print(e: &Expr) -> String {
    match e {
        Expr::Assign(a) => parenthesize("=", &[variable(&a.name.lexeme), print(&a.value)]),
        Expr::Binary(b) => parenthesize(&b.op.lexeme, &[print(&b.left), print(&b.right)]),
        Expr::Grouping(g) => parenthesize("group", &[print(&g.expression)]),
        Expr::Literal(l) => literal(&l.value),
        Expr::Logical(l) => parenthesize(&l.op.lexeme, &[print(&l.left), print(&l.right)]),
        Expr::Unary(u) => parenthesize(&u.op.lexeme, &[print(&u.right)]),
        Expr::Variable(v) => variable(&v.name.lexeme),
    }
}

pub fn print_stmt(s: &Stmt) -> String {
    match s {
        Stmt::Block(b) => {
            let statements: Vec<String> = b.statements.iter().map(print_stmt).collect();
            parenthesize("block", &statements)
        },
        Stmt::Expression(e) => parenthesize(";", &[print(&e.expression)]),
        Stmt::If(i) => {
            let mut parts = vec![print(&i.condition), print_stmt(&i.then_branch)];
            if let Some(else_branch) = &i.else_branch {
                parts.push(print_stmt(else_branch));
            }
            parenthesize("if", &parts)
        },
        Stmt::Print(p) => parenthesize("print", &[print(&p.expression)]),
        Stmt::Var(v) => {
            let mut parts = vec![variable(&v.name.lexeme)];
            if let Some(initializer) = &v.initializer {
                parts.push(print(initializer));
            }
            parenthesize("var", &parts)
        },
        Stmt::While(w) => parenthesize("while", &[print(&w.condition), print_stmt(&w.body)]),
    }
}

fn parenthesize(name: &str, parts: &[String]) -> String {
    let mut s = String::new();
    s.push('(');
    s.push_str(name);

    for part in parts.iter() {
        s.push(' ');
        s.push_str(part);
    }

    s.push(')');
    s
}

fn variable(name: &str) -> String {
    name.to_string()
}

fn literal(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{:?}", s),
        other => other.to_string(),
    }
}
