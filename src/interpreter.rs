use std::{
    cell::RefCell,
    io::Write,
    rc::Rc,
};

use crate::{
    environment::Environment,
    error::{Error, Result},
    expr::{self, Expr},
    stmt::{self, Stmt},
    token::{Token, TokenKind},
    value::Value,
};

pub struct Interpreter<W> {
    environment: Rc<RefCell<Environment>>,
    writer: W,
}

impl<W: Write> Interpreter<W> {
    pub fn new(writer: W) -> Self {
        let environment = Rc::new(RefCell::new(Environment::new()));
        Interpreter { environment, writer }
    }

    /// Runs the statements in order. The first runtime error stops the run and
    /// is returned; statements after it are not executed.
    #[tracing::instrument(level = "debug", skip_all, fields(statements = statements.len()))]
    pub fn interpret(&mut self, statements: &[Stmt]) -> Result<()> {
        for s in statements.iter() {
            self.execute(s)?;
        }
        Ok(())
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn execute(&mut self, s: &Stmt) -> Result<()> {
        match s {
            Stmt::Block(b) => self.execute_block(&b.statements),
            Stmt::Expression(e) => {
                self.evaluate(&e.expression)?;
                Ok(())
            },
            Stmt::If(i) => self.execute_if(i),
            Stmt::Print(p) => {
                let value = self.evaluate(&p.expression)?;
                writeln!(self.writer, "{}", value)?;
                Ok(())
            },
            Stmt::Var(v) => {
                let value = match &v.initializer {
                    Some(initializer) => self.evaluate(initializer)?,
                    None => Value::Nil,
                };
                self.environment.borrow_mut().declare(v.name.lexeme.clone(), value);
                Ok(())
            },
            Stmt::While(w) => {
                while self.evaluate(&w.condition)?.is_truthy() {
                    self.execute(&w.body)?;
                }
                Ok(())
            },
        }
    }

    fn execute_if(&mut self, i: &stmt::If) -> Result<()> {
        if self.evaluate(&i.condition)?.is_truthy() {
            self.execute(&i.then_branch)?;
        } else if let Some(else_branch) = &i.else_branch {
            self.execute(else_branch)?;
        }
        Ok(())
    }

    /// Runs `statements` in a fresh child scope. The enclosing scope is put back
    /// whether the block finishes or fails.
    fn execute_block(&mut self, statements: &[Stmt]) -> Result<()> {
        let child = Rc::new(RefCell::new(Environment::from(&self.environment)));
        let previous = std::mem::replace(&mut self.environment, child);
        tracing::trace!("entered block scope");

        let result = statements.iter().try_for_each(|s| self.execute(s));

        self.environment = previous;
        tracing::trace!(ok = result.is_ok(), "left block scope");
        result
    }

    fn evaluate(&mut self, e: &Expr) -> Result<Value> {
        match e {
            Expr::Assign(a) => {
                let value = self.evaluate(&a.value)?;
                self.environment.borrow_mut().assign(&a.name, value.clone())?;
                Ok(value)
            },
            Expr::Binary(b) => self.evaluate_binary(b),
            Expr::Grouping(g) => self.evaluate(&g.expression),
            Expr::Literal(l) => Ok(l.value.clone()),
            Expr::Logical(l) => self.evaluate_logical(l),
            Expr::Unary(u) => self.evaluate_unary(u),
            Expr::Variable(v) => self.environment.borrow().get(&v.name),
        }
    }

    fn evaluate_binary(&mut self, e: &expr::Binary) -> Result<Value> {
        let left = self.evaluate(&e.left)?;
        let right = self.evaluate(&e.right)?;

        use Value::{Bool, Number, String};
        match &e.op.kind {
            TokenKind::Minus => compute_if_numbers(&e.op, left, right, |l, r| l - r),
            TokenKind::Plus => match (left, right) {
                (Number(left), Number(right)) => Ok(Number(left + right)),
                (String(mut left), String(right)) => {
                    left.push_str(&right);
                    Ok(String(left))
                },
                _ => Err(Error::type_error(e.op.clone(), "Operands must be two numbers or two strings.")),
            },
            TokenKind::Slash => compute_if_numbers(&e.op, left, right, |l, r| l / r),
            TokenKind::Star => compute_if_numbers(&e.op, left, right, |l, r| l * r),
            TokenKind::Greater => compute_if_numbers(&e.op, left, right, |l, r| l > r),
            TokenKind::GreaterEqual => compute_if_numbers(&e.op, left, right, |l, r| l >= r),
            TokenKind::Less => compute_if_numbers(&e.op, left, right, |l, r| l < r),
            TokenKind::LessEqual => compute_if_numbers(&e.op, left, right, |l, r| l <= r),
            TokenKind::EqualEqual => Ok(Bool(left.is_equal(&right))),
            TokenKind::BangEqual => Ok(Bool(!left.is_equal(&right))),
            _ => Err(Error::type_error(e.op.clone(), "Unknown binary operator.")),
        }
    }

    /// Returns one of the operands as-is; the right one is only evaluated when needed.
    fn evaluate_logical(&mut self, e: &expr::Logical) -> Result<Value> {
        let left = self.evaluate(&e.left)?;

        match (&e.op.kind, left.is_truthy()) {
            (TokenKind::Or, true) | (TokenKind::And, false) => Ok(left),
            (TokenKind::Or, false) | (TokenKind::And, true) => self.evaluate(&e.right),
            _ => Err(Error::type_error(e.op.clone(), "Unknown logical operator.")),
        }
    }

    fn evaluate_unary(&mut self, e: &expr::Unary) -> Result<Value> {
        let right = self.evaluate(&e.right)?;

        use Value::*;
        match (&e.op.kind, right) {
            (TokenKind::Minus, Number(right)) => Ok(Number(-right)),
            (TokenKind::Minus, _) => Err(Error::type_error(e.op.clone(), "Operand must be a number.")),
            (TokenKind::Bang, right) => Ok(Bool(!right.is_truthy())),
            _ => Err(Error::type_error(e.op.clone(), "Unknown unary operator.")),
        }
    }
}

fn compute_if_numbers<T: Into<Value>>(
    op: &Token,
    left: Value,
    right: Value,
    f: impl Fn(f64, f64) -> T
) -> Result<Value> {
    match (left, right) {
        (Value::Number(left), Value::Number(right)) => Ok(f(left, right).into()),
        _ => Err(Error::type_error(op.clone(), "Operands must be numbers.")),
    }
}
