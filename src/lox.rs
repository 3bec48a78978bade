use std::io::Write;

use crate::{
    diagnostics::Diagnostics,
    interpreter::Interpreter,
    parser::Parser,
    scanner::Scanner,
    stmt::Stmt,
};

/// One interpreter session. Variables declared by one [`Lox::run`] stay visible
/// to the next, which is what the prompt relies on.
pub struct Lox<W> {
    interpreter: Interpreter<W>,
    diagnostics: Diagnostics,
}

impl<W: Write> Lox<W> {
    pub fn new(writer: W) -> Self {
        Self {
            interpreter: Interpreter::new(writer),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Scans and parses `source`, reporting compile-time errors.
    pub fn parse(&mut self, source: &str) -> Vec<Stmt> {
        let mut scanner = Scanner::new(source);
        let tokens = scanner.scan_tokens(&mut self.diagnostics).iter().cloned();
        Parser::new(tokens).parse(&mut self.diagnostics)
    }

    /// Runs `source` to completion. Nothing executes if it has a compile-time
    /// error; a runtime error stops execution at the failing statement. Either
    /// way the outcome is left in [`Lox::diagnostics`].
    #[tracing::instrument(level = "debug", skip_all, fields(bytes = source.len()))]
    pub fn run(&mut self, source: &str) {
        let statements = self.parse(source);
        if self.diagnostics.had_error() {
            tracing::debug!("compile errors recorded, skipping execution");
            return;
        }

        if let Err(e) = self.interpreter.interpret(&statements) {
            self.diagnostics.report(&e);
        }
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Clears both error flags, e.g. between prompt lines.
    pub fn reset_diagnostics(&mut self) {
        self.diagnostics.reset();
    }

    pub fn into_writer(self) -> W {
        self.interpreter.into_writer()
    }
}

/// Runs `source` in a fresh session, returning what it printed and its diagnostics.
pub fn run_source(source: &str) -> (String, Diagnostics) {
    let mut lox = Lox::new(Vec::new());
    lox.run(source);
    let Lox { interpreter, diagnostics } = lox;
    let output = String::from_utf8_lossy(&interpreter.into_writer()).into_owned();
    (output, diagnostics)
}
