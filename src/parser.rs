use std::iter::Peekable;

use crate::{
    diagnostics::Diagnostics,
    error::{Error, Result},
    expr::{self, Expr},
    stmt::{self, Stmt},
    token::*,
    value::Value,
};

const EQUALITY_TOKENS: &[&TokenKind] = &[
    &TokenKind::BangEqual,
    &TokenKind::EqualEqual,
];

const COMPARISON_TOKENS: &[&TokenKind] = &[
    &TokenKind::Greater,
    &TokenKind::GreaterEqual,
    &TokenKind::Less,
    &TokenKind::LessEqual,
];

const TERM_TOKENS: &[&TokenKind] = &[
    &TokenKind::Minus,
    &TokenKind::Plus,
];

const FACTOR_TOKENS: &[&TokenKind] = &[
    &TokenKind::Star,
    &TokenKind::Slash,
];

const UNARY_TOKENS: &[&TokenKind] = &[
    &TokenKind::Bang,
    &TokenKind::Minus,
];

/// Deepest expression nesting accepted before the parser gives up, so that
/// pathological input is reported instead of exhausting the stack.
const MAX_NESTING: usize = 100;

pub struct Parser<T> {
    tokens: T,
    errors: Vec<Error>,
    depth: usize,
}

impl<T: Iterator<Item = Token>> Parser<Peekable<T>> {
    pub fn new(tokens: T) -> Self {
        let tokens = tokens.peekable();
        Parser { tokens, errors: Vec::new(), depth: 0 }
    }

    /// Parses every declaration up to end of file. Declarations that fail to parse
    /// are left out of the result; their errors go to `diagnostics` in source order.
    pub fn parse(&mut self, diagnostics: &mut Diagnostics) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        tracing::debug!(statements = statements.len(), errors = self.errors.len(), "parsed program");
        for e in self.errors.drain(..) {
            diagnostics.report(&e);
        }
        statements
    }

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.match_single(&TokenKind::Var).is_some() {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(statement) => Some(statement),
            Err(e) => {
                tracing::trace!(error = %e, "synchronising after parse error");
                self.errors.push(e);
                self.synchronise();
                None
            },
        }
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name = self.consume(&TokenKind::Identifier, "Expected variable name.")?;

        let initializer = if self.match_single(&TokenKind::Equal).is_some() {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(&TokenKind::Semicolon, "Expected ';' after variable declaration.")?;
        Ok(stmt::Var { name, initializer }.into())
    }

    fn statement(&mut self) -> Result<Stmt> {
        if self.match_single(&TokenKind::For).is_some() {
            self.for_statement()
        } else if self.match_single(&TokenKind::If).is_some() {
            self.if_statement()
        } else if self.match_single(&TokenKind::Print).is_some() {
            self.print_statement()
        } else if self.match_single(&TokenKind::While).is_some() {
            self.while_statement()
        } else if self.match_single(&TokenKind::LeftBrace).is_some() {
            Ok(stmt::Block { statements: self.block()? }.into())
        } else {
            self.expression_statement()
        }
    }

    /// `for` has no node of its own: it becomes an optional initializer and a
    /// `while` loop whose body runs the increment after the loop body.
    fn for_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'for'.")?;

        let initializer = if self.match_single(&TokenKind::Semicolon).is_some() {
            None
        } else if self.match_single(&TokenKind::Var).is_some() {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if !self.check_next(&TokenKind::Semicolon) {
            self.expression()?
        } else { Expr::literal(true) };

        self.consume(&TokenKind::Semicolon, "Expected ';' after loop condition.")?;

        let increment = if !self.check_next(&TokenKind::RightParen) {
            Some(Stmt::from(stmt::Expression { expression: self.expression()? }))
        } else { None };

        self.consume(&TokenKind::RightParen, "Expected ')' after for clauses.")?;

        let body = self.statement()?;
        let body = Box::new(match increment {
            Some(i) => stmt::Block { statements: vec![body, i] }.into(),
            None => body,
        });
        let while_loop = Stmt::from(stmt::While { condition, body });
        let while_loop = match initializer {
            Some(i) => stmt::Block { statements: vec![i, while_loop] }.into(),
            None => while_loop,
        };

        Ok(while_loop)
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "Expected ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.match_single(&TokenKind::Else).is_some() {
            Some(Box::new(self.statement()?))
        } else { None };

        Ok(stmt::If { condition, then_branch, else_branch }.into())
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let expression = self.expression()?;
        self.consume(&TokenKind::Semicolon, "Expected ';' after value.")?;
        Ok(stmt::Print { expression }.into())
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(&TokenKind::LeftParen, "Expected '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(&TokenKind::RightParen, "Expected ')' after condition.")?;
        let body = Box::new(self.statement()?);

        Ok(stmt::While { condition, body }.into())
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expression = self.expression()?;
        self.consume(&TokenKind::Semicolon, "Expected ';' after expression.")?;
        Ok(stmt::Expression { expression }.into())
    }

    /// Errors inside the block are recovered per declaration, so one bad line
    /// does not throw away the rest of the block.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements = Vec::new();

        while !self.check_next(&TokenKind::RightBrace) && !self.is_at_end() {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }

        self.consume(&TokenKind::RightBrace, "Expected '}' after block.")?;
        Ok(statements)
    }

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        let target = self.or()?;
        if let Some(equals) = self.match_single(&TokenKind::Equal) {
            if let Expr::Variable(lhs) = target {
                let value = Box::new(self.nested(Self::assignment)?);
                Ok(expr::Assign { name: lhs.name, value }.into())
            } else {
                Err(Error::syntactic(equals, "Invalid assignment target."))
            }
        } else {
            Ok(target)
        }
    }

    fn or(&mut self) -> Result<Expr> {
        self.match_logical_precedence(Self::and, &TokenKind::Or)
    }

    fn and(&mut self) -> Result<Expr> {
        self.match_logical_precedence(Self::equality, &TokenKind::And)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::comparison,
            EQUALITY_TOKENS
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::term,
            COMPARISON_TOKENS
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::factor,
            TERM_TOKENS
        )
    }

    fn factor(&mut self) -> Result<Expr> {
        self.match_binary_precedence_with_tokens(
            Self::unary,
            FACTOR_TOKENS
        )
    }

    fn unary(&mut self) -> Result<Expr> {
        if let Some(token) = self.match_any(UNARY_TOKENS) {
            let right = Box::new(self.nested(Self::unary)?);
            Ok(expr::Unary { op: token, right }.into())
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let kind = match self.tokens.peek() {
            Some(next) => next.kind.clone(),
            None => return Err(Error::lexical(0, "Unexpected end of input.")),
        };

        let literal = match kind {
            TokenKind::True => Value::Bool(true),
            TokenKind::False => Value::Bool(false),
            TokenKind::Nil => Value::Nil,
            TokenKind::Number(n) => Value::Number(n),
            TokenKind::String(s) => Value::String(s),
            TokenKind::Identifier => {
                let name = self.advance()?;
                return Ok(expr::Variable { name }.into())
            },
            TokenKind::LeftParen => {
                self.advance()?;
                let expression = Box::new(self.nested(Self::expression)?);
                self.consume(&TokenKind::RightParen, "Expected ')' after expression.")?;
                return Ok(expr::Grouping { expression }.into())
            },
            _ => return Err(self.error_at_next("Expected expression.")),
        };

        self.advance()?;
        Ok(Expr::literal(literal))
    }

    fn is_at_end(&mut self) -> bool {
        self.tokens.peek().map_or(true, Token::is_eof)
    }

    fn check_next(&mut self, kind: &TokenKind) -> bool {
        self.tokens.peek()
            .map(|t| &t.kind == kind)
            .unwrap_or(false)
    }

    /// Takes the next token. The end-of-file marker is never consumed.
    fn advance(&mut self) -> Result<Token> {
        if self.is_at_end() {
            Err(self.error_at_next("Unexpected end of file."))
        } else {
            self.tokens.next().ok_or_else(|| Error::lexical(0, "Unexpected end of input."))
        }
    }

    fn consume(&mut self, kind: &TokenKind, error_msg: &str) -> Result<Token> {
        match self.match_single(kind) {
            Some(token) => Ok(token),
            None => Err(self.error_at_next(error_msg)),
        }
    }

    /// Builds an error pointing at the next token without consuming it.
    fn nested<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at_next("Expression nested too deeply."));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn error_at_next(&mut self, message: &str) -> Error {
        match self.tokens.peek() {
            Some(token) => Error::syntactic(token.clone(), message),
            None => Error::lexical(0, "Unexpected end of input."),
        }
    }

    fn match_binary_precedence_with_tokens(
        &mut self,
        parse: impl Fn(&mut Self) -> Result<Expr>,
        kinds: &[&TokenKind]
    ) -> Result<Expr> {
        let mut e = parse(self)?;

        while let Some(token) = self.match_any(kinds) {
            let right = Box::new(parse(self)?);
            e = expr::Binary { left: Box::new(e), op: token, right }.into();
        }

        Ok(e)
    }

    fn match_logical_precedence(
        &mut self,
        parse: impl Fn(&mut Self) -> Result<Expr>,
        kind: &TokenKind
    ) -> Result<Expr> {
        let mut e = parse(self)?;

        while let Some(op) = self.match_single(kind) {
            let right = Box::new(parse(self)?);
            e = expr::Logical { left: Box::new(e), op, right }.into();
        }

        Ok(e)
    }

    fn match_single(&mut self, kind: &TokenKind) -> Option<Token> {
        if self.check_next(kind) {
            self.tokens.next()
        } else {
            None
        }
    }

    fn match_any(&mut self, kinds: &[&TokenKind]) -> Option<Token> {
        kinds.iter().find_map(|k| self.match_single(k))
    }

    /// Discards tokens until just past a `;` or just before a keyword that starts
    /// a statement, so one mistake produces one error.
    fn synchronise(&mut self) {
        while let Ok(token) = self.advance() {
            if token.kind == TokenKind::Semicolon { break }

            if self.tokens.peek().map_or(false, |next| next.kind.starts_statement()) {
                break
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::printer;
    use crate::scanner::Scanner;
    use pretty_assertions::assert_eq;

    fn assert_tokens_parse_to_expr(tokens: Vec<Token>, expected: Expr) -> Result<()> {
        let mut parser = Parser::new(tokens.into_iter());
        let parsed = parser.expression()?;
        assert_eq!(expected, parsed);
        Ok(())
    }

    fn parse_source(src: &str) -> (Vec<Stmt>, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(src).scan_tokens(&mut diagnostics).to_vec();
        let statements = Parser::new(tokens.into_iter()).parse(&mut diagnostics);
        (statements, diagnostics)
    }

    fn printed(src: &str) -> Vec<String> {
        let (statements, diagnostics) = parse_source(src);
        assert!(!diagnostics.had_error(), "unexpected errors: {:?}", diagnostics.reports());
        statements.iter().map(printer::print_stmt).collect()
    }

    fn report_texts(diagnostics: &Diagnostics) -> Vec<String> {
        diagnostics.reports().iter().map(|r| r.text.clone()).collect()
    }

    #[test]
    fn string_literal_token() -> Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token::make(TokenKind::String("abc".into())),
                Token::make(TokenKind::EndOfFile),
            ],
            Expr::literal("abc")
        )
    }

    #[test]
    fn number_literal_token() -> Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token::make(TokenKind::Number(5.1)),
                Token::make(TokenKind::EndOfFile),
            ],
            Expr::literal(5.1)
        )
    }

    #[test]
    fn nil_literal_token() -> Result<()> {
        assert_tokens_parse_to_expr(
            vec![
                Token::make(TokenKind::Nil),
                Token::make(TokenKind::EndOfFile),
            ],
            Expr::literal(Value::Nil)
        )
    }

    #[test]
    fn bool_literal_tokens() -> Result<()> {
        for (kind, expected) in [(TokenKind::True, true), (TokenKind::False, false)].iter() {
            assert_tokens_parse_to_expr(
                vec![
                    Token::make(kind.clone()),
                    Token::make(TokenKind::EndOfFile),
                ],
                Expr::literal(*expected)
            )?;
        }
        Ok(())
    }

    #[test]
    fn unary_op_tokens() -> Result<()> {
        let not = Token::make(TokenKind::Bang);
        assert_tokens_parse_to_expr(
            vec![
                not.clone(),
                Token::make(TokenKind::True),
                Token::make(TokenKind::EndOfFile),
            ],
            expr::Unary { op: not, right: Box::new(Expr::literal(true)) }.into()
        )
    }

    #[test]
    fn equal_precedence_operators_fold_left() {
        assert_eq!(vec!["(; (- (- a b) c))"], printed("a - b - c;"));
        assert_eq!(vec!["(; (/ (* a b) c))"], printed("a * b / c;"));
    }

    #[test]
    fn precedence_climbs_from_or_to_unary() {
        assert_eq!(
            vec!["(; (or a (and b (== c (< d (+ e (* f (- g))))))))"],
            printed("a or b and c == d < e + f * -g;")
        );
    }

    #[test]
    fn assignment_is_right_associative() {
        assert_eq!(vec!["(; (= a (= b 1)))"], printed("a = b = 1;"));
    }

    #[test]
    fn grouping_overrides_precedence() {
        assert_eq!(vec!["(print (* (group (+ 1 2)) 3))"], printed("print (1 + 2) * 3;"));
    }

    #[test]
    fn var_declarations_with_and_without_initializer() {
        assert_eq!(vec!["(var a)", "(var b \"x\")"], printed("var a; var b = \"x\";"));
    }

    #[test]
    fn else_binds_to_nearest_if() {
        assert_eq!(
            vec!["(if a (if b (print 1) (print 2)))"],
            printed("if (a) if (b) print 1; else print 2;")
        );
    }

    #[test]
    fn for_loop_desugars_to_block_and_while() {
        assert_eq!(
            vec!["(block (var i 0) (while (< i 3) (block (print i) (; (= i (+ i 1))))))"],
            printed("for (var i = 0; i < 3; i = i + 1) print i;")
        );
    }

    #[test]
    fn for_loop_without_clauses_loops_forever_on_true() {
        assert_eq!(vec!["(while true (print 1))"], printed("for (;;) print 1;"));
    }

    #[test]
    fn for_loop_with_expression_initializer() {
        assert_eq!(
            vec!["(block (; (= i 0)) (while (< i 1) (print i)))"],
            printed("for (i = 0; i < 1;) print i;")
        );
    }

    #[test]
    fn invalid_assignment_target_is_reported_and_parsing_continues() {
        let (statements, diagnostics) = parse_source("1 = 2; print 3;");
        assert!(diagnostics.had_error());
        assert_eq!(vec!["error: [line 1] at '=': Invalid assignment target."], report_texts(&diagnostics));
        assert_eq!(vec!["(print 3)"], statements.iter().map(printer::print_stmt).collect::<Vec<_>>());
    }

    #[test]
    fn grouped_variable_is_not_an_assignment_target() {
        let (_, diagnostics) = parse_source("(a) = 1;");
        assert_eq!(vec!["error: [line 1] at '=': Invalid assignment target."], report_texts(&diagnostics));
    }

    #[test]
    fn missing_expression_points_at_the_token() {
        let (_, diagnostics) = parse_source("print ;");
        assert_eq!(vec!["error: [line 1] at ';': Expected expression."], report_texts(&diagnostics));
    }

    #[test]
    fn missing_semicolon_at_end_of_file() {
        let (statements, diagnostics) = parse_source("print 1");
        assert!(statements.is_empty());
        assert_eq!(vec!["error: [line 1] at end: Expected ';' after value."], report_texts(&diagnostics));
    }

    #[test]
    fn synchronise_reports_each_bad_statement_once() {
        let (statements, diagnostics) = parse_source(
            "var = 1;\nprint 2;\nvar x = ;\nprint x + 1 ) 2;\nprint 4;"
        );
        assert_eq!(
            vec![
                "error: [line 1] at '=': Expected variable name.",
                "error: [line 3] at ';': Expected expression.",
                "error: [line 4] at ')': Expected ';' after value.",
            ],
            report_texts(&diagnostics)
        );
        assert_eq!(
            vec!["(print 2)", "(print 4)"],
            statements.iter().map(printer::print_stmt).collect::<Vec<_>>()
        );
    }

    #[test]
    fn synchronise_stops_before_statement_keyword() {
        let (statements, diagnostics) = parse_source("1 + ; print \"ok\";");
        assert_eq!(1, diagnostics.reports().len());
        assert_eq!(vec!["(print \"ok\")"], statements.iter().map(printer::print_stmt).collect::<Vec<_>>());
    }

    #[test]
    fn errors_inside_blocks_recover_within_the_block() {
        let (statements, diagnostics) = parse_source("{ print ; print 1; }\nprint 2;");
        assert_eq!(1, diagnostics.reports().len());
        assert_eq!(
            vec!["(block (print 1))", "(print 2)"],
            statements.iter().map(printer::print_stmt).collect::<Vec<_>>()
        );
    }

    #[test]
    fn unclosed_block_reports_at_end() {
        let (_, diagnostics) = parse_source("{ print 1;");
        assert_eq!(vec!["error: [line 1] at end: Expected '}' after block."], report_texts(&diagnostics));
    }

    #[test]
    fn unsupported_keywords_are_parse_errors() {
        let (statements, diagnostics) = parse_source("fun f() {}\nprint 1;");
        assert!(diagnostics.had_error());
        assert_eq!(vec!["(print 1)"], statements.iter().map(printer::print_stmt).collect::<Vec<_>>());
    }

    #[test]
    fn deeply_nested_groupings_are_reported() {
        let src = format!("print {}1{};\nprint 2;", "(".repeat(5000), ")".repeat(5000));
        let (statements, diagnostics) = parse_source(&src);
        assert_eq!(vec!["error: [line 1] at '(': Expression nested too deeply."], report_texts(&diagnostics));
        assert_eq!(vec!["(print 2)"], statements.iter().map(printer::print_stmt).collect::<Vec<_>>());
    }

    #[test]
    fn deeply_nested_unary_operators_are_reported() {
        let src = format!("print {}1;", "-".repeat(5000));
        let (statements, diagnostics) = parse_source(&src);
        assert_eq!(vec!["error: [line 1] at '-': Expression nested too deeply."], report_texts(&diagnostics));
        assert!(statements.is_empty());
    }

    #[test]
    fn moderate_nesting_still_parses() {
        let src = format!("print {}1{};", "(".repeat(50), ")".repeat(50));
        let (statements, diagnostics) = parse_source(&src);
        assert!(!diagnostics.had_error());
        assert_eq!(1, statements.len());
    }

    #[test]
    fn synchronise_skips_past_the_token_in_error() {
        let (statements, diagnostics) = parse_source("var x = 1 print ;\nprint 2;");
        assert_eq!(
            vec!["error: [line 1] at 'print': Expected ';' after variable declaration."],
            report_texts(&diagnostics)
        );
        assert_eq!(vec!["(print 2)"], statements.iter().map(printer::print_stmt).collect::<Vec<_>>());
    }

    impl Token {
        fn make(kind: TokenKind) -> Token {
            Token { kind, lexeme: "".into(), line: 0 }
        }
    }
}
