use crate::{
    diagnostics::Diagnostics,
    error::{Error, Result},
    token::{Token, TokenKind},
};
use peekmore::{PeekMore, PeekMoreIterator};
use phf::phf_map;
use std::str::Chars;

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    "and" => TokenKind::And,
    "class" => TokenKind::Class,
    "else" => TokenKind::Else,
    "false" => TokenKind::False,
    "for" => TokenKind::For,
    "fun" => TokenKind::Fun,
    "if" => TokenKind::If,
    "nil" => TokenKind::Nil,
    "or" => TokenKind::Or,
    "print" => TokenKind::Print,
    "return" => TokenKind::Return,
    "super" => TokenKind::Super,
    "this" => TokenKind::This,
    "true" => TokenKind::True,
    "var" => TokenKind::Var,
    "while" => TokenKind::While,
};

pub struct Scanner<'a> {
    src: PeekMoreIterator<Chars<'a>>,
    lexeme_buffer: String,
    line: usize,
    tokens: Option<Vec<Token>>,
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<Token>;

    /// Yields the next token or lexical error, skipping whitespace and comments.
    /// Does not yield the end-of-file marker; see [`Scanner::scan_tokens`].
    fn next(&mut self) -> Option<Result<Token>> {
        loop {
            self.src.peek()?;

            let kind = self.next_token_kind();
            let lexeme = std::mem::take(&mut self.lexeme_buffer);

            if let Some(kind) = kind {
                let line = self.line;
                return Some(kind.map(|kind| Token { kind, lexeme, line }));
            }
        }
    }
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src: src.chars().peekmore(),
            lexeme_buffer: String::new(),
            line: 1,
            tokens: None,
        }
    }

    /// Scans the whole source once, reporting every lexical error along the way.
    /// Later calls return the same tokens without scanning or reporting again.
    pub fn scan_tokens(&mut self, diagnostics: &mut Diagnostics) -> &[Token] {
        if self.tokens.is_none() {
            let mut tokens = Vec::new();
            while let Some(result) = self.next() {
                match result {
                    Ok(token) => tokens.push(token),
                    Err(e) => diagnostics.report(&e),
                }
            }
            tokens.push(Token::new(TokenKind::EndOfFile, "", self.line));
            tracing::debug!(count = tokens.len(), lines = self.line, "scanned source");
            self.tokens = Some(tokens);
        }
        self.tokens.get_or_insert_with(Vec::new)
    }

    fn next_token_kind(&mut self) -> Option<Result<TokenKind>> {
        let next_char = self.advance()?;

        use TokenKind::*;
        match next_char {
            '(' => Some(Ok(LeftParen)),
            ')' => Some(Ok(RightParen)),
            '{' => Some(Ok(LeftBrace)),
            '}' => Some(Ok(RightBrace)),
            ',' => Some(Ok(Comma)),
            '.' => Some(Ok(Dot)),
            '-' => Some(Ok(Minus)),
            '+' => Some(Ok(Plus)),
            ';' => Some(Ok(Semicolon)),
            '*' => Some(Ok(Star)),
            '!' => Some(Ok(if self.does_next_match('=') { BangEqual } else { Bang })),
            '=' => Some(Ok(if self.does_next_match('=') { EqualEqual } else { Equal })),
            '<' => Some(Ok(if self.does_next_match('=') { LessEqual } else { Less })),
            '>' => Some(Ok(if self.does_next_match('=') { GreaterEqual } else { Greater })),
            '/' => {
                if self.does_next_match('/') { // is this a comment?
                    self.advance_until_match('\n');
                    None
                } else {
                    Some(Ok(Slash))
                }
            },
            ' ' | '\r' | '\t' => None,
            '\n' => {
                self.line += 1;
                None
            },
            '"' => Some(self.extract_string()),
            c if c.is_ascii_digit() => Some(self.extract_number()),
            c if can_start_identifier(&c) => Some(Ok(self.extract_identifier())),
            c => Some(Err(Error::lexical(self.line, format!("Unexpected character '{}'.", c)))),
        }
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.src.next()?;
        self.lexeme_buffer.push(c);
        Some(c)
    }

    fn does_next_match(&mut self, c: char) -> bool {
        if self.src.peek() == Some(&c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn extract_string(&mut self) -> Result<TokenKind> {
        let mut newline_count = 0;
        self.advance_until_match_for_each('"', |c| if c == '\n' { newline_count += 1 });
        self.line += newline_count;

        if self.advance().is_none() {
            return Err(Error::lexical(self.line, "Unterminated string."));
        }

        let contents = self.lexeme_buffer
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .unwrap_or_default();
        Ok(TokenKind::String(contents.to_string()))
    }

    fn extract_number(&mut self) -> Result<TokenKind> {
        self.advance_until(|n| !n.is_ascii_digit());

        // The dot belongs to the number only when a digit follows it.
        let has_fraction = self.src.peek() == Some(&'.')
            && self.src.peek_nth(1).map_or(false, |c| c.is_ascii_digit());
        if has_fraction {
            self.advance();
            self.advance_until(|n| !n.is_ascii_digit());
        }

        match self.lexeme_buffer.parse() {
            Err(_) => Err(Error::lexical(
                self.line,
                format!("Could not convert {} into a number.", self.lexeme_buffer)
            )),
            Ok(number) => Ok(TokenKind::Number(number)),
        }
    }

    fn extract_identifier(&mut self) -> TokenKind {
        self.advance_until(|n| !is_part_of_valid_identifier(n));

        match KEYWORDS.get(self.lexeme_buffer.as_str()) {
            Some(keyword) => keyword.clone(),
            None => TokenKind::Identifier,
        }
    }

    fn advance_until_match(&mut self, c: char) {
        self.advance_until(|n| n == &c)
    }

    fn advance_until(&mut self, should_stop: impl Fn(&char) -> bool) {
        self.advance_until_for_each(should_stop, |_| {})
    }

    fn advance_until_match_for_each(&mut self, c: char, f: impl FnMut(char)) {
        self.advance_until_for_each(|n| n == &c, f);
    }

    fn advance_until_for_each(
        &mut self,
        should_stop: impl Fn(&char) -> bool,
        mut f: impl FnMut(char),
    ) {
        while let Some(&next) = self.src.peek() {
            if should_stop(&next) { break }
            self.advance();
            f(next);
        }
    }
}

fn can_start_identifier(c: &char) -> bool {
    c.is_ascii_alphabetic()
}

fn is_part_of_valid_identifier(c: &char) -> bool {
    can_start_identifier(c) || c.is_ascii_digit()
}
