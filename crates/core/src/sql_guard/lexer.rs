//! Minimal PostgreSQL tokenizer.
//!
//! Only as precise as the read-only policy needs: it must never mistake the
//! inside of a literal, quoted identifier or comment for live SQL, and it
//! must refuse input whose quoting it cannot close.

/// A lexical token with its byte offset in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Unquoted identifier or keyword, as written.
    Word(String),
    /// `"..."` identifier with `""` unescaped.
    QuotedIdent(String),
    /// Any string literal (standard, E-string, dollar-quoted).
    StringLit,
    Number,
    /// Positional parameter such as `$1`.
    Param,
    Dot,
    Comma,
    Semicolon,
    LParen,
    RParen,
    /// Any other operator character.
    Operator(char),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    #[error("unterminated string literal at byte {0}")]
    UnterminatedString(usize),
    #[error("unterminated quoted identifier at byte {0}")]
    UnterminatedIdentifier(usize),
    #[error("unterminated block comment at byte {0}")]
    UnterminatedComment(usize),
    #[error("unterminated dollar-quoted string at byte {0}")]
    UnterminatedDollarQuote(usize),
}

struct Lexer<'a> {
    src: &'a str,
    pos: usize,
}

/// Tokenize `sql`, skipping whitespace and comments.
pub fn tokenize(sql: &str) -> Result<Vec<Token>, LexError> {
    let mut lexer = Lexer { src: sql, pos: 0 };
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

impl<'a> Lexer<'a> {
    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn peek_at(&self, n: usize) -> Option<char> {
        self.src[self.pos..].chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn next_token(&mut self) -> Result<Option<Token>, LexError> {
        self.skip_whitespace_and_comments()?;

        let start = self.pos;
        let Some(c) = self.peek() else {
            return Ok(None);
        };

        let kind = match c {
            '\'' => {
                self.lex_string(false)?;
                TokenKind::StringLit
            }
            'E' | 'e' if self.peek_at(1) == Some('\'') => {
                self.bump();
                self.lex_string(true)?;
                TokenKind::StringLit
            }
            'B' | 'b' | 'X' | 'x' | 'N' | 'n' if self.peek_at(1) == Some('\'') => {
                self.bump();
                self.lex_string(false)?;
                TokenKind::StringLit
            }
            '"' => TokenKind::QuotedIdent(self.lex_quoted_ident()?),
            '$' => self.lex_dollar()?,
            '.' if self.peek_at(1).is_some_and(|d| d.is_ascii_digit()) => {
                self.lex_number();
                TokenKind::Number
            }
            '.' => {
                self.bump();
                TokenKind::Dot
            }
            ',' => {
                self.bump();
                TokenKind::Comma
            }
            ';' => {
                self.bump();
                TokenKind::Semicolon
            }
            '(' => {
                self.bump();
                TokenKind::LParen
            }
            ')' => {
                self.bump();
                TokenKind::RParen
            }
            c if c.is_ascii_digit() => {
                self.lex_number();
                TokenKind::Number
            }
            c if c.is_alphabetic() || c == '_' => TokenKind::Word(self.lex_word()),
            other => {
                self.bump();
                TokenKind::Operator(other)
            }
        };

        Ok(Some(Token {
            kind,
            offset: start,
        }))
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexError> {
        loop {
            while self.peek().is_some_and(char::is_whitespace) {
                self.bump();
            }

            if self.peek() == Some('-') && self.peek_at(1) == Some('-') {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
                continue;
            }

            if self.peek() == Some('/') && self.peek_at(1) == Some('*') {
                let start = self.pos;
                self.bump();
                self.bump();
                // PostgreSQL block comments nest.
                let mut depth = 1u32;
                while depth > 0 {
                    match self.bump() {
                        Some('/') if self.peek() == Some('*') => {
                            self.bump();
                            depth += 1;
                        }
                        Some('*') if self.peek() == Some('/') => {
                            self.bump();
                            depth -= 1;
                        }
                        Some(_) => {}
                        None => return Err(LexError::UnterminatedComment(start)),
                    }
                }
                continue;
            }

            return Ok(());
        }
    }

    /// Consume a single-quoted literal starting at the opening quote.
    fn lex_string(&mut self, backslash_escapes: bool) -> Result<(), LexError> {
        let start = self.pos;
        self.bump();
        loop {
            match self.bump() {
                Some('\\') if backslash_escapes => {
                    if self.bump().is_none() {
                        return Err(LexError::UnterminatedString(start));
                    }
                }
                Some('\'') => {
                    if self.peek() == Some('\'') {
                        self.bump();
                    } else {
                        return Ok(());
                    }
                }
                Some(_) => {}
                None => return Err(LexError::UnterminatedString(start)),
            }
        }
    }

    fn lex_quoted_ident(&mut self) -> Result<String, LexError> {
        let start = self.pos;
        self.bump();
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('"') => {
                    if self.peek() == Some('"') {
                        self.bump();
                        name.push('"');
                    } else {
                        return Ok(name);
                    }
                }
                Some(c) => name.push(c),
                None => return Err(LexError::UnterminatedIdentifier(start)),
            }
        }
    }

    /// `$1` parameters and `$tag$ ... $tag$` strings.
    fn lex_dollar(&mut self) -> Result<TokenKind, LexError> {
        let start = self.pos;

        if self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
            return Ok(TokenKind::Param);
        }

        let rest = &self.src[self.pos + 1..];
        let tag_len = rest
            .char_indices()
            .take_while(|(i, c)| {
                if *i == 0 {
                    c.is_alphabetic() || *c == '_'
                } else {
                    c.is_alphanumeric() || *c == '_'
                }
            })
            .map(|(i, c)| i + c.len_utf8())
            .last()
            .unwrap_or(0);

        if !rest[tag_len..].starts_with('$') {
            self.bump();
            return Ok(TokenKind::Operator('$'));
        }

        let delimiter = &self.src[self.pos..self.pos + tag_len + 2];
        let body_start = self.pos + delimiter.len();
        match self.src[body_start..].find(delimiter) {
            Some(end) => {
                self.pos = body_start + end + delimiter.len();
                Ok(TokenKind::StringLit)
            }
            None => Err(LexError::UnterminatedDollarQuote(start)),
        }
    }

    fn lex_number(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '_' {
                self.bump();
            } else if (c == '+' || c == '-')
                && self.src[..self.pos].ends_with(['e', 'E'])
            {
                self.bump();
            } else {
                break;
            }
        }
    }

    fn lex_word(&mut self) -> String {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_alphanumeric() || c == '_' || c == '$')
        {
            self.bump();
        }
        self.src[start..self.pos].to_string()
    }
}
