//! Tokenizer for template source text.

use crate::error::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Colon,
    Semicolon,
    Dot,
    Eq,
    Ident(String),
    Str(String),
    Number(serde_json::Number),
    Eof,
}

impl TokenKind {
    pub fn describe(&self) -> String {
        match self {
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::LParen => "'('".to_string(),
            TokenKind::RParen => "')'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::Colon => "':'".to_string(),
            TokenKind::Semicolon => "';'".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Eof => "end of template".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
    text: &'a str,
    line: usize,
    column: usize,
}

/// Split template text into tokens. `//` starts a comment running to end of line.
pub fn tokenize(text: &str) -> Result<Vec<Token>, TemplateError> {
    let mut lexer = Lexer {
        chars: text.char_indices().peekable(),
        text,
        line: 1,
        column: 1,
    };
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

impl<'a> Lexer<'a> {
    fn bump(&mut self) -> Option<(usize, char)> {
        let next = self.chars.next();
        if let Some((_, c)) = next {
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
        next
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|(_, c)| *c)
    }

    fn error(&self, line: usize, column: usize, message: impl Into<String>) -> TemplateError {
        TemplateError::Syntax {
            line,
            column,
            message: message.into(),
        }
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    if matches!(ahead.peek(), Some((_, '/'))) {
                        while let Some(c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.bump();
                        }
                    } else {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Result<Token, TemplateError> {
        self.skip_trivia();
        let (line, column) = (self.line, self.column);
        let Some((start, c)) = self.bump() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                line,
                column,
            });
        };

        let kind = match c {
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '=' => TokenKind::Eq,
            '"' => self.string(start, line, column)?,
            c if c == '-' || c.is_ascii_digit() => self.number(start, line, column)?,
            c if c.is_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some(next) = self.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        end += next.len_utf8();
                        self.bump();
                    } else {
                        break;
                    }
                }
                TokenKind::Ident(self.text[start..end].to_string())
            }
            other => {
                return Err(self.error(line, column, format!("unexpected character '{}'", other)))
            }
        };

        Ok(Token { kind, line, column })
    }

    /// JSON string literal; escapes are decoded by serde_json.
    fn string(&mut self, start: usize, line: usize, column: usize) -> Result<TokenKind, TemplateError> {
        loop {
            match self.bump() {
                Some((_, '\\')) => {
                    self.bump();
                }
                Some((end, '"')) => {
                    let raw = &self.text[start..=end];
                    return serde_json::from_str::<String>(raw)
                        .map(TokenKind::Str)
                        .map_err(|e| self.error(line, column, format!("invalid string: {}", e)));
                }
                Some(_) => {}
                None => return Err(self.error(line, column, "unterminated string")),
            }
        }
    }

    fn number(&mut self, start: usize, line: usize, column: usize) -> Result<TokenKind, TemplateError> {
        let mut end = start + 1;
        while let Some(next) = self.peek() {
            if next.is_ascii_digit() || matches!(next, '.' | 'e' | 'E' | '+' | '-') {
                end += 1;
                self.bump();
            } else {
                break;
            }
        }
        let raw = &self.text[start..end];
        serde_json::from_str::<serde_json::Number>(raw)
            .map(TokenKind::Number)
            .map_err(|_| self.error(line, column, format!("invalid number '{}'", raw)))
    }
}
