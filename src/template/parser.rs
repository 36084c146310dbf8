//! Recursive-descent parser producing the template AST.
//!
//! Every restriction that can be checked statically is checked here, so a
//! binding with a misused helper fails when the dispatch table is loaded
//! rather than on the first request that reaches it.

use crate::error::TemplateError;
use crate::template::ast::{Block, Conditional, Expr, Helper, Item, PathRef, Root};
use crate::template::lexer::{tokenize, Token, TokenKind};
use crate::template::TemplateKind;
use crate::value::Value;

pub fn parse(text: &str, kind: TemplateKind) -> Result<Vec<Item>, TemplateError> {
    let mut parser = Parser {
        tokens: tokenize(text)?,
        pos: 0,
        kind,
    };
    let items = parser.items()?;
    match &parser.peek().kind {
        TokenKind::Eof => Ok(items),
        other => Err(parser.error_here(format!("unexpected {}", other.describe()))),
    }
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    kind: TemplateKind,
}

impl Parser {
    fn peek(&self) -> &Token {
        // tokenize always terminates the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_second(&self) -> &TokenKind {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn error_here(&self, message: impl Into<String>) -> TemplateError {
        let token = self.peek();
        TemplateError::Syntax {
            line: token.line,
            column: token.column,
            message: message.into(),
        }
    }

    fn expect(&mut self, expected: TokenKind) -> Result<Token, TemplateError> {
        if self.peek().kind == expected {
            Ok(self.advance())
        } else {
            Err(self.error_here(format!(
                "expected {}, found {}",
                expected.describe(),
                self.peek().kind.describe()
            )))
        }
    }

    fn expect_ident(&mut self) -> Result<String, TemplateError> {
        match self.advance().kind {
            TokenKind::Ident(name) => Ok(name),
            other => {
                self.pos -= 1;
                Err(self.error_here(format!("expected identifier, found {}", other.describe())))
            }
        }
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(&self.peek().kind, TokenKind::Ident(name) if name == keyword)
    }

    /// Items up to end of input or a closing brace (left unconsumed).
    fn items(&mut self) -> Result<Vec<Item>, TemplateError> {
        let mut items = Vec::new();
        while !matches!(self.peek().kind, TokenKind::Eof | TokenKind::RBrace) {
            items.push(self.item()?);
            while self.eat(&TokenKind::Semicolon) {}
        }
        Ok(items)
    }

    fn item(&mut self) -> Result<Item, TemplateError> {
        if self.is_keyword("set") {
            self.advance();
            let root = self.expect_ident()?;
            if root != "stash" {
                return Err(self.error_here("only stash entries can be assigned"));
            }
            self.expect(TokenKind::Dot)?;
            let key = self.expect_ident()?;
            self.expect(TokenKind::Eq)?;
            let value = self.expr()?;
            return Ok(Item::SetStash { key, value });
        }
        Ok(Item::Expr(self.expr()?))
    }

    fn block(&mut self) -> Result<Block, TemplateError> {
        self.expect(TokenKind::LBrace)?;
        let items = self.items()?;
        self.expect(TokenKind::RBrace)?;
        Ok(Block { items })
    }

    fn expr(&mut self) -> Result<Expr, TemplateError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Ident(ref name) if name == "if" => self.conditional(),
            TokenKind::Ident(ref name) if name == "null" => {
                self.advance();
                Ok(Expr::Literal(Value::Null))
            }
            TokenKind::Ident(ref name) if name == "true" || name == "false" => {
                self.advance();
                Ok(Expr::Literal(Value::Bool(name == "true")))
            }
            TokenKind::Ident(ref name) if *self.peek_second() == TokenKind::LParen => {
                let name = name.clone();
                self.call(&name)
            }
            TokenKind::Ident(ref name) => {
                let name = name.clone();
                self.path(&name)
            }
            TokenKind::Str(s) => {
                self.advance();
                Ok(Expr::Literal(Value::String(s)))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Literal(Value::Number(n)))
            }
            TokenKind::LBrace => self.object(),
            TokenKind::LBracket => self.list(),
            other => Err(self.error_here(format!("expected expression, found {}", other.describe()))),
        }
    }

    fn conditional(&mut self) -> Result<Expr, TemplateError> {
        if self.kind == TemplateKind::Request {
            return Err(TemplateError::NotAllowed("a conditional block".to_string()));
        }
        self.advance();
        let condition = self.expr()?;
        let then_branch = self.block()?;
        let else_branch = if self.is_keyword("else") {
            self.advance();
            if self.is_keyword("if") {
                Some(Block {
                    items: vec![Item::Expr(self.conditional()?)],
                })
            } else {
                Some(self.block()?)
            }
        } else {
            None
        };
        Ok(Expr::Conditional(Box::new(Conditional {
            condition,
            then_branch,
            else_branch,
        })))
    }

    fn call(&mut self, name: &str) -> Result<Expr, TemplateError> {
        let helper =
            Helper::from_name(name).ok_or_else(|| TemplateError::UnknownHelper(name.to_string()))?;
        if helper == Helper::RaiseError && self.kind == TemplateKind::Request {
            return Err(TemplateError::NotAllowed("raiseError".to_string()));
        }
        self.advance();
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                args.push(self.expr()?);
                if self.eat(&TokenKind::RParen) {
                    break;
                }
                self.expect(TokenKind::Comma)?;
            }
        }
        if args.len() != helper.arity() {
            return Err(TemplateError::Arity {
                helper: helper.name().to_string(),
                expected: helper.arity(),
                actual: args.len(),
            });
        }
        Ok(Expr::Call { helper, args })
    }

    fn path(&mut self, name: &str) -> Result<Expr, TemplateError> {
        let root = Root::from_name(name).ok_or_else(|| TemplateError::UnknownRoot(name.to_string()))?;
        if root == Root::Result && self.kind == TemplateKind::Request {
            return Err(TemplateError::NotAllowed("'result'".to_string()));
        }
        self.advance();
        let mut segments = Vec::new();
        while self.eat(&TokenKind::Dot) {
            segments.push(self.expect_ident()?);
        }
        Ok(Expr::Path(PathRef { root, segments }))
    }

    fn object(&mut self) -> Result<Expr, TemplateError> {
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        if !self.eat(&TokenKind::RBrace) {
            loop {
                let key = match self.advance().kind {
                    TokenKind::Str(s) | TokenKind::Ident(s) => s,
                    other => {
                        self.pos -= 1;
                        return Err(self.error_here(format!(
                            "expected object key, found {}",
                            other.describe()
                        )));
                    }
                };
                self.expect(TokenKind::Colon)?;
                fields.push((key, self.expr()?));
                if self.eat(&TokenKind::RBrace) {
                    break;
                }
                self.expect(TokenKind::Comma)?;
                // trailing comma
                if self.eat(&TokenKind::RBrace) {
                    break;
                }
            }
        }
        Ok(Expr::Object(fields))
    }

    fn list(&mut self) -> Result<Expr, TemplateError> {
        self.expect(TokenKind::LBracket)?;
        let mut items = Vec::new();
        if !self.eat(&TokenKind::RBracket) {
            loop {
                items.push(self.expr()?);
                if self.eat(&TokenKind::RBracket) {
                    break;
                }
                self.expect(TokenKind::Comma)?;
            }
        }
        Ok(Expr::List(items))
    }
}
