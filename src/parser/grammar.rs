//! Recursive-descent parser over the token stream.

use super::ast::*;
use super::globals::is_global_function;
use super::lexer::{Keyword, Token, TokenKind};
use super::ParseError;

/// Keywords that close a statement block.
const BLOCK_END: &[Keyword] = &[
    Keyword::EndProcedure,
    Keyword::EndFunction,
    Keyword::EndIf,
    Keyword::ElsIf,
    Keyword::Else,
    Keyword::EndDo,
    Keyword::EndTry,
    Keyword::Except,
];

/// Deepest expression or block nesting accepted before giving up.
const MAX_NESTING: usize = 100;

pub(crate) struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    // ─── Token helpers ──────────────────────────────────────────

    fn peek(&self) -> &Token {
        // The lexer always ends the stream with Eof and we never advance past it.
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }

    fn peek_nth_kind(&self, n: usize) -> &TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    fn at(&self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        matches!(self.peek_kind(), TokenKind::Keyword(k) if *k == kw)
    }

    fn at_any_keyword(&self, set: &[Keyword]) -> bool {
        matches!(self.peek_kind(), TokenKind::Keyword(k) if set.contains(k))
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.at(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error_here(&self, message: impl Into<String>) -> ParseError {
        let token = self.peek();
        ParseError::new(token.line, token.column, message)
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_here("nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        let found = if token.kind == TokenKind::Eof {
            "end of file".to_string()
        } else {
            format!("'{}'", token.text)
        };
        self.error_here(format!("expected {}, found {}", expected, found))
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(&kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword, what: &str) -> Result<(), ParseError> {
        if self.eat_keyword(kw) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String, ParseError> {
        Ok(self.expect(TokenKind::Ident, what)?.text)
    }

    /// A statement ends with `;` unless a block-closing keyword or the end
    /// of input follows directly.
    fn end_statement(&mut self) -> Result<(), ParseError> {
        if self.eat(&TokenKind::Semicolon)
            || self.at(&TokenKind::Eof)
            || self.at_any_keyword(BLOCK_END)
        {
            Ok(())
        } else {
            Err(self.unexpected("';'"))
        }
    }

    // ─── Module level ───────────────────────────────────────────

    pub(crate) fn parse_module(&mut self) -> Result<ModuleTree, ParseError> {
        let mut body = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::Eof => break,
                TokenKind::Semicolon => {
                    self.advance();
                }
                TokenKind::Keyword(Keyword::Async)
                    if matches!(
                        self.peek_nth_kind(1),
                        TokenKind::Keyword(Keyword::Procedure | Keyword::Function)
                    ) =>
                {
                    self.advance();
                    body.push(self.parse_function(true)?);
                }
                TokenKind::Keyword(Keyword::Procedure | Keyword::Function) => {
                    body.push(self.parse_function(false)?);
                }
                _ => body.push(self.parse_statement()?),
            }
        }
        Ok(ModuleTree {
            name: String::new(),
            body,
        })
    }

    fn parse_function(&mut self, is_async: bool) -> Result<Statement, ParseError> {
        let (kind, end) = if self.eat_keyword(Keyword::Procedure) {
            (FunctionKind::Procedure, Keyword::EndProcedure)
        } else {
            self.expect_keyword(Keyword::Function, "'Procedure' or 'Function'")?;
            (FunctionKind::Function, Keyword::EndFunction)
        };

        let name = self.expect_ident("function name")?;
        self.expect(TokenKind::LParen, "'('")?;
        let mut params = Vec::new();
        if !self.eat(&TokenKind::RParen) {
            loop {
                params.push(self.parse_param()?);
                if self.eat(&TokenKind::Comma) {
                    continue;
                }
                self.expect(TokenKind::RParen, "')'")?;
                break;
            }
        }
        let export = self.eat_keyword(Keyword::Export);

        let body = self.parse_block(&[end])?;
        let end_name = match kind {
            FunctionKind::Procedure => "'EndProcedure'",
            FunctionKind::Function => "'EndFunction'",
        };
        self.expect_keyword(end, end_name)?;
        self.eat(&TokenKind::Semicolon);

        Ok(Statement::FunctionOrProcedure(FunctionOrProcedure {
            kind,
            name,
            export,
            is_async,
            params,
            body,
        }))
    }

    fn parse_param(&mut self) -> Result<Param, ParseError> {
        let by_value = self.eat_keyword(Keyword::Val);
        let name = self.expect_ident("parameter name")?;
        let default = if self.eat(&TokenKind::Eq) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        Ok(Param {
            name,
            by_value,
            default,
        })
    }

    /// Parse statements until one of `terminators` (not consumed).
    fn parse_block(&mut self, terminators: &[Keyword]) -> Result<Vec<Statement>, ParseError> {
        let mut body = Vec::new();
        loop {
            if self.at_any_keyword(terminators) {
                return Ok(body);
            }
            match self.peek_kind() {
                TokenKind::Eof => return Err(self.unexpected("end of block")),
                TokenKind::Semicolon => {
                    self.advance();
                }
                _ => body.push(self.nested(Self::parse_statement)?),
            }
        }
    }

    // ─── Statements ─────────────────────────────────────────────

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        let stmt = match self.peek_kind().clone() {
            TokenKind::Keyword(Keyword::Var) => {
                self.advance();
                let mut names = vec![self.expect_ident("variable name")?];
                while self.eat(&TokenKind::Comma) {
                    names.push(self.expect_ident("variable name")?);
                }
                let export = self.eat_keyword(Keyword::Export);
                Statement::VarDecl { names, export }
            }
            TokenKind::Keyword(Keyword::If) => self.parse_if()?,
            TokenKind::Keyword(Keyword::While) => {
                self.advance();
                let condition = Box::new(self.parse_expression()?);
                self.expect_keyword(Keyword::Do, "'Do'")?;
                let body = self.parse_block(&[Keyword::EndDo])?;
                self.expect_keyword(Keyword::EndDo, "'EndDo'")?;
                Statement::While(ConditionalBlock { condition, body })
            }
            TokenKind::Keyword(Keyword::For) => self.parse_for()?,
            TokenKind::Keyword(Keyword::Try) => {
                self.advance();
                let body = self.parse_block(&[Keyword::Except])?;
                self.expect_keyword(Keyword::Except, "'Except'")?;
                let except = self.parse_block(&[Keyword::EndTry])?;
                self.expect_keyword(Keyword::EndTry, "'EndTry'")?;
                Statement::Try { body, except }
            }
            TokenKind::Keyword(Keyword::Return) => {
                self.advance();
                if self.at_statement_end() {
                    Statement::Return(None)
                } else {
                    Statement::Return(Some(Box::new(self.parse_expression()?)))
                }
            }
            TokenKind::Keyword(Keyword::Raise) => {
                self.advance();
                if self.at_statement_end() {
                    Statement::Raise(Vec::new())
                } else if self.at(&TokenKind::LParen) {
                    Statement::Raise(self.parse_args()?.into_iter().flatten().collect())
                } else {
                    Statement::Raise(vec![self.parse_expression()?])
                }
            }
            TokenKind::Keyword(Keyword::Break) => {
                self.advance();
                Statement::Break
            }
            TokenKind::Keyword(Keyword::Continue) => {
                self.advance();
                Statement::Continue
            }
            TokenKind::Keyword(Keyword::Goto) => {
                self.advance();
                self.expect(TokenKind::Tilde, "'~'")?;
                Statement::Goto(self.expect_ident("label")?)
            }
            TokenKind::Tilde => {
                self.advance();
                let label = self.expect_ident("label")?;
                self.expect(TokenKind::Colon, "':'")?;
                // A label prefixes the next statement; it needs no separator.
                return Ok(Statement::Label(label));
            }
            TokenKind::Keyword(Keyword::Procedure | Keyword::Function) => {
                return Err(self.error_here("nested function definitions are not allowed"));
            }
            TokenKind::Keyword(Keyword::Await) => self.parse_expression()?,
            _ => {
                let target = self.parse_postfix()?;
                if self.eat(&TokenKind::Eq) {
                    let value = self.parse_expression()?;
                    Statement::Assignment {
                        target: Box::new(target),
                        value: Box::new(value),
                    }
                } else {
                    target
                }
            }
        };
        self.end_statement()?;
        Ok(stmt)
    }

    fn at_statement_end(&self) -> bool {
        self.at(&TokenKind::Semicolon) || self.at(&TokenKind::Eof) || self.at_any_keyword(BLOCK_END)
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::If, "'If'")?;
        let branch = self.parse_conditional(&[Keyword::ElsIf, Keyword::Else, Keyword::EndIf])?;
        let mut else_if = Vec::new();
        while self.eat_keyword(Keyword::ElsIf) {
            else_if.push(self.parse_conditional(&[Keyword::ElsIf, Keyword::Else, Keyword::EndIf])?);
        }
        let else_body = if self.eat_keyword(Keyword::Else) {
            Some(self.parse_block(&[Keyword::EndIf])?)
        } else {
            None
        };
        self.expect_keyword(Keyword::EndIf, "'EndIf'")?;
        Ok(Statement::If(IfStatement {
            branch,
            else_if,
            else_body,
        }))
    }

    fn parse_conditional(&mut self, terminators: &[Keyword]) -> Result<ConditionalBlock, ParseError> {
        let condition = Box::new(self.parse_expression()?);
        self.expect_keyword(Keyword::Then, "'Then'")?;
        let body = self.parse_block(terminators)?;
        Ok(ConditionalBlock { condition, body })
    }

    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        self.expect_keyword(Keyword::For, "'For'")?;
        let stmt = if self.eat_keyword(Keyword::Each) {
            let variable = self.expect_ident("loop variable")?;
            self.expect_keyword(Keyword::In, "'In'")?;
            let collection = self.parse_expression()?;
            self.expect_keyword(Keyword::Do, "'Do'")?;
            let body = self.parse_block(&[Keyword::EndDo])?;
            Statement::ForEach {
                variable,
                collection: Box::new(collection),
                body,
            }
        } else {
            let variable = self.expect_ident("loop variable")?;
            self.expect(TokenKind::Eq, "'='")?;
            let from = self.parse_expression()?;
            self.expect_keyword(Keyword::To, "'To'")?;
            let to = self.parse_expression()?;
            self.expect_keyword(Keyword::Do, "'Do'")?;
            let body = self.parse_block(&[Keyword::EndDo])?;
            Statement::For {
                variable,
                from: Box::new(from),
                to: Box::new(to),
                body,
            }
        };
        self.expect_keyword(Keyword::EndDo, "'EndDo'")?;
        Ok(stmt)
    }

    // ─── Expressions ────────────────────────────────────────────

    pub(crate) fn parse_expression(&mut self) -> Result<Statement, ParseError> {
        self.nested(Self::parse_or)
    }

    fn parse_or(&mut self) -> Result<Statement, ParseError> {
        let mut left = self.parse_and()?;
        while self.eat_keyword(Keyword::Or) {
            let right = self.parse_and()?;
            left = binary(left, BinaryOp::Or, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Statement, ParseError> {
        let mut left = self.parse_not()?;
        while self.eat_keyword(Keyword::And) {
            let right = self.parse_not()?;
            left = binary(left, BinaryOp::And, right);
        }
        Ok(left)
    }

    fn parse_not(&mut self) -> Result<Statement, ParseError> {
        if self.eat_keyword(Keyword::Not) {
            Ok(Statement::Not(Box::new(self.nested(Self::parse_not)?)))
        } else {
            self.parse_comparison()
        }
    }

    fn parse_comparison(&mut self) -> Result<Statement, ParseError> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::Ne => BinaryOp::Ne,
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Le => BinaryOp::Le,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::Ge => BinaryOp::Ge,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(left, op, right);
        }
    }

    fn parse_additive(&mut self) -> Result<Statement, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(left, op, right);
        }
    }

    fn parse_multiplicative(&mut self) -> Result<Statement, ParseError> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.peek_kind() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.parse_unary()?;
            left = binary(left, op, right);
        }
    }

    fn parse_unary(&mut self) -> Result<Statement, ParseError> {
        if self.eat(&TokenKind::Minus) {
            return Ok(Statement::Neg(Box::new(self.nested(Self::parse_unary)?)));
        }
        if self.eat(&TokenKind::Plus) {
            return self.nested(Self::parse_unary);
        }
        if self.eat_keyword(Keyword::Await) {
            return Ok(Statement::Await(Box::new(self.nested(Self::parse_unary)?)));
        }
        self.parse_postfix()
    }

    /// Primary expression followed by member access, calls and indexing.
    fn parse_postfix(&mut self) -> Result<Statement, ParseError> {
        let mut node = self.parse_primary()?;
        loop {
            if self.eat(&TokenKind::Dot) {
                let member = self.expect_member_name()?;
                let unit = if self.at(&TokenKind::LParen) {
                    Statement::Method(MethodStatement {
                        name: member,
                        args: self.parse_args()?,
                    })
                } else {
                    Statement::Var(member)
                };
                node = Statement::CallChain(CallChainStatement {
                    unit: Box::new(unit),
                    call: Box::new(node),
                });
            } else if self.eat(&TokenKind::LBracket) {
                let index = self.parse_expression()?;
                self.expect(TokenKind::RBracket, "']'")?;
                node = Statement::Index {
                    target: Box::new(node),
                    index: Box::new(index),
                };
            } else {
                return Ok(node);
            }
        }
    }

    /// Member names may coincide with keywords (`Query.Execute`, `Item.New`).
    fn expect_member_name(&mut self) -> Result<String, ParseError> {
        match self.peek_kind() {
            TokenKind::Ident | TokenKind::Keyword(_) => Ok(self.advance().text),
            _ => Err(self.unexpected("member name")),
        }
    }

    fn parse_primary(&mut self) -> Result<Statement, ParseError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                Ok(Statement::Literal(Literal::Number(token.text)))
            }
            TokenKind::Str(first) => {
                self.advance();
                // Adjacent literals join with a line break.
                let mut value = first;
                while let TokenKind::Str(next) = self.peek_kind().clone() {
                    self.advance();
                    value.push('\n');
                    value.push_str(&next);
                }
                Ok(Statement::Literal(Literal::String(value)))
            }
            TokenKind::Date(body) => {
                self.advance();
                Ok(Statement::Literal(Literal::Date(body)))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(Statement::Literal(Literal::Bool(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(Statement::Literal(Literal::Bool(false)))
            }
            TokenKind::Keyword(Keyword::Undefined) => {
                self.advance();
                Ok(Statement::Literal(Literal::Undefined))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.advance();
                Ok(Statement::Literal(Literal::Null))
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(inner)
            }
            TokenKind::Question => {
                self.advance();
                self.expect(TokenKind::LParen, "'('")?;
                let condition = self.parse_expression()?;
                self.expect(TokenKind::Comma, "','")?;
                let then = self.parse_expression()?;
                self.expect(TokenKind::Comma, "','")?;
                let otherwise = self.parse_expression()?;
                self.expect(TokenKind::RParen, "')'")?;
                Ok(Statement::Ternary {
                    condition: Box::new(condition),
                    then: Box::new(then),
                    otherwise: Box::new(otherwise),
                })
            }
            TokenKind::Keyword(Keyword::New) => {
                self.advance();
                if self.at(&TokenKind::LParen) {
                    // New("TypeName", args)
                    Ok(Statement::New {
                        type_name: None,
                        args: self.parse_args()?,
                    })
                } else {
                    let type_name = self.expect_ident("type name")?;
                    let args = if self.at(&TokenKind::LParen) {
                        self.parse_args()?
                    } else {
                        Vec::new()
                    };
                    Ok(Statement::New {
                        type_name: Some(type_name),
                        args,
                    })
                }
            }
            TokenKind::Ident => {
                self.advance();
                if self.at(&TokenKind::LParen) {
                    let call = MethodStatement {
                        name: token.text,
                        args: self.parse_args()?,
                    };
                    if is_global_function(&call.name) {
                        Ok(Statement::Builtin(call))
                    } else {
                        Ok(Statement::Method(call))
                    }
                } else {
                    Ok(Statement::Var(token.text))
                }
            }
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `( [arg] {, [arg]} )`; empty positions are skipped arguments.
    fn parse_args(&mut self) -> Result<Vec<Option<Statement>>, ParseError> {
        self.expect(TokenKind::LParen, "'('")?;
        let mut args = Vec::new();
        if self.eat(&TokenKind::RParen) {
            return Ok(args);
        }
        loop {
            if self.at(&TokenKind::Comma) || self.at(&TokenKind::RParen) {
                args.push(None);
            } else {
                args.push(Some(self.parse_expression()?));
            }
            if self.eat(&TokenKind::Comma) {
                continue;
            }
            self.expect(TokenKind::RParen, "')'")?;
            return Ok(args);
        }
    }
}

fn binary(left: Statement, op: BinaryOp, right: Statement) -> Statement {
    Statement::Binary {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}
