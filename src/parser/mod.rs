//! # Parser
//!
//! Parses a token stream into an [`ast::Program`] using hand-written
//! recursive descent for statements and a Pratt (operator-precedence) climber
//! for expressions.
//!
//! ## Architecture
//!
//! Unlike a line-oriented grammar, statements can span many tokens and
//! nest arbitrarily (`if`/`else`, `for`, `while`, `switch`, function bodies).
//! The parser does not stop at the first error: when a statement fails to
//! parse, it records the error and *synchronizes* — discarding tokens up to
//! the next statement boundary (a `;`, a `}`, or a token that starts a new
//! statement) — so a single mistake does not hide every error after it.
//!
//! ## Expression precedence (low to high)
//!
//! 1. Assignment (`=`, right-associative)
//! 2. Logical or (`||`)
//! 3. Logical and (`&&`)
//! 4. Equality (`==`, `!=`)
//! 5. Relational (`<`, `<=`, `>`, `>=`)
//! 6. Additive (`+`, `-`)
//! 7. Multiplicative (`*`, `/`, `%`)
//! 8. Unary (`!`, `-`)
//! 9. Primary (literals, identifiers, calls, grouping)

pub mod ast;


use crate::error::{CompileError, Phase, Position};
use crate::lexer::token::{Token, TokenKind};
use ast::{AssignTarget, BinaryOp, Expression, Program, Statement, SwitchCase, UnaryOp};
use log::debug;

pub struct ParseResult {
    pub program: Program,
    pub errors: Vec<CompileError>,
}

#[must_use]
pub fn parse(tokens: &[Token]) -> ParseResult {
    debug!("parse: starting over {} token(s)", tokens.len());
    let mut parser = Parser {
        tokens,
        pos: 0,
        errors: Vec::new(),
    };
    let mut statements = Vec::new();

    while !parser.is_at_end() {
        match parser.statement() {
            Ok(stmt) => statements.push(stmt),
            Err(err) => {
                parser.errors.push(err);
                parser.synchronize();
            }
        }
    }

    debug!(
        "parse: produced {} top-level statement(s), {} error(s)",
        statements.len(),
        parser.errors.len()
    );
    ParseResult {
        program: Program { statements },
        errors: parser.errors,
    }
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    errors: Vec<CompileError>,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.pos += 1;
        }
        &self.tokens[self.pos - 1]
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> Result<&Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(CompileError::new(
                Phase::Parse,
                message,
                Position::new(tok.line, tok.column),
            ))
        }
    }

    fn expect_identifier(&mut self) -> Result<String, CompileError> {
        if matches!(self.peek().kind, TokenKind::Identifier) {
            Ok(self.advance().literal.clone())
        } else {
            let tok = self.peek().clone();
            Err(CompileError::new(
                Phase::Parse,
                "expected an identifier",
                Position::new(tok.line, tok.column),
            ))
        }
    }

    /// Skip tokens until the next likely statement boundary: after a
    /// consumed `;`, at a `}`, at EOF, or at a token that starts a new
    /// statement.
    fn synchronize(&mut self) {
        while !self.is_at_end() {
            if matches!(self.peek().kind, TokenKind::Semicolon) {
                self.advance();
                return;
            }
            if matches!(self.peek().kind, TokenKind::RBrace) {
                return;
            }
            if matches!(
                self.peek().kind,
                TokenKind::If
                    | TokenKind::Else
                    | TokenKind::For
                    | TokenKind::While
                    | TokenKind::Switch
                    | TokenKind::Break
                    | TokenKind::Continue
                    | TokenKind::Return
                    | TokenKind::Function
                    | TokenKind::Mes
                    | TokenKind::Step
            ) {
                return;
            }
            self.advance();
        }
    }

    // ---- statements ----

    fn statement(&mut self) -> Result<Statement, CompileError> {
        match self.peek().kind {
            TokenKind::LBrace => self.block_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::For => self.for_statement(),
            TokenKind::Switch => self.switch_statement(),
            TokenKind::Break => {
                let tok = self.advance().clone();
                self.expect(&TokenKind::Semicolon, "expected ';' after 'break'")?;
                Ok(Statement::Break { line: tok.line })
            }
            TokenKind::Continue => {
                let tok = self.advance().clone();
                self.expect(&TokenKind::Semicolon, "expected ';' after 'continue'")?;
                Ok(Statement::Continue { line: tok.line })
            }
            TokenKind::Return => self.return_statement(),
            TokenKind::Function => self.function_statement(),
            TokenKind::Mes => self.mes_statement(),
            TokenKind::Step => self.step_statement(),
            _ => self.expr_statement(),
        }
    }

    /// `mes(EVENT_TYPE) { ... }` — the event type is a bare identifier
    /// naming the event, not an arbitrary expression.
    fn mes_statement(&mut self) -> Result<Statement, CompileError> {
        let tok = self.advance().clone(); // 'mes'
        self.expect(&TokenKind::LParen, "expected '(' after 'mes'")?;
        let event_type = self.expect_identifier()?;
        self.expect(&TokenKind::RParen, "expected ')' after event type")?;
        let body = match self.block_statement()? {
            Statement::Block { statements, .. } => statements,
            _ => unreachable!("block_statement always returns Statement::Block"),
        };
        Ok(Statement::MesHandler {
            event_type,
            body,
            line: tok.line,
        })
    }

    fn step_statement(&mut self) -> Result<Statement, CompileError> {
        let tok = self.advance().clone(); // 'step'
        self.expect(&TokenKind::LParen, "expected '(' after 'step'")?;
        let value = self.expression()?;
        self.expect(&TokenKind::RParen, "expected ')' after step count")?;
        self.expect(&TokenKind::Semicolon, "expected ';' after 'step(...)'")?;
        Ok(Statement::Step {
            value,
            line: tok.line,
        })
    }

    fn block_statement(&mut self) -> Result<Statement, CompileError> {
        let open = self.advance().clone(); // '{'
        let mut statements = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => statements.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        self.expect(&TokenKind::RBrace, "expected '}' to close block")?;
        Ok(Statement::Block {
            statements,
            line: open.line,
        })
    }

    fn if_statement(&mut self) -> Result<Statement, CompileError> {
        let tok = self.advance().clone(); // 'if'
        self.expect(&TokenKind::LParen, "expected '(' after 'if'")?;
        let condition = self.expression()?;
        self.expect(&TokenKind::RParen, "expected ')' after if condition")?;
        let then_branch = Box::new(self.statement()?);
        // else binds to the nearest preceding if, which falls out naturally
        // here: each call to if_statement consumes its own optional else
        // before returning to its caller.
        let else_branch = if self.matches(&TokenKind::Else) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
            line: tok.line,
        })
    }

    fn while_statement(&mut self) -> Result<Statement, CompileError> {
        let tok = self.advance().clone();
        self.expect(&TokenKind::LParen, "expected '(' after 'while'")?;
        let condition = self.expression()?;
        self.expect(&TokenKind::RParen, "expected ')' after while condition")?;
        let body = Box::new(self.statement()?);
        Ok(Statement::While {
            condition,
            body,
            line: tok.line,
        })
    }

    fn for_statement(&mut self) -> Result<Statement, CompileError> {
        let tok = self.advance().clone();
        self.expect(&TokenKind::LParen, "expected '(' after 'for'")?;

        let init = if self.matches(&TokenKind::Semicolon) {
            None
        } else {
            let line = self.peek().line;
            let expr = self.expression()?;
            self.expect(&TokenKind::Semicolon, "expected ';' after for-loop init")?;
            Some(Box::new(Statement::Expr { expr, line }))
        };

        let condition = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&TokenKind::Semicolon, "expected ';' after for-loop condition")?;

        let update = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&TokenKind::RParen, "expected ')' after for-loop clauses")?;

        let body = Box::new(self.statement()?);

        Ok(Statement::For {
            init,
            condition,
            update,
            body,
            line: tok.line,
        })
    }

    fn switch_statement(&mut self) -> Result<Statement, CompileError> {
        let tok = self.advance().clone();
        self.expect(&TokenKind::LParen, "expected '(' after 'switch'")?;
        let subject = self.expression()?;
        self.expect(&TokenKind::RParen, "expected ')' after switch subject")?;
        self.expect(&TokenKind::LBrace, "expected '{' to open switch body")?;

        let mut cases = Vec::new();
        let mut default = None;

        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            if self.matches(&TokenKind::Case) {
                let value = self.expression()?;
                self.expect(&TokenKind::Colon, "expected ':' after case value")?;
                cases.push(SwitchCase {
                    value,
                    body: self.case_body()?,
                });
            } else if self.matches(&TokenKind::Default) {
                self.expect(&TokenKind::Colon, "expected ':' after 'default'")?;
                default = Some(self.case_body()?);
            } else {
                let t = self.peek().clone();
                self.errors.push(CompileError::new(
                    Phase::Parse,
                    "expected 'case' or 'default' in switch body",
                    Position::new(t.line, t.column),
                ));
                self.synchronize();
            }
        }

        self.expect(&TokenKind::RBrace, "expected '}' to close switch body")?;
        Ok(Statement::Switch {
            subject,
            cases,
            default,
            line: tok.line,
        })
    }

    /// Statements belonging to one `case`/`default` arm, up to the next
    /// `case`, `default`, or the closing `}`.
    fn case_body(&mut self) -> Result<Vec<Statement>, CompileError> {
        let mut body = Vec::new();
        while !matches!(
            self.peek().kind,
            TokenKind::Case | TokenKind::Default | TokenKind::RBrace
        ) && !self.is_at_end()
        {
            match self.statement() {
                Ok(stmt) => body.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        Ok(body)
    }

    fn return_statement(&mut self) -> Result<Statement, CompileError> {
        let tok = self.advance().clone();
        let value = if self.check(&TokenKind::Semicolon) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(&TokenKind::Semicolon, "expected ';' after return value")?;
        Ok(Statement::Return {
            value,
            line: tok.line,
        })
    }

    fn function_statement(&mut self) -> Result<Statement, CompileError> {
        let tok = self.advance().clone();
        let name = self.expect_identifier()?;
        self.expect(&TokenKind::LParen, "expected '(' after function name")?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                params.push(self.expect_identifier()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "expected ')' after parameter list")?;
        self.expect(&TokenKind::LBrace, "expected '{' to open function body")?;
        let mut body = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.is_at_end() {
            match self.statement() {
                Ok(stmt) => body.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        self.expect(&TokenKind::RBrace, "expected '}' to close function body")?;
        Ok(Statement::FunctionDef {
            name,
            params,
            body,
            line: tok.line,
        })
    }

    /// A bare expression, terminated by `;`. An assignment parsed here is
    /// promoted to [`Statement::Assign`] rather than left wrapped in
    /// `Statement::Expr` — assignment and plain expression-statements are
    /// distinct statement forms even though one recursive-descent path
    /// parses both.
    fn expr_statement(&mut self) -> Result<Statement, CompileError> {
        let line = self.peek().line;
        let expr = self.expression()?;
        self.expect(&TokenKind::Semicolon, "expected ';' after expression")?;
        if let Expression::Assign { target, value, .. } = expr {
            Ok(Statement::Assign {
                target,
                value: *value,
                line,
            })
        } else {
            Ok(Statement::Expr { expr, line })
        }
    }

    // ---- expressions ----

    fn expression(&mut self) -> Result<Expression, CompileError> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expression, CompileError> {
        let expr = self.or_expr()?;

        if matches!(self.peek().kind, TokenKind::Assign) {
            let tok = self.advance().clone();
            let value = self.assignment()?;
            let target = match expr {
                Expression::Identifier { name, .. } => AssignTarget::Identifier(name),
                Expression::Index { target, index, .. } => match *target {
                    Expression::Identifier { name, .. } => AssignTarget::Index { name, index },
                    _ => {
                        return Err(CompileError::new(
                            Phase::Parse,
                            "invalid assignment target",
                            Position::new(tok.line, tok.column),
                        ));
                    }
                },
                _ => {
                    return Err(CompileError::new(
                        Phase::Parse,
                        "invalid assignment target",
                        Position::new(tok.line, tok.column),
                    ));
                }
            };
            return Ok(Expression::Assign {
                target,
                value: Box::new(value),
                line: tok.line,
                column: tok.column,
            });
        }

        Ok(expr)
    }

    fn or_expr(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.and_expr()?;
        while matches!(self.peek().kind, TokenKind::OrOr) {
            let tok = self.advance().clone();
            let right = self.and_expr()?;
            left = Expression::Binary {
                op: BinaryOp::Or,
                left: Box::new(left),
                right: Box::new(right),
                line: tok.line,
                column: tok.column,
            };
        }
        Ok(left)
    }

    fn and_expr(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.equality()?;
        while matches!(self.peek().kind, TokenKind::AndAnd) {
            let tok = self.advance().clone();
            let right = self.equality()?;
            left = Expression::Binary {
                op: BinaryOp::And,
                left: Box::new(left),
                right: Box::new(right),
                line: tok.line,
                column: tok.column,
            };
        }
        Ok(left)
    }

    fn equality(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.relational()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Eq => BinaryOp::Eq,
                TokenKind::NotEq => BinaryOp::NotEq,
                _ => break,
            };
            let tok = self.advance().clone();
            let right = self.relational()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line: tok.line,
                column: tok.column,
            };
        }
        Ok(left)
    }

    fn relational(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::LtEq => BinaryOp::LtEq,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::GtEq => BinaryOp::GtEq,
                _ => break,
            };
            let tok = self.advance().clone();
            let right = self.additive()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line: tok.line,
                column: tok.column,
            };
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            let tok = self.advance().clone();
            let right = self.multiplicative()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line: tok.line,
                column: tok.column,
            };
        }
        Ok(left)
    }

    fn multiplicative(&mut self) -> Result<Expression, CompileError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            let tok = self.advance().clone();
            let right = self.unary()?;
            left = Expression::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
                line: tok.line,
                column: tok.column,
            };
        }
        Ok(left)
    }

    /// Prefix `-` and `!`. A leading `-` is always unary negation here —
    /// `additive()` only ever offers `-` a chance to be binary once a left
    /// operand already exists, so there is no ambiguity to break.
    fn unary(&mut self) -> Result<Expression, CompileError> {
        match self.peek().kind {
            TokenKind::Minus => {
                let tok = self.advance().clone();
                let operand = self.unary()?;
                Ok(Expression::Unary {
                    op: UnaryOp::Neg,
                    operand: Box::new(operand),
                    line: tok.line,
                    column: tok.column,
                })
            }
            TokenKind::Bang => {
                let tok = self.advance().clone();
                let operand = self.unary()?;
                Ok(Expression::Unary {
                    op: UnaryOp::Not,
                    operand: Box::new(operand),
                    line: tok.line,
                    column: tok.column,
                })
            }
            _ => self.postfix(),
        }
    }

    /// Index access binds as left-associative postfix, the same precedence
    /// level as a call — `primary()` already folds a call into an
    /// identifier, so this only ever has to chain `[index]` afterward, e.g.
    /// `grid[y][x]`.
    fn postfix(&mut self) -> Result<Expression, CompileError> {
        let mut expr = self.primary()?;
        while matches!(self.peek().kind, TokenKind::LBracket) {
            let tok = self.advance().clone();
            let index = self.expression()?;
            self.expect(&TokenKind::RBracket, "expected ']' after index expression")?;
            expr = Expression::Index {
                target: Box::new(expr),
                index: Box::new(index),
                line: tok.line,
                column: tok.column,
            };
        }
        Ok(expr)
    }

    fn primary(&mut self) -> Result<Expression, CompileError> {
        let tok = self.peek().clone();
        match &tok.kind {
            TokenKind::IntegerLiteral(v) => {
                self.advance();
                Ok(Expression::IntegerLiteral {
                    value: *v,
                    line: tok.line,
                    column: tok.column,
                })
            }
            TokenKind::FloatLiteral(v) => {
                self.advance();
                Ok(Expression::FloatLiteral {
                    value: *v,
                    line: tok.line,
                    column: tok.column,
                })
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(Expression::StringLiteral {
                    value: s.clone(),
                    line: tok.line,
                    column: tok.column,
                })
            }
            TokenKind::Identifier => {
                self.advance();
                if self.matches(&TokenKind::LParen) {
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.expression()?);
                            if !self.matches(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen, "expected ')' after call arguments")?;
                    Ok(Expression::Call {
                        callee: tok.literal.clone(),
                        args,
                        line: tok.line,
                        column: tok.column,
                    })
                } else {
                    Ok(Expression::Identifier {
                        name: tok.literal.clone(),
                        line: tok.line,
                        column: tok.column,
                    })
                }
            }
            TokenKind::LBracket => {
                self.advance();
                let mut elements = Vec::new();
                if !self.check(&TokenKind::RBracket) {
                    loop {
                        elements.push(self.expression()?);
                        if !self.matches(&TokenKind::Comma) {
                            break;
                        }
                    }
                }
                self.expect(&TokenKind::RBracket, "expected ']' to close array literal")?;
                Ok(Expression::ArrayLiteral {
                    elements,
                    line: tok.line,
                    column: tok.column,
                })
            }
            TokenKind::LParen => {
                self.advance();
                let expr = self.expression()?;
                self.expect(&TokenKind::RParen, "expected ')' to close grouped expression")?;
                Ok(expr)
            }
            _ => Err(CompileError::new(
                Phase::Parse,
                format!("unexpected token in expression: {:?}", tok.kind),
                Position::new(tok.line, tok.column),
            )),
        }
    }
}
