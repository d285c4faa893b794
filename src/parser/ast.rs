//! # Abstract Syntax Tree (AST)
//!
//! Defines the data structures representing a parsed script program.
//!
//! ## Structure
//!
//! A program is a sequence of [`Statement`]s. Every statement and expression
//! node carries the `line`/`column` of the token it originated from, so later
//! phases (the opcode emitter) can report precise positions without walking
//! back through the token stream.
//!
//! ## Design Philosophy
//!
//! The AST mirrors the surface grammar closely. There is no separate
//! resolution or typing pass — the emitter consumes these nodes directly.

/// A parsed program: the top-level sequence of statements across every
/// compiled file, already ordered with the entry-point file first.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub statements: Vec<Statement>,
}

/// A single `case` arm of a `switch` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct SwitchCase {
    pub value: Expression,
    pub body: Vec<Statement>,
}

/// The left-hand side of an assignment: a bare variable, or one element of
/// an array variable. Mirrors the "variable reference" of the data model —
/// a name plus an optional index expression.
#[derive(Debug, Clone, PartialEq)]
pub enum AssignTarget {
    Identifier(String),
    Index { name: String, index: Box<Expression> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Block {
        statements: Vec<Statement>,
        line: usize,
    },
    /// `target = expr;` — the target is a plain variable or an indexed
    /// element, never an arbitrary expression.
    Assign {
        target: AssignTarget,
        value: Expression,
        line: usize,
    },
    If {
        condition: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
        line: usize,
    },
    While {
        condition: Expression,
        body: Box<Statement>,
        line: usize,
    },
    For {
        init: Option<Box<Statement>>,
        condition: Option<Expression>,
        update: Option<Expression>,
        body: Box<Statement>,
        line: usize,
    },
    Switch {
        subject: Expression,
        cases: Vec<SwitchCase>,
        default: Option<Vec<Statement>>,
        line: usize,
    },
    Break {
        line: usize,
    },
    Continue {
        line: usize,
    },
    Return {
        value: Option<Expression>,
        line: usize,
    },
    FunctionDef {
        name: String,
        params: Vec<String>,
        body: Vec<Statement>,
        line: usize,
    },
    /// `mes(EVENT_TYPE) { ... }` — binds an event-type name to a handler
    /// body. Distinct from a plain function definition: it registers rather
    /// than defines a callable.
    MesHandler {
        event_type: String,
        body: Vec<Statement>,
        line: usize,
    },
    /// `step(expr);` — advances the script's step counter.
    Step {
        value: Expression,
        line: usize,
    },
    /// A bare expression statement, e.g. `helper();` or a lone identifier
    /// left over from debugging.
    ///
    /// Expressions with no side effect (a lone identifier, a lone literal)
    /// are syntactically valid here and parse to this same variant; the
    /// emitter treats them as a silent no-op rather than a parse error.
    Expr {
        expr: Expression,
        line: usize,
    },
}

impl Statement {
    pub fn line(&self) -> usize {
        match self {
            Statement::Block { line, .. }
            | Statement::Assign { line, .. }
            | Statement::If { line, .. }
            | Statement::While { line, .. }
            | Statement::For { line, .. }
            | Statement::Switch { line, .. }
            | Statement::Break { line }
            | Statement::Continue { line }
            | Statement::Return { line, .. }
            | Statement::FunctionDef { line, .. }
            | Statement::MesHandler { line, .. }
            | Statement::Step { line, .. }
            | Statement::Expr { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    IntegerLiteral {
        value: i64,
        line: usize,
        column: usize,
    },
    FloatLiteral {
        value: f64,
        line: usize,
        column: usize,
    },
    StringLiteral {
        value: String,
        line: usize,
        column: usize,
    },
    Identifier {
        name: String,
        line: usize,
        column: usize,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
        line: usize,
        column: usize,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
        line: usize,
        column: usize,
    },
    /// An assignment *expression* — used only where the grammar needs a
    /// value in expression position, namely a `for` loop's init/update
    /// clause. A top-level `target = expr;` statement is parsed through
    /// here and then promoted to [`Statement::Assign`]; it never survives
    /// as an `Expr` statement wrapping this variant.
    Assign {
        target: AssignTarget,
        value: Box<Expression>,
        line: usize,
        column: usize,
    },
    Call {
        callee: String,
        args: Vec<Expression>,
        line: usize,
        column: usize,
    },
    ArrayLiteral {
        elements: Vec<Expression>,
        line: usize,
        column: usize,
    },
    /// `target[index]` — read access into an array variable.
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
        line: usize,
        column: usize,
    },
}

impl Expression {
    pub fn position(&self) -> (usize, usize) {
        match self {
            Expression::IntegerLiteral { line, column, .. }
            | Expression::FloatLiteral { line, column, .. }
            | Expression::StringLiteral { line, column, .. }
            | Expression::Identifier { line, column, .. }
            | Expression::Unary { line, column, .. }
            | Expression::Binary { line, column, .. }
            | Expression::Assign { line, column, .. }
            | Expression::Call { line, column, .. }
            | Expression::ArrayLiteral { line, column, .. }
            | Expression::Index { line, column, .. } => (*line, *column),
        }
    }
}
