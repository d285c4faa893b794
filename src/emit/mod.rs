//! # Opcode Emitter
//!
//! Converts a parsed [`Program`](crate::parser::ast::Program) into a flat
//! stream of [`Opcode`]s.
//!
//! ## Design
//!
//! Unlike a linking assembler, there is no jump-target lowering: `if`,
//! `while`, `for`, and `switch` bodies are embedded directly as nested
//! `Vec<Opcode>` fields. Whatever consumes this stream reconstructs control
//! flow structurally, by walking the nested bodies, rather than by jumping
//! to resolved addresses.
//!
//! `break` and `continue` are emitted as standalone opcodes with no operand;
//! it is up to the consumer to interpret them relative to the nearest
//! enclosing loop.
//!
//! A bare expression statement with no encodable effect (a lone identifier,
//! a lone literal — e.g. a line like `x;` left over from debugging) emits
//! nothing at all. This is a deliberate no-op, not an error.

pub mod opcode;


use crate::error::{CompileError, Phase, Position};
use crate::parser::ast::{AssignTarget, Expression, Program, Statement};
use log::debug;
use opcode::Opcode;

pub struct EmitResult {
    pub opcodes: Vec<Opcode>,
    pub errors: Vec<CompileError>,
}

#[must_use]
pub fn emit(program: &Program) -> EmitResult {
    debug!(
        "emit: starting over {} top-level statement(s)",
        program.statements.len()
    );
    let mut emitter = Emitter { errors: Vec::new() };
    let opcodes = emitter.emit_statements(&program.statements);
    debug!(
        "emit: produced {} opcode(s), {} error(s)",
        opcodes.len(),
        emitter.errors.len()
    );
    EmitResult {
        opcodes,
        errors: emitter.errors,
    }
}

struct Emitter {
    errors: Vec<CompileError>,
}

impl Emitter {
    fn emit_statements(&mut self, statements: &[Statement]) -> Vec<Opcode> {
        let mut out = Vec::new();
        for stmt in statements {
            out.extend(self.emit_statement(stmt));
        }
        out
    }

    fn emit_statement(&mut self, stmt: &Statement) -> Vec<Opcode> {
        match stmt {
            Statement::Block { statements, .. } => self.emit_statements(statements),

            Statement::Assign { target, value, line } => match target {
                AssignTarget::Identifier(name) => vec![Opcode::Assign {
                    name: name.clone(),
                    value: value.clone(),
                    source_line: *line,
                }],
                AssignTarget::Index { name, index } => vec![Opcode::ArrayAssign {
                    name: name.clone(),
                    index: (**index).clone(),
                    value: value.clone(),
                    source_line: *line,
                }],
            },

            Statement::If {
                condition,
                then_branch,
                else_branch,
                line,
            } => vec![Opcode::If {
                condition: condition.clone(),
                then_body: self.emit_statement(then_branch),
                else_body: else_branch.as_ref().map(|b| self.emit_statement(b)),
                source_line: *line,
            }],

            Statement::While {
                condition,
                body,
                line,
            } => vec![Opcode::While {
                condition: condition.clone(),
                body: self.emit_statement(body),
                source_line: *line,
            }],

            Statement::For {
                init,
                condition,
                update,
                body,
                line,
            } => {
                let init = init
                    .as_ref()
                    .and_then(|s| self.emit_for_clause(s))
                    .map(Box::new);
                let update = update
                    .as_ref()
                    .and_then(|e| self.emit_for_clause_expr(e, *line))
                    .map(Box::new);
                vec![Opcode::For {
                    init,
                    condition: condition.clone(),
                    update,
                    body: self.emit_statement(body),
                    source_line: *line,
                }]
            }

            Statement::Switch {
                subject,
                cases,
                default,
                line,
            } => {
                let cases = cases
                    .iter()
                    .map(|case| (case.value.clone(), self.emit_statements(&case.body)))
                    .collect();
                let default = default.as_ref().map(|body| self.emit_statements(body));
                vec![Opcode::Switch {
                    subject: subject.clone(),
                    cases,
                    default,
                    source_line: *line,
                }]
            }

            Statement::Break { line } => vec![Opcode::Break { source_line: *line }],
            Statement::Continue { line } => vec![Opcode::Continue { source_line: *line }],

            Statement::Return { value, line } => vec![Opcode::Return {
                value: value.clone(),
                source_line: *line,
            }],

            Statement::FunctionDef {
                name,
                params,
                body,
                line,
            } => vec![Opcode::DefineFunction {
                name: name.clone(),
                params: params.clone(),
                body: self.emit_statements(body),
                source_line: *line,
            }],

            Statement::MesHandler {
                event_type,
                body,
                line,
            } => vec![Opcode::RegisterEventHandler {
                event: event_type.clone(),
                body: self.emit_statements(body),
                source_line: *line,
            }],

            Statement::Step { value, line } => vec![
                Opcode::SetStep {
                    value: value.clone(),
                    source_line: *line,
                },
                Opcode::Wait { source_line: *line },
            ],

            Statement::Expr { expr, line } => self.emit_expr_statement(expr, *line),
        }
    }

    /// Emit the opcodes for a top-level expression statement.
    ///
    /// A call emits its natural opcode; anything else (a bare identifier, a
    /// bare literal) has no encodable effect and is silently dropped.
    /// Assignment never reaches here — it is parsed straight into
    /// [`Statement::Assign`] and handled by [`Self::emit_statement`].
    fn emit_expr_statement(&mut self, expr: &Expression, line: usize) -> Vec<Opcode> {
        match expr {
            Expression::Call { callee, args, .. } => vec![Opcode::Call {
                callee: callee.clone(),
                args: args.clone(),
                source_line: line,
            }],
            _ => Vec::new(),
        }
    }

    /// Emit the init/update clause of a `for` loop as a single opcode.
    ///
    /// Unlike a top-level expression statement, a clause with no encodable
    /// effect is not a silent no-op — writing `for (1; ...; ...)` is almost
    /// certainly a mistake, so it is reported instead of being dropped.
    fn emit_for_clause(&mut self, stmt: &Statement) -> Option<Opcode> {
        if let Statement::Expr { expr, line } = stmt {
            self.emit_for_clause_expr(expr, *line)
        } else {
            None
        }
    }

    fn emit_for_clause_expr(&mut self, expr: &Expression, line: usize) -> Option<Opcode> {
        match expr {
            Expression::Assign { target, value, .. } => Some(match target {
                AssignTarget::Identifier(name) => Opcode::Assign {
                    name: name.clone(),
                    value: (**value).clone(),
                    source_line: line,
                },
                AssignTarget::Index { name, index } => Opcode::ArrayAssign {
                    name: name.clone(),
                    index: (**index).clone(),
                    value: (**value).clone(),
                    source_line: line,
                },
            }),
            Expression::Call { callee, args, .. } => Some(Opcode::Call {
                callee: callee.clone(),
                args: args.clone(),
                source_line: line,
            }),
            other => {
                let (line, column) = other.position();
                self.errors.push(CompileError::new(
                    Phase::Emit,
                    "unknown node in for-loop clause: expression has no encodable effect",
                    Position::new(line, column),
                ));
                None
            }
        }
    }
}
