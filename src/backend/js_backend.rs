use std::collections::HashMap;

use itertools::{process_results, Itertools};
use lazy_static::lazy_static;
use thiserror::Error;

use crate::frontend::{ast::Node, lexer::Ops};
use crate::stack::guarded;

// Same table the parser's grammar tiers encode: `*` and `/` bind tighter
// than `+` and `-`.
lazy_static! {
    static ref OP_PRECEDENCE: HashMap<Ops, i32> = {
        let mut map = HashMap::new();
        map.insert(Ops::Plus, 20);
        map.insert(Ops::Minus, 20);
        map.insert(Ops::Mult, 40);
        map.insert(Ops::Div, 40);
        map
    };
}

#[derive(Error, PartialEq, Debug)]
pub enum BackendError {
    #[error("cannot generate code for unsupported AST node kind {0}")]
    UnsupportedNode(String),
}

type CodeGenResult = Result<String, BackendError>;

// The method codegen renders a node, and recursively its children, as
// JavaScript source text.
pub trait JsCodeGen {
    fn codegen(&self) -> CodeGenResult;
}

/// Render a whole tree as JavaScript.
pub fn generate(ast: &Node) -> CodeGenResult {
    ast.codegen()
}

fn precedence(op: Ops) -> i32 {
    OP_PRECEDENCE[&op]
}

// Nothing under `+` or `-` is wrapped. Under `*` and `/`, left children
// only need wrapping when they bind looser than the parent.
fn wrap_left(child: &Node, parent: Ops) -> bool {
    match child {
        Node::BinaryExpression { operator, .. } if !parent.is_additive() => {
            precedence(*operator) < precedence(parent)
        }
        _ => false,
    }
}

// Right children of `*` and `/` are wrapped when they bind looser, and a
// `/` is always wrapped. A `*` under a `/` is not, nor is anything under
// `+` or `-`, so `2 / (3 * 4)` and `1 - (2 - 3)` lose their grouping.
fn wrap_right(child: &Node, parent: Ops) -> bool {
    match child {
        Node::BinaryExpression { operator, .. } if !parent.is_additive() => {
            precedence(*operator) < precedence(parent) || *operator == Ops::Div
        }
        _ => false,
    }
}

impl JsCodeGen for Node {
    fn codegen(&self) -> CodeGenResult {
        let mut out = String::new();
        emit(self, &mut out)?;

        Ok(out)
    }
}

fn emit(node: &Node, out: &mut String) -> Result<(), BackendError> {
    use Node::*;

    guarded(|| {
        match node {
            Program { body } => {
                let statements = process_results(body.iter().map(Node::codegen), |mut stmts| {
                    stmts.join(";\n")
                })?;

                out.push_str(&statements);
                out.push_str(";\n");
            }

            ExpressionStatement { expression } => emit(expression, out)?,

            CallExpression {
                callee, arguments, ..
            } => {
                emit(callee, out)?;

                let args = process_results(arguments.iter().map(Node::codegen), |mut args| {
                    args.join(", ")
                })?;

                out.push('(');
                out.push_str(&args);
                out.push(')');
            }

            MemberExpression {
                object,
                property,
                computed,
                optional,
            } => {
                emit(object, out)?;

                if *optional {
                    out.push('?');
                }

                if *computed {
                    out.push_str("[`");
                    emit(property, out)?;
                    out.push_str("`]");
                } else {
                    out.push('.');
                    emit(property, out)?;
                }
            }

            BinaryExpression { .. } => emit_binary(node, out)?,

            Identifier { name } => out.push_str(name),

            // The raw text, so `1.50` is not turned into `1.5`
            Literal { raw, .. } => out.push_str(raw),

            Unknown { kind } => return Err(BackendError::UnsupportedNode(kind.clone())),
        }

        Ok(())
    })
}

// `1 + 2 + ... + n` nests as deep as it is long, so the left spine is
// walked in a loop and only right operands are recursed into.
fn emit_binary(node: &Node, out: &mut String) -> Result<(), BackendError> {
    let mut spine = Vec::new();
    let mut leftmost = node;

    while let Node::BinaryExpression {
        operator,
        left,
        right,
    } = leftmost
    {
        spine.push((*operator, wrap_left(left, *operator), right));
        leftmost = &**left;
    }

    // Every wrapped left operand opens before the leftmost leaf
    for _ in spine.iter().filter(|(_, wrapped, _)| *wrapped) {
        out.push('(');
    }

    emit(leftmost, out)?;

    for (operator, wrapped, right) in spine.into_iter().rev() {
        if wrapped {
            out.push(')');
        }

        out.push(' ');
        out.push(operator.as_char());
        out.push(' ');

        if wrap_right(right, operator) {
            out.push('(');
            emit(right, out)?;
            out.push(')');
        } else {
            emit(right, out)?;
        }
    }

    Ok(())
}
