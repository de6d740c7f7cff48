// Copyright 2025 STARGA Inc.
// Licensed under the Apache License, Version 2.0 (the “License”);
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at:
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an “AS IS” BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Part of the TANGENT project (symbolic derivative generation for mission scripts).

//! Expression model shared by the dataflow engine.
//!
//! Expressions are immutable trees handed over by the host's parser. The
//! engine never evaluates them; it only rebuilds them ([`diff`], [`simplify`])
//! and renders them back to source form.

use std::fmt;
use std::ops::ControlFlow;

pub mod diff;
pub mod simplify;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number(f64),
    Variable(String),
    Call {
        name: String,
        args: Vec<Expr>,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

/// What to do with the children of the node just visited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Descend into the node's children.
    Into,
    /// Skip the node's children and continue with its siblings.
    Over,
}

impl Expr {
    pub fn number(value: f64) -> Expr {
        Expr::Number(value)
    }

    pub fn variable(name: impl Into<String>) -> Expr {
        Expr::Variable(name.into())
    }

    pub fn call(name: impl Into<String>, args: Vec<Expr>) -> Expr {
        Expr::Call {
            name: name.into(),
            args,
        }
    }

    pub fn neg(operand: Expr) -> Expr {
        Expr::Unary {
            op: UnOp::Neg,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    pub fn add(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Add, lhs, rhs)
    }

    pub fn sub(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Sub, lhs, rhs)
    }

    pub fn mul(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Mul, lhs, rhs)
    }

    pub fn div(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Div, lhs, rhs)
    }

    pub fn pow(lhs: Expr, rhs: Expr) -> Expr {
        Expr::binary(BinOp::Pow, lhs, rhs)
    }

    /// Pre-order walk with early termination.
    ///
    /// The visitor decides per node whether to descend ([`Step::Into`]) or
    /// skip the subtree ([`Step::Over`]), and can abort the whole walk by
    /// returning [`ControlFlow::Break`]. The short-circuit is threaded
    /// through every recursive step, so no state is shared across the walk.
    pub fn walk<T>(
        &self,
        visit: &mut impl FnMut(&Expr) -> ControlFlow<T, Step>,
    ) -> ControlFlow<T, ()> {
        let step = visit(self)?;
        if step == Step::Over {
            return ControlFlow::Continue(());
        }
        match self {
            Expr::Number(_) | Expr::Variable(_) => {}
            Expr::Call { args, .. } => {
                for arg in args {
                    arg.walk(visit)?;
                }
            }
            Expr::Unary { operand, .. } => {
                operand.walk(visit)?;
            }
            Expr::Binary { lhs, rhs, .. } => {
                lhs.walk(visit)?;
                rhs.walk(visit)?;
            }
        }
        ControlFlow::Continue(())
    }

    fn precedence(&self) -> u8 {
        match self {
            Expr::Binary { op, .. } => match op {
                BinOp::Add | BinOp::Sub => 1,
                BinOp::Mul | BinOp::Div => 2,
                BinOp::Pow => 4,
            },
            Expr::Unary { .. } => 3,
            Expr::Number(_) | Expr::Variable(_) | Expr::Call { .. } => 5,
        }
    }

    fn fmt_prec(&self, f: &mut fmt::Formatter<'_>, min: u8) -> fmt::Result {
        let prec = self.precedence();
        if prec < min {
            write!(f, "(")?;
        }
        match self {
            Expr::Number(value) => write_number(f, *value)?,
            Expr::Variable(name) => write!(f, "{}", name)?,
            Expr::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    arg.fmt_prec(f, 0)?;
                }
                write!(f, ")")?;
            }
            Expr::Unary {
                op: UnOp::Neg,
                operand,
            } => {
                write!(f, "-")?;
                operand.fmt_prec(f, prec)?;
            }
            Expr::Binary { op, lhs, rhs } => match op {
                // ^ is right-associative and rendered without spaces.
                BinOp::Pow => {
                    lhs.fmt_prec(f, prec + 1)?;
                    write!(f, "^")?;
                    rhs.fmt_prec(f, prec)?;
                }
                _ => {
                    let symbol = match op {
                        BinOp::Add => "+",
                        BinOp::Sub => "-",
                        BinOp::Mul => "*",
                        BinOp::Div => "/",
                        BinOp::Pow => unreachable!(),
                    };
                    lhs.fmt_prec(f, prec)?;
                    write!(f, " {} ", symbol)?;
                    rhs.fmt_prec(f, prec + 1)?;
                }
            },
        }
        if prec < min {
            write!(f, ")")?;
        }
        Ok(())
    }
}

fn write_number(f: &mut fmt::Formatter<'_>, value: f64) -> fmt::Result {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        write!(f, "{}", value as i64)
    } else {
        write!(f, "{}", value)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_prec(f, 0)
    }
}
