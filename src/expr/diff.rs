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

//! Forward-mode tangent rules for expressions.
//!
//! `active` classifies variable names: a name that resolves in the scope of
//! the function being differentiated (a parameter or a local flow) has a
//! tangent and maps to its marker twin; every other name is a constant with
//! tangent zero. Calls map to marker-suffixed calls of the tangent
//! arguments, which is the convention the cross-module resolver keys on.

use crate::resolve::naming;

use super::{BinOp, Expr, UnOp};

/// Build the tangent of `expr` under the given active-variable predicate.
///
/// The result is not simplified; zero terms introduced by constant operands
/// are removed by the owning context's simplification pass.
pub fn tangent(expr: &Expr, active: &dyn Fn(&str) -> bool) -> Expr {
    match expr {
        Expr::Number(_) => Expr::number(0.0),
        Expr::Variable(name) => {
            if active(name) {
                Expr::variable(naming::mark(name))
            } else {
                Expr::number(0.0)
            }
        }
        Expr::Call { name, args } => Expr::call(
            naming::mark(name),
            args.iter().map(|arg| tangent(arg, active)).collect(),
        ),
        Expr::Unary {
            op: UnOp::Neg,
            operand,
        } => Expr::neg(tangent(operand, active)),
        Expr::Binary { op, lhs, rhs } => {
            let dl = tangent(lhs, active);
            let dr = tangent(rhs, active);
            let a = lhs.as_ref().clone();
            let b = rhs.as_ref().clone();
            match op {
                BinOp::Add => Expr::add(dl, dr),
                BinOp::Sub => Expr::sub(dl, dr),
                // (a*b)' = a'*b + a*b'
                BinOp::Mul => Expr::add(Expr::mul(dl, b), Expr::mul(a, dr)),
                // (a/b)' = (a'*b - a*b') / b^2
                BinOp::Div => Expr::div(
                    Expr::sub(Expr::mul(dl, b.clone()), Expr::mul(a, dr)),
                    Expr::pow(b, Expr::number(2.0)),
                ),
                // (a^b)' = b*a^(b-1)*a' + a^b*ln(a)*b'; for a constant
                // exponent the logarithmic term carries b' = 0 and is
                // dropped by simplification.
                BinOp::Pow => Expr::add(
                    Expr::mul(
                        Expr::mul(
                            b.clone(),
                            Expr::pow(a.clone(), Expr::sub(b.clone(), Expr::number(1.0))),
                        ),
                        dl,
                    ),
                    Expr::mul(
                        Expr::mul(Expr::pow(a.clone(), b), Expr::call("ln", vec![a])),
                        dr,
                    ),
                ),
            }
        }
    }
}
