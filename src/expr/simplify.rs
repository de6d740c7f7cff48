use super::{BinOp, Expr, UnOp};

/// Simplify an expression bottom-up: fold numeric subtrees and apply the
/// identity rules that remove zero and unit terms. Pure function; no env.
pub fn simplify(expr: &Expr) -> Expr {
    match expr {
        Expr::Number(_) | Expr::Variable(_) => expr.clone(),
        Expr::Call { name, args } => Expr::call(name.clone(), args.iter().map(simplify).collect()),
        Expr::Unary {
            op: UnOp::Neg,
            operand,
        } => {
            let inner = simplify(operand);
            match inner {
                Expr::Number(n) => Expr::number(-n),
                Expr::Unary {
                    op: UnOp::Neg,
                    operand,
                } => *operand,
                other => Expr::neg(other),
            }
        }
        Expr::Binary { op, lhs, rhs } => {
            let l = simplify(lhs);
            let r = simplify(rhs);
            if let (Expr::Number(a), Expr::Number(b)) = (&l, &r) {
                if let Some(folded) = fold(*op, *a, *b) {
                    return Expr::number(folded);
                }
            }
            match op {
                BinOp::Add => {
                    if is_zero(&l) {
                        r
                    } else if is_zero(&r) {
                        l
                    } else {
                        Expr::add(l, r)
                    }
                }
                BinOp::Sub => {
                    if is_zero(&r) {
                        l
                    } else if is_zero(&l) {
                        simplify(&Expr::neg(r))
                    } else {
                        Expr::sub(l, r)
                    }
                }
                BinOp::Mul => {
                    if is_zero(&l) || is_zero(&r) {
                        Expr::number(0.0)
                    } else if is_one(&l) {
                        r
                    } else if is_one(&r) {
                        l
                    } else {
                        Expr::mul(l, r)
                    }
                }
                BinOp::Div => {
                    if is_zero(&l) && !is_zero(&r) {
                        Expr::number(0.0)
                    } else if is_one(&r) {
                        l
                    } else {
                        Expr::div(l, r)
                    }
                }
                BinOp::Pow => {
                    if is_zero(&r) {
                        Expr::number(1.0)
                    } else if is_one(&r) {
                        l
                    } else if is_one(&l) {
                        Expr::number(1.0)
                    } else {
                        Expr::pow(l, r)
                    }
                }
            }
        }
    }
}

/// Numeric fold; division by zero is left unfolded.
fn fold(op: BinOp, a: f64, b: f64) -> Option<f64> {
    match op {
        BinOp::Add => Some(a + b),
        BinOp::Sub => Some(a - b),
        BinOp::Mul => Some(a * b),
        BinOp::Div => {
            if b == 0.0 {
                None
            } else {
                Some(a / b)
            }
        }
        BinOp::Pow => Some(a.powf(b)),
    }
}

fn is_zero(expr: &Expr) -> bool {
    matches!(expr, Expr::Number(n) if *n == 0.0)
}

fn is_one(expr: &Expr) -> bool {
    matches!(expr, Expr::Number(n) if *n == 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_numeric_subtrees() {
        let e = Expr::add(Expr::number(1.0), Expr::mul(Expr::number(2.0), Expr::number(3.0)));
        assert_eq!(simplify(&e), Expr::number(7.0));
    }

    #[test]
    fn division_by_zero_is_left_alone() {
        let e = Expr::div(Expr::number(4.0), Expr::number(0.0));
        assert_eq!(simplify(&e), e);
    }

    #[test]
    fn removes_zero_terms() {
        let x = Expr::variable("x");
        let e = Expr::add(
            Expr::mul(x.clone(), Expr::number(0.0)),
            Expr::mul(Expr::variable("x_"), Expr::variable("g")),
        );
        assert_eq!(
            simplify(&e),
            Expr::mul(Expr::variable("x_"), Expr::variable("g"))
        );
    }

    #[test]
    fn unit_identities() {
        let x = Expr::variable("x");
        assert_eq!(simplify(&Expr::mul(Expr::number(1.0), x.clone())), x);
        assert_eq!(simplify(&Expr::div(x.clone(), Expr::number(1.0))), x);
        assert_eq!(simplify(&Expr::pow(x.clone(), Expr::number(1.0))), x);
        assert_eq!(
            simplify(&Expr::pow(x.clone(), Expr::number(0.0))),
            Expr::number(1.0)
        );
        assert_eq!(simplify(&Expr::sub(x.clone(), Expr::number(0.0))), x);
    }

    #[test]
    fn double_negation() {
        let x = Expr::variable("x");
        assert_eq!(simplify(&Expr::neg(Expr::neg(x.clone()))), x);
    }
}
