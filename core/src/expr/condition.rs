use super::Expr;
use crate::sql::{SQL, ToSQL, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
}

impl CompareOp {
    const fn token(self) -> Token {
        match self {
            CompareOp::Eq => Token::EQ,
            CompareOp::Ne => Token::NE,
            CompareOp::Lt => Token::LT,
            CompareOp::Le => Token::LE,
            CompareOp::Gt => Token::GT,
            CompareOp::Ge => Token::GE,
            CompareOp::Like => Token::LIKE,
        }
    }
}

/// A predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Compare {
        left: Expr,
        op: CompareOp,
        right: Expr,
    },
    In {
        expr: Expr,
        values: Vec<Expr>,
        negated: bool,
    },
    Null {
        expr: Expr,
        negated: bool,
    },
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Visits every expression in the tree
    pub fn visit_exprs<'a>(&'a self, f: &mut impl FnMut(&'a Expr)) {
        match self {
            Condition::Compare { left, right, .. } => {
                f(left);
                f(right);
            }
            Condition::In { expr, values, .. } => {
                f(expr);
                values.iter().for_each(&mut *f);
            }
            Condition::Null { expr, .. } => f(expr),
            Condition::And(items) | Condition::Or(items) => {
                for item in items {
                    item.visit_exprs(f);
                }
            }
            Condition::Not(inner) => inner.visit_exprs(f),
        }
    }

    /// Every expression in the tree, in visiting order
    pub fn exprs(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        self.visit_exprs(&mut |e| out.push(e));
        out
    }

    /// Combines with another condition using AND
    pub fn and(self, other: Condition) -> Condition {
        match self {
            Condition::And(mut items) => {
                items.push(other);
                Condition::And(items)
            }
            first => Condition::And(vec![first, other]),
        }
    }
}

fn compare(left: impl Into<Expr>, op: CompareOp, right: impl Into<Expr>) -> Condition {
    Condition::Compare {
        left: left.into(),
        op,
        right: right.into(),
    }
}

pub fn eq(left: impl Into<Expr>, right: impl Into<Expr>) -> Condition {
    compare(left, CompareOp::Eq, right)
}

pub fn neq(left: impl Into<Expr>, right: impl Into<Expr>) -> Condition {
    compare(left, CompareOp::Ne, right)
}

pub fn gt(left: impl Into<Expr>, right: impl Into<Expr>) -> Condition {
    compare(left, CompareOp::Gt, right)
}

pub fn gte(left: impl Into<Expr>, right: impl Into<Expr>) -> Condition {
    compare(left, CompareOp::Ge, right)
}

pub fn lt(left: impl Into<Expr>, right: impl Into<Expr>) -> Condition {
    compare(left, CompareOp::Lt, right)
}

pub fn lte(left: impl Into<Expr>, right: impl Into<Expr>) -> Condition {
    compare(left, CompareOp::Le, right)
}

/// SQL LIKE with `%` and `_` wildcards
pub fn like(expr: impl Into<Expr>, pattern: impl Into<Expr>) -> Condition {
    compare(expr, CompareOp::Like, pattern)
}

pub fn in_array<I, V>(expr: impl Into<Expr>, values: I) -> Condition
where
    I: IntoIterator<Item = V>,
    V: Into<Expr>,
{
    Condition::In {
        expr: expr.into(),
        values: values.into_iter().map(Into::into).collect(),
        negated: false,
    }
}

pub fn not_in_array<I, V>(expr: impl Into<Expr>, values: I) -> Condition
where
    I: IntoIterator<Item = V>,
    V: Into<Expr>,
{
    Condition::In {
        expr: expr.into(),
        values: values.into_iter().map(Into::into).collect(),
        negated: true,
    }
}

pub fn is_null(expr: impl Into<Expr>) -> Condition {
    Condition::Null {
        expr: expr.into(),
        negated: false,
    }
}

pub fn is_not_null(expr: impl Into<Expr>) -> Condition {
    Condition::Null {
        expr: expr.into(),
        negated: true,
    }
}

pub fn and(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::And(conditions.into_iter().collect())
}

pub fn or(conditions: impl IntoIterator<Item = Condition>) -> Condition {
    Condition::Or(conditions.into_iter().collect())
}

pub fn not(condition: Condition) -> Condition {
    Condition::Not(Box::new(condition))
}

fn junction<'a>(items: &'a [Condition], separator: Token, empty: &'static str) -> SQL<'a> {
    match items {
        [] => SQL::raw(empty),
        [only] => only.to_sql(),
        _ => SQL::join(items.iter().map(ToSQL::to_sql), separator).parens(),
    }
}

impl ToSQL for Condition {
    fn to_sql(&self) -> SQL<'_> {
        match self {
            Condition::Compare { left, op, right } => left.to_sql().push(op.token()).append(right.to_sql()),
            Condition::In {
                expr,
                values,
                negated,
            } => {
                if values.is_empty() {
                    return SQL::raw(if *negated { "true" } else { "false" });
                }
                let mut sql = expr.to_sql();
                if *negated {
                    sql.push_mut(Token::NOT);
                }
                sql.push(Token::IN)
                    .append(SQL::join(values.iter().map(ToSQL::to_sql), Token::COMMA).parens())
            }
            Condition::Null { expr, negated } => {
                let sql = expr.to_sql().push(Token::IS);
                if *negated {
                    sql.push(Token::NOT).push(Token::NULL)
                } else {
                    sql.push(Token::NULL)
                }
            }
            Condition::And(items) => junction(items, Token::AND, "true"),
            Condition::Or(items) => junction(items, Token::OR, "false"),
            Condition::Not(inner) => SQL::token(Token::NOT).append(inner.to_sql().parens()),
        }
    }
}
