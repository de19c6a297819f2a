use super::Expr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateFn {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFn {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AggregateFn::Count => "count",
            AggregateFn::Sum => "sum",
            AggregateFn::Avg => "avg",
            AggregateFn::Min => "min",
            AggregateFn::Max => "max",
        }
    }
}

fn aggregate(func: AggregateFn, arg: impl Into<Expr>, distinct: bool) -> Expr {
    Expr::Aggregate {
        func,
        arg: Some(Box::new(arg.into())),
        distinct,
    }
}

/// `count(expr)`: non-null values
pub fn count(expr: impl Into<Expr>) -> Expr {
    aggregate(AggregateFn::Count, expr, false)
}

/// `count(*)`
pub fn count_all() -> Expr {
    Expr::Aggregate {
        func: AggregateFn::Count,
        arg: None,
        distinct: false,
    }
}

pub fn count_distinct(expr: impl Into<Expr>) -> Expr {
    aggregate(AggregateFn::Count, expr, true)
}

pub fn sum(expr: impl Into<Expr>) -> Expr {
    aggregate(AggregateFn::Sum, expr, false)
}

pub fn avg(expr: impl Into<Expr>) -> Expr {
    aggregate(AggregateFn::Avg, expr, false)
}

pub fn min(expr: impl Into<Expr>) -> Expr {
    aggregate(AggregateFn::Min, expr, false)
}

pub fn max(expr: impl Into<Expr>) -> Expr {
    aggregate(AggregateFn::Max, expr, false)
}
