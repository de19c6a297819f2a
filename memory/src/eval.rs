//! Expression and predicate evaluation over joined rows.

use crate::truth::Truth;
use regex::Regex;
use sqlweave_core::expr::{AggregateFn, CompareOp, Condition, Direction, Expr};
use sqlweave_core::{Result, SqlweaveError, Value};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone)]
struct Slot {
    alias: String,
    columns: Vec<String>,
    offset: usize,
}

/// Column positions of a joined row: each source's columns laid end to end.
#[derive(Debug, Clone, Default)]
pub(crate) struct Layout {
    slots: Vec<Slot>,
    width: usize,
}

impl Layout {
    pub(crate) fn single(alias: &str, columns: Vec<String>) -> Self {
        let mut layout = Self::default();
        layout.push(alias, columns);
        layout
    }

    pub(crate) fn push(&mut self, alias: &str, columns: Vec<String>) {
        let width = columns.len();
        self.slots.push(Slot {
            alias: alias.to_string(),
            columns,
            offset: self.width,
        });
        self.width += width;
    }

    pub(crate) fn width(&self) -> usize {
        self.width
    }

    pub(crate) fn position(&self, qualifier: &str, name: &str) -> Result<usize> {
        let slot = self
            .slots
            .iter()
            .find(|s| s.alias == qualifier)
            .ok_or_else(|| {
                SqlweaveError::Execution(format!("missing FROM-clause entry for table \"{qualifier}\""))
            })?;
        slot.columns
            .iter()
            .position(|c| c == name)
            .map(|i| slot.offset + i)
            .ok_or_else(|| {
                SqlweaveError::Execution(format!("column {qualifier}.{name} does not exist"))
            })
    }
}

/// Evaluates a non-aggregate expression against one row
pub(crate) fn eval_row(layout: &Layout, expr: &Expr, row: &[Value]) -> Result<Value> {
    match expr {
        Expr::Column(col) => Ok(row[layout.position(&col.qualifier, &col.name)?].clone()),
        Expr::Excluded(col) => Ok(row[layout.position("excluded", &col.name)?].clone()),
        Expr::Value(value) => Ok(value.clone()),
        Expr::Aggregate { .. } => Err(SqlweaveError::Execution(
            "aggregate functions are not allowed here".into(),
        )),
    }
}

/// Evaluates an expression against a group of rows
pub(crate) fn eval_group(layout: &Layout, expr: &Expr, rows: &[&[Value]]) -> Result<Value> {
    match expr {
        Expr::Aggregate {
            func,
            arg,
            distinct,
        } => aggregate(layout, *func, arg.as_deref(), *distinct, rows),
        other => match rows.first() {
            Some(row) => eval_row(layout, other, row),
            None => Ok(Value::Null),
        },
    }
}

fn aggregate(
    layout: &Layout,
    func: AggregateFn,
    arg: Option<&Expr>,
    distinct: bool,
    rows: &[&[Value]],
) -> Result<Value> {
    let Some(arg) = arg else {
        return Ok(Value::Integer(rows.len() as i64));
    };
    let mut values: Vec<Value> = Vec::with_capacity(rows.len());
    for row in rows {
        let value = eval_row(layout, arg, row)?;
        if value.is_null() || (distinct && values.iter().any(|v| values_equal(v, &value))) {
            continue;
        }
        values.push(value);
    }

    match func {
        AggregateFn::Count => Ok(Value::Integer(values.len() as i64)),
        AggregateFn::Sum if values.is_empty() => Ok(Value::Null),
        AggregateFn::Sum => {
            if values.iter().all(|v| matches!(v, Value::Integer(_))) {
                values
                    .iter()
                    .try_fold(0i64, |acc, v| match v {
                        Value::Integer(i) => acc.checked_add(*i),
                        _ => Some(acc),
                    })
                    .map(Value::Integer)
                    .ok_or_else(|| SqlweaveError::Execution("bigint out of range".into()))
            } else {
                Ok(Value::Real(numeric_sum(&values)?))
            }
        }
        AggregateFn::Avg if values.is_empty() => Ok(Value::Null),
        AggregateFn::Avg => Ok(Value::Real(numeric_sum(&values)? / values.len() as f64)),
        AggregateFn::Min | AggregateFn::Max => {
            let mut best: Option<Value> = None;
            for value in values {
                let replace = match &best {
                    None => true,
                    Some(current) => {
                        let ord = compare(&value, current)?.unwrap_or(Ordering::Equal);
                        if func == AggregateFn::Min {
                            ord == Ordering::Less
                        } else {
                            ord == Ordering::Greater
                        }
                    }
                };
                if replace {
                    best = Some(value);
                }
            }
            Ok(best.unwrap_or_default())
        }
    }
}

fn numeric_sum(values: &[Value]) -> Result<f64> {
    values.iter().try_fold(0.0, |acc, v| match v {
        Value::Integer(i) => Ok(acc + *i as f64),
        Value::Real(r) => Ok(acc + r),
        other => Err(SqlweaveError::TypeMismatch(format!(
            "cannot add up non-numeric value {other}"
        ))),
    })
}

/// Evaluates a predicate; `scalar` resolves each expression
pub(crate) fn predicate<F>(condition: &Condition, scalar: &mut F) -> Result<Truth>
where
    F: FnMut(&Expr) -> Result<Value>,
{
    match condition {
        Condition::Compare { left, op, right } => {
            let l = scalar(left)?;
            let r = scalar(right)?;
            if *op == CompareOp::Like {
                return like(&l, &r);
            }
            let Some(ord) = compare(&l, &r)? else {
                return Ok(Truth::Unknown);
            };
            Ok(Truth::from(match op {
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Ne => ord != Ordering::Equal,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Le => ord != Ordering::Greater,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Ge => ord != Ordering::Less,
                CompareOp::Like => false,
            }))
        }
        Condition::In {
            expr,
            values,
            negated,
        } => {
            if values.is_empty() {
                return Ok(Truth::from(*negated));
            }
            let value = scalar(expr)?;
            if value.is_null() {
                return Ok(Truth::Unknown);
            }
            let mut truth = Truth::False;
            for candidate in values {
                let candidate = scalar(candidate)?;
                match compare(&value, &candidate)? {
                    Some(Ordering::Equal) => {
                        truth = Truth::True;
                        break;
                    }
                    None => truth = Truth::Unknown,
                    Some(_) => {}
                }
            }
            Ok(if *negated { truth.not() } else { truth })
        }
        Condition::Null { expr, negated } => {
            let null = scalar(expr)?.is_null();
            Ok(Truth::from(null != *negated))
        }
        Condition::And(items) => items.iter().try_fold(Truth::True, |acc, item| {
            Ok(acc.and(predicate(item, scalar)?))
        }),
        Condition::Or(items) => items.iter().try_fold(Truth::False, |acc, item| {
            Ok(acc.or(predicate(item, scalar)?))
        }),
        Condition::Not(inner) => Ok(predicate(inner, scalar)?.not()),
    }
}

/// SQL comparison; `None` when either side is NULL
pub(crate) fn compare(a: &Value, b: &Value) -> Result<Option<Ordering>> {
    Ok(match (a, b) {
        (Value::Null, _) | (_, Value::Null) => None,
        (Value::Integer(x), Value::Integer(y)) => Some(x.cmp(y)),
        (Value::Integer(x), Value::Real(y)) => (*x as f64).partial_cmp(y),
        (Value::Real(x), Value::Integer(y)) => x.partial_cmp(&(*y as f64)),
        (Value::Real(x), Value::Real(y)) => x.partial_cmp(y),
        (Value::Text(x), Value::Text(y)) => Some(x.cmp(y)),
        (Value::Boolean(x), Value::Boolean(y)) => Some(x.cmp(y)),
        (Value::Timestamp(x), Value::Timestamp(y)) => Some(x.cmp(y)),
        (Value::Uuid(x), Value::Uuid(y)) => Some(x.cmp(y)),
        _ => {
            return Err(SqlweaveError::TypeMismatch(format!(
                "operator does not exist for {a} and {b}"
            )));
        }
    })
}

pub(crate) fn values_equal(a: &Value, b: &Value) -> bool {
    matches!(compare(a, b), Ok(Some(Ordering::Equal)))
}

/// ORDER BY comparison: NULLs sort last ascending, first descending
pub(crate) fn sort_order(a: &Value, b: &Value, direction: Direction) -> Ordering {
    let ord = match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => compare(a, b).ok().flatten().unwrap_or(Ordering::Equal),
    };
    match direction {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}

/// `%` matches any run of characters, `_` exactly one
fn like(value: &Value, pattern: &Value) -> Result<Truth> {
    let (value, pattern) = match (value, pattern) {
        (Value::Null, _) | (_, Value::Null) => return Ok(Truth::Unknown),
        (Value::Text(v), Value::Text(p)) => (v, p),
        _ => {
            return Err(SqlweaveError::TypeMismatch(format!(
                "LIKE needs text operands, got {value} and {pattern}"
            )));
        }
    };
    let mut regex = String::from("(?s)^");
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            c => regex.push_str(&regex::escape(c.encode_utf8(&mut buf))),
        }
    }
    regex.push('$');
    let re = Regex::new(&regex)
        .map_err(|e| SqlweaveError::Execution(format!("invalid LIKE pattern: {e}")))?;
    Ok(Truth::from(re.is_match(value)))
}

/// Hashable tuple of values for grouping and distinct
#[derive(Debug, Clone)]
pub(crate) struct Key(pub(crate) Vec<Value>);

impl PartialEq for Key {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self.0.iter().zip(&other.0).all(|(a, b)| match (a, b) {
                (Value::Real(x), Value::Real(y)) => x.to_bits() == y.to_bits(),
                _ => a == b,
            })
    }
}

impl Eq for Key {}

impl Hash for Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            std::mem::discriminant(value).hash(state);
            match value {
                Value::Null => {}
                Value::Text(s) => s.hash(state),
                Value::Integer(i) => i.hash(state),
                Value::Real(r) => r.to_bits().hash(state),
                Value::Boolean(b) => b.hash(state),
                Value::Timestamp(ts) => ts.hash(state),
                Value::Uuid(id) => id.hash(state),
            }
        }
    }
}
