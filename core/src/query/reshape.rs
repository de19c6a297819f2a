use crate::relation::Cardinality;
use crate::value::{Nested, QueryRow, Row, Value};
use indexmap::IndexMap;
use std::hash::{Hash, Hasher};

/// One table in a compiled nested read: where its fields sit in the flat row.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Node {
    /// Output field name and its position in the row
    pub(crate) fields: Vec<(String, usize)>,
    /// Positions of the columns that identify one row of this table
    pub(crate) identity: Vec<usize>,
    pub(crate) children: Vec<Child>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Child {
    pub(crate) name: String,
    pub(crate) cardinality: Cardinality,
    pub(crate) node: Node,
}

/// Folds flat join rows into nested [`QueryRow`]s.
///
/// Rows are grouped by the identity columns of each table, in order of first
/// appearance, so parents and children keep the order the rows arrived in. A
/// joined table whose identity is entirely NULL had no match: it becomes
/// `None` for a to-one relation and adds nothing to a to-many relation.
/// Reshaping is pure; the same rows always produce the same trees.
#[derive(Debug, Clone, PartialEq)]
pub struct Reshaper {
    root: Node,
}

impl Reshaper {
    pub(crate) fn new(root: Node) -> Self {
        Self { root }
    }

    pub fn reshape(&self, rows: &[Row]) -> Vec<QueryRow> {
        let rows: Vec<&Row> = rows.iter().collect();
        reshape_node(&self.root, &rows)
    }
}

fn reshape_node(node: &Node, rows: &[&Row]) -> Vec<QueryRow> {
    let mut groups: IndexMap<GroupKey<'_>, Vec<&Row>> = IndexMap::new();
    for &row in rows {
        let key: Vec<&Value> = node
            .identity
            .iter()
            .map(|&i| row.value(i).unwrap_or(&Value::Null))
            .collect();
        if key.iter().all(|v| v.is_null()) {
            continue;
        }
        groups.entry(GroupKey(key)).or_default().push(row);
    }

    groups
        .into_values()
        .map(|group| {
            let first = group[0];
            let fields = node
                .fields
                .iter()
                .map(|(name, i)| (name.clone(), first.value(*i).cloned().unwrap_or_default()))
                .collect();
            let relations = node
                .children
                .iter()
                .map(|child| {
                    let nested = reshape_node(&child.node, &group);
                    let value = match child.cardinality {
                        Cardinality::One => Nested::One(nested.into_iter().next().map(Box::new)),
                        Cardinality::Many => Nested::Many(nested),
                    };
                    (child.name.clone(), value)
                })
                .collect();
            QueryRow { fields, relations }
        })
        .collect()
}

/// Identity values of one table row. Reals compare by bit pattern.
#[derive(Debug)]
struct GroupKey<'r>(Vec<&'r Value>);

impl PartialEq for GroupKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(&other.0)
                .all(|(a, b)| match (a, b) {
                    (Value::Real(x), Value::Real(y)) => x.to_bits() == y.to_bits(),
                    _ => a == b,
                })
    }
}

impl Eq for GroupKey<'_> {}

impl Hash for GroupKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for value in &self.0 {
            core::mem::discriminant(*value).hash(state);
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
