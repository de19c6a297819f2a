use super::reshape::{Child, Node, Reshaper};
use super::{FindOptions, Shape};
use crate::builder::{IntoPlan, Scope};
use crate::error::{Result, SqlweaveError};
use crate::expr::{ColumnRef, CompareOp, Condition, Expr, OrderBy, SelectItem, asc};
use crate::plan::{Join, JoinType, SelectPlan, Source, StatementPlan};
use crate::relation::{JoinPath, RelationGraph};
use crate::schema::{Schema, Table, TableId, TableInfo};
use crate::value::{QueryRow, Row};

/// A nested read compiled to one select plus the function that reshapes its rows.
#[derive(Debug, Clone)]
pub struct CompiledQuery {
    plan: StatementPlan,
    reshaper: Reshaper,
}

impl CompiledQuery {
    pub fn plan(&self) -> &StatementPlan {
        &self.plan
    }

    pub fn reshaper(&self) -> &Reshaper {
        &self.reshaper
    }

    /// Folds rows returned for [`plan`](Self::plan) into nested results
    pub fn reshape(&self, rows: &[Row]) -> Vec<QueryRow> {
        self.reshaper.reshape(rows)
    }
}

impl IntoPlan for CompiledQuery {
    fn into_plan(&self) -> Result<StatementPlan> {
        Ok(self.plan.clone())
    }
}

fn build_err(msg: impl Into<String>) -> SqlweaveError {
    SqlweaveError::Build(msg.into())
}

/// Compiles a nested read rooted at `table`.
///
/// Each traversed relation becomes a left join aliased by its path from the
/// root (`user__posts`, `user__posts__comments`), so a table reached twice
/// never collides with itself. Many-to-many relations join their junction
/// as `<alias>__via`. Root paging runs in a derived table so that fan-out
/// from joined children never cuts a parent's related rows short.
pub fn compile(table: &Table, options: &FindOptions) -> Result<CompiledQuery> {
    if table.is_aliased() {
        return Err(build_err("nested reads start from an unaliased table"));
    }
    let schema = table.schema();
    let graph = schema.relations()?;

    let mut scope = Scope::default();
    scope.add(table)?;
    if let Some(filter) = &options.filter {
        if filter.exprs().iter().any(|e| e.is_aggregate()) {
            return Err(build_err("aggregates are not allowed in a nested read filter"));
        }
        scope.check_condition(filter)?;
    }
    for order in &options.order_by {
        if order.expr.is_aggregate() {
            return Err(build_err("nested reads cannot be ordered by an aggregate"));
        }
        scope.check_expr(&order.expr)?;
    }

    let mut compiler = Compiler {
        schema,
        graph,
        projection: Vec::new(),
        joins: Vec::new(),
        order: Vec::new(),
    };
    let root = compiler.node(table.id(), table.name(), &options.shape)?;

    let mut order_by = options.order_by.clone();
    order_by.append(&mut compiler.order);

    let paged = options.limit.is_some() || options.offset.is_some();
    let (from, filter) = if paged {
        let mut inner = SelectPlan::new(Source::table(table.name()));
        inner.projection = table.columns().iter().map(SelectItem::from).collect();
        inner.filter = options.filter.clone();
        inner.order_by = options.order_by.clone();
        inner.order_by.extend(
            table
                .info()
                .identity_columns()
                .into_iter()
                .map(|i| asc(column_ref(table.name(), table.info(), i))),
        );
        inner.limit = options.limit;
        inner.offset = options.offset;
        let source = Source::Subquery {
            plan: Box::new(inner),
            alias: table.name().to_string(),
        };
        (source, None)
    } else {
        (Source::table(table.name()), options.filter.clone())
    };

    let mut plan = SelectPlan::new(from);
    plan.projection = compiler.projection;
    plan.joins = compiler.joins;
    plan.filter = filter;
    plan.order_by = order_by;

    Ok(CompiledQuery {
        plan: StatementPlan::Select(plan),
        reshaper: Reshaper::new(root),
    })
}

struct Compiler<'s> {
    schema: &'s Schema,
    graph: &'s RelationGraph,
    projection: Vec<SelectItem>,
    joins: Vec<Join>,
    order: Vec<OrderBy>,
}

impl<'s> Compiler<'s> {
    fn fetch(&mut self, alias: &str, info: &TableInfo, column: usize) -> usize {
        let expr = column_ref(alias, info, column);
        self.projection
            .push(expr.alias(format!("{alias}.{}", info.column(column).name)));
        self.projection.len() - 1
    }

    fn node(&mut self, id: TableId, alias: &str, shape: &Shape) -> Result<Node> {
        let schema = self.schema;
        let graph = self.graph;
        let info = schema.info(id);

        let output = output_columns(info, &shape.columns)?;
        let mut fields = Vec::with_capacity(output.len());
        for &column in &output {
            let position = self.fetch(alias, info, column);
            fields.push((info.column(column).name.clone(), column, position));
        }

        let mut identity = Vec::new();
        for column in info.identity_columns() {
            let position = match fields.iter().find(|(_, c, _)| *c == column) {
                Some((_, _, position)) => *position,
                None => self.fetch(alias, info, column),
            };
            identity.push(position);
            self.order.push(asc(column_ref(alias, info, column)));
        }

        let mut children = Vec::with_capacity(shape.with.len());
        for (name, child_shape) in &shape.with {
            if fields.iter().any(|(field, _, _)| field == name) {
                return Err(build_err(format!(
                    "relation '{name}' on '{}' has the same name as one of its columns",
                    info.name
                )));
            }
            let relation = graph.get(id, name).ok_or_else(|| {
                build_err(format!("'{}' has no relation named '{name}'", info.name))
            })?;
            let target = schema.info(relation.target);
            let child_alias = format!("{alias}__{name}");

            match &relation.path {
                JoinPath::Direct { pairs } => {
                    self.joins.push(Join {
                        kind: JoinType::Left,
                        source: aliased(target, &child_alias),
                        on: on_pairs(alias, info, &child_alias, target, pairs),
                    });
                }
                JoinPath::Through {
                    junction,
                    source_pairs,
                    target_pairs,
                } => {
                    let junction = schema.info(*junction);
                    let via = format!("{child_alias}__via");
                    self.joins.push(Join {
                        kind: JoinType::Left,
                        source: aliased(junction, &via),
                        on: on_pairs(alias, info, &via, junction, source_pairs),
                    });
                    self.joins.push(Join {
                        kind: JoinType::Left,
                        source: aliased(target, &child_alias),
                        on: on_pairs(&via, junction, &child_alias, target, target_pairs),
                    });
                }
            }

            let node = self.node(relation.target, &child_alias, child_shape)?;
            children.push(Child {
                name: name.clone(),
                cardinality: relation.cardinality,
                node,
            });
        }

        Ok(Node {
            fields: fields
                .into_iter()
                .map(|(name, _, position)| (name, position))
                .collect(),
            identity,
            children,
        })
    }
}

/// Declaration-ordered output columns for a column selection
fn output_columns(info: &TableInfo, selection: &[(String, bool)]) -> Result<Vec<usize>> {
    for (i, (name, include)) in selection.iter().enumerate() {
        if info.column_index(name).is_none() {
            return Err(build_err(format!("'{}' has no column '{name}'", info.name)));
        }
        if selection[..i].iter().any(|(other, flag)| other == name && flag != include) {
            return Err(build_err(format!(
                "column '{name}' is both included and excluded"
            )));
        }
    }
    let listed = |name: &str, flag: bool| selection.iter().any(|(n, f)| n == name && *f == flag);
    let any_included = selection.iter().any(|(_, include)| *include);

    Ok(info
        .columns
        .iter()
        .enumerate()
        .filter(|(_, column)| {
            if any_included {
                listed(&column.name, true)
            } else {
                !listed(&column.name, false)
            }
        })
        .map(|(index, _)| index)
        .collect())
}

fn column_ref(alias: &str, info: &TableInfo, column: usize) -> Expr {
    let def = info.column(column);
    Expr::Column(ColumnRef::new(alias, info.name.as_str(), def.name.as_str(), def.sql_type.clone()))
}

fn aliased(info: &TableInfo, alias: &str) -> Source {
    Source::Table {
        name: info.name.clone(),
        alias: alias.to_string(),
    }
}

fn on_pairs(
    left_alias: &str,
    left: &TableInfo,
    right_alias: &str,
    right: &TableInfo,
    pairs: &[(usize, usize)],
) -> Condition {
    let mut conditions: Vec<Condition> = pairs
        .iter()
        .map(|&(l, r)| Condition::Compare {
            left: column_ref(left_alias, left, l),
            op: CompareOp::Eq,
            right: column_ref(right_alias, right, r),
        })
        .collect();
    if conditions.len() == 1 {
        conditions.remove(0)
    } else {
        Condition::And(conditions)
    }
}
