use crate::eval::{Key, Layout, eval_group, eval_row, predicate, sort_order};
use crate::store::State;
use indexmap::{IndexMap, IndexSet};
use sqlweave_core::expr::{OrderBy, SelectItem};
use sqlweave_core::plan::{JoinType, SelectPlan, Source};
use sqlweave_core::{Result, Value};
use std::cmp::Ordering;

type Rows = Vec<Vec<Value>>;

/// Rows of a table or derived table, with its alias and column names
fn scan(state: &State, source: &Source) -> Result<(String, Vec<String>, Rows)> {
    match source {
        Source::Table { name, alias } => {
            let table = state.table(name)?;
            Ok((alias.clone(), table.columns.clone(), table.rows.clone()))
        }
        Source::Subquery { plan, alias } => {
            let rows = run_select(state, plan)?;
            let columns = plan.projection.iter().map(|item| item.label.clone()).collect();
            Ok((alias.clone(), columns, rows))
        }
    }
}

pub(crate) fn project(layout: &Layout, items: &[SelectItem], row: &[Value]) -> Result<Vec<Value>> {
    items.iter().map(|item| eval_row(layout, &item.expr, row)).collect()
}

pub(crate) fn run_select(state: &State, plan: &SelectPlan) -> Result<Rows> {
    let (alias, columns, mut rows) = scan(state, &plan.from)?;
    let mut layout = Layout::single(&alias, columns);

    for join in &plan.joins {
        let (alias, columns, right_rows) = scan(state, &join.source)?;
        let mut next = layout.clone();
        next.push(&alias, columns);

        let mut joined = Vec::with_capacity(rows.len());
        for left in &rows {
            let mut matched = false;
            for right in &right_rows {
                let mut combined = Vec::with_capacity(next.width());
                combined.extend_from_slice(left);
                combined.extend_from_slice(right);
                let keep = predicate(&join.on, &mut |e| eval_row(&next, e, &combined))?.is_true();
                if keep {
                    joined.push(combined);
                    matched = true;
                }
            }
            if !matched && join.kind == JoinType::Left {
                let mut padded = left.clone();
                padded.resize(next.width(), Value::Null);
                joined.push(padded);
            }
        }
        rows = joined;
        layout = next;
    }

    if let Some(filter) = &plan.filter {
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            let keep = predicate(filter, &mut |e| eval_row(&layout, e, &row))?.is_true();
            if keep {
                kept.push(row);
            }
        }
        rows = kept;
    }

    // (order keys, projected row)
    let mut output: Vec<(Vec<Value>, Vec<Value>)> = Vec::new();
    if plan.is_grouped() {
        let mut groups: IndexMap<Key, Vec<&[Value]>> = IndexMap::new();
        if plan.group_by.is_empty() {
            groups.insert(Key(Vec::new()), rows.iter().map(Vec::as_slice).collect());
        } else {
            for row in &rows {
                let key = plan
                    .group_by
                    .iter()
                    .map(|e| eval_row(&layout, e, row))
                    .collect::<Result<Vec<_>>>()?;
                groups.entry(Key(key)).or_default().push(row);
            }
        }
        for group in groups.values() {
            if let Some(having) = &plan.having {
                let keep = predicate(having, &mut |e| eval_group(&layout, e, group))?.is_true();
                if !keep {
                    continue;
                }
            }
            let keys = plan
                .order_by
                .iter()
                .map(|o| eval_group(&layout, &o.expr, group))
                .collect::<Result<Vec<_>>>()?;
            let projected = plan
                .projection
                .iter()
                .map(|item| eval_group(&layout, &item.expr, group))
                .collect::<Result<Vec<_>>>()?;
            output.push((keys, projected));
        }
    } else {
        for row in &rows {
            let keys = plan
                .order_by
                .iter()
                .map(|o| eval_row(&layout, &o.expr, row))
                .collect::<Result<Vec<_>>>()?;
            output.push((keys, project(&layout, &plan.projection, row)?));
        }
    }

    if !plan.order_by.is_empty() {
        output.sort_by(|(a, _), (b, _)| compare_keys(&plan.order_by, a, b));
    }

    let mut result: Rows = output.into_iter().map(|(_, row)| row).collect();
    if plan.distinct {
        let mut seen = IndexSet::new();
        result.retain(|row| seen.insert(Key(row.clone())));
    }

    let offset = plan.offset.unwrap_or(0);
    let limit = plan.limit.unwrap_or(usize::MAX);
    Ok(result.into_iter().skip(offset).take(limit).collect())
}

fn compare_keys(order: &[OrderBy], a: &[Value], b: &[Value]) -> Ordering {
    order
        .iter()
        .zip(a.iter().zip(b))
        .map(|(o, (x, y))| sort_order(x, y, o.direction))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}
