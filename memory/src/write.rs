use crate::eval::{Layout, eval_row, predicate, values_equal};
use crate::select::project;
use crate::store::{State, table_info};
use sqlweave_core::plan::{Conflict, DeletePlan, InsertPlan, UpdatePlan};
use sqlweave_core::schema::TableInfo;
use sqlweave_core::{Result, SQLType, Schema, SqlweaveError, Value};

type Rows = Vec<Vec<Value>>;

/// Returned rows and affected-row count
pub(crate) type WriteOutcome = (Rows, u64);

fn layout(info: &TableInfo) -> Layout {
    Layout::single(&info.name, column_names(info))
}

fn column_names(info: &TableInfo) -> Vec<String> {
    info.columns.iter().map(|c| c.name.clone()).collect()
}

fn violation(msg: String) -> SqlweaveError {
    SqlweaveError::ConstraintViolation(msg)
}

/// Coerces and checks one row against column types, NOT NULL, enum, check
/// and foreign-key constraints. `rows` are the table's rows as of this write.
fn check_row(state: &State, schema: &Schema, info: &TableInfo, row: &mut [Value], rows: &[Vec<Value>]) -> Result<()> {
    for (column, value) in info.columns.iter().zip(row.iter_mut()) {
        if let (SQLType::Real, Value::Integer(i)) = (&column.sql_type, &*value) {
            *value = Value::Real(*i as f64);
        }
        if value.is_null() {
            if column.not_null {
                return Err(violation(format!(
                    "null value in column \"{}\" of relation \"{}\" violates not-null constraint",
                    column.name, info.name
                )));
            }
            continue;
        }
        if !value.fits(&column.sql_type) {
            return Err(SqlweaveError::TypeMismatch(format!(
                "column \"{}\" is of type {} but value {value} is not",
                column.name, column.sql_type
            )));
        }
        if let Value::Text(text) = &*value {
            match &column.sql_type {
                SQLType::Enum(name) => {
                    if schema.enum_def(name).is_some_and(|def| !def.contains(text)) {
                        return Err(SqlweaveError::TypeMismatch(format!(
                            "invalid input value for enum {name}: \"{text}\""
                        )));
                    }
                }
                SQLType::Varchar(max) if text.chars().count() > *max as usize => {
                    return Err(SqlweaveError::TypeMismatch(format!(
                        "value too long for type character varying({max})"
                    )));
                }
                _ => {}
            }
        }
        if let Some(allowed) = &column.check
            && !allowed.iter().any(|a| values_equal(a, value))
        {
            return Err(violation(format!(
                "new row for relation \"{}\" violates check constraint on \"{}\"",
                info.name, column.name
            )));
        }
    }

    for fk in &info.foreign_keys {
        let value = &row[fk.column];
        if value.is_null() {
            continue;
        }
        let target = schema.info(fk.target);
        let exists = |rows: &[Vec<Value>]| rows.iter().any(|r| values_equal(&r[fk.target_column], value));
        let found = if fk.target == info.id {
            exists(rows) || values_equal(&row[fk.target_column], value)
        } else {
            exists(&state.table(&target.name)?.rows)
        };
        if !found {
            return Err(violation(format!(
                "insert or update on table \"{}\" violates foreign key constraint: key ({})=({value}) is not present in table \"{}\"",
                info.name, info.columns[fk.column].name, target.name
            )));
        }
    }
    Ok(())
}

/// Existing row matching `row` on every column of `key`
fn matching(rows: &[Vec<Value>], row: &[Value], key: &[usize], skip: Option<usize>) -> Option<usize> {
    if key.iter().any(|&c| row[c].is_null()) {
        return None;
    }
    rows.iter()
        .enumerate()
        .filter(|(i, _)| Some(*i) != skip)
        .find(|(_, existing)| key.iter().all(|&c| values_equal(&existing[c], &row[c])))
        .map(|(index, _)| index)
}

/// First existing row sharing a unique key with `row`, and that key
fn conflict(info: &TableInfo, rows: &[Vec<Value>], row: &[Value], skip: Option<usize>) -> Option<(usize, Vec<usize>)> {
    info.unique_keys()
        .find_map(|key| matching(rows, row, key, skip).map(|index| (index, key.to_vec())))
}

fn duplicate(info: &TableInfo, key: &[usize]) -> SqlweaveError {
    let columns: Vec<&str> = key.iter().map(|&c| info.columns[c].name.as_str()).collect();
    violation(format!(
        "duplicate key value violates unique constraint on \"{}\" ({})",
        info.name,
        columns.join(", ")
    ))
}

/// Whether `target` names exactly the columns of `key`
fn is_arbiter(info: &TableInfo, target: &[String], key: &[usize]) -> bool {
    target.len() == key.len()
        && target
            .iter()
            .all(|name| info.column_index(name).is_some_and(|c| key.contains(&c)))
}

/// The unique key an ON CONFLICT target names
fn arbiter_key(info: &TableInfo, target: &[String]) -> Option<Vec<usize>> {
    info.unique_keys()
        .find(|key| is_arbiter(info, target, key))
        .map(<[usize]>::to_vec)
}

/// Rows elsewhere that reference `info` must still find their target in `rows`
fn check_references(state: &State, schema: &Schema, info: &TableInfo, rows: &[Vec<Value>]) -> Result<()> {
    for table in schema.tables() {
        for fk in table.foreign_keys.iter().filter(|fk| fk.target == info.id) {
            let referencing: &[Vec<Value>] = if table.id == info.id {
                rows
            } else {
                &state.table(&table.name)?.rows
            };
            for row in referencing {
                let value = &row[fk.column];
                if value.is_null() {
                    continue;
                }
                if !rows.iter().any(|r| values_equal(&r[fk.target_column], value)) {
                    return Err(violation(format!(
                        "update or delete on table \"{}\" violates foreign key constraint on table \"{}\"",
                        info.name, table.name
                    )));
                }
            }
        }
    }
    Ok(())
}

pub(crate) fn insert(state: &mut State, plan: &InsertPlan) -> Result<WriteOutcome> {
    let schema = state.schema()?.clone();
    let info = table_info(&schema, &plan.table)?;
    let positions = plan
        .columns
        .iter()
        .map(|name| {
            info.column_index(name).ok_or_else(|| {
                SqlweaveError::Execution(format!(
                    "column \"{name}\" of relation \"{}\" does not exist",
                    info.name
                ))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let layout = layout(info);
    let mut excluded_layout = layout.clone();
    excluded_layout.push("excluded", column_names(info));

    let arbiter = match &plan.on_conflict {
        Some(Conflict::DoNothing { target }) | Some(Conflict::DoUpdate { target, .. }) => {
            arbiter_key(info, target)
        }
        None => None,
    };

    let mut rows = state.table(&plan.table)?.rows.clone();
    let mut returned = Vec::new();
    let mut affected = 0;
    // rows inserted or updated by this statement
    let mut touched: Vec<usize> = Vec::new();

    for values in &plan.rows {
        let mut row = vec![Value::Null; info.columns.len()];
        for (&position, value) in positions.iter().zip(values) {
            row[position] = value.clone();
        }
        check_row(state, &schema, info, &mut row, &rows)?;

        let arbiter_hit = arbiter
            .as_deref()
            .and_then(|key| matching(&rows, &row, key, None));

        let index = match (arbiter_hit, &plan.on_conflict) {
            (Some(_), Some(Conflict::DoNothing { .. })) => continue,
            (Some(index), Some(Conflict::DoUpdate { set, .. })) => {
                if touched.contains(&index) {
                    return Err(SqlweaveError::Execution(
                        "ON CONFLICT DO UPDATE command cannot affect row a second time".to_string(),
                    ));
                }
                let mut combined = rows[index].clone();
                combined.extend(row);
                let mut updated = rows[index].clone();
                for assignment in set {
                    let position = info.column_index(&assignment.column).ok_or_else(|| {
                        SqlweaveError::Execution(format!(
                            "column \"{}\" does not exist",
                            assignment.column
                        ))
                    })?;
                    updated[position] = eval_row(&excluded_layout, &assignment.value, &combined)?;
                }
                check_row(state, &schema, info, &mut updated, &rows)?;
                if let Some((_, key)) = conflict(info, &rows, &updated, Some(index)) {
                    return Err(duplicate(info, &key));
                }
                rows[index] = updated;
                index
            }
            _ => match conflict(info, &rows, &row, None) {
                None => {
                    rows.push(row);
                    rows.len() - 1
                }
                Some(_) if matches!(&plan.on_conflict, Some(Conflict::DoNothing { target }) if target.is_empty()) => {
                    continue;
                }
                Some((_, key)) => return Err(duplicate(info, &key)),
            },
        };

        touched.push(index);
        affected += 1;
        if !plan.returning.is_empty() {
            returned.push(project(&layout, &plan.returning, &rows[index])?);
        }
    }

    check_references(state, &schema, info, &rows)?;
    state.table_mut(&plan.table)?.rows = rows;
    Ok((returned, affected))
}

pub(crate) fn update(state: &mut State, plan: &UpdatePlan) -> Result<WriteOutcome> {
    let schema = state.schema()?.clone();
    let info = table_info(&schema, &plan.table)?;
    let layout = layout(info);
    let mut rows = state.table(&plan.table)?.rows.clone();

    let mut changed = Vec::new();
    for (index, row) in rows.iter().enumerate() {
        if let Some(filter) = &plan.filter {
            let keep = predicate(filter, &mut |e| eval_row(&layout, e, row))?.is_true();
            if !keep {
                continue;
            }
        }
        let mut updated = row.clone();
        for assignment in &plan.set {
            let position = layout.position(&info.name, &assignment.column)?;
            updated[position] = eval_row(&layout, &assignment.value, row)?;
        }
        changed.push((index, updated));
    }

    for (index, mut updated) in changed.iter().cloned() {
        check_row(state, &schema, info, &mut updated, &rows)?;
        rows[index] = updated;
    }
    for (index, _) in &changed {
        if let Some((_, key)) = conflict(info, &rows, &rows[*index], Some(*index)) {
            return Err(duplicate(info, &key));
        }
    }
    check_references(state, &schema, info, &rows)?;

    let returned = if plan.returning.is_empty() {
        Vec::new()
    } else {
        changed
            .iter()
            .map(|(index, _)| project(&layout, &plan.returning, &rows[*index]))
            .collect::<Result<Vec<_>>>()?
    };
    let affected = changed.len() as u64;
    state.table_mut(&plan.table)?.rows = rows;
    Ok((returned, affected))
}

pub(crate) fn delete(state: &mut State, plan: &DeletePlan) -> Result<WriteOutcome> {
    let schema = state.schema()?.clone();
    let info = table_info(&schema, &plan.table)?;
    let layout = layout(info);

    let mut kept = Vec::new();
    let mut removed = Vec::new();
    for row in &state.table(&plan.table)?.rows {
        let matches = match &plan.filter {
            Some(filter) => predicate(filter, &mut |e| eval_row(&layout, e, row))?.is_true(),
            None => true,
        };
        if matches {
            removed.push(row.clone());
        } else {
            kept.push(row.clone());
        }
    }
    check_references(state, &schema, info, &kept)?;

    let returned = if plan.returning.is_empty() {
        Vec::new()
    } else {
        removed
            .iter()
            .map(|row| project(&layout, &plan.returning, row))
            .collect::<Result<Vec<_>>>()?
    };
    let affected = removed.len() as u64;
    state.table_mut(&plan.table)?.rows = kept;
    Ok((returned, affected))
}
