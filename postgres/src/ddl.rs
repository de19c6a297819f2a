//! DDL for bootstrapping a schema in PostgreSQL.
//!
//! Statements are idempotent so `create` can run against an existing
//! database: enums are created inside a `DO` block that swallows
//! `duplicate_object`, tables and indexes use `IF NOT EXISTS`.

use sqlweave_core::schema::{ColumnDef, ColumnDefault, Schema, TableInfo};
use sqlweave_core::Value;
use sqlweave_types::EnumDef;

fn quote(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn column_list<'a>(names: impl IntoIterator<Item = &'a str>) -> String {
    names.into_iter().map(quote).collect::<Vec<_>>().join(", ")
}

/// Renders a value as an inline SQL literal. Only used for DDL; statements
/// always bind values as parameters.
pub fn literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Text(s) => format!("'{}'", s.replace('\'', "''")),
        Value::Integer(i) => i.to_string(),
        Value::Real(r) => r.to_string(),
        Value::Boolean(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
        Value::Timestamp(_) | Value::Uuid(_) => value.to_string(),
    }
}

/// `CREATE TYPE ... AS ENUM`, wrapped so an existing type is left alone
pub fn create_enum_sql(def: &EnumDef) -> String {
    let values = def
        .values
        .iter()
        .map(|v| literal(&Value::from(v.as_str())))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "DO $$ BEGIN CREATE TYPE {} AS ENUM ({}); EXCEPTION WHEN duplicate_object THEN null; END $$;",
        quote(&def.name),
        values
    )
}

fn column_sql(column: &ColumnDef) -> String {
    let mut sql = format!("{} {}", quote(&column.name), column.sql_type.to_sql_type());
    if column.not_null {
        sql.push_str(" NOT NULL");
    }
    if let ColumnDefault::Static(value) = &column.default {
        sql.push_str(" DEFAULT ");
        sql.push_str(&literal(value));
    }
    if let Some(allowed) = &column.check {
        let values = allowed.iter().map(literal).collect::<Vec<_>>().join(", ");
        sql.push_str(&format!(" CHECK ({} IN ({values}))", quote(&column.name)));
    }
    sql
}

/// `CREATE TABLE IF NOT EXISTS` with primary key, column-level unique and
/// foreign-key constraints inline
pub fn create_table_sql(schema: &Schema, table: &TableInfo) -> String {
    let name_of = |index: usize| table.column(index).name.as_str();

    let mut lines: Vec<String> = table
        .columns
        .iter()
        .map(|column| format!("\t{}", column_sql(column)))
        .collect();

    if !table.primary_key.is_empty() {
        lines.push(format!(
            "\tPRIMARY KEY({})",
            column_list(table.primary_key.iter().map(|&i| name_of(i)))
        ));
    }

    for unique in table.uniques.iter().filter(|u| u.name.is_none()) {
        lines.push(format!(
            "\tUNIQUE({})",
            column_list(unique.columns.iter().map(|&i| name_of(i)))
        ));
    }

    for fk in &table.foreign_keys {
        let target = schema.info(fk.target);
        lines.push(format!(
            "\tFOREIGN KEY ({}) REFERENCES {}({})",
            quote(name_of(fk.column)),
            quote(&target.name),
            quote(&target.column(fk.target_column).name)
        ));
    }

    format!(
        "CREATE TABLE IF NOT EXISTS {} (\n{}\n);",
        quote(&table.name),
        lines.join(",\n")
    )
}

fn create_index_sql(table: &TableInfo, name: &str, columns: &[usize]) -> String {
    format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ({});",
        quote(name),
        quote(&table.name),
        column_list(columns.iter().map(|&i| table.column(i).name.as_str()))
    )
}

/// Every statement needed to create `schema`, in dependency order: enums,
/// then tables in registration order (a table may only reference tables
/// registered before it), then named unique indexes.
pub fn create_statements(schema: &Schema) -> Vec<String> {
    let mut statements: Vec<String> = schema.enums().map(create_enum_sql).collect();
    statements.extend(schema.tables().map(|table| create_table_sql(schema, table)));
    for table in schema.tables() {
        for unique in &table.uniques {
            if let Some(name) = &unique.name {
                statements.push(create_index_sql(table, name, &unique.columns));
            }
        }
    }
    statements
}
