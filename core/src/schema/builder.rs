use super::{
    ColumnDefault, ForeignKey, Schema, TableDef, TableId, TableInfo, UniqueConstraint,
};
use crate::error::{Result, SqlweaveError};
use crate::value::Value;
use indexmap::IndexMap;
use sqlweave_types::{EnumDef, SQLType};

fn schema_err(msg: impl Into<String>) -> SqlweaveError {
    SqlweaveError::Schema(msg.into())
}

/// Registers enums and tables, validating each declaration as it arrives.
///
/// Tables must be registered after the tables their foreign keys point at
/// (self-references excepted). Relations are resolved later, on first use.
///
/// ```
/// use sqlweave_core::schema::{ColumnDef, SchemaBuilder, TableDef};
///
/// let schema = SchemaBuilder::new()
///     .table(TableDef::new("user").column(ColumnDef::uuid("id").primary_key()))?
///     .build();
/// assert!(schema.table("user").is_ok());
///
/// let dup = SchemaBuilder::new()
///     .table(TableDef::new("user"))?
///     .table(TableDef::new("user"));
/// assert!(dup.is_err());
/// # Ok::<(), sqlweave_core::SqlweaveError>(())
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    tables: Vec<TableInfo>,
    by_name: IndexMap<String, TableId>,
    enums: IndexMap<String, EnumDef>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enumeration(mut self, def: EnumDef) -> Result<Self> {
        if self.enums.contains_key(&def.name) {
            return Err(schema_err(format!("enum '{}' is already registered", def.name)));
        }
        if def.values.is_empty() {
            return Err(schema_err(format!("enum '{}' has no values", def.name)));
        }
        if let Some(dup) = def.duplicate_value() {
            return Err(schema_err(format!(
                "enum '{}' lists value '{dup}' twice",
                def.name
            )));
        }
        self.enums.insert(def.name.clone(), def);
        Ok(self)
    }

    /// Registers a table. Every table it references must already be
    /// registered, so two tables cannot reference each other.
    pub fn table(mut self, def: TableDef) -> Result<Self> {
        let id = TableId(self.tables.len());
        let info = self.resolve_table(id, def)?;
        self.by_name.insert(info.name.clone(), id);
        self.tables.push(info);
        Ok(self)
    }

    pub fn build(self) -> Schema {
        crate::weave_trace_schema!(built, self.tables.len(), self.enums.len());
        Schema::from_parts(self.tables, self.by_name, self.enums)
    }

    fn resolve_table(&self, id: TableId, def: TableDef) -> Result<TableInfo> {
        let table = def.name.as_str();
        if table.is_empty() {
            return Err(schema_err("table name must not be empty"));
        }
        if self.by_name.contains_key(table) {
            return Err(schema_err(format!("table '{table}' is already registered")));
        }

        for (i, column) in def.columns.iter().enumerate() {
            if def.columns[..i].iter().any(|c| c.name == column.name) {
                return Err(schema_err(format!(
                    "table '{table}' declares column '{}' twice",
                    column.name
                )));
            }
            if let SQLType::Enum(enum_name) = &column.sql_type
                && !self.enums.contains_key(enum_name)
            {
                return Err(schema_err(format!(
                    "column '{table}.{}' uses unknown enum '{enum_name}'",
                    column.name
                )));
            }
            self.check_default(table, column)?;
            if let Some(allowed) = &column.check
                && let Some(bad) = allowed.iter().find(|v| !v.fits(&column.sql_type))
            {
                return Err(schema_err(format!(
                    "check value {bad} does not fit column '{table}.{}'",
                    column.name
                )));
            }
        }

        let index_of = |name: &str, what: &str| {
            def.columns
                .iter()
                .position(|c| c.name == name)
                .ok_or_else(|| schema_err(format!("{what} of '{table}' names unknown column '{name}'")))
        };
        let indexes_of = |names: &[String], what: &str| -> Result<Vec<usize>> {
            if names.is_empty() {
                return Err(schema_err(format!("{what} of '{table}' has no columns")));
            }
            let mut out = Vec::with_capacity(names.len());
            for name in names {
                let index = index_of(name, what)?;
                if out.contains(&index) {
                    return Err(schema_err(format!("{what} of '{table}' repeats column '{name}'")));
                }
                out.push(index);
            }
            Ok(out)
        };

        // Primary key: column-level or table-level, never both
        let column_pk: Vec<usize> = def
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.primary_key)
            .map(|(i, _)| i)
            .collect();
        let primary_key = match (&def.primary_key, column_pk.len()) {
            (Some(_), n) if n > 0 => {
                return Err(schema_err(format!(
                    "table '{table}' declares both column and table primary keys"
                )));
            }
            (Some(names), _) => indexes_of(names, "primary key")?,
            (None, n) if n > 1 => {
                return Err(schema_err(format!(
                    "table '{table}' marks {n} columns as primary key; declare a composite key on the table"
                )));
            }
            (None, _) => column_pk,
        };

        let mut uniques: Vec<UniqueConstraint> = def
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.unique)
            .map(|(i, _)| UniqueConstraint {
                name: None,
                columns: vec![i],
            })
            .collect();
        for index in &def.unique_indexes {
            if uniques.iter().any(|u| u.name.as_deref() == Some(index.name.as_str())) {
                return Err(schema_err(format!(
                    "table '{table}' declares unique index '{}' twice",
                    index.name
                )));
            }
            uniques.push(UniqueConstraint {
                name: Some(index.name.clone()),
                columns: indexes_of(&index.columns, "unique index")?,
            });
        }

        let mut columns = def.columns;
        for &i in &primary_key {
            columns[i].not_null = true;
        }

        let mut foreign_keys = Vec::new();
        for (i, column) in columns.iter().enumerate() {
            let Some(reference) = &column.references else {
                continue;
            };

            // Self-references resolve against the table being registered
            let (target, target_info) = if reference.table == table {
                (id, None)
            } else {
                let target = self.by_name.get(&reference.table).copied().ok_or_else(|| {
                    schema_err(format!(
                        "column '{table}.{}' references unknown table '{}' \
                         (referenced tables must be registered first)",
                        column.name, reference.table
                    ))
                })?;
                (target, Some(&self.tables[target.0]))
            };

            let (target_columns, target_unique) = match target_info {
                Some(info) => {
                    let position = info.column_index(&reference.column);
                    (&info.columns, position.map(|p| info.is_unique_column(p)))
                }
                None => {
                    let position = columns.iter().position(|c| c.name == reference.column);
                    let unique = position.map(|p| {
                        primary_key == [p] || uniques.iter().any(|u| u.columns == [p])
                    });
                    (&columns, unique)
                }
            };
            let target_column = target_columns
                .iter()
                .position(|c| c.name == reference.column)
                .ok_or_else(|| {
                    schema_err(format!(
                        "column '{table}.{}' references unknown column '{}.{}'",
                        column.name, reference.table, reference.column
                    ))
                })?;
            if target_unique != Some(true) {
                return Err(schema_err(format!(
                    "column '{table}.{}' references '{}.{}', which is neither a primary key nor unique",
                    column.name, reference.table, reference.column
                )));
            }
            let target_type = &target_columns[target_column].sql_type;
            if !column.sql_type.is_compatible(target_type) {
                return Err(schema_err(format!(
                    "column '{table}.{}' is {} but references '{}.{}' of type {}",
                    column.name, column.sql_type, reference.table, reference.column, target_type
                )));
            }

            foreign_keys.push(ForeignKey {
                column: i,
                target,
                target_column,
            });
        }

        Ok(TableInfo {
            id,
            name: def.name,
            columns,
            primary_key,
            uniques,
            foreign_keys,
            relations: def.relations,
        })
    }

    fn check_default(&self, table: &str, column: &super::ColumnDef) -> Result<()> {
        let ok = match &column.default {
            ColumnDefault::None => true,
            ColumnDefault::RandomId => column.sql_type == SQLType::Uuid,
            ColumnDefault::Now => column.sql_type == SQLType::Timestamp,
            ColumnDefault::Static(value) => {
                value.fits(&column.sql_type) && self.enum_accepts(&column.sql_type, value)
            }
        };
        if ok {
            Ok(())
        } else {
            Err(schema_err(format!(
                "default of column '{table}.{}' does not fit type {}",
                column.name, column.sql_type
            )))
        }
    }

    fn enum_accepts(&self, ty: &SQLType, value: &Value) -> bool {
        match (ty.enum_name().and_then(|name| self.enums.get(name)), value) {
            (Some(def), Value::Text(text)) => def.contains(text),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::schema::ColumnDef;

    fn users() -> TableDef {
        TableDef::new("user")
            .column(ColumnDef::uuid("id").primary_key().default_random())
            .column(ColumnDef::varchar("email", 255).not_null().unique())
            .column(ColumnDef::integer("age").not_null())
    }

    fn kind(result: Result<SchemaBuilder>) -> ErrorKind {
        result.map(|_| ()).unwrap_err().kind()
    }

    #[test]
    fn duplicate_table_is_rejected() {
        let builder = SchemaBuilder::new().table(users()).unwrap();
        assert_eq!(kind(builder.table(users())), ErrorKind::Schema);
    }

    #[test]
    fn duplicate_column_is_rejected() {
        let def = TableDef::new("t")
            .column(ColumnDef::text("a"))
            .column(ColumnDef::integer("a"));
        assert_eq!(kind(SchemaBuilder::new().table(def)), ErrorKind::Schema);
    }

    #[test]
    fn foreign_key_must_target_unique_column() {
        let builder = SchemaBuilder::new().table(users()).unwrap();
        let bad = TableDef::new("post")
            .column(ColumnDef::uuid("id").primary_key())
            .column(ColumnDef::integer("authorAge").references("user", "age"));
        assert_eq!(kind(builder.table(bad)), ErrorKind::Schema);
    }

    #[test]
    fn foreign_key_types_must_match() {
        let builder = SchemaBuilder::new().table(users()).unwrap();
        let bad = TableDef::new("post")
            .column(ColumnDef::uuid("id").primary_key())
            .column(ColumnDef::integer("authorId").references("user", "id"));
        assert_eq!(kind(builder.table(bad)), ErrorKind::Schema);
    }

    #[test]
    fn foreign_key_target_must_exist() {
        let bad = TableDef::new("post")
            .column(ColumnDef::uuid("id").primary_key())
            .column(ColumnDef::uuid("authorId").references("user", "id"));
        assert_eq!(kind(SchemaBuilder::new().table(bad)), ErrorKind::Schema);
    }

    #[test]
    fn referenced_tables_register_first() {
        let post = || {
            TableDef::new("post")
                .column(ColumnDef::uuid("id").primary_key())
                .column(ColumnDef::uuid("authorId").references("user", "id"))
        };

        let err = SchemaBuilder::new().table(post()).err().unwrap();
        assert!(err.to_string().contains("registered first"), "{err}");

        let schema = SchemaBuilder::new()
            .table(users())
            .and_then(|b| b.table(post()))
            .unwrap()
            .build();
        assert_eq!(schema.table("post").unwrap().info().foreign_keys.len(), 1);
    }

    #[test]
    fn self_reference_resolves() {
        let tree = TableDef::new("node")
            .column(ColumnDef::integer("id").primary_key())
            .column(ColumnDef::integer("parentId").references("node", "id"));
        let schema = SchemaBuilder::new().table(tree).unwrap().build();
        let info = schema.table("node").unwrap().info().clone();
        assert_eq!(info.foreign_keys.len(), 1);
        assert_eq!(info.foreign_keys[0].target, info.id);
    }

    #[test]
    fn unknown_enum_and_bad_defaults() {
        let def = TableDef::new("t").column(ColumnDef::enumeration("role", "userRole"));
        assert_eq!(kind(SchemaBuilder::new().table(def)), ErrorKind::Schema);

        let builder = SchemaBuilder::new()
            .enumeration(EnumDef::new("userRole", ["ADMIN", "BASIC"]))
            .unwrap();
        let def = TableDef::new("t").column(ColumnDef::enumeration("role", "userRole").default("GUEST"));
        assert_eq!(kind(builder.table(def)), ErrorKind::Schema);

        let def = TableDef::new("t").column(ColumnDef::integer("n").default_now());
        assert_eq!(kind(SchemaBuilder::new().table(def)), ErrorKind::Schema);
    }

    #[test]
    fn bad_enums_are_rejected() {
        assert!(SchemaBuilder::new().enumeration(EnumDef::new("e", Vec::<String>::new())).is_err());
        assert!(SchemaBuilder::new().enumeration(EnumDef::new("e", ["a", "a"])).is_err());
    }

    #[test]
    fn composite_key_and_unique_index() {
        let def = TableDef::new("pair")
            .column(ColumnDef::integer("a"))
            .column(ColumnDef::integer("b"))
            .column(ColumnDef::text("label"))
            .primary_key(["a", "b"])
            .unique_index("label_idx", ["label"]);
        let schema = SchemaBuilder::new().table(def).unwrap().build();
        let info = schema.table("pair").unwrap().info().clone();
        assert_eq!(info.primary_key, vec![0, 1]);
        assert!(info.columns[0].not_null);
        assert!(info.has_unique_key(&[1, 0]));
        assert!(info.is_unique_column(2));
        assert!(!info.is_unique_column(0));

        let bad = TableDef::new("x")
            .column(ColumnDef::integer("a"))
            .primary_key(["missing"]);
        assert_eq!(kind(SchemaBuilder::new().table(bad)), ErrorKind::Schema);
    }
}
