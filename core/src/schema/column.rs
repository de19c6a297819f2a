use crate::value::Value;
use sqlweave_types::SQLType;

/// Default-value policy of a column.
///
/// Generated policies are evaluated when an insert plan is built, never at
/// declaration time.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ColumnDefault {
    #[default]
    None,
    Static(Value),
    /// Fresh identifier from the value provider
    RandomId,
    /// Current instant from the value provider
    Now,
}

impl ColumnDefault {
    #[inline]
    pub const fn is_none(&self) -> bool {
        matches!(self, ColumnDefault::None)
    }
}

/// Foreign-key target, by name. Resolved when the table is registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDef {
    pub table: String,
    pub column: String,
}

/// Column declaration.
///
/// ```
/// use sqlweave_core::schema::ColumnDef;
///
/// let id = ColumnDef::uuid("id").primary_key().default_random();
/// let email = ColumnDef::varchar("email", 255).not_null().unique();
/// assert!(id.not_null);
/// assert!(email.unique);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub sql_type: SQLType,
    pub not_null: bool,
    pub primary_key: bool,
    pub unique: bool,
    pub default: ColumnDefault,
    pub references: Option<ForeignKeyDef>,
    /// Narrowed value set; writes outside it fail with a validation error
    pub check: Option<Vec<Value>>,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, sql_type: SQLType) -> Self {
        Self {
            name: name.into(),
            sql_type,
            not_null: false,
            primary_key: false,
            unique: false,
            default: ColumnDefault::None,
            references: None,
            check: None,
        }
    }

    // ==================== constructors ====================

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, SQLType::Text)
    }

    pub fn varchar(name: impl Into<String>, len: u32) -> Self {
        Self::new(name, SQLType::Varchar(len))
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, SQLType::Integer)
    }

    pub fn real(name: impl Into<String>) -> Self {
        Self::new(name, SQLType::Real)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, SQLType::Boolean)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, SQLType::Timestamp)
    }

    pub fn uuid(name: impl Into<String>) -> Self {
        Self::new(name, SQLType::Uuid)
    }

    /// Column typed by the schema enum `enum_name`
    pub fn enumeration(name: impl Into<String>, enum_name: impl Into<String>) -> Self {
        Self::new(name, SQLType::Enum(enum_name.into()))
    }

    // ==================== modifiers ====================

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Single-column primary key; implies not null
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self.not_null = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = ColumnDefault::Static(value.into());
        self
    }

    pub fn default_random(mut self) -> Self {
        self.default = ColumnDefault::RandomId;
        self
    }

    pub fn default_now(mut self) -> Self {
        self.default = ColumnDefault::Now;
        self
    }

    pub fn references(mut self, table: impl Into<String>, column: impl Into<String>) -> Self {
        self.references = Some(ForeignKeyDef {
            table: table.into(),
            column: column.into(),
        });
        self
    }

    /// Restricts the column to a fixed set of values
    pub fn check_in<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.check = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Whether an insert must supply this column
    pub fn is_required(&self) -> bool {
        self.not_null && self.default.is_none()
    }
}
