//! Semantic column types
//!
//! Every column carries one of these. The executor picks a wire encoding from it
//! and the DDL generator spells it with [`SQLType::to_sql_type`].

/// Semantic type of a column.
///
/// See: <https://www.postgresql.org/docs/current/datatype.html>
///
/// # Examples
///
/// ```
/// use sqlweave_types::SQLType;
///
/// assert_eq!(SQLType::Varchar(255).to_sql_type(), "VARCHAR(255)");
/// assert!(SQLType::Text.is_compatible(&SQLType::Varchar(64)));
/// assert!(!SQLType::Uuid.is_compatible(&SQLType::Text));
/// ```
#[derive(Default, Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SQLType {
    /// Variable-length character string
    #[default]
    Text,

    /// Character string with a length limit
    ///
    /// See: <https://www.postgresql.org/docs/current/datatype-character.html>
    Varchar(u32),

    /// 32-bit signed integer (values are carried as `i64` in memory)
    ///
    /// See: <https://www.postgresql.org/docs/current/datatype-numeric.html#DATATYPE-INT>
    Integer,

    /// Single precision floating-point number
    Real,

    /// true/false
    Boolean,

    /// Date and time without time zone
    ///
    /// See: <https://www.postgresql.org/docs/current/datatype-datetime.html>
    Timestamp,

    /// Identifier type
    ///
    /// See: <https://www.postgresql.org/docs/current/datatype-uuid.html>
    Uuid,

    /// Reference to a named enum declared on the schema
    Enum(String),
}

impl SQLType {
    /// Get the PostgreSQL DDL spelling for this type
    #[must_use]
    pub fn to_sql_type(&self) -> String {
        match self {
            Self::Text => "TEXT".to_string(),
            Self::Varchar(len) => format!("VARCHAR({len})"),
            Self::Integer => "INTEGER".to_string(),
            Self::Real => "REAL".to_string(),
            Self::Boolean => "BOOLEAN".to_string(),
            Self::Timestamp => "TIMESTAMP".to_string(),
            Self::Uuid => "UUID".to_string(),
            Self::Enum(name) => format!("\"{name}\""),
        }
    }

    /// Whether two columns of these types may be compared or joined.
    ///
    /// Text and varchar of any length are interchangeable, enums only match the
    /// same enum, everything else must be equal.
    #[must_use]
    pub fn is_compatible(&self, other: &SQLType) -> bool {
        match (self, other) {
            (a, b) if a.is_textual() && b.is_textual() => true,
            (a, b) => a == b,
        }
    }

    /// Check if this type is numeric
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Integer | Self::Real)
    }

    /// Check if this type holds character data (enums excluded)
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Varchar(_))
    }

    /// Name of the enum this column refers to, if any
    #[must_use]
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            Self::Enum(name) => Some(name),
            _ => None,
        }
    }
}

impl core::fmt::Display for SQLType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.to_sql_type())
    }
}
