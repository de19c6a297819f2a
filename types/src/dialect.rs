//! Placeholder dialects.

/// Target dialect of a rendered statement.
///
/// Rendering is otherwise identical across dialects: identifiers are always
/// double-quoted and values are always bound. The only difference is the
/// placeholder syntax, `$1, $2, ...` for PostgreSQL and `?` for SQLite and
/// MySQL. Only PostgreSQL has an executor.
///
/// ```
/// use sqlweave_types::Dialect;
///
/// assert_eq!(Dialect::PostgreSQL.placeholder(2), "$2");
/// assert_eq!(Dialect::MySQL.placeholder(2), "?");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Dialect {
    SQLite,
    #[default]
    PostgreSQL,
    MySQL,
}

impl Dialect {
    #[inline]
    #[must_use]
    pub const fn uses_numbered_placeholders(&self) -> bool {
        matches!(self, Dialect::PostgreSQL)
    }

    /// Placeholder for the 1-based parameter `index`
    #[must_use]
    pub fn placeholder(&self, index: usize) -> String {
        if self.uses_numbered_placeholders() {
            format!("${index}")
        } else {
            "?".to_string()
        }
    }

    /// Case-insensitive lookup; `postgres` and `pg` name PostgreSQL too
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        [
            ("sqlite", Dialect::SQLite),
            ("postgresql", Dialect::PostgreSQL),
            ("postgres", Dialect::PostgreSQL),
            ("pg", Dialect::PostgreSQL),
            ("mysql", Dialect::MySQL),
        ]
        .into_iter()
        .find(|(alias, _)| name.eq_ignore_ascii_case(alias))
        .map(|(_, dialect)| dialect)
    }

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Dialect::SQLite => "sqlite",
            Dialect::PostgreSQL => "postgresql",
            Dialect::MySQL => "mysql",
        }
    }
}

impl core::fmt::Display for Dialect {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Dialect {
    type Err = DialectParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Dialect::parse(s).ok_or_else(|| DialectParseError(s.to_string()))
    }
}

/// Unknown dialect name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialectParseError(pub String);

impl core::fmt::Display for DialectParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "unknown dialect '{}'", self.0)
    }
}

impl std::error::Error for DialectParseError {}
