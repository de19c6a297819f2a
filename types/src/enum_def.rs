//! Enum definitions
//!
//! A named, closed, ordered set of string variants. Columns typed as
//! [`SQLType::Enum`](crate::SQLType::Enum) refer to one of these by name.

/// Named enum definition.
///
/// # Examples
///
/// ```
/// use sqlweave_types::EnumDef;
///
/// let role = EnumDef::new("userRole", ["ADMIN", "BASIC"]);
/// assert!(role.contains("BASIC"));
/// assert!(role.validate("GUEST").is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumDef {
    /// Enum name
    pub name: String,
    /// Enum values, in declaration order
    pub values: Vec<String>,
}

impl EnumDef {
    /// Create a new enum definition
    #[must_use]
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether `value` is one of the variants
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Checks `value` against the variant set
    pub fn validate(&self, value: &str) -> Result<(), EnumValueError> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(EnumValueError {
                enum_name: self.name.clone(),
                value: value.to_string(),
            })
        }
    }

    /// Returns the first variant that appears more than once
    #[must_use]
    pub fn duplicate_value(&self) -> Option<&str> {
        self.values
            .iter()
            .enumerate()
            .find(|(i, v)| self.values[..*i].contains(v))
            .map(|(_, v)| v.as_str())
    }
}

/// A value outside an enum's variant set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValueError {
    pub enum_name: String,
    pub value: String,
}

impl core::fmt::Display for EnumValueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "'{}' is not a variant of enum '{}'",
            self.value, self.enum_name
        )
    }
}

impl std::error::Error for EnumValueError {}
