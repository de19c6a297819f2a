//! Runtime values, flat result rows and reshaped nested rows.

use crate::error::{Result, SqlweaveError};
use crate::expr::Expr;
use chrono::NaiveDateTime;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, Serializer};
use sqlweave_types::SQLType;
use std::sync::Arc;
use uuid::Uuid;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// A single SQL value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Boolean(bool),
    Timestamp(NaiveDateTime),
    Uuid(Uuid),
}

impl Value {
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The column type this value most naturally belongs to. `None` for NULL.
    pub fn sql_type_hint(&self) -> Option<SQLType> {
        match self {
            Value::Null => None,
            Value::Text(_) => Some(SQLType::Text),
            Value::Integer(_) => Some(SQLType::Integer),
            Value::Real(_) => Some(SQLType::Real),
            Value::Boolean(_) => Some(SQLType::Boolean),
            Value::Timestamp(_) => Some(SQLType::Timestamp),
            Value::Uuid(_) => Some(SQLType::Uuid),
        }
    }

    /// Whether this value can be stored in, or compared with, a column of `ty`.
    pub fn fits(&self, ty: &SQLType) -> bool {
        match (self, ty) {
            (Value::Null, _) => true,
            (Value::Text(_), SQLType::Text | SQLType::Varchar(_) | SQLType::Enum(_)) => true,
            (Value::Integer(_), SQLType::Integer | SQLType::Real) => true,
            (Value::Real(_), SQLType::Real) => true,
            (Value::Boolean(_), SQLType::Boolean) => true,
            (Value::Timestamp(_), SQLType::Timestamp) => true,
            (Value::Uuid(_), SQLType::Uuid) => true,
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Real(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Boolean(b) => serde_json::Value::Bool(*b),
            Value::Timestamp(ts) => serde_json::Value::String(ts.format(TIMESTAMP_FORMAT).to_string()),
            Value::Uuid(id) => serde_json::Value::String(id.to_string()),
        }
    }
}

impl core::fmt::Display for Value {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Text(s) => write!(f, "'{s}'"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Timestamp(ts) => write!(f, "'{}'", ts.format(TIMESTAMP_FORMAT)),
            Value::Uuid(id) => write!(f, "'{id}'"),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_none(),
            Value::Text(s) => serializer.serialize_str(s),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Real(f) => serializer.serialize_f64(*f),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Timestamp(ts) => serializer.collect_str(&ts.format(TIMESTAMP_FORMAT)),
            Value::Uuid(id) => serializer.collect_str(id),
        }
    }
}

// ==================== From implementations ====================

macro_rules! impl_from_for_value {
    ($($ty:ty => $variant:ident $(as $cast:ty)?),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value $(as $cast)?)
                }
            }
        )*
    };
}

impl_from_for_value! {
    String => Text,
    i64 => Integer,
    i32 => Integer as i64,
    i16 => Integer as i64,
    u32 => Integer as i64,
    f64 => Real,
    f32 => Real as f64,
    bool => Boolean,
    NaiveDateTime => Timestamp,
    Uuid => Uuid,
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<&String> for Value {
    #[inline]
    fn from(value: &String) -> Self {
        Value::Text(value.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

// ==================== TryFrom implementations ====================

fn mismatch(expected: &str, got: &Value) -> SqlweaveError {
    SqlweaveError::TypeMismatch(format!("expected {expected}, got {got}"))
}

impl TryFrom<Value> for String {
    type Error = SqlweaveError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(mismatch("text", &other)),
        }
    }
}

impl TryFrom<Value> for i64 {
    type Error = SqlweaveError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Integer(i) => Ok(i),
            other => Err(mismatch("integer", &other)),
        }
    }
}

impl TryFrom<Value> for i32 {
    type Error = SqlweaveError;
    fn try_from(value: Value) -> Result<Self> {
        let wide = i64::try_from(value)?;
        i32::try_from(wide).map_err(|_| SqlweaveError::TypeMismatch(format!("{wide} overflows i32")))
    }
}

impl TryFrom<Value> for f64 {
    type Error = SqlweaveError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Real(f) => Ok(f),
            Value::Integer(i) => Ok(i as f64),
            other => Err(mismatch("real", &other)),
        }
    }
}

impl TryFrom<Value> for bool {
    type Error = SqlweaveError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(b) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl TryFrom<Value> for Uuid {
    type Error = SqlweaveError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(id) => Ok(id),
            other => Err(mismatch("uuid", &other)),
        }
    }
}

impl TryFrom<Value> for NaiveDateTime {
    type Error = SqlweaveError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Timestamp(ts) => Ok(ts),
            other => Err(mismatch("timestamp", &other)),
        }
    }
}

impl<T> TryFrom<Value> for Option<T>
where
    T: TryFrom<Value, Error = SqlweaveError>,
{
    type Error = SqlweaveError;
    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::try_from(other).map(Some),
        }
    }
}

// =============================================================================
// Row
// =============================================================================

/// A flat result row. Column labels are shared by every row of one result.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub columns: Arc<[String]>,
    pub values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        Self { columns, values }
    }

    /// Value for the first column labelled `label`
    pub fn get(&self, label: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == label)
            .and_then(|i| self.values.get(i))
    }

    /// Positional access
    #[inline]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Typed access by label.
    pub fn try_get<T>(&self, label: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = SqlweaveError>,
    {
        let value = self
            .get(label)
            .ok_or_else(|| SqlweaveError::Build(format!("no column labelled '{label}' in row")))?;
        T::try_from(value.clone())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_record(self) -> Record {
        let mut record = Record::new();
        for (column, value) in self.columns.iter().zip(self.values) {
            record = record.set(column.as_str(), value);
        }
        record
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len()))?;
        for (column, value) in self.columns.iter().zip(&self.values) {
            map.serialize_entry(column, value)?;
        }
        map.end()
    }
}

// =============================================================================
// Record
// =============================================================================

/// Ordered `column -> value` assignments for insert rows and update sets.
///
/// ```
/// use sqlweave_core::Record;
///
/// let record = Record::new().set("name", "Kyle").set("age", 23);
/// assert_eq!(record.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: IndexMap<String, Expr>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assigns a literal value
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entries.insert(column.into(), Expr::Value(value.into()));
        self
    }

    /// Assigns an expression, e.g. [`excluded`](crate::expr::excluded) inside a conflict update
    pub fn set_expr(mut self, column: impl Into<String>, expr: impl Into<Expr>) -> Self {
        self.entries.insert(column.into(), expr.into());
        self
    }

    pub fn get(&self, column: &str) -> Option<&Expr> {
        self.entries.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Expr)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// QueryRow
// =============================================================================

/// One reshaped result tree from the relational query API.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryRow {
    pub fields: IndexMap<String, Value>,
    pub relations: IndexMap<String, Nested>,
}

/// Container attached per requested relation.
#[derive(Debug, Clone, PartialEq)]
pub enum Nested {
    One(Option<Box<QueryRow>>),
    Many(Vec<QueryRow>),
}

impl QueryRow {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn try_get<T>(&self, field: &str) -> Result<T>
    where
        T: TryFrom<Value, Error = SqlweaveError>,
    {
        let value = self
            .fields
            .get(field)
            .ok_or_else(|| SqlweaveError::Build(format!("field '{field}' was not selected")))?;
        T::try_from(value.clone())
    }

    /// The single related row of a one relation, `None` when absent or not a one relation
    pub fn one(&self, relation: &str) -> Option<&QueryRow> {
        match self.relations.get(relation) {
            Some(Nested::One(Some(row))) => Some(row),
            _ => None,
        }
    }

    /// The related rows of a many relation, empty when absent or not a many relation
    pub fn many(&self, relation: &str) -> &[QueryRow] {
        match self.relations.get(relation) {
            Some(Nested::Many(rows)) => rows,
            _ => &[],
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::with_capacity(self.fields.len() + self.relations.len());
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }
        for (name, nested) in &self.relations {
            map.insert(name.clone(), nested.to_json());
        }
        serde_json::Value::Object(map)
    }
}

impl Nested {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Nested::One(None) => serde_json::Value::Null,
            Nested::One(Some(row)) => row.to_json(),
            Nested::Many(rows) => serde_json::Value::Array(rows.iter().map(QueryRow::to_json).collect()),
        }
    }
}

impl Serialize for QueryRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len() + self.relations.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        for (name, nested) in &self.relations {
            map.serialize_entry(name, nested)?;
        }
        map.end()
    }
}

impl Serialize for Nested {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Nested::One(None) => serializer.serialize_none(),
            Nested::One(Some(row)) => row.serialize(serializer),
            Nested::Many(rows) => rows.serialize(serializer),
        }
    }
}
