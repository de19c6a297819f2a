//! Parameter binding and row decoding.

use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlweave_core::{Result, SqlweaveError, Value};
use std::error::Error;
use tokio_postgres::Row as PgRow;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};
use uuid::Uuid;

type BoxError = Box<dyn Error + Sync + Send>;

/// A borrowed [`Value`] bound as a statement parameter.
///
/// Integers are narrowed or widened to whatever the server inferred for the
/// placeholder; text is written as raw bytes so it binds to enum types too.
#[derive(Debug, Clone, Copy)]
pub struct PgValue<'a>(pub &'a Value);

impl ToSql for PgValue<'_> {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> std::result::Result<IsNull, BoxError> {
        match self.0 {
            Value::Null => Ok(IsNull::Yes),
            Value::Integer(i) => match *ty {
                Type::INT2 => i16::try_from(*i)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*i)?.to_sql(ty, out),
                Type::FLOAT4 => (*i as f32).to_sql(ty, out),
                Type::FLOAT8 => (*i as f64).to_sql(ty, out),
                _ => i.to_sql(ty, out),
            },
            Value::Real(f) => match *ty {
                Type::FLOAT4 => (*f as f32).to_sql(ty, out),
                _ => f.to_sql(ty, out),
            },
            Value::Text(s) => {
                out.extend_from_slice(s.as_bytes());
                Ok(IsNull::No)
            }
            Value::Boolean(b) => b.to_sql(ty, out),
            Value::Timestamp(ts) => match *ty {
                Type::TIMESTAMPTZ => ts.and_utc().to_sql(ty, out),
                _ => ts.to_sql(ty, out),
            },
            Value::Uuid(id) => id.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

/// Text of an enum or any type without a dedicated mapping.
struct RawText(String);

impl<'a> FromSql<'a> for RawText {
    fn from_sql(_ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, BoxError> {
        Ok(RawText(std::str::from_utf8(raw)?.to_owned()))
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }
}

fn get<'a, T: FromSql<'a>>(row: &'a PgRow, index: usize) -> Result<Option<T>> {
    row.try_get::<_, Option<T>>(index)
        .map_err(|err| SqlweaveError::TypeMismatch(err.to_string()))
}

fn decode(row: &PgRow, index: usize, ty: &Type) -> Result<Value> {
    let value: Value = match *ty {
        Type::BOOL => get::<bool>(row, index)?.into(),
        Type::INT2 => get::<i16>(row, index)?.into(),
        Type::INT4 => get::<i32>(row, index)?.into(),
        Type::INT8 => get::<i64>(row, index)?.into(),
        Type::FLOAT4 => get::<f32>(row, index)?.into(),
        Type::FLOAT8 => get::<f64>(row, index)?.into(),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => get::<String>(row, index)?.into(),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, index)?.into(),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, index)?
            .map(|ts| ts.naive_utc())
            .into(),
        Type::UUID => get::<Uuid>(row, index)?.into(),
        _ => get::<RawText>(row, index)?.map(|raw| raw.0).into(),
    };
    Ok(value)
}

/// Decodes every column of `row` by the type the server reported for it
pub(crate) fn decode_row(row: &PgRow) -> Result<Vec<Value>> {
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| decode(row, index, column.type_()))
        .collect()
}
