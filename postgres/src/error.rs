use sqlweave_core::SqlweaveError;

/// Maps a PostgreSQL SQLSTATE to an error kind.
///
/// See: <https://www.postgresql.org/docs/current/errcodes-appendix.html>
///
/// ```
/// use sqlweave_core::ErrorKind;
/// use sqlweave_postgres::classify_sqlstate;
///
/// let err = classify_sqlstate("23505", "duplicate key value violates unique constraint");
/// assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
/// ```
pub fn classify_sqlstate(code: &str, message: impl Into<String>) -> SqlweaveError {
    let message = message.into();
    match code.get(..2) {
        Some("23") => SqlweaveError::ConstraintViolation(message),
        Some("22") => SqlweaveError::TypeMismatch(message),
        Some("08") => SqlweaveError::Connection(message),
        _ if code == "42804" => SqlweaveError::TypeMismatch(message),
        _ => SqlweaveError::Execution(message),
    }
}

#[cfg(feature = "tokio-postgres")]
pub(crate) fn classify(err: tokio_postgres::Error) -> SqlweaveError {
    use std::error::Error as _;

    if let Some(db) = err.as_db_error() {
        let message = match db.detail() {
            Some(detail) => format!("{}: {detail}", db.message()),
            None => db.message().to_string(),
        };
        return classify_sqlstate(db.code().code(), message);
    }

    let io = err.source().is_some_and(|source| source.is::<std::io::Error>());
    if err.is_closed() || io {
        SqlweaveError::Connection(err.to_string())
    } else {
        SqlweaveError::Execution(err.to_string())
    }
}
