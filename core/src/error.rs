use thiserror::Error;

/// Every failure the library reports.
///
/// Payloads are plain strings so a failed relation graph can be cached and
/// handed out again to every later caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlweaveError {
    /// Invalid schema declaration
    #[error("Schema error: {0}")]
    Schema(String),

    /// Foreign keys that cannot be turned into named relations unambiguously
    #[error("Relation ambiguity: {0}")]
    RelationAmbiguity(String),

    /// Query request shaped invalidly, raised before any I/O
    #[error("Build error: {0}")]
    Build(String),

    /// Value outside an enum or check set
    #[error("Validation error: {0}")]
    Validation(String),

    /// The store rejected a write (unique, foreign key, not null, check)
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// The store rejected a value for its column type
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Transient I/O failure, safe for the caller to retry
    #[error("Connection error: {0}")]
    Connection(String),

    /// Store error with no finer classification
    #[error("Execution error: {0}")]
    Execution(String),

    /// No rows returned when at least one was expected
    #[error("No rows found")]
    NotFound,

    /// Missing or invalid configuration
    #[error("Config error: {0}")]
    Config(String),
}

/// Field-less discriminant of [`SqlweaveError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Schema,
    RelationAmbiguity,
    Build,
    Validation,
    ConstraintViolation,
    TypeMismatch,
    Connection,
    Execution,
    NotFound,
    Config,
}

impl SqlweaveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Schema(_) => ErrorKind::Schema,
            Self::RelationAmbiguity(_) => ErrorKind::RelationAmbiguity,
            Self::Build(_) => ErrorKind::Build,
            Self::Validation(_) => ErrorKind::Validation,
            Self::ConstraintViolation(_) => ErrorKind::ConstraintViolation,
            Self::TypeMismatch(_) => ErrorKind::TypeMismatch,
            Self::Connection(_) => ErrorKind::Connection,
            Self::Execution(_) => ErrorKind::Execution,
            Self::NotFound => ErrorKind::NotFound,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Only connection failures are worth retrying; everything else is permanent.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

/// Result type for sqlweave operations
pub type Result<T> = std::result::Result<T, SqlweaveError>;
