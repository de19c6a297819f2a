use sqlweave_core::{Result, SqlweaveError};

const DATABASE_URL: &str = "DATABASE_URL";

/// Connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
}

impl Config {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
        }
    }

    /// Reads `DATABASE_URL`, loading a `.env` file first when one exists.
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_value(std::env::var(DATABASE_URL).ok())
    }

    fn from_value(value: Option<String>) -> Result<Self> {
        match value {
            Some(url) if !url.trim().is_empty() => Ok(Self::new(url.trim())),
            Some(_) => Err(SqlweaveError::Config(format!("{DATABASE_URL} is empty"))),
            None => Err(SqlweaveError::Config(format!("{DATABASE_URL} is not set"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlweave_core::ErrorKind;

    #[test]
    fn test_from_value() {
        let config = Config::from_value(Some(" postgres://localhost/app ".into())).unwrap();
        assert_eq!(config, Config::new("postgres://localhost/app"));
    }

    #[test]
    fn test_missing_or_empty_url() {
        let missing = Config::from_value(None).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::Config);
        assert_eq!(missing.to_string(), "Config error: DATABASE_URL is not set");

        let empty = Config::from_value(Some("  ".into())).unwrap_err();
        assert_eq!(empty.kind(), ErrorKind::Config);
    }
}
