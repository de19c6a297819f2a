mod chunk;
mod tokens;

pub use chunk::*;
pub use tokens::*;

use crate::value::Value;
use smallvec::SmallVec;
use sqlweave_types::Dialect;
use std::borrow::Cow;

/// SQL fragment builder with flat chunk storage.
///
/// Uses `SmallVec<[SQLChunk; 8]>` for inline storage of typical SQL fragments
/// without heap allocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SQL<'a> {
    pub chunks: SmallVec<[SQLChunk<'a>; 8]>,
}

/// Types that render to a SQL fragment.
pub trait ToSQL {
    fn to_sql(&self) -> SQL<'_>;
}

impl<'a> SQL<'a> {
    // ==================== constructors ====================

    /// Creates an empty SQL fragment
    #[inline]
    pub const fn empty() -> Self {
        Self {
            chunks: SmallVec::new_const(),
        }
    }

    /// Creates SQL with a single token
    #[inline]
    pub fn token(t: Token) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Token(t)],
        }
    }

    /// Creates SQL with a quoted identifier
    #[inline]
    pub fn ident(name: impl Into<Cow<'a, str>>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Ident(name.into())],
        }
    }

    /// Creates SQL with a qualified column reference
    #[inline]
    pub fn column(qualifier: impl Into<Cow<'a, str>>, name: impl Into<Cow<'a, str>>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::column(qualifier, name)],
        }
    }

    /// Creates SQL with raw text (unquoted)
    #[inline]
    pub fn raw(text: impl Into<Cow<'a, str>>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Raw(text.into())],
        }
    }

    /// Creates SQL with a single unsigned integer literal.
    #[inline]
    pub fn number(value: usize) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Number(value)],
        }
    }

    /// Creates SQL with a single parameter value
    #[inline]
    pub fn param(value: impl Into<Cow<'a, Value>>) -> Self {
        Self {
            chunks: smallvec::smallvec![SQLChunk::Param(value.into())],
        }
    }

    /// Creates SQL for a function call: NAME(args)
    #[inline]
    pub fn func(name: &'static str, args: SQL<'a>) -> Self {
        SQL::raw(name)
            .push(Token::LPAREN)
            .append(args)
            .push(Token::RPAREN)
    }

    // ==================== builder methods ====================

    /// Append another SQL fragment (flat extend)
    #[inline]
    pub fn append(mut self, other: impl Into<SQL<'a>>) -> Self {
        let other = other.into();
        if self.chunks.is_empty() {
            return other;
        }
        self.chunks.extend(other.chunks);
        self
    }

    #[inline]
    pub fn append_mut(&mut self, other: impl Into<SQL<'a>>) {
        let other = other.into();
        if self.chunks.is_empty() {
            self.chunks = other.chunks;
        } else {
            self.chunks.extend(other.chunks);
        }
    }

    /// Push a single chunk
    #[inline]
    pub fn push(mut self, chunk: impl Into<SQLChunk<'a>>) -> Self {
        self.chunks.push(chunk.into());
        self
    }

    #[inline]
    pub fn push_mut(&mut self, chunk: impl Into<SQLChunk<'a>>) {
        self.chunks.push(chunk.into());
    }

    // ==================== combinators ====================

    /// Joins multiple SQL fragments with a separator
    pub fn join<I>(sqls: I, separator: Token) -> SQL<'a>
    where
        I: IntoIterator<Item = SQL<'a>>,
    {
        let mut result = SQL::empty();
        for (i, sql) in sqls.into_iter().enumerate() {
            if i > 0 {
                result.chunks.push(SQLChunk::Token(separator));
            }
            result.chunks.extend(sql.chunks);
        }
        result
    }

    /// Wrap in parentheses: (self)
    #[inline]
    pub fn parens(self) -> Self {
        SQL::token(Token::LPAREN).append(self).push(Token::RPAREN)
    }

    /// Creates an aliased version: self AS "name"
    pub fn alias(self, name: impl Into<Cow<'a, str>>) -> SQL<'a> {
        self.push(Token::AS).push(SQLChunk::Ident(name.into()))
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    // ==================== output methods ====================

    /// Returns the SQL string with dialect-appropriate placeholders.
    pub fn sql(&self, dialect: Dialect) -> String {
        self.build(dialect).0
    }

    /// Generates the SQL string and collects parameter values in a single pass.
    ///
    /// Uses `$1, $2, ...` for PostgreSQL and `?` for SQLite and MySQL.
    pub fn build(&self, dialect: Dialect) -> (String, Vec<Value>) {
        let mut buf = String::with_capacity(self.chunks.len().saturating_mul(8).max(128));
        let mut params = Vec::new();

        for (i, chunk) in self.chunks.iter().enumerate() {
            match chunk {
                SQLChunk::Param(value) => {
                    params.push(value.as_ref().clone());
                    buf.push_str(&dialect.placeholder(params.len()));
                }
                _ => chunk.write(&mut buf),
            }

            if let Some(next) = self.chunks.get(i + 1)
                && chunk_needs_space(chunk, next)
            {
                buf.push(' ');
            }
        }

        (buf, params)
    }

    /// Returns an iterator over references to parameter values
    pub fn params(&self) -> impl Iterator<Item = &Value> {
        self.chunks.iter().filter_map(|chunk| match chunk {
            SQLChunk::Param(value) => Some(value.as_ref()),
            _ => None,
        })
    }
}

/// Canonical spacing logic for SQL chunk rendering.
pub(crate) fn chunk_needs_space(current: &SQLChunk<'_>, next: &SQLChunk<'_>) -> bool {
    match (current, next) {
        // No space before closing/separator punctuation
        (_, SQLChunk::Token(Token::RPAREN | Token::COMMA | Token::SEMI | Token::DOT)) => false,
        // No space after opening punctuation
        (SQLChunk::Token(Token::LPAREN | Token::DOT), _) => false,
        // Space after comma
        (SQLChunk::Token(Token::COMMA), _) => true,
        // Space around comparison operators
        (SQLChunk::Token(t), _) if t.is_operator() => true,
        (_, SQLChunk::Token(t)) if t.is_operator() => true,
        // Function call: count(
        (SQLChunk::Raw(_), SQLChunk::Token(Token::LPAREN)) => false,
        // Space after closing paren if next is word-like (e.g., ") FROM")
        (SQLChunk::Token(Token::RPAREN), next) => next.is_word_like(),
        // Space before opening paren if preceded by word-like (e.g., "IN (")
        (current, SQLChunk::Token(Token::LPAREN)) => current.is_word_like(),
        // Space between all word-like chunks
        _ => current.is_word_like() && next.is_word_like(),
    }
}

impl<'a> From<Token> for SQL<'a> {
    fn from(value: Token) -> Self {
        SQL::token(value)
    }
}

impl<'a> From<SQLChunk<'a>> for SQL<'a> {
    fn from(value: SQLChunk<'a>) -> Self {
        Self {
            chunks: smallvec::smallvec![value],
        }
    }
}

impl<'a> FromIterator<SQLChunk<'a>> for SQL<'a> {
    fn from_iter<I: IntoIterator<Item = SQLChunk<'a>>>(iter: I) -> Self {
        Self {
            chunks: SmallVec::from_iter(iter),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_numbered_placeholders_for_postgres() {
        let sql = SQL::token(Token::SELECT)
            .append(SQL::column("user", "name"))
            .push(Token::FROM)
            .append(SQL::ident("user"))
            .push(Token::WHERE)
            .append(SQL::column("user", "age"))
            .push(Token::EQ)
            .append(SQL::param(Cow::Owned(Value::from(29))))
            .push(Token::AND)
            .append(SQL::column("user", "name"))
            .push(Token::NE)
            .append(SQL::param(Cow::Owned(Value::from("Kyle"))));

        let (text, params) = sql.build(Dialect::PostgreSQL);
        assert_eq!(
            text,
            r#"SELECT "user"."name" FROM "user" WHERE "user"."age" = $1 AND "user"."name" <> $2"#
        );
        assert_eq!(params, vec![Value::Integer(29), Value::Text("Kyle".into())]);
        assert_eq!(
            sql.sql(Dialect::SQLite),
            r#"SELECT "user"."name" FROM "user" WHERE "user"."age" = ? AND "user"."name" <> ?"#
        );
    }

    #[test]
    fn function_calls_and_lists() {
        let count = SQL::func("count", SQL::column("user", "name")).alias("count");
        assert_eq!(
            count.sql(Dialect::PostgreSQL),
            r#"count("user"."name") AS "count""#
        );

        let list = SQL::column("user", "age")
            .push(Token::IN)
            .append(
                SQL::join(
                    [SQL::param(Cow::Owned(Value::from(1))), SQL::param(Cow::Owned(Value::from(2)))],
                    Token::COMMA,
                )
                .parens(),
            );
        assert_eq!(list.sql(Dialect::PostgreSQL), r#""user"."age" IN ($1, $2)"#);
    }

    #[test]
    fn identifiers_escape_quotes() {
        assert_eq!(SQL::ident(r#"we"ird"#).sql(Dialect::PostgreSQL), r#""we""ird""#);
    }

    #[test]
    fn operator_after_closing_paren() {
        let sql = SQL::func("count", SQL::token(Token::STAR))
            .push(Token::GT)
            .append(SQL::param(Cow::Owned(Value::from(1))));
        assert_eq!(sql.sql(Dialect::PostgreSQL), "count(*) > $1");
    }
}
