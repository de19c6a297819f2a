use super::tokens::Token;
use crate::value::Value;
use std::borrow::Cow;
use std::fmt::Write;

/// A SQL chunk represents a part of an SQL statement.
///
/// - `Token` - SQL keywords and operators (SELECT, FROM, =, etc.)
/// - `Ident` - Quoted identifiers ("table_name", "column_name")
/// - `Column` - Qualified column reference ("alias"."column")
/// - `Raw` - Unquoted raw SQL text (function names, type names)
/// - `Param` - Bound parameter, rendered as a placeholder
/// - `Number` - Unsigned integer literal (LIMIT/OFFSET)
#[derive(Debug, Clone, PartialEq)]
pub enum SQLChunk<'a> {
    /// SQL keywords and operators: SELECT, FROM, WHERE, =, AND, etc.
    Token(Token),

    /// Quoted identifier for user-provided names
    /// Renders as: "name" (with quotes)
    Ident(Cow<'a, str>),

    /// Renders as: "qualifier"."name"
    Column {
        qualifier: Cow<'a, str>,
        name: Cow<'a, str>,
    },

    /// Raw SQL text (unquoted) for function names and type spellings
    Raw(Cow<'a, str>),

    /// Parameter value, rendered as `$n` or `?` depending on dialect
    Param(Cow<'a, Value>),

    /// Renders as: the number, unquoted
    Number(usize),
}

impl<'a> SQLChunk<'a> {
    /// Creates a quoted identifier from a runtime string
    #[inline]
    pub fn ident(name: impl Into<Cow<'a, str>>) -> Self {
        Self::Ident(name.into())
    }

    /// Creates raw SQL text from a runtime string
    #[inline]
    pub fn raw(text: impl Into<Cow<'a, str>>) -> Self {
        Self::Raw(text.into())
    }

    #[inline]
    pub fn column(qualifier: impl Into<Cow<'a, str>>, name: impl Into<Cow<'a, str>>) -> Self {
        Self::Column {
            qualifier: qualifier.into(),
            name: name.into(),
        }
    }

    /// Write chunk content to buffer. Parameters are written by the caller.
    pub(crate) fn write(&self, buf: &mut String) {
        match self {
            SQLChunk::Token(token) => buf.push_str(token.as_str()),
            SQLChunk::Ident(name) => write_quoted(buf, name),
            SQLChunk::Column { qualifier, name } => {
                write_quoted(buf, qualifier);
                buf.push('.');
                write_quoted(buf, name);
            }
            SQLChunk::Raw(text) => buf.push_str(text),
            SQLChunk::Number(n) => {
                let _ = write!(buf, "{n}");
            }
            SQLChunk::Param(_) => buf.push('?'),
        }
    }

    /// Check if this chunk is "word-like" (needs space separation from other word-like chunks)
    #[inline]
    pub(crate) const fn is_word_like(&self) -> bool {
        match self {
            SQLChunk::Token(t) => !matches!(
                t,
                Token::LPAREN | Token::RPAREN | Token::COMMA | Token::SEMI | Token::DOT
            ) && !t.is_operator(),
            SQLChunk::Ident(_)
            | SQLChunk::Column { .. }
            | SQLChunk::Raw(_)
            | SQLChunk::Param(_)
            | SQLChunk::Number(_) => true,
        }
    }
}

/// Identifiers are double-quoted; embedded quotes are doubled.
fn write_quoted(buf: &mut String, name: &str) {
    buf.push('"');
    for c in name.chars() {
        if c == '"' {
            buf.push('"');
        }
        buf.push(c);
    }
    buf.push('"');
}

impl<'a> From<Token> for SQLChunk<'a> {
    #[inline]
    fn from(value: Token) -> Self {
        Self::Token(value)
    }
}
