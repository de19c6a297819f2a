/// SQL keywords, operators and punctuation.
#[allow(non_camel_case_types, clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    // Statements
    SELECT,
    DISTINCT,
    FROM,
    WHERE,
    GROUP,
    HAVING,
    ORDER,
    BY,
    LIMIT,
    OFFSET,
    INSERT,
    INTO,
    VALUES,
    UPDATE,
    SET,
    DELETE,
    RETURNING,
    ON,
    CONFLICT,
    DO,
    NOTHING,
    AS,
    ASC,
    DESC,
    // Joins
    INNER,
    LEFT,
    JOIN,
    // Logic
    AND,
    OR,
    NOT,
    IN,
    IS,
    NULL,
    LIKE,
    // DDL
    CREATE,
    TABLE,
    TYPE,
    ENUM,
    IF,
    EXISTS,
    PRIMARY,
    KEY,
    UNIQUE,
    REFERENCES,
    DEFAULT,
    CONSTRAINT,
    // Operators
    EQ,
    NE,
    LT,
    GT,
    LE,
    GE,
    STAR,
    // Punctuation
    LPAREN,
    RPAREN,
    COMMA,
    DOT,
    SEMI,
}

impl Token {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Token::SELECT => "SELECT",
            Token::DISTINCT => "DISTINCT",
            Token::FROM => "FROM",
            Token::WHERE => "WHERE",
            Token::GROUP => "GROUP",
            Token::HAVING => "HAVING",
            Token::ORDER => "ORDER",
            Token::BY => "BY",
            Token::LIMIT => "LIMIT",
            Token::OFFSET => "OFFSET",
            Token::INSERT => "INSERT",
            Token::INTO => "INTO",
            Token::VALUES => "VALUES",
            Token::UPDATE => "UPDATE",
            Token::SET => "SET",
            Token::DELETE => "DELETE",
            Token::RETURNING => "RETURNING",
            Token::ON => "ON",
            Token::CONFLICT => "CONFLICT",
            Token::DO => "DO",
            Token::NOTHING => "NOTHING",
            Token::AS => "AS",
            Token::ASC => "ASC",
            Token::DESC => "DESC",
            Token::INNER => "INNER",
            Token::LEFT => "LEFT",
            Token::JOIN => "JOIN",
            Token::AND => "AND",
            Token::OR => "OR",
            Token::NOT => "NOT",
            Token::IN => "IN",
            Token::IS => "IS",
            Token::NULL => "NULL",
            Token::LIKE => "LIKE",
            Token::CREATE => "CREATE",
            Token::TABLE => "TABLE",
            Token::TYPE => "TYPE",
            Token::ENUM => "ENUM",
            Token::IF => "IF",
            Token::EXISTS => "EXISTS",
            Token::PRIMARY => "PRIMARY",
            Token::KEY => "KEY",
            Token::UNIQUE => "UNIQUE",
            Token::REFERENCES => "REFERENCES",
            Token::DEFAULT => "DEFAULT",
            Token::CONSTRAINT => "CONSTRAINT",
            Token::EQ => "=",
            Token::NE => "<>",
            Token::LT => "<",
            Token::GT => ">",
            Token::LE => "<=",
            Token::GE => ">=",
            Token::STAR => "*",
            Token::LPAREN => "(",
            Token::RPAREN => ")",
            Token::COMMA => ",",
            Token::DOT => ".",
            Token::SEMI => ";",
        }
    }

    /// Comparison operators get a space on both sides
    pub const fn is_operator(&self) -> bool {
        matches!(
            self,
            Token::EQ | Token::NE | Token::LT | Token::GT | Token::LE | Token::GE
        )
    }
}

impl core::fmt::Display for Token {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
