use super::Cardinality;

/// Explicit relation declared on a table.
///
/// Needed only to rename a relation or to disambiguate several foreign keys
/// between the same two tables.
///
/// ```
/// use sqlweave_core::relation::RelationDecl;
///
/// // forward side: names the foreign-key column on this table
/// let author = RelationDecl::one("author", "user").fields(["authorId"]).references(["id"]);
/// // inverse side: names the foreign-key column on the target table
/// let posts = RelationDecl::many("posts", "post").via(["authorId"]);
/// assert_eq!(author.fields, vec!["authorId"]);
/// assert_eq!(posts.via, vec!["authorId"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDecl {
    pub name: String,
    pub target: String,
    pub cardinality: Cardinality,
    pub fields: Vec<String>,
    pub references: Vec<String>,
    pub via: Vec<String>,
}

impl RelationDecl {
    pub fn one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, Cardinality::One)
    }

    pub fn many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, Cardinality::Many)
    }

    fn new(name: impl Into<String>, target: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality,
            fields: Vec::new(),
            references: Vec::new(),
            via: Vec::new(),
        }
    }

    /// Foreign-key columns on the declaring table
    pub fn fields<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Referenced columns on the target table
    pub fn references<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.references = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Foreign-key columns on the target table that point back here
    pub fn via<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.via = columns.into_iter().map(Into::into).collect();
        self
    }
}
