//! Relation graph derived from foreign keys.
//!
//! Every foreign key yields a forward relation on the referencing table and an
//! inverse relation on the referenced table. Tables whose primary key is
//! exactly two foreign keys additionally link their two targets many-to-many.
//! Explicit [`RelationDecl`]s rename or disambiguate these.

mod decl;
mod naming;

pub use decl::RelationDecl;

use crate::error::{Result, SqlweaveError};
use crate::schema::{TableId, TableInfo};
use indexmap::IndexMap;
use std::collections::HashSet;

/// How many rows a relation yields, seen from its source table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    One,
    Many,
}

/// The shape of the underlying association.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Foreign key with a uniqueness constraint
    OneToOne,
    /// Foreign key without a uniqueness constraint
    OneToMany,
    /// Junction table keyed by two foreign keys
    ManyToMany,
}

/// Column pairs to join on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinPath {
    /// `(source column, target column)` pairs
    Direct { pairs: Vec<(usize, usize)> },
    /// Through a junction table: `(source column, junction column)` then
    /// `(junction column, target column)`
    Through {
        junction: TableId,
        source_pairs: Vec<(usize, usize)>,
        target_pairs: Vec<(usize, usize)>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub name: String,
    pub source: TableId,
    pub target: TableId,
    pub kind: RelationKind,
    pub cardinality: Cardinality,
    pub path: JoinPath,
    /// Declared with a [`RelationDecl`] rather than derived
    pub explicit: bool,
}

/// Relations of every table, keyed by relation name.
#[derive(Debug, Clone, Default)]
pub struct RelationGraph {
    tables: Vec<IndexMap<String, Relation>>,
}

impl RelationGraph {
    pub fn get(&self, table: TableId, name: &str) -> Option<&Relation> {
        self.tables.get(table.0).and_then(|rels| rels.get(name))
    }

    /// Relations of `table` in resolution order: declared first, then derived
    pub fn relations(&self, table: TableId) -> impl Iterator<Item = &Relation> {
        self.tables.get(table.0).into_iter().flat_map(|rels| rels.values())
    }

    /// Total number of relations
    pub fn len(&self) -> usize {
        self.tables.iter().map(IndexMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// =============================================================================
// Resolution
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CandidateKey {
    /// Foreign key `fk` of `table`, seen from `table`
    Forward { table: TableId, fk: usize },
    /// Foreign key `fk` of `table`, seen from the table it references
    Inverse { table: TableId, fk: usize },
    /// Junction `junction`, from its first key column's target or its second
    Junction { junction: TableId, reversed: bool },
}

#[derive(Debug)]
struct Candidate {
    key: CandidateKey,
    name: String,
    source: TableId,
    target: TableId,
    kind: RelationKind,
    cardinality: Cardinality,
    path: JoinPath,
    /// One of several foreign keys between the same pair of tables
    ambiguous: bool,
}

impl Candidate {
    fn to_relation(&self, name: &str, cardinality: Cardinality, explicit: bool) -> Relation {
        Relation {
            name: name.to_string(),
            source: self.source,
            target: self.target,
            kind: self.kind,
            cardinality,
            path: self.path.clone(),
            explicit,
        }
    }
}

fn candidates(tables: &[TableInfo]) -> Vec<Candidate> {
    let mut out = Vec::new();

    for table in tables {
        for (index, fk) in table.foreign_keys.iter().enumerate() {
            let siblings = table
                .foreign_keys
                .iter()
                .filter(|other| other.target == fk.target)
                .count();
            let unique = table.is_unique_column(fk.column);
            let kind = if unique {
                RelationKind::OneToOne
            } else {
                RelationKind::OneToMany
            };

            out.push(Candidate {
                key: CandidateKey::Forward {
                    table: table.id,
                    fk: index,
                },
                name: naming::forward_name(&table.columns[fk.column].name),
                source: table.id,
                target: fk.target,
                kind,
                cardinality: Cardinality::One,
                path: JoinPath::Direct {
                    pairs: vec![(fk.column, fk.target_column)],
                },
                ambiguous: siblings > 1,
            });
            out.push(Candidate {
                key: CandidateKey::Inverse {
                    table: table.id,
                    fk: index,
                },
                name: if unique {
                    naming::singular_name(&table.name)
                } else {
                    naming::plural_name(&table.name)
                },
                source: fk.target,
                target: table.id,
                kind,
                cardinality: if unique {
                    Cardinality::One
                } else {
                    Cardinality::Many
                },
                path: JoinPath::Direct {
                    pairs: vec![(fk.target_column, fk.column)],
                },
                ambiguous: siblings > 1,
            });
        }

        // Junction: composite primary key of exactly two foreign keys to distinct tables
        let [first, second] = table.primary_key.as_slice() else {
            continue;
        };
        let (Some(a), Some(b)) = (table.foreign_key(*first), table.foreign_key(*second)) else {
            continue;
        };
        if a.target == b.target {
            continue;
        }
        for (reversed, from, to) in [(false, a, b), (true, b, a)] {
            out.push(Candidate {
                key: CandidateKey::Junction {
                    junction: table.id,
                    reversed,
                },
                name: naming::plural_name(&tables[to.target.0].name),
                source: from.target,
                target: to.target,
                kind: RelationKind::ManyToMany,
                cardinality: Cardinality::Many,
                path: JoinPath::Through {
                    junction: table.id,
                    source_pairs: vec![(from.target_column, from.column)],
                    target_pairs: vec![(to.column, to.target_column)],
                },
                ambiguous: false,
            });
        }
    }

    out
}

fn match_declaration<'c>(
    tables: &[TableInfo],
    by_name: &IndexMap<String, TableId>,
    candidates: &'c [Candidate],
    table: &TableInfo,
    decl: &RelationDecl,
) -> Result<&'c Candidate> {
    let fail = |why: String| {
        SqlweaveError::RelationAmbiguity(format!(
            "relation '{}' on '{}' {why}",
            decl.name, table.name
        ))
    };

    let target = by_name
        .get(&decl.target)
        .copied()
        .ok_or_else(|| fail(format!("targets unknown table '{}'", decl.target)))?;
    let target_info = &tables[target.0];

    let forward_fk = |c: &Candidate| match c.key {
        CandidateKey::Forward { table: t, fk } if t == table.id => {
            let fk = &table.foreign_keys[fk];
            (fk.target == target).then_some(fk)
        }
        _ => None,
    };
    let inverse_fk = |c: &Candidate| match c.key {
        CandidateKey::Inverse { table: t, fk } if t == target => {
            let fk = &target_info.foreign_keys[fk];
            (fk.target == table.id).then_some(fk)
        }
        _ => None,
    };

    let matches: Vec<&Candidate> = if !decl.fields.is_empty() {
        if decl.cardinality == Cardinality::Many {
            return Err(fail("names its own foreign-key fields and must be `one`".into()));
        }
        if decl.fields.len() != 1 || decl.references.len() > 1 {
            return Err(fail("uses a composite foreign key, which is not supported".into()));
        }
        candidates
            .iter()
            .filter(|c| {
                forward_fk(*c).is_some_and(|fk| {
                    table.columns[fk.column].name == decl.fields[0]
                        && decl
                            .references
                            .first()
                            .is_none_or(|r| target_info.columns[fk.target_column].name == *r)
                })
            })
            .collect()
    } else if !decl.via.is_empty() {
        if decl.via.len() != 1 {
            return Err(fail("uses a composite foreign key, which is not supported".into()));
        }
        candidates
            .iter()
            .filter(|c| {
                inverse_fk(*c).is_some_and(|fk| target_info.columns[fk.column].name == decl.via[0])
            })
            .collect()
    } else {
        match decl.cardinality {
            Cardinality::One => candidates
                .iter()
                .filter(|c| forward_fk(*c).is_some() || inverse_fk(*c).is_some())
                .collect(),
            Cardinality::Many => {
                let inverse: Vec<&Candidate> =
                    candidates.iter().filter(|c| inverse_fk(*c).is_some()).collect();
                if inverse.is_empty() {
                    candidates
                        .iter()
                        .filter(|c| {
                            matches!(c.key, CandidateKey::Junction { .. })
                                && c.source == table.id
                                && c.target == target
                        })
                        .collect()
                } else {
                    inverse
                }
            }
        }
    };

    match matches.as_slice() {
        [only] => Ok(*only),
        [] => Err(fail(format!(
            "matches no foreign key between '{}' and '{}'",
            table.name, decl.target
        ))),
        several => Err(fail(format!(
            "matches {} foreign keys; name one with fields(..) or via(..)",
            several.len()
        ))),
    }
}

/// Builds the relation graph for a fully registered set of tables.
pub(crate) fn resolve(
    tables: &[TableInfo],
    by_name: &IndexMap<String, TableId>,
) -> Result<RelationGraph> {
    let candidates = candidates(tables);
    let mut covered = HashSet::new();
    let mut per_table: Vec<Vec<Relation>> = vec![Vec::new(); tables.len()];

    for table in tables {
        for decl in &table.relations {
            let candidate = match_declaration(tables, by_name, &candidates, table, decl)?;
            if !covered.insert(candidate.key) {
                return Err(SqlweaveError::RelationAmbiguity(format!(
                    "relation '{}' on '{}' describes a foreign key that another declaration already names",
                    decl.name, table.name
                )));
            }
            let cardinality = match candidate.key {
                CandidateKey::Forward { .. } => Cardinality::One,
                CandidateKey::Inverse { .. } | CandidateKey::Junction { .. } => decl.cardinality,
            };
            per_table[table.id.0].push(candidate.to_relation(&decl.name, cardinality, true));
        }
    }

    for candidate in &candidates {
        if covered.contains(&candidate.key) {
            continue;
        }
        if candidate.ambiguous {
            match candidate.key {
                CandidateKey::Forward { table, fk } => {
                    let info = &tables[table.0];
                    let target = info.foreign_keys[fk].target;
                    let columns: Vec<&str> = info
                        .foreign_keys
                        .iter()
                        .filter(|other| other.target == target)
                        .map(|other| info.columns[other.column].name.as_str())
                        .collect();
                    return Err(SqlweaveError::RelationAmbiguity(format!(
                        "table '{}' has {} foreign keys to '{}' ({}); declare a relation with fields(..) for '{}'",
                        info.name,
                        columns.len(),
                        tables[target.0].name,
                        columns.join(", "),
                        info.columns[info.foreign_keys[fk].column].name,
                    )));
                }
                // Inverse sides of ambiguous keys exist only when declared with via(..)
                _ => continue,
            }
        }
        per_table[candidate.source.0].push(candidate.to_relation(
            &candidate.name,
            candidate.cardinality,
            false,
        ));
    }

    let mut graph = RelationGraph {
        tables: Vec::with_capacity(per_table.len()),
    };
    for (index, relations) in per_table.into_iter().enumerate() {
        let mut map = IndexMap::with_capacity(relations.len());
        for relation in relations {
            if map.contains_key(&relation.name) {
                return Err(SqlweaveError::RelationAmbiguity(format!(
                    "table '{}' has two relations named '{}'",
                    tables[index].name, relation.name
                )));
            }
            map.insert(relation.name.clone(), relation);
        }
        graph.tables.push(map);
    }

    Ok(graph)
}
