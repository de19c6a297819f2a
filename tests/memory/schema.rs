use crate::common::schema;
use sqlweave::core::ErrorKind;
use sqlweave::core::relation::{Cardinality, RelationKind};
use sqlweave::memory::MemoryStore;
use sqlweave::prelude::*;

fn user() -> TableDef {
    TableDef::new("user")
        .column(ColumnDef::integer("id").primary_key())
        .column(ColumnDef::text("name").not_null())
}

#[test]
fn registering_twice_is_a_schema_error() {
    let err = Schema::builder()
        .table(user())
        .unwrap()
        .table(user())
        .map(|_| ())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);

    let err = Schema::builder()
        .table(user().column(ColumnDef::text("name")))
        .map(|_| ())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Schema);
}

#[test]
fn bad_foreign_keys_are_schema_errors() {
    let unknown_table = Schema::builder()
        .table(TableDef::new("post").column(ColumnDef::integer("authorId").references("user", "id")))
        .map(|_| ())
        .unwrap_err();
    assert_eq!(unknown_table.kind(), ErrorKind::Schema);

    let not_unique = Schema::builder()
        .table(user())
        .unwrap()
        .table(TableDef::new("post").column(ColumnDef::text("authorName").references("user", "name")))
        .map(|_| ())
        .unwrap_err();
    assert_eq!(not_unique.kind(), ErrorKind::Schema);

    let wrong_type = Schema::builder()
        .table(user())
        .unwrap()
        .table(TableDef::new("post").column(ColumnDef::uuid("authorId").references("user", "id")))
        .map(|_| ())
        .unwrap_err();
    assert_eq!(wrong_type.kind(), ErrorKind::Schema);

    let unknown_enum = Schema::builder()
        .table(TableDef::new("user").column(ColumnDef::enumeration("role", "Role")))
        .map(|_| ())
        .unwrap_err();
    assert_eq!(unknown_enum.kind(), ErrorKind::Schema);
}

#[test]
fn blog_relations_resolve() {
    let schema = schema();
    let graph = schema.relations().unwrap();
    let id = |name: &str| schema.table_id(name).unwrap();

    let prefs = graph.get(id("user"), "preferences").unwrap();
    assert_eq!(prefs.cardinality, Cardinality::One);
    // userId is not unique, so the underlying association is one-to-many
    assert_eq!(prefs.kind, RelationKind::OneToMany);

    assert_eq!(graph.get(id("user"), "posts").unwrap().cardinality, Cardinality::Many);
    assert_eq!(graph.get(id("post"), "author").unwrap().cardinality, Cardinality::One);
    assert_eq!(
        graph.get(id("post"), "categories").unwrap().kind,
        RelationKind::ManyToMany
    );
    assert_eq!(graph.get(id("category"), "posts").unwrap().kind, RelationKind::ManyToMany);
    assert_eq!(
        graph.get(id("postCategory"), "category").unwrap().target,
        id("category")
    );
}

#[tokio::test]
async fn ambiguous_relations_fail_on_first_use_and_stay_failed() {
    let schema = Schema::builder()
        .table(user())
        .unwrap()
        .table(
            TableDef::new("post")
                .column(ColumnDef::integer("id").primary_key())
                .column(ColumnDef::integer("authorId").references("user", "id"))
                .column(ColumnDef::integer("editorId").references("user", "id")),
        )
        .unwrap()
        .build();
    let db = Database::new(MemoryStore::new(), schema);
    db.create().await.unwrap();

    // plain statements do not need the relation graph
    let post = db.table("post").unwrap();
    assert!(db.all(&db.select_all().from(&post)).await.unwrap().is_empty());

    let first = db
        .query(&post)
        .find_many(&FindOptions::new())
        .await
        .unwrap_err();
    assert_eq!(first.kind(), ErrorKind::RelationAmbiguity);

    let again = db
        .query(&post)
        .find_many(&FindOptions::new())
        .await
        .unwrap_err();
    assert_eq!(again, first);
}
