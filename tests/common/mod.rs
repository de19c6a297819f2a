//! The blog schema shared by the integration tests: users with preferences,
//! posts, and categories linked to posts through a junction table.

use sqlweave::memory::MemoryStore;
use sqlweave::prelude::*;
use sqlweave::core::SeededValues;
use uuid::Uuid;

pub const SEED: u64 = 42;

pub fn schema() -> Schema {
    Schema::builder()
        .enumeration(EnumDef::new("UserRole", ["ADMIN", "BASIC"]))
        .unwrap()
        .table(
            TableDef::new("user")
                .column(ColumnDef::uuid("id").primary_key().default_random())
                .column(ColumnDef::varchar("name", 255).not_null())
                .column(ColumnDef::integer("age").not_null())
                .column(ColumnDef::varchar("email", 255).not_null().unique())
                .column(ColumnDef::enumeration("userRole", "UserRole").default("BASIC").not_null())
                .unique_index("emailindex", ["email"])
                .relation(RelationDecl::one("preferences", "userPreferences"))
                .relation(RelationDecl::many("posts", "post")),
        )
        .unwrap()
        .table(
            TableDef::new("userPreferences")
                .column(ColumnDef::uuid("id").primary_key().default_random())
                .column(ColumnDef::boolean("emailUpdates").not_null().default(false))
                .column(ColumnDef::uuid("userId").references("user", "id").not_null())
                .relation(RelationDecl::one("user", "user").fields(["userId"]).references(["id"])),
        )
        .unwrap()
        .table(
            TableDef::new("post")
                .column(ColumnDef::uuid("id").primary_key().default_random())
                .column(ColumnDef::varchar("title", 255).not_null())
                .column(ColumnDef::real("averageRating").not_null().default(0))
                .column(ColumnDef::timestamp("createdAt").default_now().not_null())
                .column(ColumnDef::timestamp("updatedAt").default_now().not_null())
                .column(ColumnDef::uuid("authorId").references("user", "id").not_null())
                .relation(RelationDecl::one("author", "user").fields(["authorId"]).references(["id"]))
                .relation(RelationDecl::many("postCategories", "postCategory")),
        )
        .unwrap()
        .table(
            TableDef::new("category")
                .column(ColumnDef::uuid("id").primary_key().default_random())
                .column(ColumnDef::varchar("name", 255).not_null())
                .relation(RelationDecl::many("postCategories", "postCategory")),
        )
        .unwrap()
        .table(
            TableDef::new("postCategory")
                .column(ColumnDef::uuid("postId").references("post", "id").not_null())
                .column(ColumnDef::uuid("categoryId").references("category", "id").not_null())
                .primary_key(["postId", "categoryId"])
                .relation(RelationDecl::one("post", "post").fields(["postId"]).references(["id"]))
                .relation(
                    RelationDecl::one("category", "category")
                        .fields(["categoryId"])
                        .references(["id"]),
                ),
        )
        .unwrap()
        .build()
}

/// A fresh in-memory database with the blog schema created and
/// deterministic identifiers and timestamps.
pub async fn setup() -> Database<MemoryStore> {
    let db = Database::new(MemoryStore::new(), schema()).with_provider(SeededValues::new(SEED));
    db.create().await.expect("create schema");
    db
}

pub async fn insert_user(db: &Database<MemoryStore>, name: &str, age: i32, email: &str) -> Uuid {
    let user = db.table("user").unwrap();
    let row = db
        .get(
            &db.insert(&user)
                .values([Record::new().set("name", name).set("age", age).set("email", email)])
                .returning([user.col("id").unwrap()]),
        )
        .await
        .expect("insert user");
    row.try_get("id").unwrap()
}

pub async fn insert_post(db: &Database<MemoryStore>, author: Uuid, title: &str) -> Uuid {
    let post = db.table("post").unwrap();
    let row = db
        .get(
            &db.insert(&post)
                .values([Record::new().set("title", title).set("authorId", author)])
                .returning([post.col("id").unwrap()]),
        )
        .await
        .expect("insert post");
    row.try_get("id").unwrap()
}

pub async fn insert_category(db: &Database<MemoryStore>, name: &str) -> Uuid {
    let category = db.table("category").unwrap();
    let row = db
        .get(
            &db.insert(&category)
                .values([Record::new().set("name", name)])
                .returning([category.col("id").unwrap()]),
        )
        .await
        .expect("insert category");
    row.try_get("id").unwrap()
}

pub async fn link(db: &Database<MemoryStore>, post: Uuid, category: Uuid) {
    let junction = db.table("postCategory").unwrap();
    db.execute(
        &db.insert(&junction)
            .values([Record::new().set("postId", post).set("categoryId", category)]),
    )
    .await
    .expect("link post to category");
}
