//! Runs against a live server when `DATABASE_URL` is set; every test creates
//! its own uniquely named tables so tests may share one database.

use serde_json::json;
use sqlweave::core::ErrorKind;
use sqlweave::postgres::{PostgresExecutor, connect};
use sqlweave::prelude::*;

struct Blog {
    db: Database<PostgresExecutor>,
    user: Table,
    post: Table,
}

async fn blog() -> Option<Blog> {
    let config = Config::from_env().ok()?;
    let executor = connect(&config.database_url).await.expect("connect");

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    let role = format!("Role_{suffix}");
    let user_name = format!("user_{suffix}");
    let post_name = format!("post_{suffix}");

    let schema = Schema::builder()
        .enumeration(EnumDef::new(role.as_str(), ["ADMIN", "BASIC"]))
        .unwrap()
        .table(
            TableDef::new(user_name.as_str())
                .column(ColumnDef::uuid("id").primary_key().default_random())
                .column(ColumnDef::varchar("name", 255).not_null())
                .column(ColumnDef::integer("age").not_null())
                .column(ColumnDef::varchar("email", 255).not_null().unique())
                .column(ColumnDef::enumeration("role", role.as_str()).default("BASIC").not_null())
                .relation(RelationDecl::many("posts", post_name.as_str())),
        )
        .unwrap()
        .table(
            TableDef::new(post_name.as_str())
                .column(ColumnDef::uuid("id").primary_key().default_random())
                .column(ColumnDef::text("title").not_null())
                .column(ColumnDef::real("rating").not_null().default(0))
                .column(ColumnDef::timestamp("createdAt").default_now().not_null())
                .column(ColumnDef::uuid("authorId").references(user_name.as_str(), "id").not_null())
                .relation(
                    RelationDecl::one("author", user_name.as_str())
                        .fields(["authorId"])
                        .references(["id"]),
                ),
        )
        .unwrap()
        .build();

    let db = Database::new(executor, schema);
    db.create().await.expect("create schema");
    db.create().await.expect("create is idempotent");

    let user = db.table(&user_name).unwrap();
    let post = db.table(&post_name).unwrap();
    Some(Blog { db, user, post })
}

#[tokio::test]
async fn round_trip_and_nested_read() {
    let Some(Blog { db, user, post }) = blog().await else {
        return;
    };

    let kyle = db
        .get(
            &db.insert(&user)
                .values([Record::new().set("name", "Kyle").set("age", 23).set("email", "k@b.com")])
                .returning_all(),
        )
        .await
        .unwrap();
    assert_eq!(kyle.get("role"), Some(&Value::from("BASIC")));
    let kyle_id: uuid::Uuid = kyle.try_get("id").unwrap();

    let selected = db
        .get(&db.select_all().from(&user).r#where(eq(user.col("id").unwrap(), kyle_id)))
        .await
        .unwrap();
    assert_eq!(selected, kyle);

    db.execute(
        &db.insert(&post)
            .values([Record::new().set("title", "Hello").set("authorId", kyle_id)]),
    )
    .await
    .unwrap();

    let users = db
        .query(&user)
        .find_many(
            &FindOptions::new()
                .columns([("name", true)])
                .with("posts", Shape::new().columns([("title", true), ("rating", true)])),
        )
        .await
        .unwrap();
    assert_eq!(
        serde_json::to_value(&users).unwrap(),
        json!([{ "name": "Kyle", "posts": [{ "title": "Hello", "rating": 0.0 }] }])
    );
}

#[tokio::test]
async fn aggregates_and_upserts() {
    let Some(Blog { db, user, .. }) = blog().await else {
        return;
    };
    let row = |name: &str, age: i32, email: &str| {
        Record::new().set("name", name).set("age", age).set("email", email)
    };
    db.execute(&db.insert(&user).values([
        row("Sally", 29, "s1@b.com"),
        row("Sally", 29, "s2@b.com"),
        row("Bob", 29, "b@b.com"),
    ]))
    .await
    .unwrap();

    let name = user.col("name").unwrap();
    let grouped = db
        .select([name.expr().alias("name"), count(&name).alias("count")])
        .from(&user)
        .r#where(eq(user.col("age").unwrap(), 29));
    let rows = db
        .all(&grouped.having(gt(grouped.field("count").unwrap(), 1)))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("count"), Some(&Value::from(2)));

    let mean = db
        .get(&db.select([avg(user.col("age").unwrap()).alias("mean")]).from(&user))
        .await
        .unwrap();
    assert_eq!(mean.get("mean"), Some(&Value::from(29.0)));

    db.execute(
        &db.insert(&user)
            .values([row("Robert", 30, "b@b.com")])
            .on_conflict_do_update(
                &[user.col("email").unwrap()],
                Record::new().set_expr("name", excluded(&name)),
            ),
    )
    .await
    .unwrap();
    let bob = db
        .get(&db.select_all().from(&user).r#where(eq(user.col("email").unwrap(), "b@b.com")))
        .await
        .unwrap();
    assert_eq!(bob.get("name"), Some(&Value::from("Robert")));
    assert_eq!(bob.get("age"), Some(&Value::from(29)));

    let duplicate = db
        .execute(&db.insert(&user).values([row("Sally", 1, "s1@b.com")]))
        .await
        .unwrap_err();
    assert_eq!(duplicate.kind(), ErrorKind::ConstraintViolation);
}
