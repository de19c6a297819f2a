use crate::common::{SEED, insert_post, insert_user, schema, setup};
use sqlweave::core::{ErrorKind, SeededValues};
use sqlweave::memory::MemoryStore;
use sqlweave::prelude::*;

#[tokio::test]
async fn insert_then_select_round_trips() {
    let db = setup().await;
    let user = db.table("user").unwrap();

    let inserted = db
        .get(
            &db.insert(&user)
                .values([Record::new().set("name", "Kyle").set("age", 23).set("email", "a@b.com")])
                .returning_all(),
        )
        .await
        .unwrap();
    assert_eq!(inserted.get("userRole"), Some(&Value::from("BASIC")));
    assert!(matches!(inserted.get("id"), Some(Value::Uuid(_))));

    let id = inserted.get("id").unwrap().clone();
    let selected = db
        .get(&db.select_all().from(&user).r#where(eq(user.col("id").unwrap(), id)))
        .await
        .unwrap();
    assert_eq!(selected, inserted);
}

#[tokio::test]
async fn generated_defaults_are_reproducible() {
    let first = setup().await;
    let second = setup().await;
    let a = insert_user(&first, "Kyle", 23, "a@b.com").await;
    let b = insert_user(&second, "Kyle", 23, "a@b.com").await;
    assert_eq!(a, b);

    let post = first.table("post").unwrap();
    let id = insert_post(&first, a, "Hello").await;
    let row = first
        .get(&first.select_all().from(&post).r#where(eq(post.col("id").unwrap(), id)))
        .await
        .unwrap();
    assert_eq!(row.get("averageRating"), Some(&Value::Real(0.0)));
    let created = row.get("createdAt").unwrap().to_string();
    assert!(created.starts_with("'2024-01-01T"), "{created}");
}

#[tokio::test]
async fn upsert_applies_only_the_update_set() {
    let db = setup().await;
    let original = insert_user(&db, "Kyle", 23, "a@b.com").await;

    let user = db.table("user").unwrap();
    let email = user.col("email").unwrap();
    let name = user.col("name").unwrap();

    let upsert = db
        .insert(&user)
        .values([Record::new().set("name", "Kyle Cook").set("age", 40).set("email", "a@b.com")])
        .on_conflict_do_update(&[email.clone()], Record::new().set_expr("name", excluded(&name)))
        .returning_all();
    let row = db.get(&upsert).await.unwrap();
    assert_eq!(row.try_get::<uuid::Uuid>("id").unwrap(), original);

    let rows = db.all(&db.select_all().from(&user)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::from("Kyle Cook")));
    assert_eq!(rows[0].get("age"), Some(&Value::from(23)));
    assert_eq!(rows[0].get("email"), Some(&Value::from("a@b.com")));

    let skipped = db
        .execute(
            &db.insert(&user)
                .values([Record::new().set("name", "Other").set("age", 1).set("email", "a@b.com")])
                .on_conflict_do_nothing(&[]),
        )
        .await
        .unwrap();
    assert_eq!(skipped, 0);
    assert_eq!(db.executor().row_count("user").unwrap(), 1);
}

#[tokio::test]
async fn upsert_targets_its_own_key_before_the_primary_key() {
    let db = setup().await;
    let original = insert_user(&db, "Kyle", 23, "a@b.com").await;

    let user = db.table("user").unwrap();
    let email = user.col("email").unwrap();
    let name = user.col("name").unwrap();

    let upsert = db
        .insert(&user)
        .values([Record::new()
            .set("id", original)
            .set("name", "New")
            .set("age", 40)
            .set("email", "a@b.com")])
        .on_conflict_do_update(&[email], Record::new().set_expr("name", excluded(&name)));
    assert_eq!(db.execute(&upsert).await.unwrap(), 1);

    let rows = db.all(&db.select_all().from(&user)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::from("New")));
    assert_eq!(rows[0].get("age"), Some(&Value::from(23)));
}

#[tokio::test]
async fn upsert_cannot_touch_a_row_twice() {
    let db = setup().await;
    insert_user(&db, "Kyle", 23, "a@b.com").await;

    let user = db.table("user").unwrap();
    let email = user.col("email").unwrap();
    let name = user.col("name").unwrap();

    let batch = db
        .insert(&user)
        .values([
            Record::new().set("name", "First").set("age", 30).set("email", "a@b.com"),
            Record::new().set("name", "Second").set("age", 31).set("email", "a@b.com"),
        ])
        .on_conflict_do_update(&[email.clone()], Record::new().set_expr("name", excluded(&name)));
    let err = db.execute(&batch).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution, "{err}");

    let rows = db.all(&db.select_all().from(&user)).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::from("Kyle")));

    let fresh = db
        .insert(&user)
        .values([
            Record::new().set("name", "Sam").set("age", 30).set("email", "s@b.com"),
            Record::new().set("name", "Sam 2").set("age", 31).set("email", "s@b.com"),
        ])
        .on_conflict_do_update(&[email], Record::new().set_expr("name", excluded(&name)));
    let err = db.execute(&fresh).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Execution, "{err}");
    assert_eq!(db.executor().row_count("user").unwrap(), 1);
}

#[tokio::test]
async fn store_constraints_are_classified() {
    let db = setup().await;
    let kyle = insert_user(&db, "Kyle", 23, "a@b.com").await;
    insert_post(&db, kyle, "Hello").await;
    let user = db.table("user").unwrap();
    let post = db.table("post").unwrap();

    let duplicate = db
        .execute(
            &db.insert(&user)
                .values([Record::new().set("name", "Kyle").set("age", 23).set("email", "a@b.com")]),
        )
        .await
        .unwrap_err();
    assert_eq!(duplicate.kind(), ErrorKind::ConstraintViolation);
    assert!(!duplicate.is_retryable());

    let orphan = db
        .execute(
            &db.insert(&post)
                .values([Record::new().set("title", "Orphan").set("authorId", uuid::Uuid::nil())]),
        )
        .await
        .unwrap_err();
    assert_eq!(orphan.kind(), ErrorKind::ConstraintViolation);

    let referenced = db
        .execute(&db.delete(&user).r#where(eq(user.col("id").unwrap(), kyle)))
        .await
        .unwrap_err();
    assert_eq!(referenced.kind(), ErrorKind::ConstraintViolation);

    assert_eq!(db.executor().row_count("user").unwrap(), 1);
    assert_eq!(db.executor().row_count("post").unwrap(), 1);
}

#[tokio::test]
async fn a_failing_row_rolls_back_the_statement() {
    let db = setup().await;
    let user = db.table("user").unwrap();

    let err = db
        .execute(&db.insert(&user).values([
            Record::new().set("name", "A").set("age", 1).set("email", "same@b.com"),
            Record::new().set("name", "B").set("age", 2).set("email", "same@b.com"),
        ]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConstraintViolation);
    assert_eq!(db.executor().row_count("user").unwrap(), 0);
}

#[tokio::test]
async fn invalid_values_never_reach_the_store() {
    let db = setup().await;
    let user = db.table("user").unwrap();
    let base = || Record::new().set("name", "Kyle").set("age", 23).set("email", "a@b.com");

    let role = db
        .execute(&db.insert(&user).values([base().set("userRole", "SUPER")]))
        .await
        .unwrap_err();
    assert_eq!(role.kind(), ErrorKind::Validation);

    let long_name = db
        .execute(&db.insert(&user).values([base().set("name", "x".repeat(256))]))
        .await
        .unwrap_err();
    assert_eq!(long_name.kind(), ErrorKind::Validation);

    let missing_age = db
        .execute(
            &db.insert(&user)
                .values([Record::new().set("name", "Kyle").set("email", "a@b.com")]),
        )
        .await
        .unwrap_err();
    assert_eq!(missing_age.kind(), ErrorKind::Build);

    let unknown = db
        .execute(&db.insert(&user).values([base().set("nickname", "K")]))
        .await
        .unwrap_err();
    assert_eq!(unknown.kind(), ErrorKind::Build);

    let wrong_type = db
        .execute(&db.insert(&user).values([base().set("age", "old")]))
        .await
        .unwrap_err();
    assert_eq!(wrong_type.kind(), ErrorKind::Build);

    let bad_target = db
        .execute(
            &db.insert(&user)
                .values([base()])
                .on_conflict_do_nothing(&[user.col("name").unwrap()]),
        )
        .await
        .unwrap_err();
    assert_eq!(bad_target.kind(), ErrorKind::Build);

    assert_eq!(db.executor().row_count("user").unwrap(), 0);
}

#[tokio::test]
async fn update_and_delete_report_affected_rows() {
    let db = setup().await;
    insert_user(&db, "Sally", 29, "sally@a.com").await;
    insert_user(&db, "Sally", 29, "sally@b.com").await;
    insert_user(&db, "Kyle", 23, "kyle@a.com").await;
    let user = db.table("user").unwrap();
    let name = user.col("name").unwrap();

    let updated = db
        .all(
            &db.update(&user)
                .set(Record::new().set("age", 30).set("userRole", "ADMIN"))
                .r#where(eq(&name, "Sally"))
                .returning([user.col("age").unwrap(), user.col("userRole").unwrap()]),
        )
        .await
        .unwrap();
    assert_eq!(updated.len(), 2);
    assert!(updated.iter().all(|r| r.get("age") == Some(&Value::from(30))));
    assert!(updated.iter().all(|r| r.get("userRole") == Some(&Value::from("ADMIN"))));

    let clash = db
        .execute(
            &db.update(&user)
                .set(Record::new().set("email", "kyle@a.com"))
                .r#where(eq(&name, "Sally")),
        )
        .await
        .unwrap_err();
    assert_eq!(clash.kind(), ErrorKind::ConstraintViolation);

    let deleted = db
        .execute(&db.delete(&user).r#where(eq(&name, "Sally")))
        .await
        .unwrap();
    assert_eq!(deleted, 2);

    let none = db
        .execute(&db.delete(&user).r#where(eq(&name, "Nobody")))
        .await
        .unwrap();
    assert_eq!(none, 0);
    assert_eq!(db.executor().row_count("user").unwrap(), 1);
}

#[tokio::test]
async fn builders_are_reusable_values() {
    let db = setup().await;
    let user = db.table("user").unwrap();
    let base = db.insert(&user).returning([user.col("email").unwrap()]);

    let kyle = base.values([Record::new().set("name", "Kyle").set("age", 23).set("email", "k@b.com")]);
    let sally = base.values([Record::new().set("name", "Sally").set("age", 29).set("email", "s@b.com")]);

    assert_eq!(db.get(&sally).await.unwrap().get("email"), Some(&Value::from("s@b.com")));
    assert_eq!(db.get(&kyle).await.unwrap().get("email"), Some(&Value::from("k@b.com")));
    assert_eq!(db.execute(&base).await.unwrap_err().kind(), ErrorKind::Build);
}

#[tokio::test]
async fn create_is_idempotent() {
    let store = MemoryStore::new();
    let db = Database::new(store.clone(), schema()).with_provider(SeededValues::new(SEED));
    db.create().await.unwrap();
    insert_user(&db, "Kyle", 23, "a@b.com").await;
    db.create().await.unwrap();
    assert_eq!(store.row_count("user").unwrap(), 1);
}
