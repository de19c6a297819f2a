use crate::common::{insert_post, insert_user, setup};
use sqlweave::core::ErrorKind;
use sqlweave::memory::MemoryStore;
use sqlweave::prelude::*;

async fn people() -> Database<MemoryStore> {
    let db = setup().await;
    insert_user(&db, "Sally", 29, "sally@a.com").await;
    insert_user(&db, "Sally", 29, "sally@b.com").await;
    insert_user(&db, "Kyle", 23, "kyle@a.com").await;
    insert_user(&db, "Bob", 29, "bob@a.com").await;
    db
}

#[tokio::test]
async fn having_keeps_only_repeated_names() {
    let db = people().await;
    let user = db.table("user").unwrap();
    let prefs = db.table("userPreferences").unwrap();
    let name = user.col("name").unwrap();

    let grouped = db
        .select([name.expr().alias("name"), count(&name).alias("count")])
        .from(&user)
        .r#where(eq(user.col("age").unwrap(), 29))
        .left_join(&prefs, eq(prefs.col("userId").unwrap(), user.col("id").unwrap()));

    let rows = db
        .all(&grouped.having(gt(grouped.field("count").unwrap(), 1)))
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::from("Sally")));
    assert_eq!(rows[0].get("count"), Some(&Value::from(2)));

    // without the having clause Bob's single row shows up too
    let all = db
        .all(&grouped.order_by([asc(name.clone())]))
        .await
        .unwrap();
    let counts: Vec<(String, i64)> = all
        .iter()
        .map(|r| (r.try_get("name").unwrap(), r.try_get("count").unwrap()))
        .collect();
    assert_eq!(counts, [("Bob".to_string(), 1), ("Sally".to_string(), 2)]);
}

#[tokio::test]
async fn aggregates_over_the_whole_table() {
    let db = people().await;
    let user = db.table("user").unwrap();
    let age = user.col("age").unwrap();

    let row = db
        .get(
            &db.select([
                count_all().alias("n"),
                sum(&age).alias("total"),
                avg(&age).alias("mean"),
                min(&age).alias("youngest"),
                max(&age).alias("oldest"),
                count_distinct(&age).alias("ages"),
            ])
            .from(&user),
        )
        .await
        .unwrap();

    assert_eq!(row.get("n"), Some(&Value::from(4)));
    assert_eq!(row.get("total"), Some(&Value::from(110)));
    assert_eq!(row.get("mean"), Some(&Value::from(27.5)));
    assert_eq!(row.get("youngest"), Some(&Value::from(23)));
    assert_eq!(row.get("oldest"), Some(&Value::from(29)));
    assert_eq!(row.get("ages"), Some(&Value::from(2)));
}

#[tokio::test]
async fn distinct_order_limit_offset() {
    let db = people().await;
    let user = db.table("user").unwrap();
    let age = user.col("age").unwrap();

    let ages = db
        .all(&db.select_distinct([&age]).from(&user).order_by([desc(&age)]))
        .await
        .unwrap();
    let ages: Vec<i64> = ages.iter().map(|r| r.try_get("age").unwrap()).collect();
    assert_eq!(ages, [29, 23]);

    let name = user.col("name").unwrap();
    let page = db
        .all(
            &db.select([&name])
                .from(&user)
                .order_by([asc(&name), asc(user.col("email").unwrap())])
                .limit(2)
                .offset(1),
        )
        .await
        .unwrap();
    let names: Vec<String> = page.iter().map(|r| r.try_get("name").unwrap()).collect();
    assert_eq!(names, ["Kyle", "Sally"]);
}

#[tokio::test]
async fn conditions_filter_rows() {
    let db = people().await;
    let user = db.table("user").unwrap();
    let name = user.col("name").unwrap();
    let email = user.col("email").unwrap();

    let count_where = |condition: Condition| {
        let query = db.select([count_all().alias("n")]).from(&user).r#where(condition);
        let db = &db;
        async move {
            db.get(&query)
                .await
                .unwrap()
                .try_get::<i64>("n")
                .unwrap()
        }
    };

    assert_eq!(count_where(like(&name, "S%")).await, 2);
    assert_eq!(count_where(like(&name, "_ob")).await, 1);
    assert_eq!(count_where(in_array(&email, ["kyle@a.com", "bob@a.com"])).await, 2);
    assert_eq!(count_where(not_in_array(&email, ["kyle@a.com"])).await, 3);
    assert_eq!(
        count_where(and([eq(&name, "Sally"), neq(&email, "sally@a.com")])).await,
        1
    );
    assert_eq!(count_where(or([lt(user.col("age").unwrap(), 25), eq(&name, "Bob")])).await, 2);
    assert_eq!(count_where(not(eq(&name, "Sally"))).await, 2);
    assert_eq!(count_where(is_null(&name)).await, 0);
    assert_eq!(count_where(is_not_null(user.col("userRole").unwrap())).await, 4);
}

#[tokio::test]
async fn joins_pair_rows() {
    let db = setup().await;
    let kyle = insert_user(&db, "Kyle", 23, "kyle@b.com").await;
    insert_user(&db, "Sally", 29, "sally@b.com").await;
    insert_post(&db, kyle, "Hello").await;

    let user = db.table("user").unwrap();
    let post = db.table("post").unwrap();
    let on = eq(post.col("authorId").unwrap(), user.col("id").unwrap());

    let inner = db
        .all(
            &db.select([
                post.col("title").unwrap().expr().alias("title"),
                user.col("name").unwrap().expr().alias("author"),
            ])
            .from(&post)
            .inner_join(&user, on.clone()),
        )
        .await
        .unwrap();
    assert_eq!(inner.len(), 1);
    assert_eq!(inner[0].get("author"), Some(&Value::from("Kyle")));

    let left = db
        .all(
            &db.select_all()
                .from(&user)
                .left_join(&post, on)
                .order_by([asc(user.col("name").unwrap())]),
        )
        .await
        .unwrap();
    assert_eq!(left.len(), 2);
    assert_eq!(left[0].get("post.title"), Some(&Value::from("Hello")));
    assert_eq!(left[1].get("name"), Some(&Value::from("Sally")));
    assert_eq!(left[1].get("post.title"), Some(&Value::Null));
}

#[tokio::test]
async fn get_reports_not_found() {
    let db = setup().await;
    let user = db.table("user").unwrap();
    let err = db
        .get(&db.select_all().from(&user))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn malformed_selects_are_build_errors() {
    let db = people().await;
    let user = db.table("user").unwrap();
    let post = db.table("post").unwrap();

    // post is never joined
    let out_of_scope = db
        .all(&db.select([post.col("title").unwrap()]).from(&user))
        .await
        .unwrap_err();
    assert_eq!(out_of_scope.kind(), ErrorKind::Build);

    // a name compared with a number
    let incompatible = db
        .all(&db.select_all().from(&user).r#where(eq(user.col("name").unwrap(), 3)))
        .await
        .unwrap_err();
    assert_eq!(incompatible.kind(), ErrorKind::Build);

    // plain column outside the explicit grouping key
    let ungrouped = db
        .all(
            &db.select([user.col("name").unwrap().expr().alias("name"), count_all().alias("n")])
                .from(&user)
                .group_by([user.col("age").unwrap()]),
        )
        .await
        .unwrap_err();
    assert_eq!(ungrouped.kind(), ErrorKind::Build);
}
