use crate::common::{insert_category, insert_post, insert_user, link, setup};
use serde_json::json;
use sqlweave::core::ErrorKind;
use sqlweave::core::query::compile;
use sqlweave::prelude::*;

#[tokio::test]
async fn find_many_with_preferences() {
    let db = setup().await;
    let u1 = insert_user(&db, "Kyle", 23, "a@b.com").await;

    let prefs = db.table("userPreferences").unwrap();
    let p1: uuid::Uuid = db
        .get(
            &db.insert(&prefs)
                .values([Record::new().set("userId", u1).set("emailUpdates", true)])
                .returning([prefs.col("id").unwrap()]),
        )
        .await
        .unwrap()
        .try_get("id")
        .unwrap();

    let user = db.table("user").unwrap();
    let users = db
        .query(&user)
        .find_many(
            &FindOptions::new()
                .columns([("name", true), ("id", true)])
                .with("preferences", Shape::new()),
        )
        .await
        .unwrap();

    let expected = json!([{
        "id": u1.to_string(),
        "name": "Kyle",
        "preferences": {
            "id": p1.to_string(),
            "emailUpdates": true,
            "userId": u1.to_string(),
        },
    }]);
    let actual = serde_json::to_value(&users).unwrap();
    assert_eq!(actual, expected);

    // columns come back in declaration order, not request order
    let fields: Vec<&str> = users[0].fields.keys().map(String::as_str).collect();
    assert_eq!(fields, ["id", "name"]);
}

#[tokio::test]
async fn missing_one_relation_is_null() {
    let db = setup().await;
    insert_user(&db, "Kyle", 23, "a@b.com").await;

    let user = db.table("user").unwrap();
    let users = db
        .query(&user)
        .find_many(&FindOptions::new().with("preferences", Shape::new()))
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert!(users[0].one("preferences").is_none());
    assert_eq!(users[0].to_json()["preferences"], serde_json::Value::Null);
}

#[tokio::test]
async fn zero_children_is_an_empty_list() {
    let db = setup().await;
    let kyle = insert_user(&db, "Kyle", 23, "kyle@b.com").await;
    insert_user(&db, "Sally", 29, "sally@b.com").await;
    insert_post(&db, kyle, "First").await;
    insert_post(&db, kyle, "Second").await;

    let user = db.table("user").unwrap();
    let users = db
        .query(&user)
        .find_many(
            &FindOptions::new()
                .columns([("name", true)])
                .with("posts", Shape::new().columns([("title", true)]))
                .order_by([asc(user.col("name").unwrap())]),
        )
        .await
        .unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].get("name"), Some(&Value::from("Kyle")));
    let mut titles: Vec<&Value> = users[0]
        .many("posts")
        .iter()
        .filter_map(|p| p.get("title"))
        .collect();
    titles.sort_by_key(|v| v.to_string());
    assert_eq!(titles, [&Value::from("First"), &Value::from("Second")]);

    assert_eq!(users[1].get("name"), Some(&Value::from("Sally")));
    assert_eq!(users[1].to_json()["posts"], json!([]));
}

#[tokio::test]
async fn many_to_many_through_the_junction() {
    let db = setup().await;
    let kyle = insert_user(&db, "Kyle", 23, "kyle@b.com").await;
    let post = insert_post(&db, kyle, "Rust").await;
    insert_post(&db, kyle, "Nothing").await;
    let lang = insert_category(&db, "languages").await;
    let sys = insert_category(&db, "systems").await;
    link(&db, post, lang).await;
    link(&db, post, sys).await;

    let posts = db.table("post").unwrap();
    let found = db
        .query(&posts)
        .find_many(
            &FindOptions::new()
                .columns([("title", true)])
                .with("categories", Shape::new().columns([("name", true)]))
                .with("author", Shape::new().columns([("name", true)]))
                .order_by([asc(posts.col("title").unwrap())]),
        )
        .await
        .unwrap();

    assert_eq!(found.len(), 2);
    assert_eq!(found[0].get("title"), Some(&Value::from("Nothing")));
    assert!(found[0].many("categories").is_empty());

    let mut names: Vec<String> = found[1]
        .many("categories")
        .iter()
        .map(|c| c.try_get::<String>("name").unwrap())
        .collect();
    names.sort();
    assert_eq!(names, ["languages", "systems"]);

    for row in &found {
        let author = row.one("author").expect("every post has an author");
        assert_eq!(author.get("name"), Some(&Value::from("Kyle")));
    }
}

#[tokio::test]
async fn nested_relations_go_deeper() {
    let db = setup().await;
    let kyle = insert_user(&db, "Kyle", 23, "kyle@b.com").await;
    let post = insert_post(&db, kyle, "Rust").await;
    let cat = insert_category(&db, "languages").await;
    link(&db, post, cat).await;

    let user = db.table("user").unwrap();
    let users = db
        .query(&user)
        .find_many(&FindOptions::new().columns([("name", true)]).with(
            "posts",
            Shape::new()
                .columns([("title", true)])
                .with("categories", Shape::new().columns([("name", true)])),
        ))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&users).unwrap(),
        json!([{ "name": "Kyle", "posts": [{ "title": "Rust", "categories": [{ "name": "languages" }] }] }])
    );
}

#[tokio::test]
async fn limit_counts_root_rows_only() {
    let db = setup().await;
    let kyle = insert_user(&db, "Kyle", 23, "kyle@b.com").await;
    let sally = insert_user(&db, "Sally", 29, "sally@b.com").await;
    for title in ["a", "b", "c"] {
        insert_post(&db, kyle, title).await;
    }
    insert_post(&db, sally, "d").await;

    let user = db.table("user").unwrap();
    let options = FindOptions::new()
        .with("posts", Shape::new())
        .order_by([asc(user.col("name").unwrap())])
        .limit(1);
    let users = db.query(&user).find_many(&options).await.unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].get("name"), Some(&Value::from("Kyle")));
    assert_eq!(users[0].many("posts").len(), 3);

    let second = db.query(&user).find_many(&options.clone().offset(1)).await.unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].get("name"), Some(&Value::from("Sally")));
    assert_eq!(second[0].many("posts").len(), 1);
}

#[tokio::test]
async fn find_first_filters_the_root() {
    let db = setup().await;
    insert_user(&db, "Kyle", 23, "kyle@b.com").await;
    insert_user(&db, "Sally", 29, "sally@b.com").await;

    let user = db.table("user").unwrap();
    let sally = db
        .query(&user)
        .find_first(&FindOptions::new().r#where(eq(user.col("age").unwrap(), 29)))
        .await
        .unwrap()
        .expect("Sally is 29");
    assert_eq!(sally.get("name"), Some(&Value::from("Sally")));
    assert_eq!(sally.get("userRole"), Some(&Value::from("BASIC")));

    let nobody = db
        .query(&user)
        .find_first(&FindOptions::new().r#where(gt(user.col("age").unwrap(), 90)))
        .await
        .unwrap();
    assert!(nobody.is_none());
}

#[tokio::test]
async fn excluded_primary_key_still_groups_rows() {
    let db = setup().await;
    let kyle = insert_user(&db, "Kyle", 23, "kyle@b.com").await;
    insert_post(&db, kyle, "a").await;
    insert_post(&db, kyle, "b").await;

    let user = db.table("user").unwrap();
    let users = db
        .query(&user)
        .find_many(
            &FindOptions::new()
                .columns([("id", false), ("email", false)])
                .with("posts", Shape::new().columns([("id", false)])),
        )
        .await
        .unwrap();

    assert_eq!(users.len(), 1);
    assert!(users[0].get("id").is_none());
    assert!(users[0].get("email").is_none());
    assert_eq!(users[0].get("age"), Some(&Value::from(23)));
    assert_eq!(users[0].many("posts").len(), 2);
    assert!(users[0].many("posts").iter().all(|p| p.get("id").is_none()));
}

#[tokio::test]
async fn reshaping_is_deterministic() {
    let db = setup().await;
    let kyle = insert_user(&db, "Kyle", 23, "kyle@b.com").await;
    insert_user(&db, "Sally", 29, "sally@b.com").await;
    insert_post(&db, kyle, "a").await;
    insert_post(&db, kyle, "b").await;

    let user = db.table("user").unwrap();
    let options = FindOptions::new().with("posts", Shape::new()).with("preferences", Shape::new());
    let compiled = compile(&user, &options).unwrap();
    let rows = db.all(&compiled).await.unwrap();

    let first = compiled.reshape(&rows);
    let second = compiled.reshape(&rows);
    assert_eq!(first, second);

    let recompiled = compile(&user, &options).unwrap();
    assert_eq!(recompiled.plan(), compiled.plan());
    assert_eq!(recompiled.reshape(&rows), first);
    assert_eq!(db.query(&user).find_many(&options).await.unwrap(), first);
}

#[tokio::test]
async fn invalid_requests_fail_before_the_store() {
    let db = setup().await;
    let user = db.table("user").unwrap();

    let unknown_relation = db
        .query(&user)
        .find_many(&FindOptions::new().with("comments", Shape::new()))
        .await
        .unwrap_err();
    assert_eq!(unknown_relation.kind(), ErrorKind::Build);

    let unknown_column = db
        .query(&user)
        .find_many(&FindOptions::new().columns([("nickname", true)]))
        .await
        .unwrap_err();
    assert_eq!(unknown_column.kind(), ErrorKind::Build);

    let conflicting = db
        .query(&user)
        .find_many(&FindOptions::new().columns([("name", true), ("name", false)]))
        .await
        .unwrap_err();
    assert_eq!(conflicting.kind(), ErrorKind::Build);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_reads_share_one_database() {
    let db = setup().await;
    let kyle = insert_user(&db, "Kyle", 23, "kyle@b.com").await;
    insert_post(&db, kyle, "a").await;

    let user = db.table("user").unwrap();
    let options = FindOptions::new().with("posts", Shape::new());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let db = db.clone();
            let user = user.clone();
            let options = options.clone();
            tokio::spawn(async move { db.query(&user).find_many(&options).await })
        })
        .collect();

    let expected = db.query(&user).find_many(&options).await.unwrap();
    for handle in handles {
        assert_eq!(handle.await.unwrap().unwrap(), expected);
    }
}
