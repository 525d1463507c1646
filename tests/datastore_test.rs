use rentdb::{DataStore, DbConfig, DbError, ParamType, Value};
use serde::{Deserialize, Serialize};

async fn users_store() -> DataStore {
    let store = DataStore::connect(&DbConfig::sqlite(":memory:"))
        .await
        .expect("connect");
    store
        .run_unparameterized(
            "CREATE TABLE users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL UNIQUE, active INTEGER)",
            &[],
        )
        .await
        .into_result()
        .expect("create users");
    store
}

async fn count_users(store: &DataStore) -> i64 {
    let mut stmt = store
        .prepare("SELECT COUNT(*) AS count FROM users")
        .await
        .unwrap();
    let row = stmt.fetch_one().await.unwrap().expect("count row");
    row.get("count").and_then(Value::as_i64).unwrap()
}

#[tokio::test]
async fn test_insert_then_select_by_last_insert_id() {
    let store = users_store().await;

    let mut insert = store
        .prepare("INSERT INTO users (name) VALUES (:name)")
        .await
        .unwrap();
    insert.bind(":name", "Alice").unwrap();
    assert!(insert.execute().await.unwrap());
    assert_eq!(insert.row_count().unwrap(), 1);

    let id = store.last_insert_id().await.unwrap().expect("generated id");
    assert!(!id.is_empty());

    let mut select = store
        .prepare("SELECT name FROM users WHERE id = :id")
        .await
        .unwrap();
    select
        .bind_typed(":id", Value::from(id.as_str()), ParamType::Int)
        .unwrap();
    let row = select.fetch_one().await.unwrap().expect("row");
    assert_eq!(row.columns(), ["name"]);
    assert_eq!(row.get("name"), Some(&Value::from("Alice")));
}

#[tokio::test]
async fn test_count_on_empty_table_returns_zero_row() {
    let store = users_store().await;
    let mut stmt = store
        .prepare("SELECT COUNT(*) as count FROM users")
        .await
        .unwrap();
    let row = stmt.fetch_one().await.unwrap();
    assert_eq!(row.unwrap().get("count"), Some(&Value::Int(0)));
}

#[tokio::test]
async fn test_bind_infers_bool_and_int_distinctly() {
    let store = users_store().await;
    let mut stmt = store
        .prepare("INSERT INTO users (name, active) VALUES (:name, :active)")
        .await
        .unwrap();
    stmt.bind("name", 0).unwrap();
    stmt.bind(":active", false).unwrap();
    assert_eq!(stmt.bound(":name").unwrap().ty, ParamType::Int);
    assert_eq!(stmt.bound(":name").unwrap().value, Value::Int(0));
    assert_eq!(stmt.bound("active").unwrap().ty, ParamType::Bool);
    assert_eq!(stmt.bound("active").unwrap().value, Value::Bool(false));
    stmt.bind(":active", None::<bool>).unwrap();
    assert_eq!(stmt.bound(":active").unwrap().ty, ParamType::Null);
}

#[tokio::test]
async fn test_fetch_all_preserves_backend_order() {
    let store = users_store().await;
    for name in ["carol", "alice", "bob"] {
        store
            .run_unparameterized("INSERT INTO users (name) VALUES (?)", &[Value::from(name)])
            .await
            .into_result()
            .unwrap();
    }
    let mut stmt = store
        .prepare("SELECT name FROM users ORDER BY name DESC")
        .await
        .unwrap();
    let names: Vec<Value> = stmt
        .fetch_all()
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.get("name").cloned().unwrap())
        .collect();
    assert_eq!(names, vec![Value::from("carol"), Value::from("bob"), Value::from("alice")]);
    assert_eq!(stmt.row_count().unwrap(), 3);
    assert!(stmt.fetch_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_fetch_one_walks_rows_and_rebind_reexecutes() {
    let store = users_store().await;
    store
        .run_best_effort_batch(&[
            "INSERT INTO users (name) VALUES ('a')",
            "INSERT INTO users (name) VALUES ('b')",
        ])
        .await;
    let mut stmt = store
        .prepare("SELECT name FROM users WHERE id >= ? ORDER BY id")
        .await
        .unwrap();
    stmt.bind(1usize, 1).unwrap();
    assert_eq!(stmt.fetch_one().await.unwrap().unwrap().get("name"), Some(&Value::from("a")));
    assert_eq!(stmt.fetch_one().await.unwrap().unwrap().get("name"), Some(&Value::from("b")));
    assert!(stmt.fetch_one().await.unwrap().is_none());

    stmt.bind(1usize, 2).unwrap();
    let rows = stmt.fetch_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("name"), Some(&Value::from("b")));
}

#[tokio::test]
async fn test_empty_query_still_reports_columns() {
    let store = users_store().await;
    let mut stmt = store
        .prepare("SELECT id, name FROM users WHERE name = :name")
        .await
        .unwrap();
    stmt.bind(":name", "nobody").unwrap();
    assert!(stmt.fetch_all().await.unwrap().is_empty());
    assert_eq!(stmt.column_names().unwrap(), ["id", "name"]);
    assert_eq!(stmt.row_count().unwrap(), 0);
}

#[tokio::test]
async fn test_at_and_dollar_markers_bind_by_name() {
    let store = users_store().await;
    store
        .run_unparameterized("INSERT INTO users (name) VALUES (?)", &[Value::from("gina")])
        .await
        .into_result()
        .unwrap();
    for sql in [
        "SELECT name FROM users WHERE name = @name",
        "SELECT name FROM users WHERE name = $name",
    ] {
        let mut stmt = store.prepare(sql).await.unwrap();
        stmt.bind(":name", "gina").unwrap();
        let row = stmt.fetch_one().await.unwrap().expect("row");
        assert_eq!(row.get("name"), Some(&Value::from("gina")));
    }
}

#[tokio::test]
async fn test_row_count_before_execute_is_usage_error() {
    let store = users_store().await;
    let stmt = store.prepare("SELECT * FROM users").await.unwrap();
    assert!(matches!(stmt.row_count(), Err(DbError::Usage(_))));
    assert!(matches!(stmt.column_names(), Err(DbError::Usage(_))));
}

#[tokio::test]
async fn test_prepare_rejects_bad_sql() {
    let store = users_store().await;
    let err = store.prepare("SELEC name FROM users").await.err().unwrap();
    assert!(matches!(err, DbError::Prepare(_)));
    assert!(err.native().unwrap().message.contains("syntax error"));

    let err = store.prepare("SELECT * FROM cars").await.err().unwrap();
    assert!(matches!(err, DbError::Prepare(_)));

    assert!(matches!(store.prepare("  ").await, Err(DbError::Usage(_))));
}

#[tokio::test]
async fn test_constraint_violation_is_execution_error_with_native_code() {
    let store = users_store().await;
    let mut stmt = store
        .prepare("INSERT INTO users (name) VALUES (:name)")
        .await
        .unwrap();
    stmt.bind(":name", "dup").unwrap();
    stmt.execute().await.unwrap();
    let err = stmt.execute().await.unwrap_err();
    assert!(matches!(err, DbError::Execution(_)));
    // primary result code SQLITE_CONSTRAINT
    assert_eq!(err.native_code().map(|c| c & 0xff), Some(19));
}

#[tokio::test]
async fn test_missing_and_unknown_parameters() {
    let store = users_store().await;
    let mut stmt = store
        .prepare("INSERT INTO users (name, active) VALUES (:name, :active)")
        .await
        .unwrap();
    stmt.bind(":name", "x").unwrap();
    assert!(matches!(stmt.execute().await, Err(DbError::Usage(_))));

    stmt.bind(":active", true).unwrap();
    stmt.bind(":nope", 1).unwrap();
    assert!(matches!(stmt.execute().await, Err(DbError::Usage(_))));

    stmt.clear_bindings();
    stmt.bind(":name", "x").unwrap();
    stmt.bind(1usize, true).unwrap();
    assert!(matches!(stmt.execute().await, Err(DbError::Usage(_))));
}

#[tokio::test]
async fn test_best_effort_failure_leaves_connection_usable() {
    let store = users_store().await;
    let attempt = store.run_unparameterized("ALTER TABLE users ADD COLUMN", &[]).await;
    assert!(attempt.is_failed());
    assert!(matches!(attempt.error(), Some(DbError::Prepare(_))));

    let attempt = store
        .run_unparameterized("INSERT INTO users (name) VALUES (?)", &[Value::from("after")])
        .await;
    assert!(attempt.is_completed());
    assert_eq!(attempt.result().unwrap().row_count, 1);
    assert_eq!(count_users(&store).await, 1);
}

#[tokio::test]
async fn test_best_effort_batch_continues_past_existing_column() {
    let store = users_store().await;
    let attempts = store
        .run_best_effort_batch(&[
            "ALTER TABLE users ADD COLUMN name TEXT",
            "ALTER TABLE users ADD COLUMN phone TEXT",
            "INSERT INTO users (name, phone) VALUES ('dan', '555')",
        ])
        .await;
    assert!(attempts[0].is_failed());
    assert!(attempts[1].is_completed());
    assert!(attempts[2].is_completed());
    assert_eq!(count_users(&store).await, 1);
}

#[derive(Serialize)]
struct NewUser<'a> {
    name: &'a str,
    active: bool,
}

#[derive(Debug, Deserialize, PartialEq)]
struct User {
    id: i64,
    name: String,
    active: Option<bool>,
}

#[tokio::test]
async fn test_bind_all_and_typed_fetch() {
    let store = users_store().await;
    let mut insert = store
        .prepare("INSERT INTO users (name, active) VALUES (:name, :active)")
        .await
        .unwrap();
    insert
        .bind_all(&NewUser {
            name: "erin",
            active: true,
        })
        .unwrap();
    insert.execute().await.unwrap();
    insert
        .bind_all(&NewUser {
            name: "frank",
            active: false,
        })
        .unwrap();
    insert.execute().await.unwrap();

    let mut select = store
        .prepare("SELECT id, name, active FROM users WHERE name IN (?, ?) ORDER BY id")
        .await
        .unwrap();
    select.bind_all(&("erin", "frank")).unwrap();
    let users: Vec<User> = select.fetch_all_as().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0].name, "erin");
    assert_eq!(users[0].active, Some(true));
    assert_eq!(users[1].active, Some(false));

    let mut one = store
        .prepare("SELECT id, name, active FROM users WHERE name = :name")
        .await
        .unwrap();
    one.bind(":name", "nobody").unwrap();
    assert_eq!(one.fetch_one_as::<User>().await.unwrap(), None);
}

#[tokio::test]
async fn test_debug_dump_params() {
    let store = users_store().await;
    let mut stmt = store
        .prepare("SELECT * FROM users WHERE id = :id AND name = :name")
        .await
        .unwrap();
    stmt.bind(":id", 5).unwrap().bind(":name", "Alice").unwrap();
    let dump = stmt.debug_dump_params();
    assert!(dump.starts_with("SQL: [51] SELECT * FROM users"));
    assert!(dump.contains("Params: 2"));
    assert!(dump.contains("Key: :id type=int value=5"));
    assert!(dump.contains("Key: :name type=str value='Alice'"));
}

#[tokio::test]
async fn test_last_insert_id_none_before_insert() {
    let store = users_store().await;
    assert_eq!(store.last_insert_id().await.unwrap(), None);
}

#[tokio::test]
async fn test_file_database_persists_across_stores() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rental.db");
    let config = DbConfig::sqlite(path.to_string_lossy().to_string());

    let store = DataStore::connect(&config).await.unwrap();
    store
        .run_best_effort_batch(&[
            "CREATE TABLE cars (id INTEGER PRIMARY KEY, model TEXT)",
            "INSERT INTO cars (model) VALUES ('Yaris')",
        ])
        .await;
    store.close().await.unwrap();

    let store = DataStore::connect(&config).await.unwrap();
    let mut stmt = store.prepare("SELECT model FROM cars").await.unwrap();
    let rows = stmt.fetch_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].get("model"), Some(&Value::from("Yaris")));
}

#[tokio::test]
async fn test_connect_failure_is_connection_error() {
    let config = DbConfig::sqlite("/nonexistent/dir/rental.db");
    let err = DataStore::connect(&config).await.err().unwrap();
    assert!(matches!(err, DbError::Connection(_)));
    assert!(err.native_code().is_some());
}
