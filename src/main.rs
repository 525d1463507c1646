use rentdb::{DataStore, DatabaseType, DbConfig, ParamType, Value};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = if std::env::var("DB_DRIVER").is_ok() || std::env::var("DB_NAME").is_ok() {
        DbConfig::from_env()?
    } else {
        DbConfig::sqlite(":memory:")
    };
    tracing::info!(?config, "connecting");
    let store = DataStore::connect(&config).await?;

    let create = match store.db_type() {
        DatabaseType::MySql => {
            "CREATE TABLE IF NOT EXISTS users (id INT AUTO_INCREMENT PRIMARY KEY, name VARCHAR(255) NOT NULL)"
        }
        DatabaseType::Sqlite => {
            "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL)"
        }
    };
    store.run_unparameterized(create, &[]).await.into_result()?;

    let mut insert = store
        .prepare("INSERT INTO users (name) VALUES (:name)")
        .await?;
    insert.bind(":name", "Alice")?;
    insert.execute().await?;
    let id = store
        .last_insert_id()
        .await?
        .ok_or_else(|| anyhow::anyhow!("insert did not generate an id"))?;

    let mut select = store
        .prepare("SELECT name FROM users WHERE id = :id")
        .await?;
    select.bind_typed(":id", Value::from(id.as_str()), ParamType::Int)?;
    match select.fetch_one().await? {
        Some(row) => println!("user {} -> {:?}", id, row.get("name")),
        None => println!("user {} not found", id),
    }

    store.close().await?;
    Ok(())
}
