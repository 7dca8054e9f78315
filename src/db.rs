use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use tracing::info;

use crate::{config::Config, error::StoreError};

/// Upper bound on concurrent connections; statements beyond this queue.
const MAX_CONNECTIONS: u32 = 10;

/// Embedded relational schema, applied idempotently at startup.
const SCHEMA: &str = include_str!("schema.sql");

/// Builds the bounded connection pool, probes connectivity, and applies the
/// schema. An unreachable store fails here so the process can exit early.
pub async fn connect(config: &Config) -> Result<MySqlPool, StoreError> {
    let opts = MySqlConnectOptions::new()
        .host(&config.mysql_host)
        .port(config.mysql_port)
        .database(&config.mysql_database)
        .username(&config.mysql_user)
        .password(&config.mysql_password);

    info!(
        host = %config.mysql_host,
        port = config.mysql_port,
        database = %config.mysql_database,
        user = %config.mysql_user,
        "Connecting to MySQL"
    );

    let pool = MySqlPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect_with(opts)
        .await?;

    // Acquire-then-release round trip; catches bad credentials and DNS
    // trouble before the server starts accepting requests.
    let conn = pool.acquire().await?;
    drop(conn);
    info!("MySQL connection successful");

    apply_schema(&pool).await?;

    Ok(pool)
}

async fn apply_schema(pool: &MySqlPool) -> Result<(), StoreError> {
    for statement in schema_statements(SCHEMA) {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|source| StoreError::Query {
                action: "apply schema",
                source,
            })?;
    }
    Ok(())
}

// MySQL executes one statement per query; split on terminators and drop
// comment-only fragments.
fn schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}
