//! Database migrations for the measurement store

use sqlx::SqlitePool;

/// Run all migrations. Idempotent; executed at startup.
pub async fn run(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    tracing::info!("Running measurement store migrations...");

    // One row per monitored request
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS function_calls (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            endpoint TEXT NOT NULL,
            execution_time REAL NOT NULL,
            version TEXT NOT NULL,
            group_by TEXT,
            time TIMESTAMP NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One row per endpoint, controlling whether monitoring is active
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS monitor_rules (
            endpoint TEXT PRIMARY KEY,
            monitor BOOLEAN NOT NULL DEFAULT 0,
            time_added TIMESTAMP NOT NULL,
            version_added TEXT NOT NULL,
            last_accessed TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    create_indexes(pool).await?;

    tracing::info!("Measurement store migrations complete");
    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_function_calls_endpoint ON function_calls(endpoint)",
    )
    .execute(pool)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_function_calls_time ON function_calls(time)")
        .execute(pool)
        .await?;

    Ok(())
}
