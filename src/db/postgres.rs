use sqlx::{postgres::PgPoolOptions, PgPool};

/// Creates the PostgreSQL connection pool
///
/// Both the server and the import tool go through this pool. Connections
/// are reused and capped; sqlx manages their lifecycle.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies any pending migrations from the embedded `migrations/` directory
///
/// Runs at server and importer startup, so a fresh database needs no manual
/// schema setup.
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
