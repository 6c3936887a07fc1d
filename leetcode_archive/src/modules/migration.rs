use sqlx::migrate::Migrator;

/// Creates the archive tables; run before any command touches the store.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[cfg(test)]
pub(crate) async fn memory_pool() -> sqlx::Pool<sqlx::sqlite::Sqlite> {
    // A single connection, since every in-memory connection opens its own database.
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    MIGRATOR.run(&pool).await.unwrap();
    pool
}
