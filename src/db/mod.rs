pub mod models;
pub mod reader;
pub mod writer;

pub use reader::OddsReader;
pub use writer::OddsRecorder;

/// Fresh in-memory store with migrations applied. One connection, so every
/// query sees the same database.
#[cfg(test)]
pub async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("migrations apply");
    pool
}
