use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

use crate::error::AppResult;

/* ------------ shared store handle ------------
 * One per process. Request handlers get it through an `Extension`,
 * the sweeper gets its own clone. Every read goes to the database.
 */
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

const SCHEMA: [&str; 2] = [
    "CREATE TABLE IF NOT EXISTS participants (
        id          TEXT PRIMARY KEY,
        name        TEXT NOT NULL UNIQUE,
        last_status INTEGER NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS messages (
        seq       INTEGER PRIMARY KEY AUTOINCREMENT,
        from_name TEXT NOT NULL,
        to_name   TEXT NOT NULL,
        text      TEXT NOT NULL,
        kind      TEXT NOT NULL,
        time      TEXT NOT NULL
    )",
];

impl Store {
    /// Connects and makes sure both tables exist.
    pub async fn open(url: &str) -> AppResult<Self> {
        let pool = if url.contains(":memory:") {
            // each connection would get its own empty database
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await?
        } else {
            SqlitePool::connect(url).await?
        };
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    pub async fn init(&self) -> AppResult<()> {
        for ddl in SCHEMA {
            sqlx::query(ddl).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
pub(crate) async fn test_store() -> Store {
    Store::open("sqlite::memory:").await.unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn init_is_repeatable() {
        let store = test_store().await;
        store.init().await.unwrap();
        let (n,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN ('participants','messages')",
        )
        .fetch_one(store.pool())
        .await
        .unwrap();
        assert_eq!(n, 2);
    }
}
