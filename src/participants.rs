//! Who is in the room, and when we last heard from them.
use chrono::{DateTime, Local};
use serde::Serialize;
use sqlx::{QueryBuilder, Sqlite};

use crate::{
    error::{invalid, not_found, AppErr, AppResult},
    messages::{self, Message, JOINED},
    state::Store,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    #[serde(skip)]
    pub id: String,
    pub name: String,
    /// Unix millis of the last heartbeat (or of joining).
    pub last_status: i64,
}

impl Store {
    /// Adds `name` to the room and announces it with a status message.
    pub async fn register(&self, name: Option<&str>, at: &DateTime<Local>) -> AppResult<Participant> {
        let name = match name {
            Some(n) if !n.trim().is_empty() => n,
            _ => return Err(invalid("name is required")),
        };
        if self.find_participant(name).await?.is_some() {
            return Err(taken(name));
        }

        let who = Participant {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            last_status: at.timestamp_millis(),
        };

        let mut tx = self.pool().begin().await?;
        sqlx::query("INSERT INTO participants (id, name, last_status) VALUES (?,?,?)")
            .bind(&who.id)
            .bind(&who.name)
            .bind(who.last_status)
            .execute(&mut *tx)
            .await
            .map_err(|e| match e {
                // lost a race with another registration of the same name
                sqlx::Error::Database(db) if db.is_unique_violation() => taken(name),
                other => AppErr::Db(other),
            })?;
        messages::insert(&mut tx, &Message::status(name, JOINED, at)).await?;
        tx.commit().await?;

        Ok(who)
    }

    pub async fn participants(&self) -> AppResult<Vec<Participant>> {
        let rows: Vec<(String, String, i64)> =
            sqlx::query_as("SELECT id, name, last_status FROM participants ORDER BY rowid")
                .fetch_all(self.pool())
                .await?;
        Ok(rows.into_iter().map(|(id, name, last_status)| Participant { id, name, last_status }).collect())
    }

    pub async fn find_participant(&self, name: &str) -> AppResult<Option<Participant>> {
        let row: Option<(String, String, i64)> =
            sqlx::query_as("SELECT id, name, last_status FROM participants WHERE name = ?")
                .bind(name)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(|(id, name, last_status)| Participant { id, name, last_status }))
    }

    /// Refreshes `last_status` so the sweeper leaves `name` alone.
    pub async fn heartbeat(&self, name: Option<&str>, at: &DateTime<Local>) -> AppResult<()> {
        let name = name.ok_or_else(|| not_found("no user given"))?;
        let done = sqlx::query("UPDATE participants SET last_status = ? WHERE name = ?")
            .bind(at.timestamp_millis())
            .bind(name)
            .execute(self.pool())
            .await?;
        if done.rows_affected() == 0 {
            return Err(not_found(format!("{name} is not in the room")));
        }
        Ok(())
    }

    /// Appends the farewell batch, then drops the given ids, in one transaction.
    pub async fn evict(&self, ids: &[&str], farewells: &[Message]) -> AppResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool().begin().await?;
        messages::insert_many(&mut tx, farewells).await?;

        let mut q = QueryBuilder::<Sqlite>::new("DELETE FROM participants WHERE id IN (");
        let mut list = q.separated(", ");
        for id in ids {
            list.push_bind(*id);
        }
        list.push_unseparated(")");
        q.build().execute(&mut *tx).await?;

        tx.commit().await?;
        Ok(())
    }
}

fn taken(name: &str) -> AppErr {
    AppErr::Conflict(format!("{name} is already in the room"))
}
