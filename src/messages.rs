//! Message log: append-only, read back in insertion order.
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use sqlx::SqliteConnection;

use crate::{
    error::{invalid, AppResult},
    state::Store,
};

/// Recipient meaning "everyone in the room".
pub const BROADCAST: &str = "Todos";
pub const JOINED: &str = "entra na sala...";
pub const LEFT: &str = "sai da sala...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Message,
    PrivateMessage,
    Status,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Message        => "message",
            Kind::PrivateMessage => "private_message",
            Kind::Status         => "status",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "message"         => Some(Kind::Message),
            "private_message" => Some(Kind::PrivateMessage),
            "status"          => Some(Kind::Status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub from: String,
    pub to:   String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: Kind,
    pub time: String,
}

impl Message {
    /// Join/leave notice, always addressed to the whole room.
    pub fn status(from: &str, text: &str, at: &DateTime<Local>) -> Self {
        Self {
            from: from.into(),
            to:   BROADCAST.into(),
            text: text.into(),
            kind: Kind::Status,
            time: stamp(at),
        }
    }

    pub fn visible_to(&self, viewer: Option<&str>) -> bool {
        self.kind == Kind::Message
            || viewer.is_some_and(|v| self.to == v || self.from == v)
    }
}

pub fn stamp(at: &DateTime<Local>) -> String {
    at.format("%H:%M:%S").to_string()
}

/// Body of `POST /messages`. Every field is optional here so a missing one
/// becomes a 422 instead of a deserialization rejection.
#[derive(Debug, Default, Deserialize)]
pub struct Draft {
    pub to:   Option<String>,
    pub text: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

impl Draft {
    fn check(&self) -> AppResult<(&str, &str, Kind)> {
        let to   = required(self.to.as_deref(), "to")?;
        let text = required(self.text.as_deref(), "text")?;
        let kind = match self.kind.as_deref().and_then(Kind::parse) {
            Some(k @ (Kind::Message | Kind::PrivateMessage)) => k,
            _ => return Err(invalid("type must be message or private_message")),
        };
        Ok((to, text, kind))
    }
}

fn required<'a>(v: Option<&'a str>, field: &str) -> AppResult<&'a str> {
    match v {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(invalid(format!("{field} is required"))),
    }
}

/// A positive integer trims the result, anything else means "no limit".
pub fn parse_limit(raw: Option<&str>) -> Option<usize> {
    raw?.trim()
        .parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
}

/// Visibility filter first, then keep the newest `limit`.
pub fn visible(all: Vec<Message>, viewer: Option<&str>, limit: Option<usize>) -> Vec<Message> {
    let mut out: Vec<Message> = all.into_iter().filter(|m| m.visible_to(viewer)).collect();
    if let Some(n) = limit {
        let cut = out.len().saturating_sub(n);
        out.drain(..cut);
    }
    out
}

pub(crate) async fn insert(conn: &mut SqliteConnection, m: &Message) -> AppResult<()> {
    sqlx::query("INSERT INTO messages (from_name, to_name, text, kind, time) VALUES (?,?,?,?,?)")
        .bind(&m.from)
        .bind(&m.to)
        .bind(&m.text)
        .bind(m.kind.as_str())
        .bind(&m.time)
        .execute(conn)
        .await?;
    Ok(())
}

pub(crate) async fn insert_many(conn: &mut SqliteConnection, batch: &[Message]) -> AppResult<()> {
    for m in batch {
        insert(&mut *conn, m).await?;
    }
    Ok(())
}

impl Store {
    /// Stores a chat line from `from`. The sender must currently be in the room.
    pub async fn post_message(
        &self,
        from: Option<&str>,
        draft: &Draft,
        at: &DateTime<Local>,
    ) -> AppResult<Message> {
        let (to, text, kind) = draft.check()?;
        let from = from.ok_or_else(|| invalid("user header is required"))?;
        if self.find_participant(from).await?.is_none() {
            return Err(invalid(format!("{from} is not in the room")));
        }

        let msg = Message { from: from.into(), to: to.into(), text: text.into(), kind, time: stamp(at) };
        let mut conn = self.pool().acquire().await?;
        insert(&mut conn, &msg).await?;
        Ok(msg)
    }

    pub async fn all_messages(&self) -> AppResult<Vec<Message>> {
        let rows: Vec<(String, String, String, String, String)> = sqlx::query_as(
            "SELECT from_name, to_name, text, kind, time FROM messages ORDER BY seq",
        )
        .fetch_all(self.pool())
        .await?;

        rows.into_iter()
            .map(|(from, to, text, kind, time)| -> AppResult<Message> {
                let kind = Kind::parse(&kind)
                    .ok_or_else(|| sqlx::Error::Decode(format!("unknown message kind {kind:?}").into()))?;
                Ok(Message { from, to, text, kind, time })
            })
            .collect()
    }

    pub async fn messages_for(&self, viewer: Option<&str>, limit: Option<usize>) -> AppResult<Vec<Message>> {
        Ok(visible(self.all_messages().await?, viewer, limit))
    }
}
