use anyhow::Context;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::enums::text_enum;
use crate::error::ValidationError;
use crate::llm::{ChatRole, HistoryTurn};

/// Most messages a transcript returns.
pub const TRANSCRIPT_LIMIT: i64 = 100;

text_enum! {
    pub enum Sender {
        User => "user",
        Nutritionist => "nutritionist",
    }
}

const MESSAGE_COLUMNS: &str = "id, user_id, content, sender, timestamp, image_url, is_reset";

#[derive(Debug, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub content: String,
    pub sender: String,
    pub timestamp: OffsetDateTime,
    pub image_url: Option<String>,
    pub is_reset: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub content: String,
    pub sender: Sender,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub image_url: Option<String>,
    pub is_reset: bool,
}

impl TryFrom<MessageRow> for Message {
    type Error = ValidationError;

    fn try_from(r: MessageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            content: r.content,
            sender: r.sender.parse()?,
            timestamp: r.timestamp,
            image_url: r.image_url,
            is_reset: r.is_reset,
        })
    }
}

impl Message {
    pub fn as_history(&self) -> HistoryTurn {
        HistoryTurn {
            role: match self.sender {
                Sender::User => ChatRole::User,
                Sender::Nutritionist => ChatRole::Assistant,
            },
            content: self.content.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender: Sender,
    pub content: String,
    pub image_url: Option<String>,
    pub is_reset: bool,
}

impl NewMessage {
    pub fn from_user(content: impl Into<String>, image_url: Option<String>) -> Self {
        Self {
            sender: Sender::User,
            content: content.into(),
            image_url,
            is_reset: false,
        }
    }

    pub fn reply(content: impl Into<String>) -> Self {
        Self {
            sender: Sender::Nutritionist,
            content: content.into(),
            image_url: None,
            is_reset: false,
        }
    }

    pub fn reset_marker(content: impl Into<String>) -> Self {
        Self {
            is_reset: true,
            ..Self::reply(content)
        }
    }
}

pub async fn create(db: &PgPool, user_id: Uuid, m: &NewMessage) -> anyhow::Result<Message> {
    let row = sqlx::query_as::<_, MessageRow>(&format!(
        r#"
        INSERT INTO messages (user_id, content, sender, image_url, is_reset)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {MESSAGE_COLUMNS}
        "#
    ))
    .bind(user_id)
    .bind(&m.content)
    .bind(m.sender.as_str())
    .bind(&m.image_url)
    .bind(m.is_reset)
    .fetch_one(db)
    .await
    .context("insert message")?;
    Ok(Message::try_from(row)?)
}

pub async fn has_any(db: &PgPool, user_id: Uuid) -> anyhow::Result<bool> {
    let found: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM messages WHERE user_id = $1 LIMIT 1")
        .bind(user_id)
        .fetch_optional(db)
        .await
        .context("any message")?;
    Ok(found.is_some())
}

/// The latest `limit` messages from the most recent reset marker on,
/// oldest first. Earlier messages stay stored but are not returned.
pub async fn transcript(db: &PgPool, user_id: Uuid, limit: i64) -> anyhow::Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, MessageRow>(&format!(
        r#"
        SELECT {MESSAGE_COLUMNS}
        FROM (
            SELECT {MESSAGE_COLUMNS}, seq
            FROM messages
            WHERE user_id = $1
              AND seq >= COALESCE(
                  (SELECT MAX(seq) FROM messages WHERE user_id = $1 AND is_reset),
                  0
              )
            ORDER BY seq DESC
            LIMIT $2
        ) recent
        ORDER BY seq ASC
        "#
    ))
    .bind(user_id)
    .bind(limit)
    .fetch_all(db)
    .await
    .context("chat transcript")?;
    Ok(rows
        .into_iter()
        .map(Message::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}
