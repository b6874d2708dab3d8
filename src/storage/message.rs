//! Message storage: the per-player inbox.

use rusqlite::{Connection, params};
use uuid::Uuid;

use crate::model::{Message, MessageKind, MessageParams, PlayerId};

use super::{Result, Storage, StorageError, timestamp};

impl Storage {
    /// A player's messages, oldest first.
    pub fn messages_for_player(&self, player: PlayerId) -> Result<Vec<Message>> {
        messages_for_player(&self.conn, player)
    }

    /// Marks every message of `player` as read. Returns how many changed.
    pub fn mark_messages_viewed(&self, player: PlayerId) -> Result<usize> {
        Ok(self.conn.execute(
            "UPDATE messages SET viewed = 1 WHERE player_id = ?1 AND viewed = 0",
            [player.0],
        )?)
    }
}

pub fn insert_message(conn: &Connection, message: &Message) -> Result<()> {
    conn.execute(
        "INSERT INTO messages (id, player_id, kind, params, created_at, viewed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            message.id.to_string(),
            message.player_id.0,
            message.kind.key(),
            serde_json::to_string(&message.params)?,
            message.created_at.as_second(),
            message.viewed,
        ],
    )?;
    Ok(())
}

pub fn messages_for_player(conn: &Connection, player: PlayerId) -> Result<Vec<Message>> {
    let mut stmt = conn.prepare(
        "SELECT id, kind, params, created_at, viewed FROM messages
         WHERE player_id = ?1 ORDER BY created_at, rowid",
    )?;
    let rows = stmt
        .query_map([player.0], |r| {
            Ok((
                r.get::<_, String>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, i64>(3)?,
                r.get::<_, bool>(4)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(id, kind, params, created_at, viewed)| {
            let id = Uuid::parse_str(&id)
                .map_err(|e| StorageError::Corrupt(format!("invalid message id {id}: {e}")))?;
            let kind: MessageKind = kind.parse().map_err(StorageError::Corrupt)?;
            let params: MessageParams = serde_json::from_str(&params)
                .map_err(|e| StorageError::Corrupt(format!("invalid params on {id}: {e}")))?;
            Ok(Message {
                id,
                player_id: player,
                kind,
                params,
                created_at: timestamp(created_at, "created_at")?,
                viewed,
            })
        })
        .collect()
}
