use crate::error::{DbError, Result};
use crate::models::{ChatUserRow, MessageRow, UserRow};
use crate::Database;
use rusqlite::{Connection, OptionalExtension, Row, params};

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
        profile_image: Option<&str>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, profile_image) VALUES (?1, ?2, ?3, ?4)",
                params![username, email, password_hash, profile_image],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", &username))
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "id", &id))
    }

    /// Everyone except `viewer_id`, for picking a chat partner.
    pub fn list_users_except(&self, viewer_id: i64) -> Result<Vec<ChatUserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, email, profile_image
                 FROM users
                 WHERE id != ?1
                 ORDER BY username COLLATE NOCASE",
            )?;

            let rows = stmt
                .query_map([viewer_id], |row| {
                    Ok(ChatUserRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        email: row.get(2)?,
                        profile_image: row.get(3)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Delete every message the user sent or received, then the user row,
    /// in one transaction. Returns the number of messages removed.
    pub fn delete_user_cascade(&self, user_id: i64) -> Result<usize> {
        self.with_tx(|tx| {
            let messages_deleted = tx.execute(
                "DELETE FROM messages WHERE sender_id = ?1 OR receiver_id = ?1",
                [user_id],
            )?;

            let users_deleted = tx.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
            if users_deleted == 0 {
                return Err(DbError::NotFound(format!("User {}", user_id)));
            }

            Ok(messages_deleted)
        })
    }

    // -- Messages --

    pub fn insert_message(&self, sender_id: i64, receiver_id: i64, body: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO messages (sender_id, receiver_id, message) VALUES (?1, ?2, ?3)",
                params![sender_id, receiver_id, body],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Both directions between two users, oldest first.
    pub fn get_conversation(&self, user_a: i64, user_b: i64) -> Result<Vec<MessageRow>> {
        self.with_conn(|conn| query_conversation(conn, user_a, user_b))
    }

    pub fn get_message(&self, id: i64) -> Result<Option<MessageRow>> {
        self.with_conn(|conn| {
            let row = conn
                .query_row(
                    &format!("{MESSAGE_SELECT} WHERE m.id = ?1"),
                    [id],
                    message_from_row,
                )
                .optional()?;
            Ok(row)
        })
    }

    /// Mark everything `sender_id` sent to `receiver_id` as read.
    /// Returns how many rows flipped.
    pub fn mark_read(&self, sender_id: i64, receiver_id: i64) -> Result<usize> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE sender_id = ?1 AND receiver_id = ?2 AND is_read = 0",
                [sender_id, receiver_id],
            )?;
            Ok(changed)
        })
    }

    pub fn unread_count(&self, receiver_id: i64) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE receiver_id = ?1 AND is_read = 0",
                [receiver_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    // -- Reactions --

    /// Overwrite a message's reaction. `None` clears it.
    pub fn set_reaction(&self, message_id: i64, emoji: Option<&str>) -> Result<()> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE messages SET reaction = ?1 WHERE id = ?2",
                params![emoji, message_id],
            )?;
            if changed == 0 {
                return Err(DbError::NotFound(format!("Message {}", message_id)));
            }
            Ok(())
        })
    }

    /// Clear the reaction if it already equals `emoji`, otherwise set it.
    /// Returns the reaction left on the message.
    pub fn toggle_reaction(&self, message_id: i64, emoji: &str) -> Result<Option<String>> {
        self.with_tx(|tx| {
            let current: Option<String> = tx
                .query_row(
                    "SELECT reaction FROM messages WHERE id = ?1",
                    [message_id],
                    |row| row.get(0),
                )
                .optional()?
                .ok_or_else(|| DbError::NotFound(format!("Message {}", message_id)))?;

            let next = if current.as_deref() == Some(emoji) {
                None
            } else {
                Some(emoji.to_string())
            };

            tx.execute(
                "UPDATE messages SET reaction = ?1 WHERE id = ?2",
                params![next, message_id],
            )?;

            Ok(next)
        })
    }
}

const MESSAGE_SELECT: &str =
    "SELECT m.id, m.sender_id, m.receiver_id, u.username, m.message, m.created_at, m.is_read, m.reaction
     FROM messages m
     JOIN users u ON m.sender_id = u.id";

fn query_user(
    conn: &Connection,
    column: &str,
    value: &dyn rusqlite::ToSql,
) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT id, username, email, password, profile_image, created_at FROM users WHERE {column} = ?1"
    ))?;

    let row = stmt
        .query_row([value], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                email: row.get(2)?,
                password: row.get(3)?,
                profile_image: row.get(4)?,
                created_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
            })
        })
        .optional()?;

    Ok(row)
}

fn query_conversation(conn: &Connection, user_a: i64, user_b: i64) -> Result<Vec<MessageRow>> {
    // JOIN users to fetch sender_username in a single query.
    // id breaks created_at ties so same-millisecond sends keep insertion order.
    let mut stmt = conn.prepare(&format!(
        "{MESSAGE_SELECT}
         WHERE (m.sender_id = ?1 AND m.receiver_id = ?2)
            OR (m.sender_id = ?2 AND m.receiver_id = ?1)
         ORDER BY m.created_at ASC, m.id ASC"
    ))?;

    let rows = stmt
        .query_map([user_a, user_b], message_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<MessageRow> {
    Ok(MessageRow {
        id: row.get(0)?,
        sender_id: row.get(1)?,
        receiver_id: row.get(2)?,
        sender_username: row.get(3)?,
        body: row.get(4)?,
        created_at: row.get::<_, Option<String>>(5)?.unwrap_or_default(),
        is_read: row.get::<_, Option<bool>>(6)?.unwrap_or(false),
        reaction: row.get(7)?,
    })
}
