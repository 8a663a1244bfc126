use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{DbError, Result};

/// One schema step. `apply` must be safe to run against a database that
/// already has the change (databases created before `schema_version` existed).
struct Migration {
    version: u32,
    description: &'static str,
    apply: fn(&Connection) -> rusqlite::Result<()>,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "base tables",
        apply: create_base_tables,
    },
    Migration {
        version: 2,
        description: "users.profile_image",
        apply: add_profile_image,
    },
    Migration {
        version: 3,
        description: "messages.reaction",
        apply: add_reaction,
    },
    Migration {
        version: 4,
        description: "message indexes",
        apply: create_message_indexes,
    },
];

/// Highest schema version this build knows about.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

pub fn run(conn: &mut Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER NOT NULL,
            applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    let current = current_version(conn)?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        info!(
            "Running migration v{} ({})",
            migration.version, migration.description
        );

        let tx = conn.transaction()?;
        (migration.apply)(&tx).map_err(|source| DbError::Migration {
            version: migration.version,
            source,
        })?;
        tx.execute(
            "INSERT INTO schema_version (version) VALUES (?1)",
            [migration.version],
        )?;
        tx.commit()?;
    }

    info!("Database migrations complete (schema v{})", latest_version());
    Ok(())
}

pub fn current_version(conn: &Connection) -> Result<u32> {
    let version = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )?;
    Ok(version)
}

fn create_base_tables(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT UNIQUE NOT NULL,
            email       TEXT UNIQUE NOT NULL,
            password    TEXT NOT NULL,
            created_at  TEXT DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now'))
        );

        CREATE TABLE IF NOT EXISTS messages (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            sender_id    INTEGER NOT NULL REFERENCES users(id),
            receiver_id  INTEGER NOT NULL REFERENCES users(id),
            message      TEXT NOT NULL,
            created_at   TEXT DEFAULT (strftime('%Y-%m-%d %H:%M:%f', 'now')),
            is_read      INTEGER DEFAULT 0
        );
        ",
    )
}

fn add_profile_image(conn: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(conn, "users", "profile_image", "TEXT")
}

fn add_reaction(conn: &Connection) -> rusqlite::Result<()> {
    add_column_if_missing(conn, "messages", "reaction", "TEXT")
}

fn create_message_indexes(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_messages_pair
            ON messages(sender_id, receiver_id, created_at);

        CREATE INDEX IF NOT EXISTS idx_messages_unread
            ON messages(receiver_id, is_read);
        ",
    )
}

fn add_column_if_missing(
    conn: &Connection,
    table: &str,
    column: &str,
    decl: &str,
) -> rusqlite::Result<()> {
    if column_exists(conn, table, column)? {
        debug!("{}.{} already present, skipping ALTER", table, column);
        return Ok(());
    }
    conn.execute_batch(&format!("ALTER TABLE {table} ADD COLUMN {column} {decl};"))
}

fn column_exists(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table})"))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names.iter().any(|name| name == column))
}
