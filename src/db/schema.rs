// Database schema: the tables rule predicates are written against.
//
// Counters live in separate *_info tables, joined with LEFT JOIN. A row
// without an info row has no reports and no dismissals, which is why the
// predicates wrap every counter in COALESCE.

use anyhow::{Context, Result};
use rusqlite::Connection;

/// Create all tables if they don't exist yet.
///
/// Idempotent, safe to call on every startup.
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- Accounts. status is the AccountStatus code, roles_mask a role value
        CREATE TABLE IF NOT EXISTS users (
            uid TEXT PRIMARY KEY,
            username TEXT NOT NULL,
            biography TEXT,
            img TEXT,
            status INTEGER NOT NULL DEFAULT 0,
            roles_mask INTEGER NOT NULL DEFAULT 0,
            verified INTEGER NOT NULL DEFAULT 0,
            visibility_status TEXT NOT NULL DEFAULT 'normal',
            createdat TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS users_info (
            userid TEXT PRIMARY KEY REFERENCES users(uid),
            reports INTEGER NOT NULL DEFAULT 0,
            dismissals INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS posts (
            postid TEXT PRIMARY KEY,
            userid TEXT NOT NULL REFERENCES users(uid),
            title TEXT NOT NULL,
            mediadescription TEXT,
            media TEXT,
            visibility_status TEXT NOT NULL DEFAULT 'normal',
            createdat TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS post_info (
            postid TEXT PRIMARY KEY REFERENCES posts(postid),
            userid TEXT NOT NULL,
            reports INTEGER NOT NULL DEFAULT 0,
            dismissals INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS comments (
            commentid TEXT PRIMARY KEY,
            postid TEXT NOT NULL REFERENCES posts(postid),
            userid TEXT NOT NULL REFERENCES users(uid),
            content TEXT NOT NULL,
            visibility_status TEXT NOT NULL DEFAULT 'normal',
            createdat TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS comment_info (
            commentid TEXT PRIMARY KEY REFERENCES comments(commentid),
            userid TEXT NOT NULL,
            reports INTEGER NOT NULL DEFAULT 0,
            dismissals INTEGER NOT NULL DEFAULT 0
        );

        -- blockerid does not want to see blockedid
        CREATE TABLE IF NOT EXISTS user_block_user (
            blockerid TEXT NOT NULL,
            blockedid TEXT NOT NULL,
            createdat TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (blockerid, blockedid)
        );

        -- Booked ad slots. Times use SQLite's datetime() text format
        CREATE TABLE IF NOT EXISTS advertisements (
            advertisementid INTEGER PRIMARY KEY AUTOINCREMENT,
            postid TEXT NOT NULL REFERENCES posts(postid),
            timestart TEXT NOT NULL,
            timeend TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_posts_user ON posts(userid);
        CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(postid);
        CREATE INDEX IF NOT EXISTS idx_blocks_blocked ON user_block_user(blockedid);
        CREATE INDEX IF NOT EXISTS idx_ads_post ON advertisements(postid);
        ",
    )
    .context("Failed to create database tables")?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [1],
    )?;

    Ok(())
}

/// Count the number of tables in the database (useful for init confirmation).
pub fn table_count(conn: &Connection) -> Result<i64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
        [],
        |row| row.get(0),
    )?;
    Ok(count)
}
