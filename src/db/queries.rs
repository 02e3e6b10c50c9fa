// Database queries: listings filtered by rule predicates, redacted rows,
// interaction checks and fixture inserts.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use rusqlite::types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef};
use rusqlite::{params, Connection, Row, ToSql};
use tracing::debug;

use crate::filtering::composer::{self, CombinedPredicate};
use crate::filtering::sql::{SqlPredicate, SqlValue};
use crate::filtering::types::{AccountStatus, ContentType, VisibilityStatus};
use crate::models::{Comment, Moderatable, Post, Profile};
use crate::redact::Redact;
use crate::rules::Rule;

impl ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(match self {
            SqlValue::Integer(i) => ToSqlOutput::from(*i),
            SqlValue::Text(s) => ToSqlOutput::from(s.as_str()),
        })
    }
}

impl ToSql for VisibilityStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

// Unknown stored values load as a status that takes no moderation action,
// so one odd row never fails a whole listing.

impl FromSql for VisibilityStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        Ok(raw.parse().unwrap_or_else(|_| {
            debug!(status = raw, "Unrecognized visibility status, no moderation action");
            VisibilityStatus::Unrecognized
        }))
    }
}

impl FromSql for AccountStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let code = value.as_i64()?;
        Ok(AccountStatus::from_code(code).unwrap_or_else(|| {
            debug!(code, "Unrecognized account status, treating as pending review");
            AccountStatus::PendingReview
        }))
    }
}

/// Execute `sql` with named parameters from the map (stored without the
/// leading colon).
fn query_named<T, F>(conn: &Connection, sql: &str, params: &BTreeMap<String, SqlValue>, map: F) -> Result<Vec<T>>
where
    F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
    let names: Vec<(String, &SqlValue)> = params.iter().map(|(k, v)| (format!(":{k}"), v)).collect();
    let bound: Vec<(&str, &dyn ToSql)> = names
        .iter()
        .map(|(name, value)| (name.as_str(), *value as &dyn ToSql))
        .collect();

    let mut stmt = conn
        .prepare(sql)
        .with_context(|| format!("Failed to prepare query: {sql}"))?;
    let rows = stmt.query_map(bound.as_slice(), map)?;

    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

/// Add a caller filter (not a rule) to a composed predicate.
fn scope(combined: &mut CombinedPredicate, clause: &str, name: &str, value: &str) -> Result<()> {
    combined.and(name, SqlPredicate::new(clause).bind(name, value))?;
    Ok(())
}

fn redact_all<T>(rules: &[Box<dyn Rule>], rows: Vec<T>) -> Vec<T>
where
    T: Moderatable + Redact,
{
    rows.into_iter()
        .map(|row| {
            let pattern = composer::select_replacement(rules, &row.subject());
            row.redacted(pattern)
        })
        .collect()
}

fn profile_from_row(row: &Row<'_>) -> rusqlite::Result<Profile> {
    Ok(Profile {
        uid: row.get(0)?,
        username: row.get(1)?,
        biography: row.get(2)?,
        img: row.get(3)?,
        status: row.get(4)?,
        roles_mask: row.get(5)?,
        verified: row.get(6)?,
        visibility_status: row.get(7)?,
        reports: row.get(8)?,
        dismissals: row.get(9)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        postid: row.get(0)?,
        userid: row.get(1)?,
        title: row.get(2)?,
        media_description: row.get(3)?,
        media: row.get(4)?,
        visibility_status: row.get(5)?,
        reports: row.get(6)?,
        dismissals: row.get(7)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        commentid: row.get(0)?,
        postid: row.get(1)?,
        userid: row.get(2)?,
        content: row.get(3)?,
        visibility_status: row.get(4)?,
        reports: row.get(5)?,
        dismissals: row.get(6)?,
    })
}

/// Profiles visible under `rules`, optionally only one user.
pub fn list_profiles(conn: &Connection, rules: &[Box<dyn Rule>], user_id: Option<&str>) -> Result<Vec<Profile>> {
    let mut combined = composer::combine(rules, ContentType::User)?;
    if let Some(uid) = user_id {
        scope(&mut combined, "u.uid = :filter_user_id", "filter_user_id", uid)?;
    }
    let sql = format!(
        "SELECT u.uid, u.username, u.biography, u.img, u.status, u.roles_mask, u.verified,
                u.visibility_status, COALESCE(ui.reports, 0), COALESCE(ui.dismissals, 0)
         FROM users u
         LEFT JOIN users_info ui ON ui.userid = u.uid
         WHERE {}
         ORDER BY u.createdat DESC, u.uid",
        combined.predicate
    );
    let rows = query_named(conn, &sql, &combined.params, profile_from_row)?;
    debug!(count = rows.len(), "Listed profiles");
    Ok(redact_all(rules, rows))
}

/// Caller-side filters of a post listing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostFilter<'a> {
    pub user_id: Option<&'a str>,
    pub post_id: Option<&'a str>,
    /// Substring match on the title.
    pub title: Option<&'a str>,
}

/// Posts visible under `rules`.
pub fn list_posts(conn: &Connection, rules: &[Box<dyn Rule>], filter: &PostFilter<'_>) -> Result<Vec<Post>> {
    let mut combined = composer::combine(rules, ContentType::Post)?;
    if let Some(uid) = filter.user_id {
        scope(&mut combined, "p.userid = :filter_user_id", "filter_user_id", uid)?;
    }
    if let Some(pid) = filter.post_id {
        scope(&mut combined, "p.postid = :filter_post_id", "filter_post_id", pid)?;
    }
    if let Some(title) = filter.title {
        scope(
            &mut combined,
            "p.title LIKE '%' || :filter_title || '%'",
            "filter_title",
            title,
        )?;
    }
    let sql = format!(
        "SELECT p.postid, p.userid, p.title, p.mediadescription, p.media, p.visibility_status,
                COALESCE(pi.reports, 0), COALESCE(pi.dismissals, 0)
         FROM posts p
         LEFT JOIN post_info pi ON pi.postid = p.postid
         WHERE {}
         ORDER BY p.createdat DESC, p.postid",
        combined.predicate
    );
    let rows = query_named(conn, &sql, &combined.params, post_from_row)?;
    debug!(count = rows.len(), "Listed posts");
    Ok(redact_all(rules, rows))
}

/// Comments on one post visible under `rules`.
pub fn list_comments(conn: &Connection, rules: &[Box<dyn Rule>], post_id: &str) -> Result<Vec<Comment>> {
    let mut combined = composer::combine(rules, ContentType::Comment)?;
    scope(&mut combined, "c.postid = :filter_post_id", "filter_post_id", post_id)?;
    let sql = format!(
        "SELECT c.commentid, c.postid, c.userid, c.content, c.visibility_status,
                COALESCE(ci.reports, 0), COALESCE(ci.dismissals, 0)
         FROM comments c
         LEFT JOIN comment_info ci ON ci.commentid = c.commentid
         WHERE {}
         ORDER BY c.createdat, c.commentid",
        combined.predicate
    );
    let rows = query_named(conn, &sql, &combined.params, comment_from_row)?;
    debug!(count = rows.len(), post_id, "Listed comments");
    Ok(redact_all(rules, rows))
}

/// Whether the interaction guards of `rules` allow acting on `target_id`.
///
/// No guard at all means the interaction is allowed.
pub fn is_interaction_allowed(conn: &Connection, rules: &[Box<dyn Rule>], target_id: &str) -> Result<bool> {
    let Some(guard) = composer::interaction_guard(rules, target_id)? else {
        return Ok(true);
    };
    let sql = format!("SELECT ({})", guard.predicate);
    let allowed = query_named(conn, &sql, &guard.params, |row| row.get::<_, bool>(0))?
        .into_iter()
        .next()
        .unwrap_or(false);
    if !allowed {
        debug!(target_id, "Interaction refused");
    }
    Ok(allowed)
}

// --- Fixture inserts ---

/// Insert a user and its counters row.
pub fn insert_profile(conn: &Connection, profile: &Profile) -> Result<()> {
    conn.execute(
        "INSERT INTO users (uid, username, biography, img, status, roles_mask, verified, visibility_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            profile.uid,
            profile.username,
            profile.biography,
            profile.img,
            profile.status.code(),
            profile.roles_mask,
            profile.verified,
            profile.visibility_status,
        ],
    )
    .with_context(|| format!("Failed to insert user {}", profile.uid))?;
    conn.execute(
        "INSERT INTO users_info (userid, reports, dismissals) VALUES (?1, ?2, ?3)",
        params![profile.uid, profile.reports, profile.dismissals],
    )?;
    Ok(())
}

/// Insert a post and its counters row.
pub fn insert_post(conn: &Connection, post: &Post) -> Result<()> {
    conn.execute(
        "INSERT INTO posts (postid, userid, title, mediadescription, media, visibility_status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            post.postid,
            post.userid,
            post.title,
            post.media_description,
            post.media,
            post.visibility_status,
        ],
    )
    .with_context(|| format!("Failed to insert post {}", post.postid))?;
    conn.execute(
        "INSERT INTO post_info (postid, userid, reports, dismissals) VALUES (?1, ?2, ?3, ?4)",
        params![post.postid, post.userid, post.reports, post.dismissals],
    )?;
    Ok(())
}

/// Insert a comment and its counters row.
pub fn insert_comment(conn: &Connection, comment: &Comment) -> Result<()> {
    conn.execute(
        "INSERT INTO comments (commentid, postid, userid, content, visibility_status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            comment.commentid,
            comment.postid,
            comment.userid,
            comment.content,
            comment.visibility_status,
        ],
    )
    .with_context(|| format!("Failed to insert comment {}", comment.commentid))?;
    conn.execute(
        "INSERT INTO comment_info (commentid, userid, reports, dismissals) VALUES (?1, ?2, ?3, ?4)",
        params![comment.commentid, comment.userid, comment.reports, comment.dismissals],
    )?;
    Ok(())
}

/// Record that `blocker` blocked `blocked`.
pub fn block_user(conn: &Connection, blocker: &str, blocked: &str) -> Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO user_block_user (blockerid, blockedid) VALUES (?1, ?2)",
        params![blocker, blocked],
    )?;
    Ok(())
}

/// Book `post_id` as an advertisement between two datetime() strings.
pub fn insert_advertisement(conn: &Connection, post_id: &str, time_start: &str, time_end: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO advertisements (postid, timestart, timeend) VALUES (?1, ?2, ?3)",
        params![post_id, time_start, time_end],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;
    use crate::filtering::types::roles;

    fn test_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();
        conn
    }

    fn user(uid: &str) -> Profile {
        Profile {
            uid: uid.into(),
            username: format!("{uid}_name"),
            biography: Some("bio".into()),
            img: None,
            status: AccountStatus::Normal,
            roles_mask: roles::USER,
            verified: true,
            visibility_status: VisibilityStatus::Normal,
            reports: 0,
            dismissals: 0,
        }
    }

    #[test]
    fn test_profile_roundtrip_without_rules() {
        let conn = test_db();
        let mut alice = user("alice");
        alice.status = AccountStatus::Locked;
        alice.reports = 2;
        insert_profile(&conn, &alice).unwrap();

        let listed = list_profiles(&conn, &[], None).unwrap();
        assert_eq!(listed, vec![alice]);
    }

    #[test]
    fn test_missing_info_row_counts_as_zero() {
        let conn = test_db();
        conn.execute(
            "INSERT INTO users (uid, username) VALUES ('bare', 'bare')",
            [],
        )
        .unwrap();
        let listed = list_profiles(&conn, &[], Some("bare")).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].reports, 0);
        assert_eq!(listed[0].dismissals, 0);
    }

    #[test]
    fn test_unknown_status_values_still_load() {
        let conn = test_db();
        insert_profile(&conn, &user("alice")).unwrap();
        conn.execute(
            "INSERT INTO users (uid, username, status, visibility_status) VALUES ('odd', 'odd', 42, 'pending')",
            [],
        )
        .unwrap();

        let listed = list_profiles(&conn, &[], None).unwrap();
        assert_eq!(listed.len(), 2);
        let Some(odd) = listed.iter().find(|p| p.uid == "odd") else {
            panic!("odd profile missing");
        };
        assert_eq!(odd.status, AccountStatus::PendingReview);
        assert_eq!(odd.visibility_status, VisibilityStatus::Unrecognized);
    }

    #[test]
    fn test_no_guard_allows_interaction() {
        let conn = test_db();
        assert!(is_interaction_allowed(&conn, &[], "anything").unwrap());
    }
}
