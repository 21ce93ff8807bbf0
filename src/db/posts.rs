// Post store - owns all SQL against the posts table
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::params;

use crate::db::models::{Post, PostMeta};
use crate::error::AppResult;
use crate::state::DbPool;

/// Persist a new post and return it as stored.
///
/// The creation timestamp is assigned by SQLite and re-read by id so
/// the value returned here matches what `list_recent` will serve
/// later. If the re-read fails, the current time stands in.
pub fn insert(pool: &DbPool, story: &str, feeling: &str, meta: &PostMeta) -> AppResult<Post> {
    let conn = pool.get()?;

    conn.execute(
        "INSERT INTO posts (story, feeling, raw_ip, ip_hash, user_agent, accept_lang,
                            referer, client_tz, client_lang, screen, platform)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            story,
            feeling,
            meta.raw_ip,
            meta.ip_hash,
            meta.user_agent,
            meta.accept_lang,
            meta.referer,
            meta.client_tz,
            meta.client_lang,
            meta.screen,
            meta.platform,
        ],
    )?;
    let id = conn.last_insert_rowid();

    let created_at = match conn.query_row(
        "SELECT created_at FROM posts WHERE id = ?1",
        params![id],
        |row| row.get::<_, String>(0),
    ) {
        Ok(raw) => parse_created_at(&raw).unwrap_or_else(|_| Utc::now()),
        Err(e) => {
            tracing::warn!("could not re-read created_at for post {}: {}", id, e);
            Utc::now()
        }
    };

    Ok(Post {
        id,
        story: story.to_string(),
        feeling: feeling.to_string(),
        created_at,
    })
}

/// The most recent posts, newest first. Only public columns are
/// selected; metadata stays in the database.
pub fn list_recent(pool: &DbPool, limit: i64) -> AppResult<Vec<Post>> {
    let conn = pool.get()?;

    let mut stmt = conn.prepare(
        "SELECT id, story, feeling, created_at
         FROM posts
         ORDER BY datetime(created_at) DESC, id DESC
         LIMIT ?1",
    )?;

    let posts = stmt
        .query_map(params![limit], |row| {
            let raw: String = row.get(3)?;
            let created_at = parse_created_at(&raw).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    3,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?;
            Ok(Post {
                id: row.get(0)?,
                story: row.get(1)?,
                feeling: row.get(2)?,
                created_at,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(posts)
}

/// SQLite's datetime('now') format, which is always UTC.
fn parse_created_at(raw: &str) -> chrono::ParseResult<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc())
}
