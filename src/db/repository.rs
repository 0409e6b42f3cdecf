use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use tokio_rusqlite::Connection;

use crate::error::Result;
use crate::models::{
    Article, Comment, CommentAnalysis, Coordinates, GuestUser, NewArticle, NewComment,
    ReadingHistoryItem, SourceType, VoteCounts, VoteType,
};

use super::schema::SCHEMA;

const ARTICLE_COLUMNS: &str = "a.id, a.external_id, a.title, a.description, a.content, a.source, \
     a.source_type, a.political_score, a.published_at, a.url, a.image_url, a.ai_summary, \
     a.location_name, a.location_lat, a.location_lng, a.created_at";

const COMMENT_COLUMNS: &str = "c.id, c.article_id, c.user_id, g.guest_id, c.parent_id, c.content, \
     c.created_at, c.updated_at, c.ai_summary, c.political_score, c.is_deleted";

/// Handle to the application store.
///
/// Cloning is cheap and every clone talks to the same connection, so
/// background tasks can hold their own copy.
#[derive(Clone)]
pub struct Repository {
    conn: Connection,
}

impl Repository {
    pub async fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path).await?;
        Self::init(conn).await
    }

    #[cfg(test)]
    pub async fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().await?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self> {
        conn.call(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    // Guest user operations

    pub async fn register_guest_user(&self, guest_id: &str) -> Result<GuestUser> {
        let guest_id = guest_id.to_string();
        let now = timestamp(&Utc::now());
        let user = self
            .conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO guest_users (guest_id, created_at) VALUES (?1, ?2) ON CONFLICT(guest_id) DO NOTHING",
                    params![guest_id, now],
                )?;
                let user = conn.query_row(
                    "SELECT id, guest_id, created_at, last_active_at FROM guest_users WHERE guest_id = ?1",
                    params![guest_id],
                    guest_user_from_row,
                )?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    pub async fn get_guest_user(&self, guest_id: &str) -> Result<Option<GuestUser>> {
        let guest_id = guest_id.to_string();
        let user = self
            .conn
            .call(move |conn| {
                let user = conn
                    .query_row(
                        "SELECT id, guest_id, created_at, last_active_at FROM guest_users WHERE guest_id = ?1",
                        params![guest_id],
                        guest_user_from_row,
                    )
                    .optional()?;
                Ok(user)
            })
            .await?;
        Ok(user)
    }

    pub async fn touch_guest_user(&self, user_id: i64) -> Result<()> {
        let now = timestamp(&Utc::now());
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE guest_users SET last_active_at = ?1 WHERE id = ?2",
                    params![now, user_id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Article operations

    /// Insert a newly ingested article, deriving its source type from the score.
    pub async fn insert_article(
        &self,
        article: NewArticle,
        political_score: Option<f64>,
    ) -> Result<i64> {
        let source_type = political_score
            .map(SourceType::from_score)
            .unwrap_or(SourceType::Center);
        let now = timestamp(&Utc::now());
        let id = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO articles (external_id, title, description, content, source, source_type,
                                             political_score, published_at, url, image_url, created_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"#,
                    params![
                        article.external_id,
                        article.title,
                        article.description,
                        article.content,
                        article.source,
                        source_type.as_str(),
                        political_score,
                        article.published_at.as_ref().map(timestamp),
                        article.url,
                        article.image_url,
                        now,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        Ok(id)
    }

    pub async fn get_article(&self, id: i64) -> Result<Option<Article>> {
        let article = self
            .conn
            .call(move |conn| {
                let sql = format!("SELECT {} FROM articles a WHERE a.id = ?1", ARTICLE_COLUMNS);
                let article = conn
                    .query_row(&sql, params![id], |row| article_from_row(row, 0))
                    .optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    pub async fn get_article_by_external_id(&self, external_id: &str) -> Result<Option<Article>> {
        let external_id = external_id.to_string();
        let article = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    "SELECT {} FROM articles a WHERE a.external_id = ?1",
                    ARTICLE_COLUMNS
                );
                let article = conn
                    .query_row(&sql, params![external_id], |row| article_from_row(row, 0))
                    .optional()?;
                Ok(article)
            })
            .await?;
        Ok(article)
    }

    pub async fn get_articles(&self, limit: usize, offset: usize) -> Result<Vec<Article>> {
        self.search_articles("", None, limit, offset).await
    }

    /// Case-insensitive substring search over title and description.
    pub async fn search_articles(
        &self,
        query: &str,
        from: Option<DateTime<Utc>>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Article>> {
        let pattern = format!("%{}%", escape_like(query));
        let query = query.to_string();
        let from = from.as_ref().map(timestamp);
        let (limit, offset) = (limit as i64, offset as i64);
        let articles = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    r#"SELECT {} FROM articles a
                       WHERE (?1 = '' OR a.title LIKE ?2 ESCAPE '\' OR a.description LIKE ?2 ESCAPE '\')
                         AND (?3 IS NULL OR a.published_at >= ?3)
                       ORDER BY a.published_at DESC NULLS LAST, a.id DESC
                       LIMIT ?4 OFFSET ?5"#,
                    ARTICLE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let articles = stmt
                    .query_map(params![query, pattern, from, limit, offset], |row| {
                        article_from_row(row, 0)
                    })?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    /// Store a score together with the source type it implies.
    pub async fn set_political_score(&self, id: i64, score: f64) -> Result<()> {
        let source_type = SourceType::from_score(score);
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET political_score = ?1, source_type = ?2 WHERE id = ?3",
                    params![score, source_type.as_str(), id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn set_location(&self, id: i64, name: &str, coordinates: Coordinates) -> Result<()> {
        let name = name.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET location_name = ?1, location_lat = ?2, location_lng = ?3 WHERE id = ?4",
                    params![name, coordinates.lat, coordinates.lng, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn set_summary(&self, id: i64, summary: &str) -> Result<()> {
        let summary = summary.to_string();
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE articles SET ai_summary = ?1 WHERE id = ?2",
                    params![summary, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn get_articles_with_location(&self, limit: usize) -> Result<Vec<Article>> {
        let limit = limit as i64;
        let articles = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    r#"SELECT {} FROM articles a
                       WHERE a.location_lat IS NOT NULL AND a.location_lng IS NOT NULL
                       ORDER BY a.published_at DESC NULLS LAST
                       LIMIT ?1"#,
                    ARTICLE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let articles = stmt
                    .query_map(params![limit], |row| article_from_row(row, 0))?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(articles)
            })
            .await?;
        Ok(articles)
    }

    // Vote operations

    pub async fn get_article_votes(&self, article_id: i64) -> Result<VoteCounts> {
        let votes = self
            .conn
            .call(move |conn| {
                let (up, down): (i64, i64) = conn.query_row(
                    r#"SELECT COALESCE(SUM(vote_type = 'up'), 0), COALESCE(SUM(vote_type = 'down'), 0)
                       FROM article_votes WHERE article_id = ?1"#,
                    params![article_id],
                    |row| Ok((row.get(0)?, row.get(1)?)),
                )?;
                Ok(VoteCounts {
                    upvotes: up as u32,
                    downvotes: down as u32,
                })
            })
            .await?;
        Ok(votes)
    }

    pub async fn get_user_vote(&self, article_id: i64, user_id: i64) -> Result<Option<VoteType>> {
        let vote = self
            .conn
            .call(move |conn| {
                let vote: Option<String> = conn
                    .query_row(
                        "SELECT vote_type FROM article_votes WHERE article_id = ?1 AND user_id = ?2",
                        params![article_id, user_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(vote)
            })
            .await?;
        Ok(vote.as_deref().and_then(VoteType::parse))
    }

    /// Cast, change or (with `None`) withdraw a user's vote.
    pub async fn vote_on_article(
        &self,
        article_id: i64,
        user_id: i64,
        vote: Option<VoteType>,
    ) -> Result<()> {
        let now = timestamp(&Utc::now());
        self.conn
            .call(move |conn| {
                match vote {
                    Some(vote) => {
                        conn.execute(
                            r#"INSERT INTO article_votes (article_id, user_id, vote_type, created_at, updated_at)
                               VALUES (?1, ?2, ?3, ?4, ?4)
                               ON CONFLICT(article_id, user_id) DO UPDATE SET
                                   vote_type = excluded.vote_type,
                                   updated_at = excluded.updated_at"#,
                            params![article_id, user_id, vote.as_str(), now],
                        )?;
                    }
                    None => {
                        conn.execute(
                            "DELETE FROM article_votes WHERE article_id = ?1 AND user_id = ?2",
                            params![article_id, user_id],
                        )?;
                    }
                }
                Ok(())
            })
            .await?;
        Ok(())
    }

    // Reading history

    /// Record a read and return the entry id; re-reading an article only moves its `read_at`.
    pub async fn track_article_read(
        &self,
        user_id: i64,
        article_id: i64,
        read_at: DateTime<Utc>,
    ) -> Result<i64> {
        let read_at = timestamp(&read_at);
        let id = self
            .conn
            .call(move |conn| {
                let id = conn.query_row(
                    r#"INSERT INTO reading_history (user_id, article_id, read_at)
                       VALUES (?1, ?2, ?3)
                       ON CONFLICT(user_id, article_id) DO UPDATE SET read_at = excluded.read_at
                       RETURNING id"#,
                    params![user_id, article_id, read_at],
                    |row| row.get(0),
                )?;
                Ok(id)
            })
            .await?;
        Ok(id)
    }

    pub async fn get_reading_history(
        &self,
        user_id: i64,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReadingHistoryItem>> {
        let (limit, offset) = (limit as i64, offset as i64);
        let history = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    r#"SELECT h.id, h.user_id, h.article_id, h.read_at, {}
                       FROM reading_history h
                       LEFT JOIN articles a ON a.id = h.article_id
                       WHERE h.user_id = ?1
                       ORDER BY h.read_at DESC, h.id DESC
                       LIMIT ?2 OFFSET ?3"#,
                    ARTICLE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let history = stmt
                    .query_map(params![user_id, limit, offset], history_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(history)
            })
            .await?;
        Ok(history)
    }

    pub async fn get_read_articles_with_location(
        &self,
        user_id: i64,
        limit: usize,
    ) -> Result<Vec<ReadingHistoryItem>> {
        let limit = limit as i64;
        let history = self
            .conn
            .call(move |conn| {
                let sql = format!(
                    r#"SELECT h.id, h.user_id, h.article_id, h.read_at, {}
                       FROM reading_history h
                       JOIN articles a ON a.id = h.article_id
                       WHERE h.user_id = ?1
                         AND a.location_lat IS NOT NULL AND a.location_lng IS NOT NULL
                       ORDER BY h.read_at DESC
                       LIMIT ?2"#,
                    ARTICLE_COLUMNS
                );
                let mut stmt = conn.prepare(&sql)?;
                let history = stmt
                    .query_map(params![user_id, limit], history_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                Ok(history)
            })
            .await?;
        Ok(history)
    }

    pub async fn delete_reading_history_item(&self, id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .call(move |conn| {
                let rows = conn.execute("DELETE FROM reading_history WHERE id = ?1", params![id])?;
                Ok(rows > 0)
            })
            .await?;
        Ok(deleted)
    }

    pub async fn clear_reading_history(&self, user_id: i64) -> Result<usize> {
        let removed = self
            .conn
            .call(move |conn| {
                let rows = conn.execute(
                    "DELETE FROM reading_history WHERE user_id = ?1",
                    params![user_id],
                )?;
                Ok(rows)
            })
            .await?;
        Ok(removed)
    }

    // Comment operations

    pub async fn create_comment(&self, comment: NewComment) -> Result<Comment> {
        let now = timestamp(&Utc::now());
        let created = self
            .conn
            .call(move |conn| {
                conn.execute(
                    r#"INSERT INTO comments (article_id, user_id, parent_id, content, created_at, updated_at)
                       VALUES (?1, ?2, ?3, ?4, ?5, ?5)"#,
                    params![
                        comment.article_id,
                        comment.user_id,
                        comment.parent_id,
                        comment.content,
                        now
                    ],
                )?;
                let id = conn.last_insert_rowid();
                let created = conn.query_row(&comment_by_id_sql(), params![id], comment_from_row)?;
                Ok(created)
            })
            .await?;
        Ok(created)
    }

    pub async fn get_comment(&self, id: i64) -> Result<Option<Comment>> {
        let comment = self
            .conn
            .call(move |conn| {
                let comment = conn
                    .query_row(&comment_by_id_sql(), params![id], comment_from_row)
                    .optional()?;
                Ok(comment)
            })
            .await?;
        Ok(comment)
    }

    /// Live top-level comments, newest first, each with its live replies oldest first.
    pub async fn get_comments_for_article(&self, article_id: i64) -> Result<Vec<Comment>> {
        let comments = self
            .conn
            .call(move |conn| {
                let top_sql = format!(
                    r#"SELECT {} FROM comments c
                       LEFT JOIN guest_users g ON g.id = c.user_id
                       WHERE c.article_id = ?1 AND c.parent_id IS NULL AND c.is_deleted = 0
                       ORDER BY c.created_at DESC, c.id DESC"#,
                    COMMENT_COLUMNS
                );
                let reply_sql = format!(
                    r#"SELECT {} FROM comments c
                       LEFT JOIN guest_users g ON g.id = c.user_id
                       WHERE c.parent_id = ?1 AND c.is_deleted = 0
                       ORDER BY c.created_at ASC, c.id ASC"#,
                    COMMENT_COLUMNS
                );

                let mut top_stmt = conn.prepare(&top_sql)?;
                let mut comments = top_stmt
                    .query_map(params![article_id], comment_from_row)?
                    .collect::<std::result::Result<Vec<_>, _>>()?;

                let mut reply_stmt = conn.prepare(&reply_sql)?;
                for comment in &mut comments {
                    comment.replies = reply_stmt
                        .query_map(params![comment.id], comment_from_row)?
                        .collect::<std::result::Result<Vec<_>, _>>()?;
                }
                Ok(comments)
            })
            .await?;
        Ok(comments)
    }

    pub async fn update_comment_content(&self, id: i64, content: &str) -> Result<()> {
        let content = content.to_string();
        let now = timestamp(&Utc::now());
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE comments SET content = ?1, updated_at = ?2 WHERE id = ?3",
                    params![content, now, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    pub async fn set_comment_analysis(&self, id: i64, analysis: CommentAnalysis) -> Result<()> {
        let now = timestamp(&Utc::now());
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE comments SET ai_summary = ?1, political_score = ?2, updated_at = ?3 WHERE id = ?4",
                    params![analysis.summary, analysis.political_score, now, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }

    /// Flag the comment as deleted; the row and its content stay.
    pub async fn soft_delete_comment(&self, id: i64) -> Result<()> {
        let now = timestamp(&Utc::now());
        self.conn
            .call(move |conn| {
                conn.execute(
                    "UPDATE comments SET is_deleted = 1, updated_at = ?1 WHERE id = ?2",
                    params![now, id],
                )?;
                Ok(())
            })
            .await?;
        Ok(())
    }
}

/// Fixed-width UTC timestamps so text ordering matches time ordering.
fn timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    // Try RFC3339 first (e.g., "2026-01-11T12:34:56+00:00")
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Try SQLite datetime format (e.g., "2026-01-11 12:34:56")
    if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    None
}

fn escape_like(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn comment_by_id_sql() -> String {
    format!(
        "SELECT {} FROM comments c LEFT JOIN guest_users g ON g.id = c.user_id WHERE c.id = ?1",
        COMMENT_COLUMNS
    )
}

fn required_datetime(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    Ok(parse_datetime(&row.get::<_, String>(idx)?).unwrap_or_else(Utc::now))
}

fn guest_user_from_row(row: &Row) -> rusqlite::Result<GuestUser> {
    Ok(GuestUser {
        id: row.get(0)?,
        guest_id: row.get(1)?,
        created_at: required_datetime(row, 2)?,
        last_active_at: row
            .get::<_, Option<String>>(3)?
            .and_then(|s| parse_datetime(&s)),
    })
}

/// Map the `ARTICLE_COLUMNS` block starting at column `at`.
fn article_from_row(row: &Row, at: usize) -> rusqlite::Result<Article> {
    Ok(Article {
        id: row.get(at)?,
        external_id: row.get(at + 1)?,
        title: row.get(at + 2)?,
        description: row.get(at + 3)?,
        content: row.get(at + 4)?,
        source: row.get(at + 5)?,
        source_type: SourceType::parse(&row.get::<_, String>(at + 6)?),
        political_score: row.get(at + 7)?,
        published_at: row
            .get::<_, Option<String>>(at + 8)?
            .and_then(|s| parse_datetime(&s)),
        url: row.get(at + 9)?,
        image_url: row.get(at + 10)?,
        ai_summary: row.get(at + 11)?,
        location_name: row.get(at + 12)?,
        location_lat: row.get(at + 13)?,
        location_lng: row.get(at + 14)?,
        created_at: required_datetime(row, at + 15)?,
    })
}

fn history_from_row(row: &Row) -> rusqlite::Result<ReadingHistoryItem> {
    let article = match row.get::<_, Option<i64>>(4)? {
        Some(_) => Some(article_from_row(row, 4)?),
        None => None,
    };
    Ok(ReadingHistoryItem {
        id: row.get(0)?,
        user_id: row.get(1)?,
        article_id: row.get(2)?,
        read_at: required_datetime(row, 3)?,
        article,
    })
}

fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        article_id: row.get(1)?,
        user_id: row.get(2)?,
        guest_id: row.get(3)?,
        parent_id: row.get(4)?,
        content: row.get(5)?,
        created_at: required_datetime(row, 6)?,
        updated_at: required_datetime(row, 7)?,
        ai_summary: row.get(8)?,
        political_score: row.get(9)?,
        is_deleted: row.get(10)?,
        replies: Vec::new(),
    })
}
