use chrono::{DateTime, Utc};
use serde::Serialize;

use super::Article;

#[derive(Debug, Clone, Serialize)]
pub struct GuestUser {
    pub id: i64,
    pub guest_id: String,
    pub created_at: DateTime<Utc>,
    pub last_active_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReadingHistoryItem {
    pub id: i64,
    pub user_id: i64,
    pub article_id: i64,
    pub read_at: DateTime<Utc>,
    /// Missing when the joined article row no longer exists.
    pub article: Option<Article>,
}
