pub const SCHEMA: &str = r#"
PRAGMA foreign_keys = ON;

-- guest_users table
CREATE TABLE IF NOT EXISTS guest_users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    guest_id TEXT NOT NULL UNIQUE,
    created_at TEXT NOT NULL,
    last_active_at TEXT
);

-- articles table
CREATE TABLE IF NOT EXISTS articles (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    content TEXT,
    source TEXT NOT NULL,
    source_type TEXT NOT NULL DEFAULT 'center' CHECK (source_type IN ('left', 'center', 'right')),
    political_score REAL CHECK (political_score IS NULL OR political_score BETWEEN -10 AND 10),
    published_at TEXT,
    url TEXT NOT NULL,
    image_url TEXT,
    ai_summary TEXT,
    location_name TEXT,
    location_lat REAL,
    location_lng REAL,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles(published_at DESC);

-- article_votes table
CREATE TABLE IF NOT EXISTS article_votes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES guest_users(id) ON DELETE CASCADE,
    vote_type TEXT NOT NULL CHECK (vote_type IN ('up', 'down')),
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(article_id, user_id)
);

-- reading_history table (one row per user and article)
CREATE TABLE IF NOT EXISTS reading_history (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL REFERENCES guest_users(id) ON DELETE CASCADE,
    article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    read_at TEXT NOT NULL,
    UNIQUE(user_id, article_id)
);

CREATE INDEX IF NOT EXISTS idx_reading_history_user_read_at ON reading_history(user_id, read_at DESC);

-- comments table (soft-deleted, single level of replies)
CREATE TABLE IF NOT EXISTS comments (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    article_id INTEGER NOT NULL REFERENCES articles(id) ON DELETE CASCADE,
    user_id INTEGER NOT NULL REFERENCES guest_users(id) ON DELETE CASCADE,
    parent_id INTEGER REFERENCES comments(id),
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    ai_summary TEXT,
    political_score REAL,
    is_deleted INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_comments_article_id ON comments(article_id);
CREATE INDEX IF NOT EXISTS idx_comments_parent_id ON comments(parent_id);
"#;
