use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Local, NaiveDate, TimeZone, Utc};
use futures::stream::{self, StreamExt};
use rand::Rng;
use tokio::task::JoinSet;

use crate::ai::{Analyzer, ClaudeClient, CompletionClient};
use crate::config::Config;
use crate::db::Repository;
use crate::error::{AppError, Result};
use crate::models::{
    Article, ArticleText, ArticleWithVotes, Comment, CommentAnalysis, Dashboard, GuestUser,
    MapPin, NewArticle, NewComment, ReadingHistoryItem, VoteSummary, VoteType,
};
use crate::news::{NewsFetcher, DEFAULT_SECTION};
use crate::scoring::{calculate_democracy_score, challenge_statuses, reading_streak_data};

const GUEST_PREFIX: &str = "guest_";
const GUEST_SUFFIX_LEN: usize = 26;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Max articles scored at once during ingestion.
const INGEST_CONCURRENCY: usize = 5;

pub struct App {
    repository: Repository,
    analyzer: Arc<Analyzer>,
    fetcher: Option<NewsFetcher>,
    background: JoinSet<()>,
    history_limit: usize,
    map_limit: usize,
}

impl App {
    pub async fn new(config: &Config) -> Result<Self> {
        let repository = Repository::new(&config.db_path).await?;

        let client: Option<Arc<dyn CompletionClient>> = match non_empty(&config.claude_api_key) {
            Some(key) => {
                let client = ClaudeClient::new(key.to_string(), config.claude_model.clone())?;
                tracing::info!("Using Claude model {}", client.model_version());
                let client: Arc<dyn CompletionClient> = Arc::new(client);
                Some(client)
            }
            None => {
                tracing::info!("No Claude API key configured, using heuristic analysis");
                None
            }
        };

        let fetcher = non_empty(&config.nyt_api_key)
            .map(|key| NewsFetcher::new(key.to_string()))
            .transpose()?;

        let analyzer = Analyzer::new(client, config.heuristics.clone());

        Ok(Self::with_parts(
            repository,
            analyzer,
            fetcher,
            config.dashboard_history_limit,
            config.map_limit,
        ))
    }

    pub fn with_parts(
        repository: Repository,
        analyzer: Analyzer,
        fetcher: Option<NewsFetcher>,
        history_limit: usize,
        map_limit: usize,
    ) -> Self {
        Self {
            repository,
            analyzer: Arc::new(analyzer),
            fetcher,
            background: JoinSet::new(),
            history_limit,
            map_limit,
        }
    }

    /// Wait for detached analysis to settle. Failures are logged only.
    pub async fn finish_background(&mut self) {
        while let Some(result) = self.background.join_next().await {
            if let Err(e) = result {
                tracing::warn!("Background task failed: {}", e);
            }
        }
    }

    // Guests

    pub async fn new_guest(&self) -> Result<GuestUser> {
        let guest_id = generate_guest_id(&mut rand::thread_rng());
        let user = self.repository.register_guest_user(&guest_id).await?;
        tracing::debug!("Registered guest {}", user.guest_id);
        Ok(user)
    }

    /// Resolve a guest id, registering it on first sight.
    async fn guest(&self, guest_id: &str) -> Result<GuestUser> {
        let guest_id = guest_id.trim();
        if guest_id.is_empty() {
            return Err(AppError::InvalidInput("Guest id cannot be empty".to_string()));
        }

        let user = match self.repository.get_guest_user(guest_id).await? {
            Some(user) => user,
            None => self.repository.register_guest_user(guest_id).await?,
        };
        self.repository.touch_guest_user(user.id).await?;
        Ok(user)
    }

    // News ingestion

    fn fetcher(&self) -> Result<&NewsFetcher> {
        self.fetcher
            .as_ref()
            .ok_or_else(|| AppError::Config("nyt_api_key is not set".to_string()))
    }

    pub async fn refresh_top_stories(&self, section: Option<&str>) -> Result<Vec<ArticleWithVotes>> {
        let section = section.unwrap_or(DEFAULT_SECTION);
        let items = self.fetcher()?.top_stories(section).await?;
        Ok(self.ingest(items).await)
    }

    pub async fn search_news(&self, query: &str, page: u32) -> Result<Vec<ArticleWithVotes>> {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("Search query cannot be empty".to_string()));
        }
        let items = self.fetcher()?.search(query, page).await?;
        Ok(self.ingest(items).await)
    }

    /// Store and score fetched articles, keeping their order. Items that fail are skipped.
    ///
    /// Repeated external ids collapse to their first occurrence, so concurrent
    /// ingests never race on the same insert.
    async fn ingest(&self, items: Vec<NewArticle>) -> Vec<ArticleWithVotes> {
        let mut seen = HashSet::new();
        let items: Vec<NewArticle> = items
            .into_iter()
            .filter(|item| seen.insert(item.external_id.clone()))
            .collect();

        stream::iter(items)
            .map(|item| async move {
                let url = item.url.clone();
                match self.ingest_one(item).await {
                    Ok(article) => Some(article),
                    Err(e) => {
                        tracing::warn!("Failed to ingest {}: {}", url, e);
                        None
                    }
                }
            })
            .buffered(INGEST_CONCURRENCY)
            .filter_map(|r| async { r })
            .collect()
            .await
    }

    async fn ingest_one(&self, item: NewArticle) -> Result<ArticleWithVotes> {
        let existing = self
            .repository
            .get_article_by_external_id(&item.external_id)
            .await?;

        let id = match existing {
            Some(article) if article.political_score.is_some() => article.id,
            Some(article) => {
                let score = self
                    .analyzer
                    .analyze_political_leaning(&ArticleText::from(&item))
                    .await;
                self.repository.set_political_score(article.id, score).await?;
                article.id
            }
            None => {
                let score = self
                    .analyzer
                    .analyze_political_leaning(&ArticleText::from(&item))
                    .await;
                self.repository.insert_article(item, Some(score)).await?
            }
        };

        let article = self.article(id).await?;
        let votes = self.repository.get_article_votes(id).await?;
        Ok(ArticleWithVotes { article, votes })
    }

    // Articles

    async fn article(&self, id: i64) -> Result<Article> {
        self.repository
            .get_article(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Article {}", id)))
    }

    pub async fn articles(&self, limit: usize, offset: usize) -> Result<Vec<Article>> {
        self.repository.get_articles(limit, offset).await
    }

    pub async fn find_articles(&self, query: &str, limit: usize) -> Result<Vec<Article>> {
        self.repository.search_articles(query, None, limit, 0).await
    }

    pub async fn summarize_article(&self, article_id: i64) -> Result<String> {
        let article = self.article(article_id).await?;
        if let Some(summary) = article.ai_summary.as_deref().filter(|s| !s.is_empty()) {
            return Ok(summary.to_string());
        }

        let summary = self
            .analyzer
            .generate_summary(&ArticleText::from(&article))
            .await;
        self.repository.set_summary(article_id, &summary).await?;
        Ok(summary)
    }

    pub async fn vote(
        &self,
        article_id: i64,
        guest_id: &str,
        vote: Option<VoteType>,
    ) -> Result<VoteSummary> {
        let user = self.guest(guest_id).await?;
        self.article(article_id).await?;
        self.repository.vote_on_article(article_id, user.id, vote).await?;

        Ok(VoteSummary {
            article_id,
            votes: self.repository.get_article_votes(article_id).await?,
            user_vote: self.repository.get_user_vote(article_id, user.id).await?,
        })
    }

    // Reading history

    /// Record a read; location extraction runs in the background when the article has none.
    pub async fn track_read(&mut self, article_id: i64, guest_id: &str) -> Result<ReadingHistoryItem> {
        let user = self.guest(guest_id).await?;
        let article = self.article(article_id).await?;
        let read_at = Utc::now();
        let id = self
            .repository
            .track_article_read(user.id, article_id, read_at)
            .await?;

        if !article.has_coordinates() {
            self.spawn_location_extraction(article.clone());
        }

        Ok(ReadingHistoryItem {
            id,
            user_id: user.id,
            article_id,
            read_at,
            article: Some(article),
        })
    }

    fn spawn_location_extraction(&mut self, article: Article) {
        let repository = self.repository.clone();
        let analyzer = Arc::clone(&self.analyzer);

        self.background.spawn(async move {
            let extraction = analyzer.extract_location(&ArticleText::from(&article)).await;
            let Some(coordinates) = extraction.coordinates else {
                tracing::debug!("No coordinates found for article {}", article.id);
                return;
            };

            if let Err(e) = repository
                .set_location(article.id, &extraction.location, coordinates)
                .await
            {
                tracing::warn!("Failed to store location for article {}: {}", article.id, e);
            }
        });
    }

    pub async fn history(
        &self,
        guest_id: &str,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<ReadingHistoryItem>> {
        let user = self.guest(guest_id).await?;
        self.repository.get_reading_history(user.id, limit, offset).await
    }

    pub async fn delete_history_entry(&self, history_id: i64) -> Result<()> {
        if self.repository.delete_reading_history_item(history_id).await? {
            Ok(())
        } else {
            Err(AppError::NotFound(format!("History entry {}", history_id)))
        }
    }

    pub async fn clear_history(&self, guest_id: &str) -> Result<usize> {
        let user = self.guest(guest_id).await?;
        self.repository.clear_reading_history(user.id).await
    }

    // Dashboard and map

    pub async fn dashboard(&self, guest_id: &str) -> Result<Dashboard> {
        self.dashboard_on(guest_id, Local::now().date_naive(), &Local).await
    }

    async fn dashboard_on<Tz: TimeZone>(
        &self,
        guest_id: &str,
        today: NaiveDate,
        tz: &Tz,
    ) -> Result<Dashboard> {
        let user = self.guest(guest_id).await?;
        let history = self
            .repository
            .get_reading_history(user.id, self.history_limit, 0)
            .await?;

        Ok(Dashboard {
            democracy: calculate_democracy_score(&history),
            streaks: reading_streak_data(&history, today, tz),
            challenges: challenge_statuses(&history, today, tz),
        })
    }

    /// Map pins for every located article, or only those the guest has read.
    pub async fn article_locations(&self, guest_id: Option<&str>) -> Result<Vec<MapPin>> {
        let pins = match guest_id {
            Some(guest_id) => {
                let user = self.guest(guest_id).await?;
                self.repository
                    .get_read_articles_with_location(user.id, self.map_limit)
                    .await?
                    .iter()
                    .filter_map(|item| {
                        item.article
                            .as_ref()
                            .and_then(|article| MapPin::from_article(article, Some(item.read_at)))
                    })
                    .collect()
            }
            None => self
                .repository
                .get_articles_with_location(self.map_limit)
                .await?
                .iter()
                .filter_map(|article| MapPin::from_article(article, None))
                .collect(),
        };
        Ok(pins)
    }

    // Comments

    pub async fn list_comments(&self, article_id: i64) -> Result<Vec<Comment>> {
        self.repository.get_comments_for_article(article_id).await
    }

    /// Post a comment; a reply to a reply is attached to the top-level comment.
    pub async fn post_comment(
        &mut self,
        article_id: i64,
        guest_id: &str,
        text: &str,
        parent_id: Option<i64>,
    ) -> Result<Comment> {
        let content = comment_content(text)?;
        let user = self.guest(guest_id).await?;
        self.article(article_id).await?;

        let parent_id = match parent_id {
            Some(id) => {
                let parent = self.live_comment(id).await?;
                if parent.article_id != article_id {
                    return Err(AppError::InvalidInput(format!(
                        "Comment {} belongs to another article",
                        id
                    )));
                }
                Some(parent.parent_id.unwrap_or(parent.id))
            }
            None => None,
        };

        let comment = self
            .repository
            .create_comment(NewComment {
                article_id,
                user_id: user.id,
                parent_id,
                content: content.clone(),
            })
            .await?;

        self.spawn_comment_analysis(comment.id, content);
        Ok(comment)
    }

    pub async fn edit_comment(&mut self, comment_id: i64, guest_id: &str, text: &str) -> Result<Comment> {
        let content = comment_content(text)?;
        self.owned_comment(comment_id, guest_id).await?;

        self.repository
            .update_comment_content(comment_id, &content)
            .await?;
        self.spawn_comment_analysis(comment_id, content);

        self.live_comment(comment_id).await
    }

    /// Re-run the analysis now and store it.
    pub async fn analyze_comment(&self, comment_id: i64, guest_id: &str) -> Result<CommentAnalysis> {
        let comment = self.owned_comment(comment_id, guest_id).await?;
        let analysis = self.analyzer.analyze_comment(&comment.content).await;
        self.repository
            .set_comment_analysis(comment_id, analysis.clone())
            .await?;
        Ok(analysis)
    }

    pub async fn delete_comment(&self, comment_id: i64, guest_id: &str) -> Result<()> {
        self.owned_comment(comment_id, guest_id).await?;
        self.repository.soft_delete_comment(comment_id).await
    }

    async fn live_comment(&self, id: i64) -> Result<Comment> {
        self.repository
            .get_comment(id)
            .await?
            .filter(|c| !c.is_deleted)
            .ok_or_else(|| AppError::NotFound(format!("Comment {}", id)))
    }

    async fn owned_comment(&self, id: i64, guest_id: &str) -> Result<Comment> {
        let user = self.guest(guest_id).await?;
        let comment = self.live_comment(id).await?;
        if comment.user_id != user.id {
            return Err(AppError::Forbidden(format!(
                "Comment {} belongs to another guest",
                id
            )));
        }
        Ok(comment)
    }

    fn spawn_comment_analysis(&mut self, comment_id: i64, content: String) {
        let repository = self.repository.clone();
        let analyzer = Arc::clone(&self.analyzer);

        self.background.spawn(async move {
            let analysis = analyzer.analyze_comment(&content).await;
            if let Err(e) = repository.set_comment_analysis(comment_id, analysis).await {
                tracing::warn!("Failed to store analysis for comment {}: {}", comment_id, e);
            }
        });
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

fn comment_content(text: &str) -> Result<String> {
    let content = text.trim();
    if content.is_empty() {
        return Err(AppError::InvalidInput("Comment content cannot be empty".to_string()));
    }
    Ok(content.to_string())
}

fn generate_guest_id<R: Rng + ?Sized>(rng: &mut R) -> String {
    let suffix: String = (0..GUEST_SUFFIX_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("{}{}", GUEST_PREFIX, suffix)
}
