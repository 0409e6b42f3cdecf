use std::sync::Arc;

use crate::models::{ArticleText, CommentAnalysis, LocationExtraction};
use crate::scoring::HeuristicTable;

use super::client::CompletionClient;
use super::interpreter::{
    fallback_comment_analysis, fallback_location, fallback_summary, interpret_comment_analysis,
    interpret_location, interpret_summary, parse_political_score,
};
use super::prompts;

/// LLM-backed analysis that always produces a value.
///
/// Without a client, or whenever the model call fails or answers with
/// something unusable, each method falls back to the heuristic score or a
/// fixed default.
pub struct Analyzer {
    client: Option<Arc<dyn CompletionClient>>,
    heuristics: HeuristicTable,
}

impl Analyzer {
    pub fn new(client: Option<Arc<dyn CompletionClient>>, heuristics: HeuristicTable) -> Self {
        Self { client, heuristics }
    }

    async fn complete(&self, prompt: String, max_tokens: u32) -> Option<String> {
        let client = self.client.as_ref()?;
        match client.complete(&prompt, max_tokens).await {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!("LLM request failed: {}", e);
                None
            }
        }
    }

    fn heuristic_score(&self, article: &ArticleText<'_>) -> f64 {
        self.heuristics.score(
            article.source,
            article.title,
            article.description,
            &mut rand::thread_rng(),
        )
    }

    pub async fn analyze_political_leaning(&self, article: &ArticleText<'_>) -> f64 {
        tracing::debug!("Analyzing political leaning for article: {}", article.title);

        let response = self
            .complete(prompts::political_leaning(article), prompts::SCORE_MAX_TOKENS)
            .await;

        if let Some(text) = response {
            tracing::debug!("Raw political score response: {:?}", text);
            if let Some(score) = parse_political_score(&text) {
                return score;
            }
            tracing::warn!("Invalid political score {:?}, using source-based fallback", text);
        }

        self.heuristic_score(article)
    }

    pub async fn analyze_comment(&self, comment: &str) -> CommentAnalysis {
        match self
            .complete(prompts::comment_leaning(comment), prompts::COMMENT_MAX_TOKENS)
            .await
        {
            Some(text) => interpret_comment_analysis(&text),
            None => fallback_comment_analysis(),
        }
    }

    pub async fn extract_location(&self, article: &ArticleText<'_>) -> LocationExtraction {
        match self
            .complete(prompts::article_location(article), prompts::LOCATION_MAX_TOKENS)
            .await
        {
            Some(text) => {
                tracing::debug!("Raw location response: {:?}", text);
                interpret_location(&text, article)
            }
            None => fallback_location(article),
        }
    }

    pub async fn generate_summary(&self, article: &ArticleText<'_>) -> String {
        match self
            .complete(prompts::article_summary(article), prompts::SUMMARY_MAX_TOKENS)
            .await
        {
            Some(text) => interpret_summary(&text, article.title),
            None => fallback_summary(article.title),
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use super::*;
    use crate::ai::CompletionClient;
    use crate::error::{AppError, Result};

    /// Replies with a canned completion, or fails when given `None`.
    pub struct ScriptedClient {
        reply: Option<String>,
        pub calls: AtomicUsize,
    }

    impl ScriptedClient {
        pub fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Some(text.to_string()),
                calls: AtomicUsize::new(0),
            })
        }

        pub fn failing() -> Arc<Self> {
            Arc::new(Self {
                reply: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for ScriptedClient {
        async fn complete(&self, _prompt: &str, _max_tokens: u32) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .clone()
                .ok_or_else(|| AppError::ClaudeApi("API error: overloaded".to_string()))
        }
    }

    pub fn steady_table() -> HeuristicTable {
        HeuristicTable {
            jitter: 0.0,
            ..HeuristicTable::default()
        }
    }

    pub fn analyzer_with(client: Arc<ScriptedClient>) -> Analyzer {
        let client: Arc<dyn CompletionClient> = client;
        Analyzer::new(Some(client), steady_table())
    }
}
