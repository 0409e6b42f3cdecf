use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scores at or beyond this magnitude leave the center bucket.
const SOURCE_TYPE_THRESHOLD: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    Left,
    Center,
    Right,
}

impl SourceType {
    pub fn from_score(score: f64) -> Self {
        if score <= -SOURCE_TYPE_THRESHOLD {
            SourceType::Left
        } else if score >= SOURCE_TYPE_THRESHOLD {
            SourceType::Right
        } else {
            SourceType::Center
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::Left => "left",
            SourceType::Center => "center",
            SourceType::Right => "right",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "left" => SourceType::Left,
            "right" => SourceType::Right,
            _ => SourceType::Center,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub source: String,
    pub source_type: SourceType,
    pub political_score: Option<f64>,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    pub image_url: Option<String>,
    pub ai_summary: Option<String>,
    pub location_name: Option<String>,
    pub location_lat: Option<f64>,
    pub location_lng: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Article {
    pub fn has_coordinates(&self) -> bool {
        self.location_lat.is_some() && self.location_lng.is_some()
    }
}

#[derive(Debug, Clone)]
pub struct NewArticle {
    pub external_id: String,
    pub title: String,
    pub description: String,
    pub content: Option<String>,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    pub image_url: Option<String>,
}

/// The text an analyzer needs, borrowed from either a stored or a freshly fetched article.
#[derive(Debug, Clone, Copy)]
pub struct ArticleText<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub source: &'a str,
    pub content: Option<&'a str>,
}

impl<'a> From<&'a Article> for ArticleText<'a> {
    fn from(article: &'a Article) -> Self {
        Self {
            title: &article.title,
            description: &article.description,
            source: &article.source,
            content: article.content.as_deref(),
        }
    }
}

impl<'a> From<&'a NewArticle> for ArticleText<'a> {
    fn from(article: &'a NewArticle) -> Self {
        Self {
            title: &article.title,
            description: &article.description,
            source: &article.source,
            content: article.content.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteType {
    Up,
    Down,
}

impl VoteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteType::Up => "up",
            VoteType::Down => "down",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "up" => Some(VoteType::Up),
            "down" => Some(VoteType::Down),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VoteCounts {
    pub upvotes: u32,
    pub downvotes: u32,
}

/// Tally for an article plus the asking guest's own vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteSummary {
    pub article_id: i64,
    pub votes: VoteCounts,
    pub user_vote: Option<VoteType>,
}

/// An article as returned from ingestion, with its current vote tally.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleWithVotes {
    #[serde(flatten)]
    pub article: Article,
    pub votes: VoteCounts,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-10.0, SourceType::Left)]
    #[case(-3.0, SourceType::Left)]
    #[case(-2.99, SourceType::Center)]
    #[case(0.0, SourceType::Center)]
    #[case(2.99, SourceType::Center)]
    #[case(3.0, SourceType::Right)]
    #[case(10.0, SourceType::Right)]
    fn source_type_follows_thresholds(#[case] score: f64, #[case] expected: SourceType) {
        assert_eq!(SourceType::from_score(score), expected);
    }

    #[test]
    fn source_type_round_trips_through_text() {
        for t in [SourceType::Left, SourceType::Center, SourceType::Right] {
            assert_eq!(SourceType::parse(t.as_str()), t);
        }
    }
}
