use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Article, SourceType};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationExtraction {
    pub location: String,
    pub coordinates: Option<Coordinates>,
    pub confidence: f64,
}

/// A single pin on the world map.
#[derive(Debug, Clone, Serialize)]
pub struct MapPin {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub source: String,
    pub source_type: SourceType,
    pub political_score: f64,
    pub published_at: Option<DateTime<Utc>>,
    pub url: String,
    pub location: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<DateTime<Utc>>,
}

impl MapPin {
    /// Build a pin when the article carries finite coordinates.
    pub fn from_article(article: &Article, read_at: Option<DateTime<Utc>>) -> Option<Self> {
        let (lat, lng) = (article.location_lat?, article.location_lng?);
        if !lat.is_finite() || !lng.is_finite() {
            return None;
        }

        Some(Self {
            id: article.id,
            title: article.title.clone(),
            description: article.description.clone(),
            source: article.source.clone(),
            source_type: article.source_type,
            political_score: article.political_score.unwrap_or(0.0),
            published_at: article.published_at,
            url: article.url.clone(),
            location: article
                .location_name
                .clone()
                .unwrap_or_else(|| "Unknown Location".to_string()),
            lat,
            lng,
            read_at,
        })
    }
}
