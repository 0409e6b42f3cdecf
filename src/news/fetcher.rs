use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use url::Url;

use crate::db::parse_datetime;
use crate::error::{AppError, Result};
use crate::models::NewArticle;

const NYT_API_BASE: &str = "https://api.nytimes.com/svc";
const NYT_SITE: &str = "https://www.nytimes.com/";
pub const NYT_SOURCE: &str = "New York Times";
pub const DEFAULT_SECTION: &str = "home";

#[derive(Debug, Deserialize)]
struct TopStoriesResponse {
    #[serde(default)]
    results: Vec<TopStory>,
}

#[derive(Debug, Deserialize)]
struct TopStory {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "abstract")]
    summary: String,
    #[serde(default)]
    url: String,
    published_date: Option<String>,
    #[serde(default)]
    multimedia: Option<Vec<TopStoryMedia>>,
}

#[derive(Debug, Deserialize)]
struct TopStoryMedia {
    url: String,
    format: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    response: SearchBody,
}

#[derive(Debug, Deserialize)]
struct SearchBody {
    #[serde(default)]
    docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
struct SearchDoc {
    #[serde(default)]
    headline: Headline,
    #[serde(default, rename = "abstract")]
    summary: String,
    #[serde(default)]
    web_url: String,
    pub_date: Option<String>,
    // An array in the classic API and an object in newer responses.
    #[serde(default)]
    multimedia: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct Headline {
    #[serde(default)]
    main: String,
}

#[derive(Debug, Deserialize)]
struct SearchMedia {
    url: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    subtype: Option<String>,
}

/// Client for the NYT Top Stories and Article Search APIs.
pub struct NewsFetcher {
    client: Client,
    api_key: String,
}

impl NewsFetcher {
    pub fn new(api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("democracy-lens/1.0")
            .build()?;

        Ok(Self { client, api_key })
    }

    pub async fn top_stories(&self, section: &str) -> Result<Vec<NewArticle>> {
        let url = top_stories_url(section, &self.api_key)?;
        let response: TopStoriesResponse = self.get_json(url).await?;
        let articles: Vec<NewArticle> = response
            .results
            .into_iter()
            .filter_map(story_to_article)
            .collect();

        tracing::debug!("Fetched {} top stories for section {}", articles.len(), section);
        Ok(articles)
    }

    /// `page` is 1-based.
    pub async fn search(&self, query: &str, page: u32) -> Result<Vec<NewArticle>> {
        let url = search_url(query, page, &self.api_key)?;
        let response: SearchResponse = self.get_json(url).await?;
        let articles: Vec<NewArticle> = response
            .response
            .docs
            .into_iter()
            .filter_map(doc_to_article)
            .collect();

        tracing::debug!("Fetched {} search results for {:?}", articles.len(), query);
        Ok(articles)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.client.get(url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(AppError::NewsApi(format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("")
            )));
        }

        Ok(response.json().await?)
    }
}

fn top_stories_url(section: &str, api_key: &str) -> Result<Url> {
    let section = if section.trim().is_empty() {
        DEFAULT_SECTION
    } else {
        section.trim()
    };
    let raw = format!(
        "{}/topstories/v2/{}.json?api-key={}",
        NYT_API_BASE,
        urlencoding::encode(section),
        urlencoding::encode(api_key)
    );
    let url = Url::parse(&raw).map_err(|e| anyhow::anyhow!("Invalid NYT URL: {}", e))?;
    Ok(url)
}

fn search_url(query: &str, page: u32, api_key: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/search/v2/articlesearch.json", NYT_API_BASE))
        .map_err(|e| anyhow::anyhow!("Invalid NYT URL: {}", e))?;
    url.query_pairs_mut()
        .append_pair("q", query)
        .append_pair("page", &page.saturating_sub(1).to_string())
        .append_pair("api-key", api_key);
    Ok(url)
}

fn story_to_article(story: TopStory) -> Option<NewArticle> {
    if story.url.is_empty() {
        tracing::debug!("Skipping top story without URL: {}", story.title);
        return None;
    }

    let image_url = story.multimedia.as_deref().and_then(|media| {
        media
            .iter()
            .find(|m| matches!(m.format.as_deref(), Some("superJumbo") | Some("Large")))
            .map(|m| m.url.clone())
    });

    Some(NewArticle {
        external_id: story.url.clone(),
        title: story.title,
        description: story.summary,
        content: None,
        source: NYT_SOURCE.to_string(),
        published_at: story.published_date.as_deref().and_then(parse_datetime),
        url: story.url,
        image_url,
    })
}

fn doc_to_article(doc: SearchDoc) -> Option<NewArticle> {
    if doc.web_url.is_empty() {
        tracing::debug!("Skipping search result without URL: {}", doc.headline.main);
        return None;
    }

    let image_url = doc
        .multimedia
        .and_then(|value| serde_json::from_value::<Vec<SearchMedia>>(value).ok())
        .and_then(|media| {
            media
                .into_iter()
                .find(|m| m.kind.as_deref() == Some("image") && m.subtype.as_deref() == Some("xlarge"))
        })
        .map(|m| format!("{}{}", NYT_SITE, m.url));

    Some(NewArticle {
        external_id: doc.web_url.clone(),
        title: doc.headline.main,
        description: doc.summary,
        content: None,
        source: NYT_SOURCE.to_string(),
        published_at: doc.pub_date.as_deref().and_then(parse_nyt_date),
        url: doc.web_url,
        image_url,
    })
}

/// Search results use offsets without a colon, e.g. `2026-10-17T09:00:05+0000`.
fn parse_nyt_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    parse_datetime(s).or_else(|| {
        chrono::DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%z")
            .ok()
            .map(|dt| dt.with_timezone(&chrono::Utc))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    const TOP_STORIES: &str = r#"{
        "status": "OK",
        "results": [
            {
                "title": "Senate Passes Budget",
                "abstract": "A late-night vote.",
                "url": "https://www.nytimes.com/2026/10/17/us/politics/budget.html",
                "published_date": "2026-10-17T05:00:11-04:00",
                "multimedia": [
                    {"url": "https://static01.nyt.com/thumb.jpg", "format": "Standard Thumbnail"},
                    {"url": "https://static01.nyt.com/large.jpg", "format": "Large"}
                ]
            },
            {
                "title": "Missing link",
                "abstract": "",
                "url": "",
                "published_date": null,
                "multimedia": null
            }
        ]
    }"#;

    const SEARCH: &str = r#"{
        "status": "OK",
        "response": {
            "docs": [
                {
                    "headline": {"main": "Election Night in Ohio"},
                    "abstract": "Results trickle in.",
                    "web_url": "https://www.nytimes.com/2026/10/16/us/ohio.html",
                    "pub_date": "2026-10-16T22:15:00+0000",
                    "multimedia": [
                        {"url": "images/thumb.jpg", "type": "image", "subtype": "thumbnail"},
                        {"url": "images/xl.jpg", "type": "image", "subtype": "xlarge"}
                    ]
                },
                {
                    "headline": {"main": "New Format"},
                    "abstract": "Object multimedia.",
                    "web_url": "https://www.nytimes.com/2026/10/15/world/new.html",
                    "pub_date": "2026-10-15T10:00:00Z",
                    "multimedia": {"default": {"url": "https://static01.nyt.com/x.jpg"}}
                }
            ]
        }
    }"#;

    #[test]
    fn maps_top_stories() {
        let response: TopStoriesResponse = serde_json::from_str(TOP_STORIES).unwrap();
        let articles: Vec<_> = response.results.into_iter().filter_map(story_to_article).collect();

        assert_eq!(articles.len(), 1);
        let article = &articles[0];
        assert_eq!(article.title, "Senate Passes Budget");
        assert_eq!(article.description, "A late-night vote.");
        assert_eq!(article.source, NYT_SOURCE);
        assert_eq!(article.external_id, article.url);
        assert_eq!(article.image_url.as_deref(), Some("https://static01.nyt.com/large.jpg"));
        assert_eq!(
            article.published_at,
            Some(Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 11).unwrap())
        );
    }

    #[test]
    fn maps_search_docs() {
        let response: SearchResponse = serde_json::from_str(SEARCH).unwrap();
        let articles: Vec<_> = response.response.docs.into_iter().filter_map(doc_to_article).collect();

        assert_eq!(articles.len(), 2);
        assert_eq!(articles[0].title, "Election Night in Ohio");
        assert_eq!(
            articles[0].image_url.as_deref(),
            Some("https://www.nytimes.com/images/xl.jpg")
        );
        assert_eq!(
            articles[0].published_at,
            Some(Utc.with_ymd_and_hms(2026, 10, 16, 22, 15, 0).unwrap())
        );
        assert_eq!(articles[1].image_url, None);
    }

    #[test]
    fn builds_urls() {
        let url = top_stories_url("", "key").unwrap();
        assert_eq!(url.path(), "/svc/topstories/v2/home.json");

        let url = search_url("climate & energy", 3, "key").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("q".to_string(), "climate & energy".to_string()),
                ("page".to_string(), "2".to_string()),
                ("api-key".to_string(), "key".to_string()),
            ]
        );

        let url = search_url("x", 0, "key").unwrap();
        assert!(url.as_str().contains("page=0"));
    }
}
