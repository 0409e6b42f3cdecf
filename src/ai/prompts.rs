use crate::models::ArticleText;

pub const SCORE_MAX_TOKENS: u32 = 10;
pub const COMMENT_MAX_TOKENS: u32 = 200;
pub const LOCATION_MAX_TOKENS: u32 = 200;
pub const SUMMARY_MAX_TOKENS: u32 = 150;

fn article_block(article: &ArticleText<'_>) -> String {
    let mut block = format!(
        "Title: {}\nSource: {}\nDescription: {}",
        article.title, article.source, article.description
    );
    if let Some(content) = article.content.filter(|c| !c.is_empty()) {
        block.push_str("\nContent: ");
        block.push_str(content);
    }
    block
}

pub fn political_leaning(article: &ArticleText<'_>) -> String {
    format!(
        r#"Please analyze the political leaning of the following news article on a scale from -10 (extremely liberal) to +10 (extremely conservative).

{}

Consider the following factors:
- Language and framing
- Topic selection and emphasis
- Source reputation
- Presentation of different viewpoints

Provide ONLY a single number between -10 and 10 representing the political leaning score.
Return ONLY the numerical score with no additional text."#,
        article_block(article)
    )
}

pub fn comment_leaning(comment: &str) -> String {
    format!(
        r#"Please analyze the political leaning of the following comment and provide:
1. A brief summary (1-2 sentences)
2. A political leaning score from -10 (extremely liberal) to +10 (extremely conservative)

Comment: "{}"

Format your response as JSON with the following structure:
{{
  "summary": "Brief summary of the comment",
  "politicalScore": number from -10 to 10
}}

Return ONLY the JSON with no additional text or markdown formatting."#,
        comment
    )
}

pub fn article_location(article: &ArticleText<'_>) -> String {
    format!(
        r#"Please analyze the following news article and extract the primary geographic location it relates to.

{}

Return your response in JSON format with the following structure:
{{
  "location": "Name of city/country/region",
  "coordinates": {{ "lat": latitude, "lng": longitude }},
  "confidence": a number between 0 and 1 representing your confidence in this location extraction
}}

If you cannot determine a specific geographic location, set coordinates to null.
Return ONLY the JSON with no additional text."#,
        article_block(article)
    )
}

pub fn article_summary(article: &ArticleText<'_>) -> String {
    format!(
        r#"Please provide a concise summary (2-3 sentences) of the following news article:

{}

Your summary should be objective and highlight the key points of the article."#,
        article_block(article)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_only_included_when_present() {
        let mut article = ArticleText {
            title: "Budget passes",
            description: "Senate votes",
            source: "Reuters",
            content: None,
        };
        assert!(!political_leaning(&article).contains("Content:"));

        article.content = Some("Full text");
        let prompt = political_leaning(&article);
        assert!(prompt.contains("Content: Full text"));
        assert!(prompt.contains("Source: Reuters"));
    }

    #[test]
    fn json_prompts_keep_literal_braces() {
        assert!(comment_leaning("hello").contains("\"politicalScore\""));
        let article = ArticleText {
            title: "t",
            description: "d",
            source: "s",
            content: None,
        };
        assert!(article_location(&article).contains("{ \"lat\": latitude"));
    }
}
