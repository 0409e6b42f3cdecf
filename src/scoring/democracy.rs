use std::collections::HashSet;

use crate::models::{Article, DemocracyDimensions, DemocracyScore, ReadingHistoryItem};

const BASE: f64 = 50.0;
const CAP: f64 = 100.0;
const CENTER_BAND: f64 = 3.0;

impl Default for DemocracyScore {
    fn default() -> Self {
        Self {
            score: BASE as u32,
            dimensions: DemocracyDimensions {
                media_freedom: BASE,
                electoral_process: BASE,
                civil_liberties: BASE,
                rule_of_law: BASE,
                deliberation: BASE,
            },
        }
    }
}

/// Derive the democracy score from a reading history.
///
/// Every dimension starts at 50 and only ever gains points, so nothing falls
/// below 50. Media freedom and deliberation are capped at 100.
pub fn calculate_democracy_score(history: &[ReadingHistoryItem]) -> DemocracyScore {
    if history.is_empty() {
        return DemocracyScore::default();
    }

    let articles: Vec<&Article> = history.iter().filter_map(|h| h.article.as_ref()).collect();
    let total = articles.len();

    let unique_sources = articles
        .iter()
        .map(|a| a.source.as_str())
        .collect::<HashSet<_>>()
        .len();

    let media_freedom = (BASE + unique_sources as f64 * 10.0).min(CAP);
    let deliberation = deliberation(&articles);

    let electoral_process = BASE
        + if total > 5 { 15.0 } else { 0.0 }
        + if unique_sources > 3 { 15.0 } else { 0.0 };
    let civil_liberties = BASE + if total > 3 { 25.0 } else { 0.0 };
    let rule_of_law = BASE + if total > 4 { 20.0 } else { 0.0 };

    let weighted = media_freedom * 0.3
        + deliberation * 0.3
        + electoral_process * 0.15
        + civil_liberties * 0.15
        + rule_of_law * 0.1;

    DemocracyScore {
        score: weighted.round() as u32,
        dimensions: DemocracyDimensions {
            media_freedom,
            electoral_process,
            civil_liberties,
            rule_of_law,
            deliberation,
        },
    }
}

/// Balance between left and right reads, plus a bonus per centrist read.
fn deliberation(articles: &[&Article]) -> f64 {
    let scores: Vec<f64> = articles.iter().filter_map(|a| a.political_score).collect();
    if scores.is_empty() {
        return BASE;
    }

    let left = scores.iter().filter(|&&s| s < 0.0).count();
    let right = scores.iter().filter(|&&s| s > 0.0).count();
    let center = scores
        .iter()
        .filter(|&&s| (-CENTER_BAND..=CENTER_BAND).contains(&s))
        .count();

    let (min, max) = (left.min(right), left.max(right));
    let balance = if max > 0 { min as f64 / max as f64 } else { 0.0 };

    (BASE + balance * 30.0 + center as f64 * 2.0).min(CAP)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::{history_item, read};

    #[test]
    fn empty_history_is_neutral() {
        let result = calculate_democracy_score(&[]);
        assert_eq!(result.score, 50);
        assert_eq!(result.dimensions.media_freedom, 50.0);
        assert_eq!(result.dimensions.electoral_process, 50.0);
        assert_eq!(result.dimensions.civil_liberties, 50.0);
        assert_eq!(result.dimensions.rule_of_law, 50.0);
        assert_eq!(result.dimensions.deliberation, 50.0);
    }

    #[test]
    fn balanced_diverse_history() {
        let sources = ["A", "B", "C", "D", "E"];
        let history: Vec<_> = (0..10)
            .map(|i| {
                let score = if i < 5 { -5.0 } else { 5.0 };
                read(sources[i % 5], Some(score))
            })
            .collect();

        let result = calculate_democracy_score(&history);

        assert_eq!(result.dimensions.deliberation, 80.0);
        assert_eq!(result.dimensions.media_freedom, 100.0);
        assert_eq!(result.dimensions.electoral_process, 80.0);
        assert_eq!(result.dimensions.civil_liberties, 75.0);
        assert_eq!(result.dimensions.rule_of_law, 70.0);
        assert_eq!(result.score, 84);
    }

    #[test]
    fn unscored_articles_leave_deliberation_neutral() {
        let history = vec![read("A", None), read("B", None)];
        let result = calculate_democracy_score(&history);

        assert_eq!(result.dimensions.deliberation, 50.0);
        assert_eq!(result.dimensions.media_freedom, 70.0);
    }

    #[test]
    fn center_reads_add_to_deliberation() {
        // One-sided history: balance 0, but three centrist reads
        let history = vec![
            read("A", Some(-1.0)),
            read("A", Some(-2.0)),
            read("A", Some(0.0)),
            read("A", Some(-8.0)),
        ];
        let result = calculate_democracy_score(&history);
        assert_eq!(result.dimensions.deliberation, 56.0);
    }

    #[test]
    fn deliberation_and_media_freedom_are_capped() {
        let history: Vec<_> = (0..40)
            .map(|i| read(&format!("S{i}"), Some(if i % 2 == 0 { 1.0 } else { -1.0 })))
            .collect();
        let result = calculate_democracy_score(&history);

        assert_eq!(result.dimensions.deliberation, 100.0);
        assert_eq!(result.dimensions.media_freedom, 100.0);
        assert_eq!(result.score, 90);
    }

    #[test]
    fn entries_without_article_are_ignored() {
        let history = vec![history_item(None), history_item(None)];
        let result = calculate_democracy_score(&history);
        assert_eq!(result, DemocracyScore::default());
    }

    #[test]
    fn recomputation_is_identical() {
        let history = vec![read("A", Some(4.0)), read("B", Some(-4.5))];
        assert_eq!(
            calculate_democracy_score(&history),
            calculate_democracy_score(&history)
        );
    }
}
