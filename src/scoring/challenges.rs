use std::collections::HashSet;

use chrono::{NaiveDate, TimeZone};

use crate::models::{Article, Challenge, ChallengeStatus, ReadingHistoryItem};

use super::streaks::read_dates;

/// Whether today's reads satisfy a daily challenge.
pub fn is_challenge_complete<Tz: TimeZone>(
    challenge: Challenge,
    history: &[ReadingHistoryItem],
    today: NaiveDate,
    tz: &Tz,
) -> bool {
    let todays_articles: Vec<&Article> = history
        .iter()
        .zip(read_dates(history, tz))
        .filter(|(_, date)| *date == today)
        .filter_map(|(item, _)| item.article.as_ref())
        .collect();

    match challenge {
        Challenge::OpposingViewpoints => {
            let has_left = todays_articles
                .iter()
                .any(|a| a.political_score.is_some_and(|s| s < 0.0));
            let has_right = todays_articles
                .iter()
                .any(|a| a.political_score.is_some_and(|s| s > 0.0));
            has_left && has_right
        }
        Challenge::NewSources => {
            todays_articles
                .iter()
                .map(|a| a.source.as_str())
                .collect::<HashSet<_>>()
                .len()
                >= 3
        }
        // Stand-in until reads can be checked against fact-check sources
        Challenge::FactCheck => todays_articles.len() >= 3,
    }
}

pub fn challenge_statuses<Tz: TimeZone>(
    history: &[ReadingHistoryItem],
    today: NaiveDate,
    tz: &Tz,
) -> Vec<ChallengeStatus> {
    Challenge::ALL
        .into_iter()
        .map(|challenge| ChallengeStatus {
            challenge,
            title: challenge.title(),
            completed: is_challenge_complete(challenge, history, today, tz),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::test_support::{date, read_on, with_article};
    use chrono::Utc;

    #[test]
    fn empty_history_completes_nothing() {
        let statuses = challenge_statuses(&[], date(2026, 10, 18), &Utc);
        assert_eq!(statuses.len(), 3);
        assert!(statuses.iter().all(|s| !s.completed));
    }

    #[test]
    fn opposing_viewpoints_needs_both_sides_today() {
        let today = date(2026, 10, 18);
        let yesterday = date(2026, 10, 17);

        let one_sided = vec![
            with_article(read_on(today, 9), "CNN", Some(-6.0)),
            with_article(read_on(yesterday, 9), "Fox News", Some(7.0)),
        ];
        assert!(!is_challenge_complete(
            Challenge::OpposingViewpoints,
            &one_sided,
            today,
            &Utc
        ));

        let balanced = vec![
            with_article(read_on(today, 9), "CNN", Some(-6.0)),
            with_article(read_on(today, 10), "Fox News", Some(7.0)),
        ];
        assert!(is_challenge_complete(
            Challenge::OpposingViewpoints,
            &balanced,
            today,
            &Utc
        ));
    }

    #[test]
    fn new_sources_counts_distinct_names() {
        let today = date(2026, 10, 18);
        let history = vec![
            with_article(read_on(today, 8), "BBC", None),
            with_article(read_on(today, 9), "BBC", None),
            with_article(read_on(today, 10), "NPR", None),
        ];

        assert!(!is_challenge_complete(Challenge::NewSources, &history, today, &Utc));
        assert!(is_challenge_complete(Challenge::FactCheck, &history, today, &Utc));

        let mut more = history.clone();
        more.push(with_article(read_on(today, 11), "Reuters", None));
        assert!(is_challenge_complete(Challenge::NewSources, &more, today, &Utc));
    }
}
