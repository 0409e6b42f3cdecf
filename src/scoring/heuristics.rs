use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MIN_SCORE: f64 = -10.0;
pub const MAX_SCORE: f64 = 10.0;
/// Wider jitter than the whole score range only ever lands on a bound.
pub const MAX_JITTER: f64 = MAX_SCORE - MIN_SCORE;

const KEYWORD_NUDGE: f64 = 0.5;

/// Tunable data behind the source-based fallback score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicTable {
    /// Half-width of the uniform noise added to every score.
    pub jitter: f64,
    pub left_keywords: Vec<String>,
    pub right_keywords: Vec<String>,
    pub source_bias: HashMap<String, f64>,
}

impl Default for HeuristicTable {
    fn default() -> Self {
        let source_bias = [
            ("CNN", -6.5),
            ("MSNBC", -7.8),
            ("New York Times", -5.2),
            ("Washington Post", -4.8),
            ("NPR", -3.5),
            ("BBC", -1.2),
            ("Reuters", 0.3),
            ("Associated Press", 0.1),
            ("Wall Street Journal", 3.8),
            ("Fox News", 7.2),
            ("Breitbart", 8.5),
            ("Daily Wire", 7.9),
        ]
        .into_iter()
        .map(|(name, bias)| (name.to_string(), bias))
        .collect();

        let words = |list: &[&str]| list.iter().map(|w| w.to_string()).collect();

        Self {
            jitter: 1.0,
            left_keywords: words(&[
                "progressive",
                "equity",
                "climate change",
                "social justice",
                "diversity",
                "inclusion",
            ]),
            right_keywords: words(&[
                "traditional",
                "freedom",
                "liberty",
                "tax cuts",
                "small government",
                "family values",
            ]),
            source_bias,
        }
    }
}

impl HeuristicTable {
    pub fn source_bias(&self, source: &str) -> f64 {
        self.source_bias.get(source).copied().unwrap_or(0.0)
    }

    /// Estimate political leaning from the source and a few keywords.
    ///
    /// Always returns a value in `[MIN_SCORE, MAX_SCORE]`. The jitter makes
    /// repeated calls differ unless `jitter` is zero.
    pub fn score<R: Rng + ?Sized>(
        &self,
        source: &str,
        title: &str,
        description: &str,
        rng: &mut R,
    ) -> f64 {
        let mut score = self.source_bias(source);

        if self.jitter.is_finite() && self.jitter > 0.0 {
            let jitter = self.jitter.min(MAX_JITTER);
            score += rng.gen_range(-jitter..=jitter);
        }

        let text = format!("{} {}", title, description).to_lowercase();

        for keyword in &self.left_keywords {
            if text.contains(&keyword.to_lowercase()) {
                score -= KEYWORD_NUDGE;
            }
        }
        for keyword in &self.right_keywords {
            if text.contains(&keyword.to_lowercase()) {
                score += KEYWORD_NUDGE;
            }
        }

        clamp_score(score)
    }
}

/// Clamp into the political score range; NaN collapses to neutral.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(MIN_SCORE, MAX_SCORE)
}
