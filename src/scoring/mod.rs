mod challenges;
mod democracy;
mod heuristics;
mod streaks;

pub use challenges::{challenge_statuses, is_challenge_complete};
pub use democracy::calculate_democracy_score;
pub use heuristics::{clamp_score, HeuristicTable, MAX_JITTER, MAX_SCORE, MIN_SCORE};
pub use streaks::reading_streak_data;
