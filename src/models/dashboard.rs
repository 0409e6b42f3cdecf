use chrono::NaiveDate;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemocracyDimensions {
    pub media_freedom: f64,
    pub electoral_process: f64,
    pub civil_liberties: f64,
    pub rule_of_law: f64,
    pub deliberation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DemocracyScore {
    pub score: u32,
    pub dimensions: DemocracyDimensions,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub day: u32,
    pub has_activity: bool,
    pub intensity: u8,
    pub is_today: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakData {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub days_in_month: Vec<CalendarDay>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Challenge {
    OpposingViewpoints,
    NewSources,
    FactCheck,
}

impl Challenge {
    pub const ALL: [Challenge; 3] = [
        Challenge::OpposingViewpoints,
        Challenge::NewSources,
        Challenge::FactCheck,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Challenge::OpposingViewpoints => "Explore Opposing Viewpoints",
            Challenge::NewSources => "Discover New Sources",
            Challenge::FactCheck => "Fact Check Challenge",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChallengeStatus {
    pub challenge: Challenge,
    pub title: &'static str,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub democracy: DemocracyScore,
    pub streaks: StreakData,
    pub challenges: Vec<ChallengeStatus>,
}
