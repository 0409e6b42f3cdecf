mod article;
mod comment;
mod dashboard;
mod history;
mod location;

pub use article::{
    Article, ArticleText, ArticleWithVotes, NewArticle, SourceType, VoteCounts, VoteSummary, VoteType,
};
pub use comment::{Comment, CommentAnalysis, NewComment};
pub use dashboard::{
    CalendarDay, Challenge, ChallengeStatus, Dashboard, DemocracyDimensions, DemocracyScore,
    StreakData,
};
pub use history::{GuestUser, ReadingHistoryItem};
pub use location::{Coordinates, LocationExtraction, MapPin};
