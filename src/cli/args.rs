use clap::{Parser, Subcommand, ValueEnum};

use crate::models::VoteType;

const DEFAULT_PAGE_SIZE: usize = 20;

/// Balanced-news dashboard backend. Prints JSON on stdout.
#[derive(Parser, Debug)]
#[command(name = "democracy-lens", version, about, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Create a guest identity
    NewGuest,
    /// Fetch and score NYT top stories
    Refresh { section: Option<String> },
    /// Search NYT and score the results
    Search {
        query: String,
        #[arg(default_value_t = 1)]
        page: u32,
    },
    /// List stored articles
    Articles {
        #[arg(default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,
        #[arg(default_value_t = 0)]
        offset: usize,
    },
    /// Search stored articles
    Find {
        query: String,
        #[arg(default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,
    },
    /// Record a read
    Read { article_id: i64, guest_id: String },
    /// Show reading history
    History {
        guest_id: String,
        #[arg(default_value_t = DEFAULT_PAGE_SIZE)]
        limit: usize,
        #[arg(default_value_t = 0)]
        offset: usize,
    },
    /// Remove one history entry
    Forget { history_id: i64 },
    /// Remove all history entries
    ClearHistory { guest_id: String },
    /// Democracy score, streaks and challenges
    Dashboard { guest_id: String },
    /// Article locations
    Map { guest_id: Option<String> },
    /// List comments
    Comments { article_id: i64 },
    /// Post a comment or a reply
    Comment {
        article_id: i64,
        guest_id: String,
        text: String,
        parent_id: Option<i64>,
    },
    /// Replace a comment's text
    EditComment {
        comment_id: i64,
        guest_id: String,
        text: String,
    },
    /// Delete a comment and its replies
    DeleteComment { comment_id: i64, guest_id: String },
    /// Re-run comment analysis now
    AnalyzeComment { comment_id: i64, guest_id: String },
    /// Vote on an article; `none` withdraws the vote
    Vote {
        article_id: i64,
        guest_id: String,
        vote: VoteChoice,
    },
    /// Summarize an article
    Summarize { article_id: i64 },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteChoice {
    Up,
    Down,
    None,
}

impl From<VoteChoice> for Option<VoteType> {
    fn from(choice: VoteChoice) -> Self {
        match choice {
            VoteChoice::Up => Some(VoteType::Up),
            VoteChoice::Down => Some(VoteType::Down),
            VoteChoice::None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;

    fn parse(line: &str) -> Result<Command, clap::Error> {
        let argv = std::iter::once("democracy-lens").chain(line.split_whitespace());
        Cli::try_parse_from(argv).map(|cli| cli.command)
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case("new-guest", Command::NewGuest)]
    #[case("refresh", Command::Refresh { section: None })]
    #[case("refresh politics", Command::Refresh { section: Some("politics".into()) })]
    #[case("search climate", Command::Search { query: "climate".into(), page: 1 })]
    #[case("search climate 3", Command::Search { query: "climate".into(), page: 3 })]
    #[case("articles", Command::Articles { limit: 20, offset: 0 })]
    #[case("articles 5 10", Command::Articles { limit: 5, offset: 10 })]
    #[case("read 7 guest_x", Command::Read { article_id: 7, guest_id: "guest_x".into() })]
    #[case("clear-history guest_x", Command::ClearHistory { guest_id: "guest_x".into() })]
    #[case("map", Command::Map { guest_id: None })]
    #[case("comment 1 guest_x hello 4", Command::Comment {
        article_id: 1,
        guest_id: "guest_x".into(),
        text: "hello".into(),
        parent_id: Some(4),
    })]
    #[case("vote 3 guest_x down", Command::Vote {
        article_id: 3,
        guest_id: "guest_x".into(),
        vote: VoteChoice::Down,
    })]
    #[case("vote 3 guest_x none", Command::Vote {
        article_id: 3,
        guest_id: "guest_x".into(),
        vote: VoteChoice::None,
    })]
    fn parses_commands(#[case] line: &str, #[case] expected: Command) {
        assert_eq!(parse(line).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("launch")]
    #[case("read seven guest_x")]
    #[case("read 7")]
    #[case("vote 3 guest_x sideways")]
    #[case("articles ten")]
    #[case("new-guest extra")]
    fn rejects_bad_input(#[case] line: &str) {
        assert!(parse(line).is_err());
    }

    #[test]
    fn comment_text_keeps_spaces() {
        let argv = ["democracy-lens", "comment", "1", "guest_x", "taxes are too high"];
        match Cli::try_parse_from(argv).map(|cli| cli.command) {
            Ok(Command::Comment { text, parent_id, .. }) => {
                assert_eq!(text, "taxes are too high");
                assert_eq!(parent_id, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn vote_choice_maps_to_stored_vote() {
        assert_eq!(Option::<VoteType>::from(VoteChoice::Up), Some(VoteType::Up));
        assert_eq!(Option::<VoteType>::from(VoteChoice::None), None);
    }
}
