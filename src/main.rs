use serde::Serialize;
use serde_json::json;

mod ai;
mod app;
mod cli;
mod config;
mod db;
mod error;
mod models;
mod news;
mod scoring;

use app::App;
use clap::Parser;
use cli::{Cli, Command};
use config::Config;
use error::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (only show warnings and errors by default)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config::load()?;
    let mut app = App::new(&config).await?;

    let result = run(&mut app, cli.command).await;

    // Detached analysis must land before the process exits
    app.finish_background().await;

    match result {
        Ok(output) => {
            println!("{}", output);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

async fn run(app: &mut App, command: Command) -> Result<String> {
    match command {
        Command::NewGuest => to_json(&app.new_guest().await?),
        Command::Refresh { section } => to_json(&app.refresh_top_stories(section.as_deref()).await?),
        Command::Search { query, page } => to_json(&app.search_news(&query, page).await?),
        Command::Articles { limit, offset } => to_json(&app.articles(limit, offset).await?),
        Command::Find { query, limit } => to_json(&app.find_articles(&query, limit).await?),
        Command::Read {
            article_id,
            guest_id,
        } => to_json(&app.track_read(article_id, &guest_id).await?),
        Command::History {
            guest_id,
            limit,
            offset,
        } => to_json(&app.history(&guest_id, limit, offset).await?),
        Command::Forget { history_id } => {
            app.delete_history_entry(history_id).await?;
            to_json(&json!({ "success": true }))
        }
        Command::ClearHistory { guest_id } => {
            let removed = app.clear_history(&guest_id).await?;
            to_json(&json!({ "success": true, "removed": removed }))
        }
        Command::Dashboard { guest_id } => to_json(&app.dashboard(&guest_id).await?),
        Command::Map { guest_id } => to_json(&app.article_locations(guest_id.as_deref()).await?),
        Command::Comments { article_id } => to_json(&app.list_comments(article_id).await?),
        Command::Comment {
            article_id,
            guest_id,
            text,
            parent_id,
        } => to_json(&app.post_comment(article_id, &guest_id, &text, parent_id).await?),
        Command::EditComment {
            comment_id,
            guest_id,
            text,
        } => to_json(&app.edit_comment(comment_id, &guest_id, &text).await?),
        Command::DeleteComment {
            comment_id,
            guest_id,
        } => {
            app.delete_comment(comment_id, &guest_id).await?;
            to_json(&json!({ "success": true }))
        }
        Command::AnalyzeComment {
            comment_id,
            guest_id,
        } => to_json(&app.analyze_comment(comment_id, &guest_id).await?),
        Command::Vote {
            article_id,
            guest_id,
            vote,
        } => to_json(&app.vote(article_id, &guest_id, vote.into()).await?),
        Command::Summarize { article_id } => {
            let summary = app.summarize_article(article_id).await?;
            to_json(&json!({ "articleId": article_id, "summary": summary }))
        }
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
