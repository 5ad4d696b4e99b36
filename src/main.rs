use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::time::Duration;
use tokio::sync::watch;

use creel::agg::Scheduler;
use creel::config::{self, Config};
use creel::ops;
use creel::storage::Database;

#[derive(Parser, Debug)]
#[command(name = "creel", about = "Personal RSS aggregator", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a user and log in as them
    Register { name: String },
    /// Switch the current user
    Login { name: String },
    /// Delete every user, feed, follow and post
    Reset,
    /// List registered users
    Users,
    /// Poll followed feeds indefinitely, one feed per tick
    Agg {
        /// Time between polls, e.g. "30s", "1m", "1h10m"
        #[arg(value_parser = humantime::parse_duration)]
        interval: Duration,
    },
    /// Register a feed and follow it
    #[command(name = "addfeed")]
    AddFeed { name: String, url: String },
    /// List all registered feeds
    Feeds,
    /// Follow an already-registered feed
    Follow { url: String },
    /// Stop following a feed
    Unfollow { url: String },
    /// List the feeds the current user follows
    Following,
    /// Show recent posts from followed feeds
    Browse {
        /// Maximum number of posts to show
        #[arg(default_value_t = 2)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    // Set up config directory
    let config_dir = config::config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }
    let config_path = config_dir.join("config.toml");
    let mut config = Config::load(&config_path).context("Failed to load config")?;

    // Open database
    let db_path = config.database_path(&config_dir);
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = Database::open(db_path_str)
        .await
        .context("Failed to open database")?;

    match cli.command {
        Command::Register { name } => {
            let user = ops::register(&db, &name).await?;
            config.set_user(&config_path, &user.name)?;
            println!("User {} created and logged in", user.name);
        }
        Command::Login { name } => {
            let user = ops::login(&db, &name).await?;
            config.set_user(&config_path, &user.name)?;
            println!("Logged in as {}", user.name);
        }
        Command::Reset => {
            ops::reset(&db).await?;
            println!("All users, feeds and posts deleted");
        }
        Command::Users => {
            for user in ops::users(&db).await? {
                if config.current_user.as_deref() == Some(user.name.as_str()) {
                    println!("* {} (current)", user.name);
                } else {
                    println!("* {}", user.name);
                }
            }
        }
        Command::Agg { interval } => {
            let client = reqwest::Client::builder()
                .user_agent(concat!("creel/", env!("CARGO_PKG_VERSION")))
                .build()
                .context("Failed to build HTTP client")?;
            let scheduler = Scheduler::new(db.clone(), client, interval);
            let (shutdown_tx, shutdown_rx) = watch::channel(false);

            println!(
                "Collecting feeds every {} (ctrl-c to stop)",
                humantime::format_duration(interval)
            );
            let poller = tokio::spawn(async move { scheduler.run(shutdown_rx).await });

            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for ctrl-c")?;
            let _ = shutdown_tx.send(true);
            let _ = poller.await;
        }
        Command::AddFeed { name, url } => {
            let user = ops::require_user(&db, &config).await?;
            let feed = ops::add_feed(&db, &user, &name, &url).await?;
            println!("Feed {} added and followed ({})", feed.name, feed.url);
        }
        Command::Feeds => {
            let feeds = ops::feeds(&db).await?;
            if feeds.is_empty() {
                println!("There are no active feeds");
            }
            for (i, feed) in feeds.iter().enumerate() {
                println!(
                    "{}: {} ({}) added by {}",
                    i + 1,
                    feed.name,
                    feed.url,
                    feed.user_name
                );
            }
        }
        Command::Follow { url } => {
            let user = ops::require_user(&db, &config).await?;
            let follow = ops::follow(&db, &user, &url).await?;
            println!("{} is now following {}", follow.user_name, follow.feed_name);
        }
        Command::Unfollow { url } => {
            let user = ops::require_user(&db, &config).await?;
            ops::unfollow(&db, &user, &url).await?;
            println!("Unfollowed {}", url);
        }
        Command::Following => {
            let user = ops::require_user(&db, &config).await?;
            for follow in ops::following(&db, &user).await? {
                println!("* {}", follow.feed_name);
            }
        }
        Command::Browse { limit } => {
            let user = ops::require_user(&db, &config).await?;
            let posts = ops::browse(&db, &user, limit).await?;
            if posts.is_empty() {
                println!("No posts yet; follow a feed and run the agg command to collect some");
            }
            for post in posts {
                println!();
                println!(
                    "{} ({})",
                    post.title.as_deref().unwrap_or("(untitled)"),
                    post.feed_name
                );
                if let Some(description) = &post.description {
                    println!("{description}");
                }
                println!("{}", post.url);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_defaults_to_limit_two() {
        let cli = Cli::try_parse_from(["creel", "browse"]).unwrap();
        match cli.command {
            Command::Browse { limit } => assert_eq!(limit, 2),
            other => panic!("Expected Browse, got {other:?}"),
        }

        let cli = Cli::try_parse_from(["creel", "browse", "5"]).unwrap();
        match cli.command {
            Command::Browse { limit } => assert_eq!(limit, 5),
            other => panic!("Expected Browse, got {other:?}"),
        }
    }

    #[test]
    fn test_agg_interval_parses_compound_durations() {
        let cli = Cli::try_parse_from(["creel", "agg", "1h10m"]).unwrap();
        match cli.command {
            Command::Agg { interval } => assert_eq!(interval, Duration::from_secs(4200)),
            other => panic!("Expected Agg, got {other:?}"),
        }
    }

    #[test]
    fn test_agg_rejects_bad_interval_at_parse_time() {
        assert!(Cli::try_parse_from(["creel", "agg", "soon"]).is_err());
        assert!(Cli::try_parse_from(["creel", "browse", "two"]).is_err());
    }
}
