#[macro_use]
extern crate log;

use std::io::Write;
use std::time::Duration;

use clap::{Parser, Subcommand};
use mangamark::{
    application::worker,
    domain::{
        repositories::tracking::TrackingRepository,
        services::{bookmark::BookmarkService, tracking::TrackingService},
    },
    infrastructure::{
        config::Config,
        database,
        domain::repositories::{
            bookmark::BookmarkRepositoryImpl, feed::FeedRepositoryImpl,
            tracking::TrackingRepositoryImpl,
        },
    },
};
use mangamark_reddit::{AuthSession, RedditClient};

#[derive(Parser)]
struct Opts {
    /// Path to config file
    #[clap(long)]
    config: Option<String>,
    #[clap(subcommand)]
    subcmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bookmark a title for tracking
    Add {
        name: String,
        #[clap(long)]
        alternate_name: Option<String>,
        #[clap(long)]
        cover_url: Option<String>,
    },
    /// List bookmarked titles
    List,
    /// Show the recorded events for a title
    History { name: String },
    /// Run a single polling cycle
    Run,
    /// Poll the feed periodically
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let mut log_builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        if let Ok(level) = std::env::var("MANGAMARK_LOG") {
            log_builder.parse_filters(&format!("mangamark={level},mangamark_reddit={level}"));
        }
    }
    log_builder.init();

    let opts: Opts = Opts::parse();
    let config = Config::open(opts.config)?;

    debug!("config: {:?}", config);

    let pool = database::establish_connection(&config.database_path, config.create_database).await?;

    let bookmark_repo = BookmarkRepositoryImpl::new(pool.clone());
    let tracking_repo = TrackingRepositoryImpl::new(pool.clone());

    match opts.subcmd {
        Command::Add {
            name,
            alternate_name,
            cover_url,
        } => {
            let bookmark_svc = BookmarkService::new(bookmark_repo);
            let bookmark = bookmark_svc
                .add_bookmark(&name, alternate_name.as_deref(), cover_url.as_deref())
                .await?;
            println!("bookmarked {} (id {})", bookmark.name, bookmark.id);
        }
        Command::List => {
            let bookmark_svc = BookmarkService::new(bookmark_repo);
            for bookmark in bookmark_svc.list_bookmarks().await? {
                match &bookmark.alternate_name {
                    Some(alternate) if !alternate.is_empty() => {
                        println!("{}\t{} ({alternate})", bookmark.id, bookmark.name)
                    }
                    _ => println!("{}\t{}", bookmark.id, bookmark.name),
                }
            }
        }
        Command::History { name } => {
            let bookmark_svc = BookmarkService::new(bookmark_repo);
            let bookmark = bookmark_svc.get_bookmark(&name).await?;
            for event in tracking_repo.get_events_by_manga_id(bookmark.id).await? {
                match event.chapter.as_str() {
                    "" => println!("{}\t{}", event.observed_at, event.source_url),
                    chapter => {
                        println!("{}\tch {}\t{}", event.observed_at, chapter, event.source_url)
                    }
                }
            }
        }
        Command::Run => {
            let feed_repo = FeedRepositoryImpl::new(build_feed_client(&config).await?);
            let tracking_svc = TrackingService::new(bookmark_repo, tracking_repo, feed_repo);

            let summary = tracking_svc.run_cycle().await?;
            println!(
                "{} titles checked, {} failed, {} new events",
                summary.titles_checked, summary.titles_failed, summary.new_events
            );
        }
        Command::Watch => {
            let feed_repo = FeedRepositoryImpl::new(build_feed_client(&config).await?);
            let tracking_svc = TrackingService::new(bookmark_repo, tracking_repo, feed_repo);

            let (_command_tx, worker_handle) =
                worker::updates::start(config.update_interval, tracking_svc);

            tokio::select! {
                _ = worker_handle => {
                    info!("update worker quit");
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("ctrl+c signal");
                }
            }
        }
    }

    info!("closing database...");
    pool.close().await;

    Ok(())
}

/// Builds the feed client, running the interactive authorization flow first
/// when credentials are configured. The token lives for this process only.
async fn build_feed_client(config: &Config) -> Result<RedditClient, anyhow::Error> {
    let mut client = RedditClient::new(
        &config.feed_base_url,
        &config.board,
        &config.flair,
        &config.user_agent,
        Duration::from_secs(config.request_timeout),
    )?;

    if let Some(reddit) = &config.reddit {
        let mut session = AuthSession::new(
            &reddit.auth_base_url,
            reddit.client_id.clone(),
            reddit.client_secret.clone(),
            &reddit.redirect_uri,
            &reddit.scope,
            &config.user_agent,
            Duration::from_secs(config.request_timeout),
        )?;

        let request = session.begin_authorization();
        session.probe_authorization(&request).await?;

        println!("open the following url in a browser and authorize the app:");
        println!("{}", request.url);

        let state = prompt("state from the redirect: ")?;
        let code = prompt("code from the redirect: ")?;

        let token = session.complete_authorization(state.trim(), code.trim()).await?;
        info!("authorized, token expires in {}s", token.expires_in);

        client.set_access_token(Some(token.access_token));
    }

    Ok(client)
}

fn prompt(label: &str) -> Result<String, anyhow::Error> {
    print!("{label}");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;

    Ok(line)
}
