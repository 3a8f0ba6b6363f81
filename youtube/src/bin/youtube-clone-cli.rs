use clap::{Parser, Subcommand, ValueEnum};
use jiff::Timestamp;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_clone_api::auth_utils::AuthEnvironment;
use youtube_clone_api::config::Config;
use youtube_clone_api::format::{format_number, format_time_ago};
use youtube_clone_api::store::{KeyValueStore, keys};
use youtube_clone_api::youtube_api::YouTubeClient;
use youtube_clone_api::{
    Channel, Comment, Lookup, Page, QuotaStatus, SearchOptions, Video, resolve_api_key,
    setup_service,
};

/// Browse YouTube from the terminal, with fallback data when the API quota runs out.
#[derive(Parser, Debug)]
#[command(name = "youtube-clone-cli", version)]
struct Cli {
    /// YouTube Data API key [env: YOUTUBE_API_KEY]. A key saved with `set-key` takes precedence.
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// API root [env: YOUTUBE_API_BASE_URL]
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Region of trending videos [env: YOUTUBE_REGION_CODE, default: US]
    #[arg(long, global = true)]
    region: Option<String>,

    /// Page size of list commands [env: YOUTUBE_MAX_RESULTS, default: 20]
    #[arg(long, global = true)]
    max_results: Option<u32>,

    /// Store file for settings, quota state and fallback data [env: YOUTUBE_CLONE_STORE]
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Most popular videos in the region
    Trending {
        #[arg(long)]
        page_token: Option<String>,
    },
    /// Search for videos
    Search {
        query: String,
        /// relevance, date, viewCount, rating or title
        #[arg(long, default_value = "relevance")]
        order: String,
        #[arg(long)]
        page_token: Option<String>,
        /// Only videos published after this instant (RFC 3339)
        #[arg(long)]
        published_after: Option<Timestamp>,
    },
    /// Details of one video
    Video { video_id: String },
    /// Details of one channel
    Channel { channel_id: String },
    /// A channel's uploads, newest first
    ChannelVideos {
        channel_id: String,
        #[arg(long)]
        page_token: Option<String>,
    },
    /// Top-level comments on a video
    Comments {
        video_id: String,
        #[arg(long)]
        page_token: Option<String>,
    },
    /// Quota usage and rate-limit state
    Status,
    /// Force fallback data on or off
    Mock { state: Toggle },
    /// Clear the rate-limit latch
    ResetRateLimit,
    /// Reset quota state (fallback data is forced on afterwards)
    ResetAll,
    /// Regenerate the fallback data now
    RefreshMock,
    /// Save an API key
    SetKey { key: String },
    /// Check that an API key works (the saved or configured one by default)
    TestKey { key: Option<String> },
    /// Whether Google sign-in is likely to work on a hostname
    AuthCheck { hostname: Option<String> },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Toggle {
    On,
    Off,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(api_key) = &cli.api_key {
        config.api_key = Some(api_key.clone());
    }
    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(region) = &cli.region {
        config.region_code = region.clone();
    }
    if let Some(max_results) = cli.max_results {
        config.max_results = max_results;
    }
    if let Some(store) = &cli.store {
        config.store_path = Some(store.clone());
    }
    let store = config.open_store();

    run(&cli, &config, store).await
}

async fn run(cli: &Cli, config: &Config, store: Arc<dyn KeyValueStore>) -> eyre::Result<()> {
    let service = setup_service(config, Arc::clone(&store));
    let now = Timestamp::now();

    match &cli.command {
        Command::Trending { page_token } => {
            let page = service.trending_videos(page_token.as_deref()).await;
            print_videos(&page, cli.json, now)?;
        }
        Command::Search {
            query,
            order,
            page_token,
            published_after,
        } => {
            let options = SearchOptions {
                order: order.clone(),
                page_token: page_token.clone(),
                published_after: *published_after,
            };
            let page = service.search_videos(query, &options).await;
            print_videos(&page, cli.json, now)?;
        }
        Command::Video { video_id } => {
            let lookup = service.video_details(video_id).await;
            print_video(&lookup, cli.json, now)?;
        }
        Command::Channel { channel_id } => {
            let lookup = service.channel_details(channel_id).await;
            print_channel(&lookup, cli.json)?;
        }
        Command::ChannelVideos {
            channel_id,
            page_token,
        } => {
            let page = service
                .channel_videos(channel_id, page_token.as_deref())
                .await;
            print_videos(&page, cli.json, now)?;
        }
        Command::Comments {
            video_id,
            page_token,
        } => {
            let page = service
                .video_comments(video_id, page_token.as_deref())
                .await;
            print_comments(&page, cli.json, now)?;
        }
        Command::Status => {
            let status = service.tracker().status();
            print_status(&status, service.tracker().manual_override(), cli.json, now)?;
        }
        Command::Mock { state } => {
            let status = service
                .tracker()
                .set_manual_override(matches!(state, Toggle::On));
            print_status(&status, service.tracker().manual_override(), cli.json, now)?;
        }
        Command::ResetRateLimit => {
            let status = service.tracker().reset_rate_limit();
            print_status(&status, service.tracker().manual_override(), cli.json, now)?;
        }
        Command::ResetAll => {
            let status = service.tracker().reset_all();
            print_status(&status, service.tracker().manual_override(), cli.json, now)?;
        }
        Command::RefreshMock => {
            let dataset = service.fallback().refresh()?;
            println!(
                "generated {} trending videos, {} search results, {} comments",
                dataset.trending_videos.len(),
                dataset.search_results.len(),
                dataset.comments.len()
            );
        }
        Command::SetKey { key } => {
            store.set(keys::API_KEY, key.trim())?;
            println!("API key saved. Run `mock off` to switch back to live data.");
        }
        Command::TestKey { key } => {
            let Some(key) = key
                .clone()
                .or_else(|| resolve_api_key(config, store.as_ref()))
            else {
                eyre::bail!("no API key given, saved or configured");
            };
            let client = YouTubeClient::new(key, reqwest::Client::new())
                .with_base_url(&config.base_url);
            let check = client.validate_api_key().await;
            println!("{}", check.message);
            if !check.success {
                std::process::exit(1);
            }
        }
        Command::AuthCheck { hostname } => {
            let env = AuthEnvironment::from_env(hostname.clone());
            let domain = env.current_domain().unwrap_or("(none)");
            println!("domain:               {domain}");
            println!(
                "auth domain:          {}",
                env.firebase_auth_domain().unwrap_or("(not configured)")
            );
            println!("preview environment:  {}", env.is_preview_environment());
            println!("likely authorized:    {}", env.is_domain_likely_authorized());
            println!(
                "google sign-in:       {}",
                if env.should_disable_google_sign_in() {
                    "disabled"
                } else {
                    "enabled"
                }
            );
            let domains = env.domains_to_authorize();
            if !domains.is_empty() {
                println!("domains to authorize: {}", domains.join(", "));
            }
        }
    }

    service.fallback().wait_for_refresh().await;
    Ok(())
}

fn source_label(using_mock: bool) -> &'static str {
    if using_mock {
        "fallback data"
    } else {
        "live"
    }
}

fn print_videos(page: &Page<Video>, json: bool, now: Timestamp) -> eyre::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&page.items)?);
        return Ok(());
    }

    for video in &page.items {
        println!("{}", video.title);
        println!(
            "    {} | {} views | {}",
            video.channel_title,
            format_number(&video.view_count),
            format_time_ago(video.published_at, now)
        );
        println!("    https://www.youtube.com/watch?v={}", video.id);
    }
    print_footer(page.items.len(), page.next_page_token.as_deref(), page.using_mock);
    Ok(())
}

fn print_video(lookup: &Lookup<Video>, json: bool, now: Timestamp) -> eyre::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&lookup.item)?);
        return Ok(());
    }

    match &lookup.item {
        Some(video) => {
            println!("{}", video.title);
            println!(
                "{} | {} views | {}",
                video.channel_title,
                format_number(&video.view_count),
                format_time_ago(video.published_at, now)
            );
            println!();
            println!("{}", video.description);
        }
        None => println!("video not found"),
    }
    println!("({})", source_label(lookup.using_mock));
    Ok(())
}

fn print_channel(lookup: &Lookup<Channel>, json: bool) -> eyre::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&lookup.item)?);
        return Ok(());
    }

    match &lookup.item {
        Some(channel) => {
            println!("{}", channel.title);
            println!(
                "{} subscribers | {} videos",
                format_number(&channel.subscriber_count),
                format_number(&channel.video_count)
            );
            println!();
            println!("{}", channel.description);
        }
        None => println!("channel not found"),
    }
    println!("({})", source_label(lookup.using_mock));
    Ok(())
}

fn print_comments(page: &Page<Comment>, json: bool, now: Timestamp) -> eyre::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&page.items)?);
        return Ok(());
    }

    for comment in &page.items {
        println!(
            "{} ({}, {} likes)",
            comment.author_name,
            format_time_ago(comment.published_at, now),
            format_number(&comment.like_count)
        );
        println!("    {}", comment.text);
    }
    print_footer(page.items.len(), page.next_page_token.as_deref(), page.using_mock);
    Ok(())
}

fn print_footer(count: usize, next_page_token: Option<&str>, using_mock: bool) {
    println!();
    match next_page_token {
        Some(token) => println!(
            "{count} results ({}), next page: --page-token {token}",
            source_label(using_mock)
        ),
        None => println!("{count} results ({})", source_label(using_mock)),
    }
}

fn print_status(
    status: &QuotaStatus,
    manual_override: bool,
    json: bool,
    now: Timestamp,
) -> eyre::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(status)?);
        return Ok(());
    }

    println!(
        "quota used:     {} / {}",
        format_number(&status.quota_used.to_string()),
        format_number(&status.quota_limit.to_string())
    );
    println!("rate limited:   {}", status.is_rate_limited);
    if let Some(hit_at) = status.rate_limit_hit_at {
        println!("limited since:  {}", format_time_ago(hit_at, now));
    }
    if let Some(reset_time) = status.reset_time {
        println!("resets at:      {reset_time}");
    }
    println!("manual mock:    {manual_override}");
    println!("serving:        {}", source_label(status.using_mock_data));
    Ok(())
}
