use anyhow::{bail, Context, Result};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use trashtag_lka::config::{Config, LogFormat};
use trashtag_lka::device::Devices;
use trashtag_lka::gateway;
use trashtag_lka::location::CoordinateSource;
use trashtag_lka::screens::challenges::ChallengesScreen;
use trashtag_lka::screens::comments::CommentsScreen;
use trashtag_lka::screens::feed::FeedScreen;
use trashtag_lka::screens::map::MapScreen;
use trashtag_lka::screens::profile::ProfileScreen;
use trashtag_lka::screens::{AppContext, DataSource};

const USAGE: &str = "usage: trashtag [feed | map | comments <post-id> | challenges | profile]";

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing(config.log_format)?;
    config.validate().context("Invalid configuration")?;

    info!(
        backend_configured = config.is_backend_configured(),
        demo_mode = config.demo_mode,
        "Configuration loaded"
    );

    let gateway = gateway::connect(&config).context("Failed to create backend client")?;
    let ctx = AppContext::new(gateway, config);
    let devices = Devices::headless();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        [] | ["feed"] => show_feed(ctx).await,
        ["map"] => show_map(ctx, &devices).await,
        ["comments", post_id] => show_comments(ctx, post_id).await,
        ["challenges"] => {
            show_challenges();
            Ok(())
        }
        ["profile"] => show_profile(ctx).await,
        _ => bail!(USAGE),
    }
}

fn source_note(source: Option<DataSource>) -> &'static str {
    match source {
        Some(DataSource::Fallback) => " (demo data)",
        _ => "",
    }
}

async fn show_feed(ctx: AppContext) -> Result<()> {
    let mut screen = FeedScreen::new(ctx);
    screen.load().await.context("Failed to load feed")?;

    println!("Feed{}", source_note(screen.source()));
    if screen.shows_empty_state() {
        println!("No posts yet");
    }
    for post in screen.posts() {
        println!(
            "[{}] {} · {} · {}",
            post.badge(),
            post.author.name,
            post.location,
            screen.time_label(post)
        );
        println!("    {}", post.caption);
        println!(
            "    ♥ {}  💬 {}  {}",
            post.likes_count,
            post.comments_count,
            post.hashtags.join(" ")
        );
    }
    Ok(())
}

async fn show_map(ctx: AppContext, devices: &Devices) -> Result<()> {
    let mut screen = MapScreen::new(ctx, devices);
    if let Err(e) = screen.locate_user().await {
        info!(error = %e, "Showing map around the reference point");
    }
    screen.load().await.context("Failed to load map")?;

    let stats = screen.stats();
    println!(
        "Cleanup map{}: {} locations, {} beaches, {} parks",
        source_note(screen.source()),
        stats.total,
        stats.beaches,
        stats.parks
    );
    for location in screen.visible() {
        let approximate = if location.coordinate_source == CoordinateSource::Approximate {
            " (approximate)"
        } else {
            ""
        };
        println!(
            "{} {} [{}] {:.4}, {:.4}{approximate} by {}",
            location.kind.icon(),
            location.name,
            location.kind.label(),
            location.coordinates.latitude,
            location.coordinates.longitude,
            location.contributor
        );
    }
    Ok(())
}

async fn show_comments(ctx: AppContext, post_id: &str) -> Result<()> {
    let mut screen = CommentsScreen::new(ctx, post_id);
    screen.load().await.context("Failed to load comments")?;

    if let Some(post) = screen.post() {
        println!(
            "{} · {}{}",
            post.caption,
            post.location,
            source_note(screen.source())
        );
    }
    for comment in screen.comments() {
        println!(
            "  {} ({}): {}",
            comment.author.name,
            screen.time_label(comment),
            comment.content
        );
    }
    Ok(())
}

fn show_challenges() {
    let screen = ChallengesScreen::new();
    println!("Challenges");
    for challenge in screen.challenges() {
        println!(
            "  {} [{}] {} {:.0}% · {} · {}",
            challenge.title,
            challenge.period.as_str(),
            challenge.progress_label(),
            challenge.progress_percent(),
            challenge.reward,
            challenge.deadline
        );
    }
    println!("Leaderboard");
    for entry in screen.leaderboard() {
        println!("  #{} {} · {}", entry.rank, entry.name, entry.summary());
    }
}

async fn show_profile(ctx: AppContext) -> Result<()> {
    let mut screen = ProfileScreen::new(ctx);
    screen.load().await.context("Failed to load profile")?;

    if let Some(profile) = screen.profile() {
        println!(
            "{} · {} · {}{}",
            profile.name,
            profile.city,
            profile.rank,
            source_note(screen.source())
        );
        println!(
            "  {} cleanups · {} likes · {} points · joined {}",
            profile.total_cleanups, profile.total_likes, profile.total_points, profile.join_date
        );
    }
    for achievement in screen.achievements() {
        println!(
            "  {} {}: {}/{}",
            if achievement.unlocked { "★" } else { "☆" },
            achievement.title,
            achievement.progress,
            achievement.max_progress
        );
    }
    Ok(())
}

fn init_tracing(format: LogFormat) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,trashtag_lka=debug"));

    match format {
        LogFormat::Json => {
            // Structured JSON logging
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {e}"))?;
        }
    }

    Ok(())
}
