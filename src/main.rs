use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::collections::{BTreeSet, HashSet};
use std::path::PathBuf;
use std::sync::Arc;

use newsdesk::app::NewsController;
use newsdesk::config::Config;
use newsdesk::model::{Article, ContentType, FilterUpdate, SortMode};
use newsdesk::remote::{NewsClient, NewsService};
use newsdesk::storage::{ArticleCache, BookmarkStore, Database, KvStore, StorageError};
use newsdesk::util::{
    article_time, describe_age, extract_youtube_id, fit_to_width, format_long, format_relative,
    sanitize_for_terminal, source_badge, truncate_text, unique_agents, validate_url_for_open,
    MAX_SEARCH_QUERY_LENGTH,
};

/// Width of the title column in list output.
const TITLE_WIDTH: usize = 60;

/// Get the config directory path (~/.config/newsdesk/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsdesk"))
}

#[derive(Parser, Debug)]
#[command(name = "newsdesk", about = "AI news reader backed by a local cache", version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List articles (default)
    List(ListArgs),
    /// Show one article by slug
    Show { slug: String },
    /// Open an article's first link in the browser
    Open { slug: String },
    /// Fetch new articles and merge them into the cache
    Refresh {
        /// Fail on fetch errors instead of falling back to the cache
        #[arg(long)]
        strict: bool,
    },
    /// Toggle the bookmark on an article id
    Bookmark { id: String },
    /// List bookmarked articles
    Bookmarks,
    /// Delete cached articles (bookmarks are kept)
    ClearCache,
    /// Show configuration and cache state
    Status,
}

#[derive(ClapArgs, Debug, Default)]
struct ListArgs {
    /// Case-insensitive text search
    #[arg(long, short)]
    query: Option<String>,

    /// Content type filter (video, article, wikipedia); repeatable
    #[arg(long = "type", value_name = "TYPE")]
    content_types: Vec<ContentType>,

    /// Source name filter, e.g. YouTube; repeatable
    #[arg(long = "source", value_name = "SOURCE")]
    sources: Vec<String>,

    /// Topic filter matched against tags; repeatable
    #[arg(long = "topic", value_name = "TOPIC")]
    topics: Vec<String>,

    /// Sort order (recent, watched, highlighted)
    #[arg(long, default_value_t = SortMode::Recent)]
    sort: SortMode,

    /// Only bookmarked articles
    #[arg(long)]
    bookmarked: bool,

    /// Use cached articles without contacting the backend
    #[arg(long)]
    offline: bool,

    /// Maximum number of rows
    #[arg(long, short = 'n', default_value_t = 20)]
    limit: usize,
}

impl ListArgs {
    fn filter_update(&self) -> FilterUpdate {
        FilterUpdate {
            content_types: Some(self.content_types.iter().copied().collect()),
            sources: Some(self.sources.iter().cloned().collect::<BTreeSet<_>>()),
            topics: Some(self.topics.iter().cloned().collect::<BTreeSet<_>>()),
            sort_by: Some(self.sort),
        }
    }
}

/// Everything a subcommand needs, wired from config.
struct Session {
    config: Config,
    db_path: PathBuf,
    service: NewsService,
    controller: NewsController,
}

async fn open_store(db_path: &std::path::Path) -> Result<Database> {
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    match Database::open(db_path_str).await {
        Ok(db) => Ok(db),
        Err(StorageError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of newsdesk appears to be using the cache. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => Err(anyhow::anyhow!("Failed to open database: {}", e)),
    }
}

async fn setup() -> Result<Session> {
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        tracing::info!(path = %config_dir.display(), "Created config directory");
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if let Err(e) =
            std::fs::set_permissions(&config_dir, std::fs::Permissions::from_mode(0o700))
        {
            tracing::warn!(
                path = %config_dir.display(),
                error = %e,
                "Failed to set config directory permissions to 0700"
            );
        }
    }

    let config = Config::load(&config_dir.join("config.toml"))
        .context("Failed to load config.toml")?
        .with_env()
        .context("Invalid backend URL")?;

    let db_path = config
        .database_path
        .clone()
        .unwrap_or_else(|| config_dir.join("newsdesk.db"));
    let store: Arc<dyn KvStore> = Arc::new(open_store(&db_path).await?);

    let client = NewsClient::new(&config).context("Failed to create HTTP client")?;
    let service = NewsService::new(client, ArticleCache::new(store.clone()));
    let controller =
        NewsController::new(service.clone(), BookmarkStore::new(store), config.search_debounce());

    Ok(Session {
        config,
        db_path,
        service,
        controller,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut ctx = setup().await?;

    match args.command.unwrap_or(Command::List(ListArgs {
        limit: 20,
        ..ListArgs::default()
    })) {
        Command::List(list) => cmd_list(&mut ctx, list).await,
        Command::Show { slug } => cmd_show(&mut ctx, &slug).await,
        Command::Open { slug } => cmd_open(&mut ctx, &slug).await,
        Command::Refresh { strict } => cmd_refresh(&mut ctx, strict).await,
        Command::Bookmark { id } => cmd_bookmark(&mut ctx, &id).await,
        Command::Bookmarks => cmd_bookmarks(&mut ctx).await,
        Command::ClearCache => {
            ctx.service.cache().clear().await;
            println!("Cache cleared.");
            Ok(())
        }
        Command::Status => cmd_status(&mut ctx).await,
    }
}

async fn cmd_list(ctx: &mut Session, list: ListArgs) -> Result<()> {
    let query = list.query.clone().unwrap_or_default();
    if query.chars().count() > MAX_SEARCH_QUERY_LENGTH {
        anyhow::bail!("Search query is too long (max {MAX_SEARCH_QUERY_LENGTH} characters)");
    }

    let controller = &mut ctx.controller;
    if list.offline {
        controller.load_local().await;
    } else {
        controller.initialize().await;
        controller.settle().await;
    }

    if controller.is_empty_state() {
        print_empty_state(ctx);
        return Ok(());
    }

    ctx.controller.set_search_query(query);
    ctx.controller.set_filters(list.filter_update());

    let controller = &ctx.controller;
    let now = Utc::now();
    let rows: Vec<&Article> = controller
        .state()
        .filtered()
        .iter()
        .filter(|a| !list.bookmarked || controller.is_bookmarked(&a.id))
        .take(list.limit)
        .collect();

    if rows.is_empty() {
        let state = controller.state();
        if list.bookmarked {
            println!("No bookmarked articles match.");
        } else if state.filters().is_unfiltered() && !state.search_query().is_empty() {
            println!("No articles match '{}'.", state.search_query());
        } else {
            println!("No articles match the current search and filters.");
        }
        return Ok(());
    }

    for article in rows {
        print_row(article, controller.is_bookmarked(&article.id), now);
    }
    Ok(())
}

fn print_row(article: &Article, bookmarked: bool, now: chrono::DateTime<Utc>) {
    let marker = if bookmarked { '*' } else { ' ' };
    let title = sanitize_for_terminal(&article.title);
    let agents: Vec<&str> = unique_agents(&article.source_links)
        .into_iter()
        .map(|agent| agent.as_str())
        .collect();
    let video = if article.has_video() { " [video]" } else { "" };
    println!(
        "{marker} {}  {:<16} {}{video}",
        fit_to_width(&title, TITLE_WIDTH),
        describe_age(article, now),
        agents.join(", "),
    );
    println!("    {}", article.slug);
}

fn print_empty_state(ctx: &Session) {
    println!("No articles available.");
    println!(
        "The backend at {} could not be reached and nothing is cached yet.",
        ctx.service.client().endpoint()
    );
    println!("Check that the news service is running, or set NEWSDESK_API_URL.");
}

/// Look up a slug in the cache first, refreshing once if it is unknown.
async fn resolve_article(controller: &mut NewsController, slug: &str) -> Result<Article> {
    controller.load_local().await;
    if controller.find_by_slug(slug).is_none() {
        tracing::debug!(slug, "Slug not cached, refreshing");
        controller.refresh();
        controller.settle().await;
    }
    controller
        .find_by_slug(slug)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("No article with slug '{}'", slug))
}

async fn cmd_show(ctx: &mut Session, slug: &str) -> Result<()> {
    let article = resolve_article(&mut ctx.controller, slug).await?;
    let bookmarked = ctx.controller.is_bookmarked(&article.id);

    println!("{}", sanitize_for_terminal(&article.title));
    if let Some(time) = article_time(&article) {
        println!("{}", format_long(time));
    }
    if !article.tags.is_empty() {
        println!("Tags: {}", article.tags.join(", "));
    }
    println!("Id: {}{}", article.id, if bookmarked { " (bookmarked)" } else { "" });
    println!();
    println!("{}", sanitize_for_terminal(&article.description));

    for section in &article.content {
        println!();
        if !section.heading.is_empty() {
            println!("## {}", sanitize_for_terminal(&section.heading));
        }
        for paragraph in &section.paragraphs {
            println!("{}", sanitize_for_terminal(paragraph));
            println!();
        }
    }

    if !article.source_links.is_empty() {
        println!("Sources:");
        for link in &article.source_links {
            let badge = source_badge(&link.source);
            println!(
                "  [{}] {} <{}>",
                badge.label,
                truncate_text(&sanitize_for_terminal(&link.title), 70),
                link.url
            );
        }
    }

    if !article.video_links.is_empty() {
        println!("Videos:");
        for video in &article.video_links {
            let id = if video.video_id.is_empty() {
                extract_youtube_id(&video.url)
            } else {
                Some(video.video_id.clone())
            };
            println!(
                "  {} <{}>{}",
                truncate_text(&sanitize_for_terminal(&video.title), 70),
                video.url,
                id.map(|id| format!(" ({id})")).unwrap_or_default()
            );
        }
    }
    Ok(())
}

async fn cmd_open(ctx: &mut Session, slug: &str) -> Result<()> {
    let article = resolve_article(&mut ctx.controller, slug).await?;
    let url = article
        .source_links
        .iter()
        .map(|link| link.url.as_str())
        .chain(article.video_links.iter().map(|video| video.url.as_str()))
        .find(|url| !url.is_empty())
        .ok_or_else(|| anyhow::anyhow!("Article '{}' has no links to open", slug))?;

    let url = validate_url_for_open(url).with_context(|| format!("Refusing to open '{url}'"))?;
    open::that(url.as_str()).with_context(|| format!("Failed to open browser for {url}"))?;
    println!("Opened {url}");
    Ok(())
}

async fn cmd_refresh(ctx: &mut Session, strict: bool) -> Result<()> {
    if strict {
        let service = &ctx.service;
        let known: HashSet<String> = service
            .cache()
            .load()
            .await
            .into_iter()
            .map(|a| a.id)
            .collect();
        let merged = service
            .try_fetch_and_merge()
            .await
            .with_context(|| format!("Failed to fetch {}", service.client().endpoint()))?;
        println!(
            "{} new articles; cache holds {}.",
            merged.iter().filter(|a| !known.contains(&a.id)).count(),
            merged.len()
        );
        return Ok(());
    }

    let controller = &mut ctx.controller;
    controller.initialize().await;
    controller.settle().await;

    if controller.is_empty_state() {
        print_empty_state(ctx);
    } else {
        println!("Cache holds {} articles.", controller.state().articles().len());
    }
    Ok(())
}

async fn cmd_bookmark(ctx: &mut Session, id: &str) -> Result<()> {
    let controller = &mut ctx.controller;
    controller.load_local().await;
    if controller.toggle_bookmark(id).await {
        println!("Bookmarked {id}");
    } else {
        println!("Removed bookmark {id}");
    }
    Ok(())
}

async fn cmd_bookmarks(ctx: &mut Session) -> Result<()> {
    let controller = &mut ctx.controller;
    controller.load_local().await;

    let bookmarked = controller.bookmarked_articles();
    let missing = controller
        .state()
        .bookmarks()
        .len()
        .saturating_sub(bookmarked.len());
    if bookmarked.is_empty() {
        println!("No bookmarked articles in the cache.");
    }
    let now = Utc::now();
    for article in bookmarked {
        print_row(article, true, now);
    }
    if missing > 0 {
        println!("({missing} bookmarked articles are no longer cached)");
    }
    Ok(())
}

async fn cmd_status(ctx: &mut Session) -> Result<()> {
    let now = Utc::now();
    let controller = &mut ctx.controller;
    controller.load_local().await;

    println!("Backend:   {}", ctx.service.client().endpoint());
    println!("Database:  {}", ctx.db_path.display());
    println!("Timeout:   {}", match ctx.config.request_timeout() {
        Some(timeout) => format!("{}s", timeout.as_secs()),
        None => "none".to_string(),
    });
    println!("Articles:  {}", controller.state().articles().len());
    println!("Bookmarks: {}", controller.state().bookmarks().len());
    match ctx.service.cache().last_saved().await {
        Some(saved) => {
            let freshness = if ctx.service.cache().is_fresh_at(now).await {
                "fresh"
            } else {
                "stale"
            };
            println!("Saved:     {} ({freshness})", format_relative(saved, now));
        }
        None => println!("Saved:     never"),
    }
    Ok(())
}
