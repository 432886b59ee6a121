//! cinedex - movie/TV catalog browser CLI.

/// Application configuration (TOML).
mod config;

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use cinedex_api::image::{ImageSize, image_url};
use cinedex_api::normalize::{NormalizedListing, Provider, VideoRecord};
use cinedex_api::query::{
    DiscoverFilters, Feed, ListingQuery, ListingScope, MediaKind, TimeWindow, parse_slug_id,
};
use cinedex_api::upstream::CatalogClient;
use cinedex_api::{Catalog, PageControl, PaginationWindow, plan_pagination};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{AppConfig, resolve_config_path};

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// List a feed or discover page.
    List(ListArgs),
    /// Search by text.
    Search(SearchArgs),
    /// Show a movie or series detail page.
    Detail(ItemArgs),
    /// Show cast and crew.
    Credits(ItemArgs),
    /// Show the trailer picked for a title or season.
    Trailer(TrailerArgs),
    /// Show a season and its episodes.
    Season(SeasonArgs),
    /// List recommended titles.
    Recommendations(ItemArgs),
    /// Show where a title can be watched.
    Providers(ProvidersArgs),
    /// Show the landing-page sections.
    Home,
    /// Plan page controls for a listing.
    Pages(PagesArgs),
    /// Manage the config file.
    Config(ConfigCommand),
}

/// Media kind argument.
#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    /// Movies.
    Movie,
    /// TV series.
    Tv,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => Self::Movie,
            KindArg::Tv => Self::Tv,
        }
    }
}

/// Listing scope argument.
#[derive(Clone, Copy, ValueEnum)]
enum ScopeArg {
    /// Movies.
    Movie,
    /// TV series.
    Tv,
    /// Movies and series mixed.
    Multi,
}

impl From<ScopeArg> for ListingScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Movie => Self::Kind(MediaKind::Movie),
            ScopeArg::Tv => Self::Kind(MediaKind::Tv),
            ScopeArg::Multi => Self::Multi,
        }
    }
}

/// Listing family argument.
#[derive(Clone, Copy, ValueEnum)]
enum FeedArg {
    /// Popular titles.
    Popular,
    /// Top-rated titles.
    TopRated,
    /// Trending today.
    Trending,
    /// Trending this week.
    TrendingWeek,
    /// Upcoming movies / series on the air.
    Upcoming,
    /// Filtered discover listing.
    Discover,
}

impl From<FeedArg> for Feed {
    fn from(feed: FeedArg) -> Self {
        match feed {
            FeedArg::Popular => Self::Popular,
            FeedArg::TopRated => Self::TopRated,
            FeedArg::Trending => Self::Trending(TimeWindow::Day),
            FeedArg::TrendingWeek => Self::Trending(TimeWindow::Week),
            FeedArg::Upcoming => Self::Upcoming,
            FeedArg::Discover => Self::Discover,
        }
    }
}

/// Arguments for the `list` subcommand.
#[derive(clap::Args)]
struct ListArgs {
    /// Media kinds to list.
    #[arg(long, value_enum, default_value = "movie")]
    kind: ScopeArg,
    /// Listing family.
    #[arg(long, value_enum, default_value = "discover")]
    feed: FeedArg,
    /// Result page (1-based).
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Response language (default: config value).
    #[arg(long)]
    language: Option<String>,
    /// Comma-separated genre ids (e.g. "28,878").
    #[arg(long, value_delimiter = ',')]
    genres: Vec<u32>,
    /// Sort order (e.g. "vote_average.desc").
    #[arg(long)]
    sort_by: Option<String>,
    /// Release year.
    #[arg(long)]
    year: Option<u32>,
    /// Additional discover filter as `name=value` (repeatable).
    #[arg(long = "filter", value_name = "NAME=VALUE")]
    filters: Vec<String>,
    /// Cache lifetime override in seconds.
    #[arg(long)]
    cache_seconds: Option<u64>,
}

/// Arguments for the `search` subcommand.
#[derive(clap::Args)]
struct SearchArgs {
    /// Search text.
    query: String,
    /// Media kinds to search.
    #[arg(long, value_enum, default_value = "multi")]
    kind: ScopeArg,
    /// Result page (1-based).
    #[arg(long, default_value_t = 1)]
    page: u32,
    /// Response language (default: config value).
    #[arg(long)]
    language: Option<String>,
}

/// Arguments for per-item subcommands.
#[derive(clap::Args)]
struct ItemArgs {
    /// Media kind of the item.
    #[arg(long, value_enum)]
    kind: KindArg,
    /// Item id or route slug (e.g. "603-the-matrix").
    id: String,
    /// Response language (default: config value).
    #[arg(long)]
    language: Option<String>,
}

/// Arguments for the `trailer` subcommand.
#[derive(clap::Args)]
struct TrailerArgs {
    /// Media kind of the item.
    #[arg(long, value_enum)]
    kind: KindArg,
    /// Item id or route slug.
    id: String,
    /// Season number (TV only).
    #[arg(long)]
    season: Option<u32>,
}

/// Arguments for the `season` subcommand.
#[derive(clap::Args)]
struct SeasonArgs {
    /// Series id or route slug.
    id: String,
    /// Season number.
    #[arg(long, required = true)]
    season: u32,
}

/// Arguments for the `providers` subcommand.
#[derive(clap::Args)]
struct ProvidersArgs {
    /// Media kind of the item.
    #[arg(long, value_enum)]
    kind: KindArg,
    /// Item id or route slug.
    id: String,
    /// Only show this ISO 3166-1 region (e.g. "US").
    #[arg(long)]
    region: Option<String>,
}

/// Arguments for the `pages` subcommand.
#[derive(clap::Args)]
struct PagesArgs {
    /// Current page.
    #[arg(long, required = true)]
    current: u32,
    /// Total pages.
    #[arg(long, required = true)]
    total: u32,
    /// Use the narrow (±1) window instead of the wide (±2) one.
    #[arg(long)]
    narrow: bool,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write a config file with default values.
    Init,
    /// Show the effective configuration.
    Show,
}

/// Builds a `Catalog` over a `CatalogClient` from config and `TMDB_API_TOKEN`.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded, `TMDB_API_TOKEN` is not
/// set, or the client fails to build.
#[instrument(skip_all)]
fn build_catalog(dir: Option<&PathBuf>) -> Result<Catalog<CatalogClient>> {
    let path = resolve_config_path(dir)?;
    let config = AppConfig::load(&path)?;
    let api_token = std::env::var("TMDB_API_TOKEN")
        .context("TMDB_API_TOKEN environment variable is required")?;

    let client = CatalogClient::builder()
        .api_token(api_token)
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .base_url(config.catalog.base_url()?)
        .default_cache_seconds(config.catalog.cache_seconds)
        .timeout(config.catalog.timeout())
        .build()
        .context("failed to build catalog client")?;

    Ok(Catalog::with_language(client, config.catalog.language))
}

/// Parses `name=value` discover filter arguments onto `filters`.
///
/// # Errors
///
/// Returns an error if an argument has no `=` or an empty name.
fn parse_filters(mut filters: DiscoverFilters, raw: &[String]) -> Result<DiscoverFilters> {
    for arg in raw {
        let Some((name, value)) = arg.split_once('=') else {
            bail!("filter must be NAME=VALUE: {arg:?}");
        };
        if name.trim().is_empty() {
            bail!("filter name is empty: {arg:?}");
        }
        filters = filters.set(name.trim(), value.trim());
    }
    Ok(filters)
}

/// Resolves an id argument that may be a bare id or a route slug.
fn resolve_id(raw: &str) -> Result<u64> {
    parse_slug_id(raw).context("invalid id")
}

fn log_listing(listing: &NormalizedListing) {
    tracing::info!("ID\tKind\tYear\tRating\tTitle");
    for item in &listing.items {
        tracing::info!(
            "{}\t{}\t{}\t{}\t{}",
            item.id,
            item.media_kind,
            item.release_year.as_deref().unwrap_or("N/A"),
            item.vote_average
                .map_or_else(|| String::from("N/A"), |v| format!("{v:.1}")),
            item.title,
        );
    }
    tracing::info!(
        "Page {} of {} ({} items)",
        listing.page,
        listing.total_pages,
        listing.items.len()
    );
}

fn log_trailer(trailer: Option<&VideoRecord>) {
    match trailer {
        Some(video) => tracing::info!(
            "{}\t{}\t{}\t{}",
            video.video_type.as_deref().unwrap_or("-"),
            video.site.as_deref().unwrap_or("-"),
            video.key,
            video.name.as_deref().unwrap_or("-"),
        ),
        None => tracing::info!("No trailer available"),
    }
}

fn provider_names(providers: &[Provider]) -> String {
    if providers.is_empty() {
        return String::from("-");
    }
    providers
        .iter()
        .map(|p| p.provider_name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Renders page controls as a single line, e.g. `1 … 4 [5] 6 … 20`.
fn render_pages(controls: &[PageControl]) -> String {
    controls
        .iter()
        .map(|control| match control {
            PageControl::Page {
                number,
                active: true,
            } => format!("[{number}]"),
            PageControl::Page { number, .. } => number.to_string(),
            PageControl::Ellipsis => String::from("…"),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Page-control line for `listing`, or `None` when it fits on one page.
fn page_line(listing: &NormalizedListing, window: PaginationWindow) -> Option<String> {
    let controls = plan_pagination(listing.page, listing.total_pages, window);
    (!controls.is_empty()).then(|| render_pages(&controls))
}

fn log_pages(listing: &NormalizedListing, window: PaginationWindow) {
    if let Some(line) = page_line(listing, window) {
        tracing::info!("Pages: {line}");
    }
}

/// Runs the `list` subcommand.
///
/// # Errors
///
/// Returns an error if the query is invalid or the catalog request fails.
#[instrument(skip_all)]
async fn run_list(args: &ListArgs, dir: Option<&PathBuf>) -> Result<()> {
    let mut filters = DiscoverFilters::new()
        .with_genres(args.genres.as_slice())
        .set_opt("sort_by", args.sort_by.clone())
        .set_opt("year", args.year);
    filters = parse_filters(filters, &args.filters)?;

    let mut query = ListingQuery::new(ListingScope::from(args.kind))
        .feed(args.feed.into())
        .page(args.page)
        .filters(filters);
    if let Some(language) = &args.language {
        query = query.language(language.clone());
    }
    if let Some(seconds) = args.cache_seconds {
        query = query.cache_seconds(seconds);
    }

    let catalog = build_catalog(dir)?;
    let listing = catalog
        .list_catalog(&query)
        .await
        .context("catalog listing failed")?;
    log_listing(&listing);
    log_pages(&listing, PaginationWindow::Wide);
    Ok(())
}

/// Runs the `search` subcommand.
///
/// # Errors
///
/// Returns an error if the query is invalid or the catalog request fails.
#[instrument(skip_all)]
async fn run_search(args: &SearchArgs, dir: Option<&PathBuf>) -> Result<()> {
    let mut query = ListingQuery::search(ListingScope::from(args.kind), args.query.clone())
        .page(args.page);
    if let Some(language) = &args.language {
        query = query.language(language.clone());
    }

    let catalog = build_catalog(dir)?;
    let listing = catalog
        .list_catalog(&query)
        .await
        .context("catalog search failed")?;
    log_listing(&listing);
    log_pages(&listing, PaginationWindow::Narrow);
    Ok(())
}

/// Runs the `detail` subcommand.
///
/// # Errors
///
/// Returns an error if the id is invalid or the detail request fails.
#[instrument(skip_all)]
async fn run_detail(args: &ItemArgs, dir: Option<&PathBuf>) -> Result<()> {
    let id = resolve_id(&args.id)?;
    let catalog = build_catalog(dir)?;
    let page = catalog
        .get_detail_page(args.kind.into(), id, args.language.as_deref())
        .await
        .context("catalog detail request failed")?;
    let detail = &page.detail;

    tracing::info!(
        "{} ({})",
        detail.title,
        detail.release_year.as_deref().unwrap_or("N/A")
    );
    if let Some(original) = &detail.original_title {
        tracing::info!("Original title: {original}");
    }
    if let Some(tagline) = &detail.tagline {
        tracing::info!("Tagline: {tagline}");
    }
    if !detail.genres.is_empty() {
        let genres: Vec<&str> = detail.genres.iter().map(|g| g.name.as_str()).collect();
        tracing::info!("Genres: {}", genres.join(", "));
    }
    if let Some(status) = &detail.status {
        tracing::info!("Status: {status}");
    }
    if let Some(movie) = detail.movie() {
        if let Some(runtime) = movie.runtime {
            tracing::info!("Runtime: {runtime} min");
        }
        if let Some(budget) = movie.budget {
            tracing::info!("Budget: ${budget}");
        }
        if let Some(revenue) = movie.revenue {
            tracing::info!("Revenue: ${revenue}");
        }
        if let Some(collection) = &movie.belongs_to_collection {
            tracing::info!("Collection: {}", collection.name);
        }
    }
    if let Some(tv) = detail.tv() {
        if let (Some(seasons), Some(episodes)) = (tv.number_of_seasons, tv.number_of_episodes) {
            tracing::info!("Seasons: {seasons}, episodes: {episodes}");
        }
        for season in &tv.seasons {
            tracing::info!(
                "  S{:02}\t{}\t{}",
                season.season_number,
                season.name.as_deref().unwrap_or("-"),
                season.air_date.as_deref().unwrap_or("-"),
            );
        }
    }
    if let Some(poster) = image_url(detail.poster_path.as_deref(), ImageSize::W500) {
        tracing::info!("Poster: {poster}");
    }
    if let Some(overview) = &detail.overview {
        tracing::info!("{overview}");
    }
    let cast: Vec<&str> = page.credits.cast.iter().take(5).map(|p| p.name.as_str()).collect();
    if !cast.is_empty() {
        tracing::info!("Starring: {}", cast.join(", "));
    }
    log_trailer(page.trailer.as_ref());
    Ok(())
}

/// Runs the `credits` subcommand.
///
/// # Errors
///
/// Returns an error if the id is invalid or the credits request fails.
#[instrument(skip_all)]
async fn run_credits(args: &ItemArgs, dir: Option<&PathBuf>) -> Result<()> {
    let id = resolve_id(&args.id)?;
    let catalog = build_catalog(dir)?;
    let credits = catalog
        .get_credits(args.kind.into(), id)
        .await
        .context("catalog credits request failed")?;

    tracing::info!("Cast:");
    for person in &credits.cast {
        tracing::info!(
            "  {}\t{}\t{}",
            person.id,
            person.name,
            person.character.as_deref().unwrap_or("-")
        );
    }
    tracing::info!("Crew:");
    for person in &credits.crew {
        tracing::info!(
            "  {}\t{}\t{}",
            person.id,
            person.name,
            person.job.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Runs the `trailer` subcommand.
///
/// # Errors
///
/// Returns an error if the id is invalid or a season is given for a movie.
#[instrument(skip_all)]
async fn run_trailer(args: &TrailerArgs, dir: Option<&PathBuf>) -> Result<()> {
    let id = resolve_id(&args.id)?;
    let kind = MediaKind::from(args.kind);
    let catalog = build_catalog(dir)?;
    let trailer = match (kind, args.season) {
        (MediaKind::Tv, Some(season)) => catalog.get_season_trailer(id, season).await,
        (MediaKind::Movie, Some(_)) => bail!("--season is only valid for --kind tv"),
        (_, None) => catalog.get_trailer(kind, id).await,
    };
    log_trailer(trailer.as_ref());
    Ok(())
}

/// Runs the `season` subcommand.
///
/// # Errors
///
/// Returns an error if the id is invalid or the season request fails.
#[instrument(skip_all)]
async fn run_season(args: &SeasonArgs, dir: Option<&PathBuf>) -> Result<()> {
    let id = resolve_id(&args.id)?;
    let catalog = build_catalog(dir)?;
    let season = catalog
        .get_season(id, args.season)
        .await
        .context("catalog season request failed")?;

    tracing::info!(
        "{} ({})",
        season.name.as_deref().unwrap_or("Season"),
        season.air_date.as_deref().unwrap_or("N/A")
    );
    tracing::info!("Ep\tAirDate\t\tRuntime\tType\tName");
    for episode in &season.episodes {
        tracing::info!(
            "{}\t{}\t{}\t{}\t{}",
            episode.episode_number,
            episode.air_date.as_deref().unwrap_or("-"),
            episode
                .runtime
                .map_or_else(|| String::from("-"), |m| format!("{m}m")),
            episode.episode_type.as_deref().unwrap_or("-"),
            episode.name.as_deref().unwrap_or("-"),
        );
    }
    tracing::info!("Total: {} episodes", season.episodes.len());
    Ok(())
}

/// Runs the `recommendations` subcommand.
///
/// # Errors
///
/// Returns an error if the id is invalid or the request fails.
#[instrument(skip_all)]
async fn run_recommendations(args: &ItemArgs, dir: Option<&PathBuf>) -> Result<()> {
    let id = resolve_id(&args.id)?;
    let catalog = build_catalog(dir)?;
    let listing = catalog
        .get_recommendations(args.kind.into(), id)
        .await
        .context("catalog recommendations request failed")?;
    log_listing(&listing);
    Ok(())
}

/// Runs the `providers` subcommand.
///
/// # Errors
///
/// Returns an error if the id is invalid or the request fails.
#[instrument(skip_all)]
async fn run_providers(args: &ProvidersArgs, dir: Option<&PathBuf>) -> Result<()> {
    let id = resolve_id(&args.id)?;
    let catalog = build_catalog(dir)?;
    let providers = catalog
        .get_watch_providers(args.kind.into(), id)
        .await
        .context("catalog watch providers request failed")?;

    let wanted = args.region.as_deref().map(str::to_uppercase);
    for (region, offers) in &providers {
        if wanted.as_ref().is_some_and(|w| w != region) {
            continue;
        }
        tracing::info!(
            "{region}\tstream: {}\trent: {}\tbuy: {}",
            provider_names(&offers.flatrate),
            provider_names(&offers.rent),
            provider_names(&offers.buy),
        );
    }
    Ok(())
}

/// Runs the `home` subcommand.
///
/// # Errors
///
/// Returns an error if the catalog client fails to build.
#[instrument(skip_all)]
async fn run_home(dir: Option<&PathBuf>) -> Result<()> {
    let catalog = build_catalog(dir)?;
    let feed = catalog.get_home_feed().await;
    let sections = [
        ("Trending movies", &feed.trending_movies),
        ("Popular movies", &feed.popular_movies),
        ("Popular TV", &feed.popular_tv),
        ("Top rated movies", &feed.top_rated_movies),
        ("Top rated TV", &feed.top_rated_tv),
        ("Upcoming movies", &feed.upcoming_movies),
        ("On the air", &feed.on_the_air_tv),
    ];
    for (label, listing) in sections {
        let titles: Vec<&str> = listing
            .items
            .iter()
            .take(5)
            .map(|i| i.title.as_str())
            .collect();
        tracing::info!("{label}: {}", titles.join(" | "));
    }
    Ok(())
}

/// Runs the `pages` subcommand.
fn run_pages(args: &PagesArgs) {
    let window = if args.narrow {
        PaginationWindow::Narrow
    } else {
        PaginationWindow::Wide
    };
    let controls = plan_pagination(args.current, args.total, window);
    if controls.is_empty() {
        tracing::info!("No pagination");
    } else {
        tracing::info!("{}", render_pages(&controls));
    }
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the file already exists or cannot be written.
fn run_config_init(dir: Option<&PathBuf>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    if path.exists() {
        bail!("config already exists: {}", path.display());
    }
    AppConfig::default().save(&path)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded.
fn run_config_show(dir: Option<&PathBuf>) -> Result<()> {
    let path = resolve_config_path(dir)?;
    let config = AppConfig::load(&path)?;
    tracing::info!("Config: {}", path.display());
    tracing::info!("language = {}", config.catalog.language);
    tracing::info!("cache_seconds = {}", config.catalog.cache_seconds);
    tracing::info!("timeout_seconds = {}", config.catalog.timeout_seconds);
    tracing::info!("base_url = {}", config.catalog.base_url()?);
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let dir = cli.dir.as_ref();
    match cli.command {
        Commands::List(args) => run_list(&args, dir).await,
        Commands::Search(args) => run_search(&args, dir).await,
        Commands::Detail(args) => run_detail(&args, dir).await,
        Commands::Credits(args) => run_credits(&args, dir).await,
        Commands::Trailer(args) => run_trailer(&args, dir).await,
        Commands::Season(args) => run_season(&args, dir).await,
        Commands::Recommendations(args) => run_recommendations(&args, dir).await,
        Commands::Providers(args) => run_providers(&args, dir).await,
        Commands::Home => run_home(dir).await,
        Commands::Pages(args) => {
            run_pages(&args);
            Ok(())
        }
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Init => run_config_init(dir),
            ConfigSubcommands::Show => run_config_show(dir),
        },
    }
}
