use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

use tmm_core::compare::{SearchResultSort, SortDirection};
use tmm_core::config::{config_path, load_config, load_config_from, save_config, AppConfig};
use tmm_core::context::ScraperContext;
use tmm_core::entities::artwork::MediaArtworkType;
use tmm_core::entities::{ids, CastType, MediaType};
use tmm_core::error::ScrapeError;
use tmm_core::genres::GenreRegistry;
use tmm_core::metadata::MediaMetadata;
use tmm_core::options::ScrapeOptions;
use tmm_core::progress::{ProgressEvent, ProgressHandler};
use tmm_core::provider::{capabilities, ConfigType, ScraperType};
use tmm_core::scrape;
use tmm_core::search::MediaSearchResult;
use tmm_core::task::{CancelToken, UiLoop};

type CliError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "tmm")]
#[command(about = "Search and scrape movie metadata")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: ~/.config/tinymediamanager/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search a provider for a movie
    Search {
        /// Title to search for
        #[arg(required = true)]
        query: String,

        /// Release year
        #[arg(long)]
        year: Option<i32>,

        /// Metadata provider id (default from config)
        #[arg(short, long)]
        provider: Option<String>,

        /// Language for titles and plots (ISO 639-1)
        #[arg(long)]
        language: Option<String>,

        /// Maximum number of results to show
        #[arg(long, default_value = "10")]
        limit: usize,

        /// Order results by (score, year, title)
        #[arg(long)]
        sort: Option<String>,

        /// Reverse the order
        #[arg(long)]
        desc: bool,
    },

    /// Scrape full metadata, artwork and trailers for a movie
    Scrape {
        /// Title to search for; the best match is scraped
        query: Option<String>,

        /// Release year, used when searching
        #[arg(long)]
        year: Option<i32>,

        /// TMDB id; skips the search
        #[arg(long)]
        tmdb_id: Option<i64>,

        /// IMDb id (tt...); skips the search
        #[arg(long)]
        imdb_id: Option<String>,

        /// Metadata provider id (default from config)
        #[arg(short, long)]
        provider: Option<String>,

        /// Language for titles, plots and artwork (ISO 639-1)
        #[arg(long)]
        language: Option<String>,

        /// Only fetch artwork of this type (poster, background, ...)
        #[arg(long)]
        artwork_type: Option<String>,
    },

    /// List and configure metadata providers
    Providers {
        #[command(subcommand)]
        action: ProvidersAction,
    },

    /// List or resolve genres
    Genres {
        #[command(subcommand)]
        action: GenresAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ProvidersAction {
    /// List providers and their capabilities
    List,
    /// Show or change provider settings
    Config {
        #[command(subcommand)]
        action: ProviderConfigAction,
    },
}

#[derive(Subcommand)]
enum ProviderConfigAction {
    /// Show settings of a provider
    Show {
        /// Provider id
        id: String,
    },
    /// Change a provider setting
    Set {
        /// Provider id
        id: String,
        /// Setting key
        key: String,
        /// Value
        value: String,
    },
    /// Restore default settings
    Reset {
        /// Provider id
        id: String,
    },
}

#[derive(Subcommand)]
enum GenresAction {
    /// List all genres
    List {
        /// Language for genre names (en, de, fr)
        #[arg(long)]
        language: Option<String>,
    },
    /// Resolve a genre name the way provider data is resolved
    Lookup {
        /// Genre name in any supported language
        name: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Initialize default config file
    Init,
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Key (dot-separated path)
        key: String,
        /// Value
        value: String,
    },
}

fn main() {
    let cli = Cli::parse();

    // logs go to stderr so --json output stays parseable
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    debug!(command = cli.command.name(), json = cli.json, "Dispatching command");
    let result = match &cli.command {
        Commands::Search {
            query,
            year,
            provider,
            language,
            limit,
            sort,
            desc,
        } => run_search(
            &cli,
            query,
            *year,
            provider.as_deref(),
            language.as_deref(),
            *limit,
            sort.as_deref(),
            *desc,
        ),
        Commands::Scrape {
            query,
            year,
            tmdb_id,
            imdb_id,
            provider,
            language,
            artwork_type,
        } => run_scrape(
            &cli,
            query.as_deref(),
            *year,
            *tmdb_id,
            imdb_id.as_deref(),
            provider.as_deref(),
            language.as_deref(),
            artwork_type.as_deref(),
        ),
        Commands::Providers { action } => run_providers(&cli, action),
        Commands::Genres { action } => run_genres(&cli, action),
        Commands::Config { action } => run_config(&cli, action),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Self::Search { .. } => "search",
            Self::Scrape { .. } => "scrape",
            Self::Providers { .. } => "providers",
            Self::Genres { .. } => "genres",
            Self::Config { .. } => "config",
        }
    }
}

fn config_file(cli: &Cli) -> Result<PathBuf, CliError> {
    match &cli.config {
        Some(p) => Ok(p.clone()),
        None => config_path().ok_or_else(|| "Could not determine config directory".into()),
    }
}

fn app_config(cli: &Cli) -> Result<AppConfig, CliError> {
    match &cli.config {
        Some(p) => {
            debug!(path = %p.display(), "Loading config");
            Ok(load_config_from(p)?)
        }
        None => Ok(load_config()),
    }
}

fn context(cli: &Cli, language: Option<&str>) -> Result<ScraperContext, CliError> {
    let mut cfg = app_config(cli)?;
    if let Some(lang) = language {
        cfg.scraper.language = lang.to_string();
    }
    Ok(ScraperContext::new(cfg))
}

fn spinner(json: bool) -> ProgressBar {
    if json {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Run `work` in the background and wait for its completion on this thread.
fn run_task<T, W>(name: &str, json: bool, work: W) -> Result<T, CliError>
where
    T: Send + 'static,
    W: FnOnce(&CancelToken, &dyn ProgressHandler) -> T + Send + 'static,
{
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let mut ui = UiLoop::new(rt.handle().clone());

    let pb = spinner(json);
    pb.set_message(name.to_string());
    let progress = pb.clone();
    let slot = Arc::new(Mutex::new(None));
    let done = slot.clone();

    ui.spawn(
        name,
        move |token| {
            let handler = move |e: ProgressEvent| {
                if let Some(msg) = e.message {
                    progress.set_message(format!("{}: {}", e.operation, msg));
                }
            };
            work(token, &handler)
        },
        move |output| {
            if let Ok(mut s) = done.lock() {
                *s = Some(output);
            }
        },
    );
    rt.block_on(async {
        while ui.next().await {}
    });
    pb.finish_and_clear();

    let output = slot.lock().ok().and_then(|mut s| s.take());
    output.ok_or_else(|| format!("{} did not complete", name).into())
}

#[allow(clippy::too_many_arguments)]
fn run_search(
    cli: &Cli,
    query: &str,
    year: Option<i32>,
    provider: Option<&str>,
    language: Option<&str>,
    limit: usize,
    sort: Option<&str>,
    desc: bool,
) -> Result<(), CliError> {
    let ctx = context(cli, language)?;
    let provider_id = provider.unwrap_or(&ctx.config.scraper.movie_provider);
    let scraper = ctx.providers.scraper(ScraperType::Movie, provider_id)?;

    let mut options = ctx.search_options(MediaType::Movie, query);
    options.year = year;

    let mut results = run_task("search", cli.json, move |_, progress| {
        scrape::search(&scraper, &options, Some(progress))
    })??;

    let order = match sort {
        Some(s) => s.parse::<SearchResultSort>()?,
        None => ctx.config.scraper.result_sort,
    };
    let direction = if desc {
        SortDirection::Descending
    } else {
        SortDirection::Ascending
    };
    if order != SearchResultSort::Score || desc {
        order.comparator(direction).sort(&mut results);
    }
    results.truncate(limit);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else if results.is_empty() {
        println!("No results found");
    } else {
        for (i, r) in results.iter().enumerate() {
            println!("{:>2}. {}", i + 1, format_result(r));
        }
    }
    Ok(())
}

fn format_result(r: &MediaSearchResult) -> String {
    let year = if r.year > 0 {
        format!(" ({})", r.year)
    } else {
        String::new()
    };
    format!(
        "{}{} [{}:{}] score {:.2}",
        r.title,
        year,
        r.provider_id,
        r.id(),
        r.score
    )
}

#[allow(clippy::too_many_arguments)]
fn run_scrape(
    cli: &Cli,
    query: Option<&str>,
    year: Option<i32>,
    tmdb_id: Option<i64>,
    imdb_id: Option<&str>,
    provider: Option<&str>,
    language: Option<&str>,
    artwork_type: Option<&str>,
) -> Result<(), CliError> {
    if query.is_none() && tmdb_id.is_none() && imdb_id.is_none() {
        return Err("Give a title or --tmdb-id / --imdb-id".into());
    }
    let ctx = context(cli, language)?;
    let job = ctx.scrape_job(provider)?;

    let mut options = ctx.scrape_options_for(MediaType::Movie);
    if let Some(id) = tmdb_id {
        options.set_id(ids::TMDB, id);
    }
    if let Some(id) = imdb_id {
        options.set_id(ids::IMDB, id);
    }
    if let Some(t) = artwork_type {
        let parsed = t.parse::<MediaArtworkType>()?;
        options.artwork_type = Some(parsed);
    }

    // without ids, search first and scrape the best match
    let search = match query {
        Some(q) if options.ids.is_empty() => {
            let mut s = ctx.search_options(MediaType::Movie, q);
            s.year = year;
            Some(s)
        }
        _ => None,
    };

    let md = run_task("scrape", cli.json, move |token, progress| {
        if let Some(search_options) = search {
            let results = scrape::search(&job.metadata, &search_options, Some(progress))?;
            let best = results.first().ok_or(ScrapeError::NotFound)?;
            let mut from_result = ScrapeOptions::from_search_result(best);
            from_result.language = options.language.clone();
            from_result.country = options.country.clone();
            from_result.poster_size = options.poster_size;
            from_result.fanart_size = options.fanart_size;
            from_result.artwork_type = options.artwork_type;
            options = from_result;
        }
        scrape::scrape(&job, &options, Some(progress), token)
    })??;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&md)?);
    } else {
        print_metadata(&ctx, &md);
    }
    Ok(())
}

fn print_metadata(ctx: &ScraperContext, md: &MediaMetadata) {
    if md.year > 0 {
        println!("{} ({})", md.title, md.year);
    } else {
        println!("{}", md.title);
    }
    println!("Sort title: {}", ctx.sortable_title(&md.title));
    if !md.original_title.is_empty() && md.original_title != md.title {
        println!("Original title: {}", md.original_title);
    }
    let id_list: Vec<String> = md.ids.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
    println!("Ids: {}", id_list.join(", "));
    if !md.tagline.is_empty() {
        println!("Tagline: {}", md.tagline);
    }
    if md.runtime > 0 {
        println!("Runtime: {} min", md.runtime);
    }
    if md.rating > 0.0 {
        println!("Rating: {:.1} ({} votes)", md.rating, md.vote_count);
    }
    if !md.genres.is_empty() {
        let names: Vec<&str> = md.genres.iter().map(|g| ctx.genres.localized_name(g)).collect();
        println!("Genres: {}", names.join(", "));
    }
    if !md.certifications.is_empty() {
        let certs: Vec<String> = md.certifications.iter().map(|c| c.to_string()).collect();
        println!("Certification: {}", certs.join(", "));
    }
    let directors: Vec<&str> = md
        .cast_members(Some(CastType::Director))
        .iter()
        .map(|c| c.name.as_str())
        .collect();
    if !directors.is_empty() {
        println!("Director: {}", directors.join(", "));
    }
    for actor in md.cast_members(Some(CastType::Actor)).iter().take(5) {
        println!("  {} as {}", actor.name, actor.character);
    }
    if !md.plot.is_empty() {
        println!("\n{}\n", md.plot);
    }
    println!("Artwork: {}", md.artwork.len());
    for kind in [MediaArtworkType::Poster, MediaArtworkType::Background] {
        if let Some(best) = md.media_art(Some(kind)).first() {
            println!("  best {:?}: {}", kind, best.default_url);
        }
    }
    println!("Trailers: {}", md.trailers.len());
    for t in md.trailers.iter().take(3) {
        println!("  {} {} {}", t.name, t.quality, t.url);
    }
}

#[derive(Serialize)]
struct ProviderRow<'a> {
    id: &'a str,
    name: &'a str,
    description: &'a str,
    version: &'a str,
    capabilities: Vec<&'static str>,
}

#[derive(Serialize)]
struct SettingRow {
    key: String,
    #[serde(rename = "type")]
    kind: &'static str,
    value: String,
    default: String,
    possible_values: Vec<String>,
    encrypted: bool,
}

fn run_providers(cli: &Cli, action: &ProvidersAction) -> Result<(), CliError> {
    let ctx = context(cli, None)?;
    match action {
        ProvidersAction::List => {
            let providers = ctx.providers.all();
            let rows: Vec<ProviderRow> = providers
                .iter()
                .map(|p| {
                    let info = p.info();
                    ProviderRow {
                        id: &info.id,
                        name: &info.name,
                        description: &info.description,
                        version: &info.version,
                        capabilities: capabilities(p.as_ref()),
                    }
                })
                .collect();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for r in &rows {
                    println!("{} - {} {} [{}]", r.id, r.name, r.version, r.capabilities.join(", "));
                }
            }
        }
        ProvidersAction::Config { action } => match action {
            ProviderConfigAction::Show { id } => {
                let provider = ctx.providers.get_required(id)?;
                let config = provider.info().config();
                let rows: Vec<SettingRow> = config
                    .entries()
                    .iter()
                    .map(|e| SettingRow {
                        key: e.key.clone(),
                        kind: match e.config_type {
                            ConfigType::Bool => "bool",
                            ConfigType::Text => "text",
                            ConfigType::Select => "select",
                            ConfigType::SelectIndex => "select-index",
                        },
                        value: e.display_value(),
                        default: e.default_value.clone(),
                        possible_values: e.possible_values.clone(),
                        encrypted: e.encrypt,
                    })
                    .collect();
                if cli.json {
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                } else if rows.is_empty() {
                    println!("{} has no settings", id);
                } else {
                    for r in &rows {
                        if r.possible_values.is_empty() {
                            println!("{} ({}) = {}", r.key, r.kind, r.value);
                        } else {
                            println!(
                                "{} ({}) = {}  [{}]",
                                r.key,
                                r.kind,
                                r.value,
                                r.possible_values.join("|")
                            );
                        }
                    }
                }
            }
            ProviderConfigAction::Set { id, key, value } => {
                let provider = ctx.providers.get_required(id)?;
                provider.info().config_mut().set_value(key, value)?;
                ctx.save_provider_config(id)?;
                if !cli.json {
                    println!("Updated {}.{}", id, key);
                }
            }
            ProviderConfigAction::Reset { id } => {
                let provider = ctx.providers.get_required(id)?;
                provider.info().config_mut().reset();
                ctx.save_provider_config(id)?;
                if !cli.json {
                    println!("Reset settings of {}", id);
                }
            }
        },
    }
    Ok(())
}

fn run_genres(cli: &Cli, action: &GenresAction) -> Result<(), CliError> {
    match action {
        GenresAction::List { language } => {
            let language = match language {
                Some(l) => l.clone(),
                None => app_config(cli)?.scraper.language,
            };
            let registry = GenreRegistry::new(language);
            let rows: Vec<serde_json::Value> = registry
                .values()
                .iter()
                .map(|g| {
                    serde_json::json!({
                        "key": g.name(),
                        "name": registry.localized_name(g),
                    })
                })
                .collect();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for g in registry.values() {
                    println!("{:<16} {}", g.name(), registry.localized_name(&g));
                }
            }
        }
        GenresAction::Lookup { name } => {
            let registry = GenreRegistry::new(app_config(cli)?.scraper.language);
            let before = registry.values().len();
            let genre = registry.get_genre(name);
            let known = registry.values().len() == before;
            if cli.json {
                let out = serde_json::json!({
                    "key": genre.name(),
                    "name": registry.localized_name(&genre),
                    "known": known,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else if known {
                println!("{} ({})", registry.localized_name(&genre), genre.name());
            } else {
                println!("{} (not a known genre)", genre.name());
            }
        }
    }
    Ok(())
}

fn write_config(path: &Path, cfg: &AppConfig) -> Result<(), CliError> {
    save_config(cfg, path)?;
    Ok(())
}

fn run_config(cli: &Cli, action: &ConfigAction) -> Result<(), CliError> {
    match action {
        ConfigAction::Init => {
            let path = config_file(cli)?;
            write_config(&path, &AppConfig::default())?;
            println!("Wrote default config to {}", path.display());
        }
        ConfigAction::Show => {
            let cfg = app_config(cli)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&cfg)?);
            } else {
                println!("{}", toml::to_string_pretty(&cfg)?);
            }
        }
        ConfigAction::Set { key, value } => {
            let path = config_file(cli)?;
            let mut cfg = load_config_from(&path)?;
            cfg.set(key, value)?;
            write_config(&path, &cfg)?;
            if !cli.json {
                println!("Updated {}", key);
            }
        }
    }
    Ok(())
}
