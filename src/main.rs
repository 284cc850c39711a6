use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

use jav_scraper::apis::factory::{create_api, create_apis};
use jav_scraper::apis::{JavLibraryApi, MissAvApi};
use jav_scraper::app::ports::HttpClientPort;
use jav_scraper::app::{LookupOutcome, LookupUseCase};
use jav_scraper::config::{Config, DEFAULT_CONFIG_PATH};
use jav_scraper::constants::{self, JAVLIBRARY_API, MISSAV_API};
use jav_scraper::infra::ReqwestHttp;
use jav_scraper::observability;
use jav_scraper::types::{JavInfo, JavRecord, Language};
use jav_scraper::{SerialNoParser, VideoApi};

#[derive(Parser)]
#[command(name = "jav_scraper")]
#[command(about = "Normalize JAV serial numbers and look them up on video sites")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    /// Page language: zh, cn or ja
    #[arg(long, global = true)]
    lang: Option<Language>,
    /// Print a Prometheus metrics snapshot on exit
    #[arg(long, global = true)]
    metrics: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the canonical serial number for each identifier
    Parse {
        raw: Vec<String>,
        /// Treat bare 6-7 digit numbers as FC2 numbers
        #[arg(long)]
        fc2_numbers: bool,
        /// Reference year for the date-coded guard (defaults to this year)
        #[arg(long)]
        year: Option<i32>,
    },
    /// Run a keyword search on one source
    Search {
        /// Source name. Available: javlibrary, missav, tokyolib, fc2
        #[arg(long)]
        source: String,
        keyword: String,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Normalize identifiers and fetch their details from every source
    Lookup {
        raw: Vec<String>,
        /// Sources to query (comma-separated), defaults to the configured ones
        #[arg(long)]
        sources: Option<String>,
        /// Download cover images
        #[arg(long)]
        thumbnail: bool,
        /// Save downloaded covers here
        #[arg(long)]
        thumbnail_dir: Option<PathBuf>,
        /// Print results as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn parser_for(config: &Config) -> SerialNoParser {
    SerialNoParser::new().extend_fc2_from_no(config.parser.extend_fc2_from_no)
}

async fn run_search(
    source: &str,
    keyword: &str,
    page: u32,
    http: Arc<dyn HttpClientPort>,
    lang: Language,
) -> anyhow::Result<Vec<JavRecord>> {
    let records = match source {
        JAVLIBRARY_API => {
            let mut api = JavLibraryApi::new(http);
            api.set_language(lang);
            api.search_page(keyword, page).await?
        }
        MISSAV_API => {
            let mut api = MissAvApi::new(http);
            api.set_language(lang);
            api.search_page(keyword, page).await?
        }
        _ => {
            let Some(mut api) = create_api(source, http) else {
                bail!("Unknown source '{}'. Available: {}", source, constants::supported_apis().join(", "));
            };
            if page != 1 {
                warn!(source, "Source has a single result page, ignoring --page");
            }
            api.set_language(lang);
            api.search_by_keyword(keyword).await?
        }
    };
    Ok(records)
}

fn save_thumbnail(dir: &Path, source: &str, info: &JavInfo) -> anyhow::Result<Option<PathBuf>> {
    let Some(thumbnail) = &info.thumbnail else {
        return Ok(None);
    };
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let path = dir.join(format!("{}_{}.jpg", info.serial_no, source.to_lowercase()));
    thumbnail
        .to_rgb8()
        .save(&path)
        .with_context(|| format!("Failed to save thumbnail to {}", path.display()))?;
    Ok(Some(path))
}

fn print_outcome(outcome: &LookupOutcome, json: bool, thumbnail_dir: Option<&Path>) -> anyhow::Result<()> {
    if let Some(dir) = thumbnail_dir {
        for hit in &outcome.hits {
            if let Some(path) = save_thumbnail(dir, hit.source, &hit.info)? {
                info!(path = %path.display(), "Saved thumbnail");
            }
        }
    }

    if json {
        let value = serde_json::json!({
            "raw": outcome.raw,
            "serial_no": outcome.canonical(),
            "hits": outcome.hits.iter().map(|hit| hit.info.to_json()).collect::<Vec<_>>(),
            "misses": outcome.misses,
            "failures": outcome
                .failures
                .iter()
                .map(|f| serde_json::json!({ "source": f.source, "error": f.error.to_string() }))
                .collect::<Vec<_>>(),
        });
        println!("{value}");
        return Ok(());
    }

    let Some(canonical) = outcome.canonical() else {
        println!("{}\tunrecognized", outcome.raw);
        return Ok(());
    };
    println!("{}\t{}", outcome.raw, canonical);
    for hit in &outcome.hits {
        println!("  [{}] {}", hit.source, hit.info);
    }
    for source in &outcome.misses {
        println!("  [{}] not found", source);
    }
    for failure in &outcome.failures {
        println!("  [{}] error: {}", failure.source, failure.error);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    let mut config = Config::load_from(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;
    if let Some(lang) = cli.lang {
        config.sources.language = lang.to_string();
    }
    let lang = config.sources.language()?;

    // Initialize logging
    let _guard = jav_scraper::logging::init_logging(&config.logging);

    if cli.metrics {
        observability::init()?;
    }

    match cli.command {
        Commands::Parse { raw, fc2_numbers, year } => {
            let mut parser = match year {
                Some(year) => SerialNoParser::with_reference_year(year),
                None => SerialNoParser::new(),
            };
            parser = parser.extend_fc2_from_no(fc2_numbers || config.parser.extend_fc2_from_no);
            for item in &raw {
                let canonical = parser.parse(item);
                println!("{}\t{}", item, canonical.as_deref().unwrap_or("-"));
            }
        }
        Commands::Search { source, keyword, page } => {
            let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new(&config.http)?);
            let records = run_search(&source, &keyword, page, http, lang).await?;
            info!(source = %source, count = records.len(), "Search finished");
            for record in records {
                println!("{}\t{}\t{}", record.keyword, record.title, record.url);
            }
        }
        Commands::Lookup {
            raw,
            sources,
            thumbnail,
            thumbnail_dir,
            json,
        } => {
            let api_names: Vec<String> = match sources {
                Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
                None => config.sources.enabled.clone(),
            };
            let http: Arc<dyn HttpClientPort> = Arc::new(ReqwestHttp::new(&config.http)?);
            let apis = create_apis(&api_names, http, lang)?;

            let with_thumbnail = thumbnail || config.sources.with_thumbnail || thumbnail_dir.is_some();
            let use_case = LookupUseCase::new(parser_for(&config), apis);

            let queried: Vec<&str> = use_case.sources().collect();
            info!(sources = ?queried, "Looking up {} identifiers", raw.len());
            for outcome in use_case.resolve_many(raw.as_slice(), with_thumbnail).await {
                print_outcome(&outcome, json, thumbnail_dir.as_deref())?;
            }
        }
    }

    if cli.metrics {
        if let Some(snapshot) = observability::render() {
            println!("{snapshot}");
        }
    }

    Ok(())
}
