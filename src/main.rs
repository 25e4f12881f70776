use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use comfy_table::{modifiers, presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use bullion_fetcher::{
    cache::{now_ms, FileStore, KeyValueStore, MemoryStore, PriceCache, SaveOutcome, UNAVAILABLE},
    config::{self, Config},
    logger::{self, LogTag, LoggerConfig},
    paths, BullionFetcher, CancelSignal, FetchResult, PriceExtractor, Source,
};

#[derive(Parser, Debug)]
#[command(name = "bullion-fetcher", version)]
#[command(about = "Fetch bullion prices from vendor pages through fallback relays")]
struct Cli {
    /// Config file (defaults to config.toml in the data directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable DEBUG output for a tag (system, config, relay, extract, cache, batch, all)
    #[arg(long = "debug", global = true, value_name = "TAG")]
    debug: Vec<String>,

    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    /// Keep the price cache in memory and write no files
    #[arg(long, global = true)]
    no_persist: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch prices for the given URLs, or the configured sources
    Fetch {
        /// Pause between network fetches (overrides batch.delay_ms)
        #[arg(long, value_name = "MS")]
        delay_ms: Option<u64>,

        #[arg(long)]
        json: bool,

        urls: Vec<String>,
    },
    /// Fetch a single page, bypassing the cache
    Price {
        url: String,

        #[arg(long)]
        json: bool,
    },
    /// Extract a price from a local markup file ("-" reads stdin)
    Extract { file: String },
    /// Inspect or maintain the price cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
    /// List configured sources
    Sources,
    /// List configured relays in fallback order
    Relays,
    /// Write the default configuration file
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum CacheAction {
    Show,
    /// Drop entries past the expiry horizon
    Prune,
    Clear,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if !cli.no_persist {
        if let Err(e) = paths::ensure_all_directories() {
            eprintln!("❌ Failed to create required directories: {}", e);
            std::process::exit(1);
        }
    }

    let mut log_config = LoggerConfig::from_flags(&cli.debug, cli.verbose, cli.quiet);
    log_config.file_logging = !cli.no_persist;
    logger::init(log_config);

    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            logger::error(LogTag::System, &format!("{:#}", e));
            1
        }
    };

    logger::flush();
    std::process::exit(code);
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(paths::get_config_path);

    if let Command::InitConfig { force } = cli.command {
        return write_default_config(&config_path, force);
    }

    let config = config::load_config_from_path(&config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    config::init_config(config.clone())?;

    let store: Arc<dyn KeyValueStore> = if cli.no_persist {
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::in_data_directory())
    };

    match cli.command {
        Command::Fetch { delay_ms, json, urls } => {
            let fetcher = BullionFetcher::from_config_with_store(&config, store)?;
            run_fetch(&fetcher, urls, delay_ms.map(Duration::from_millis), json).await
        }
        Command::Price { url, json } => {
            Source::from_url(&url).validate()?;
            let fetcher = BullionFetcher::from_config_with_store(&config, store)?;
            let lookup = fetcher.fetch_price(&url).await;

            if json {
                println!("{}", serde_json::to_string_pretty(&lookup)?);
            } else {
                match (&lookup.price, &lookup.error) {
                    (Some(price), _) => println!("{} {}", "💰".bold(), price.green().bold()),
                    (None, Some(error)) => println!("{} {}", UNAVAILABLE.red().bold(), error.dimmed()),
                    (None, None) => println!("{} {}", UNAVAILABLE.yellow().bold(), "(no price found in page)".dimmed()),
                }
            }
            Ok(())
        }
        Command::Extract { file } => {
            let markup = read_markup(&file)?;
            let extractor = PriceExtractor::new(&config.extractor.selectors)?;
            match extractor.extract_match(&markup) {
                Some(found) => {
                    println!("{}", found.price.green().bold());
                    logger::info(LogTag::Extract, &format!("Matched selector {}", found.selector));
                    Ok(())
                }
                None => bail!("No price found in {}", file),
            }
        }
        Command::Cache { action } => {
            let cache = PriceCache::from_config(&config.cache, store);
            if !cli.no_persist {
                println!("Store: {}", paths::get_store_file_path(cache.key()).display());
            }
            run_cache_action(&cache, action)
        }
        Command::Sources => {
            let mut table = new_table(&["Name", "URL"]);
            for source in config.sources()? {
                table.add_row(vec![Cell::new(&source.name), Cell::new(&source.url)]);
            }
            println!("{}", table);
            Ok(())
        }
        Command::Relays => {
            println!(
                "{} (timeout {}s each)",
                "Relays in fallback order".bold(),
                config.relay.timeout_secs
            );
            for (index, endpoint) in config.relay.endpoints.iter().enumerate() {
                println!("  {:>2}. {}", index + 1, endpoint);
            }
            Ok(())
        }
        Command::InitConfig { .. } => Ok(()),
    }
}

async fn run_fetch(fetcher: &BullionFetcher, urls: Vec<String>, delay: Option<Duration>, json: bool) -> Result<()> {
    let sources = urls
        .into_iter()
        .map(|url| {
            let source = Source::from(url);
            source.validate().map(|_| source)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let cancel = Arc::new(CancelSignal::new());
    {
        let cancel = cancel.clone();
        ctrlc::set_handler(move || {
            logger::warning(LogTag::System, "Ctrl-C received, stopping after the current source");
            cancel.cancel();
        })
        .context("Failed to install Ctrl-C handler")?;
    }

    let (results, requested) = match (sources.is_empty(), delay) {
        (true, None) => (
            fetcher.fetch_defaults_cancellable(&cancel).await,
            fetcher.default_sources().len(),
        ),
        (true, Some(delay)) => (
            fetcher.fetch_all_cancellable(fetcher.default_sources(), delay, &cancel).await,
            fetcher.default_sources().len(),
        ),
        (false, delay) => (
            fetcher
                .fetch_all_cancellable(&sources, delay.unwrap_or_else(|| fetcher.default_delay()), &cancel)
                .await,
            sources.len(),
        ),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&results)?);
    } else {
        print_results(&results);
    }

    if cancel.is_cancelled() && results.len() < requested {
        bail!("Cancelled after {}/{} sources", results.len(), requested);
    }
    Ok(())
}

fn run_cache_action(cache: &PriceCache, action: CacheAction) -> Result<()> {
    match action {
        CacheAction::Show => {
            let entries = cache.load();
            if entries.is_empty() {
                println!("Price cache '{}' is empty", cache.key());
                return Ok(());
            }

            let now = now_ms();
            let mut table = new_table(&["URL", "Price", "Age", "Fetched"]);
            for (url, entry) in entries.iter() {
                let price = if entry.is_unavailable() {
                    Cell::new(&entry.price).fg(Color::Red)
                } else {
                    Cell::new(&entry.price).fg(Color::Green)
                };
                let fetched = entry
                    .fetched_at()
                    .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                    .unwrap_or_default();
                table.add_row(vec![
                    Cell::new(url),
                    price,
                    Cell::new(entry.age_ms(now).map(format_age).unwrap_or_else(|| "unknown".to_string())),
                    Cell::new(fetched),
                ]);
            }
            println!("{}", table);
            Ok(())
        }
        CacheAction::Prune => {
            let remaining = cache.load();
            println!("{} entries within the expiry horizon", remaining.len());
            Ok(())
        }
        CacheAction::Clear => match cache.clear() {
            SaveOutcome::Persisted => {
                println!("Cleared price cache '{}'", cache.key());
                Ok(())
            }
            SaveOutcome::Skipped => {
                println!("Price cache '{}' was never written", cache.key());
                Ok(())
            }
            SaveOutcome::Failed(reason) => bail!("Failed to clear price cache: {}", reason),
        },
    }
}

fn write_default_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    config::save_config_to_path(&Config::default(), path)?;
    logger::info(LogTag::Config, &format!("Wrote default configuration to {}", path.display()));
    Ok(())
}

fn read_markup(file: &str) -> Result<String> {
    if file == "-" {
        let mut markup = String::new();
        std::io::stdin().read_to_string(&mut markup).context("Failed to read stdin")?;
        return Ok(markup);
    }
    std::fs::read_to_string(file).with_context(|| format!("Failed to read {}", file))
}

fn new_table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL)
        .apply_modifier(modifiers::UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(
        headers
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold))
            .collect::<Vec<_>>(),
    );
    table
}

fn print_results(results: &[FetchResult]) {
    let mut table = new_table(&["Name", "Price", "Source"]);
    for result in results {
        let price = if result.price == UNAVAILABLE {
            Cell::new(&result.price).fg(Color::Red)
        } else {
            Cell::new(&result.price).fg(Color::Green)
        };
        let origin = if result.cached { "cache" } else { "network" };
        table.add_row(vec![Cell::new(&result.name), price, Cell::new(origin)]);
    }
    println!("{}", table);
}

fn format_age(age_ms: i64) -> String {
    let secs = age_ms.max(0) / 1000;
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m", secs / 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
