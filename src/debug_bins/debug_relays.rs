/// Relay probe
///
/// Fetches one product page through EVERY configured relay (not just until
/// the first success) and reports status, size, latency and the price each
/// response yields.
use clap::Parser;
use colored::Colorize;

use bullion_fetcher::{
    config::{self, Config},
    logger::{self, LoggerConfig},
    paths,
    relay::RelayFetcher,
    PriceExtractor,
};

#[derive(Parser, Debug)]
#[command(name = "debug_relays")]
#[command(about = "Probe every relay against a product page")]
struct Args {
    /// Product page to fetch (defaults to the first configured source)
    url: Option<String>,

    /// Config file (defaults to config.toml in the data directory)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Override the per-relay timeout
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Show relay debug logs
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let debug_tags = if args.verbose { vec!["relay".to_string()] } else { Vec::new() };
    logger::init(LoggerConfig::from_flags(&debug_tags, false, !args.verbose));

    let config_path = args.config.clone().unwrap_or_else(paths::get_config_path);
    let mut config = match config::load_config_from_path(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "Config error:".red().bold(), e);
            Config::default()
        }
    };
    if let Some(timeout) = args.timeout_secs {
        config.relay.timeout_secs = timeout;
    }

    let Some(url) = args.url.or_else(|| config.sources.first().map(|s| s.url.clone())) else {
        eprintln!("{}", "No URL given and no sources configured".red());
        std::process::exit(1);
    };

    let relays = match RelayFetcher::from_config(&config.relay) {
        Ok(relays) => relays,
        Err(e) => {
            eprintln!("{} {}", "Failed to build relays:".red().bold(), e);
            std::process::exit(1);
        }
    };
    let extractor = PriceExtractor::new(&config.extractor.selectors).unwrap_or_default();

    println!("\n{}", "🔎 Relay Probe".bold().green());
    println!("{}", "=".repeat(60).green());
    println!("Target:  {}", url.yellow());
    println!("Relays:  {} (timeout {}s)\n", relays.len(), config.relay.timeout_secs);

    let reports = relays.probe_all(&url).await;
    let mut working = 0;

    for (index, report) in reports.iter().enumerate() {
        let latency = format!("{:>6}ms", report.elapsed.as_millis());
        match &report.result {
            Ok(body) => {
                working += 1;
                let price = extractor
                    .extract_match(body)
                    .map(|m| format!("{} via {}", m.price.green().bold(), m.selector))
                    .unwrap_or_else(|| "no price".yellow().to_string());
                println!(
                    "{:>2}. {} {} {:>8} bytes  {}  {}",
                    index + 1,
                    "OK  ".green(),
                    latency,
                    body.len(),
                    report.relay,
                    price
                );
            }
            Err(e) => {
                println!(
                    "{:>2}. {} {} {}\n      {}",
                    index + 1,
                    "FAIL".red(),
                    latency,
                    report.relay,
                    e.to_string().dimmed()
                );
            }
        }
    }

    println!("\n{} / {} relays served the page", working, reports.len());
    logger::flush();
}
