/// Extraction probe
///
/// Runs each configured selector on its own against a saved page and shows
/// what it would yield, then the price the full priority list picks.
use clap::Parser;
use colored::Colorize;
use std::io::Read;

use bullion_fetcher::{config, paths, PriceExtractor};

#[derive(Parser, Debug)]
#[command(name = "debug_extract")]
#[command(about = "Show which price selector matches a saved page")]
struct Args {
    /// Markup file ("-" reads stdin)
    file: String,

    /// Config file (defaults to config.toml in the data directory)
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

fn main() {
    let args = Args::parse();

    let markup = if args.file == "-" {
        let mut markup = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut markup) {
            eprintln!("{} {}", "Failed to read stdin:".red().bold(), e);
            std::process::exit(1);
        }
        markup
    } else {
        match std::fs::read_to_string(&args.file) {
            Ok(markup) => markup,
            Err(e) => {
                eprintln!("{} {}: {}", "Failed to read".red().bold(), args.file, e);
                std::process::exit(1);
            }
        }
    };

    let config_path = args.config.unwrap_or_else(paths::get_config_path);
    let selectors = config::load_config_from_path(&config_path)
        .map(|c| c.extractor.selectors)
        .unwrap_or_else(|_| config::Config::default().extractor.selectors);

    println!("\n{}", "🧪 Extraction Probe".bold().green());
    println!("{}", "=".repeat(60).green());
    println!("Input: {} ({} bytes)\n", args.file.yellow(), markup.len());

    for (index, selector) in selectors.iter().enumerate() {
        let outcome = match PriceExtractor::new(std::slice::from_ref(selector)) {
            Ok(single) => match single.extract(&markup) {
                Some(price) => price.green().bold().to_string(),
                None => "-".dimmed().to_string(),
            },
            Err(e) => e.to_string().red().to_string(),
        };
        println!("{:>2}. {:<28} {}", index + 1, selector, outcome);
    }

    println!();
    match PriceExtractor::new(&selectors).map(|e| e.extract_match(&markup)) {
        Ok(Some(found)) => println!("Price: {} (selector {})", found.price.green().bold(), found.selector),
        Ok(None) => println!("Price: {}", "none".yellow()),
        Err(e) => {
            eprintln!("{} {}", "Invalid selector list:".red().bold(), e);
            std::process::exit(1);
        }
    }
}
