//! TCG Catalog - sale catalogs from a card inventory
//!
//! Reads the inventory CSV, picks the cards held in duplicate, optionally
//! enriches them from TCGdex and renders a PDF catalog.

use chrono::Local;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tcg_catalog::enrichment::DEFAULT_MAX_CONCURRENT;
use tcg_catalog::formatters::{
    file_timestamp, format_config, format_not_found_preview, format_social_networks,
};
use tcg_catalog::models::format_cents;
use tcg_catalog::{
    format_card_table, format_stats, read_collection, sort_saleable, write_not_found_report,
    AppPaths, CatalogError, CatalogRenderer, CardRecord, Collection, Enricher, ImageCache,
    PriceOverrides, RenderOptions, Result, SetMappingCache, SortBy, StoreConfig, TcgdexClient,
};

/// Trading card catalog generator
#[derive(Parser, Debug)]
#[command(name = "tcg_catalog")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Data directory (default: ~/.local/share/tcg_catalog)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a PDF catalog of saleable cards
    Generate {
        /// Output PDF path (default: catalogs/catalog_<timestamp>.pdf)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Path to the inventory CSV
        #[arg(short, long)]
        csv: Option<PathBuf>,
        /// Download images and stats from TCGdex
        #[arg(long)]
        enrich: bool,
        /// Leave card statistics out of the PDF
        #[arg(long)]
        no_stats: bool,
        /// Show prices in the PDF
        #[arg(long)]
        prices: bool,
        /// Catalog title (default: catalog_title from config)
        #[arg(short, long)]
        title: Option<String>,
        /// Include every card, not only duplicates
        #[arg(short, long)]
        all: bool,
        /// Minimum quantity to include
        #[arg(short = 'm', long = "min-qty", default_value_t = 2)]
        min_qty: u32,
        /// Sort by: set (set + number), name, price
        #[arg(short, long, default_value = "set")]
        sort: SortBy,
        /// Maximum simultaneous TCGdex lookups
        #[arg(long, default_value_t = DEFAULT_MAX_CONCURRENT)]
        max_concurrent: usize,
        /// TCGdex language
        #[arg(long, default_value = "en")]
        language: String,
    },
    /// List cards in the inventory
    List {
        #[arg(short, long)]
        csv: Option<PathBuf>,
        /// Only cards held in duplicate
        #[arg(short, long)]
        saleable: bool,
        /// Filter by set name
        #[arg(long = "set")]
        set_filter: Option<String>,
    },
    /// Set a custom price (in dollars) for a card
    SetPrice {
        /// Part of the card name
        name: String,
        /// New price in dollars
        price: f64,
        #[arg(short, long)]
        csv: Option<PathBuf>,
        /// Which match to update when several cards match (1-based)
        #[arg(long)]
        index: Option<usize>,
    },
    /// Show collection statistics
    Stats {
        #[arg(short, long)]
        csv: Option<PathBuf>,
    },
    /// Delete cached card images
    ClearCache,
    /// View or edit the store configuration
    Config {
        key: Option<String>,
        value: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=tcg_catalog=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let paths = cli.data_dir.map(AppPaths::new).unwrap_or_default();

    if let Err(e) = run(cli.command, &paths).await {
        log::error!("{e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(command: Command, paths: &AppPaths) -> Result<()> {
    paths.ensure_dirs()?;
    log::debug!("Data directory: {}", paths.root.display());

    match command {
        Command::Generate {
            output,
            csv,
            enrich,
            no_stats,
            prices,
            title,
            all,
            min_qty,
            sort,
            max_concurrent,
            language,
        } => {
            let config = StoreConfig::load(&paths.config_file());
            let options = RenderOptions {
                title: title.unwrap_or_else(|| config.catalog_title.clone()),
                include_stats: !no_stats,
                show_prices: prices,
            };
            let generate = GenerateArgs {
                output,
                csv,
                enrich,
                min_qty: if all { 1 } else { min_qty },
                sort,
                max_concurrent,
                language,
            };
            generate_catalog(paths, &config, generate, options).await
        }
        Command::List {
            csv,
            saleable,
            set_filter,
        } => list_cards(paths, csv, saleable, set_filter),
        Command::SetPrice {
            name,
            price,
            csv,
            index,
        } => set_price(paths, csv, &name, price, index),
        Command::Stats { csv } => {
            let collection = load_collection(paths, csv)?;
            print!("{}", format_stats(&collection));
            Ok(())
        }
        Command::ClearCache => {
            let cache = ImageCache::with_default_client(&paths.cache_dir())?;
            let size_before = cache.size_bytes();
            cache.clear()?;
            println!(
                "OK Cache cleared ({:.2} MB freed)",
                size_before as f64 / 1024.0 / 1024.0
            );
            Ok(())
        }
        Command::Config { key, value } => edit_config(paths, key, value),
    }
}

struct GenerateArgs {
    output: Option<PathBuf>,
    csv: Option<PathBuf>,
    enrich: bool,
    min_qty: u32,
    sort: SortBy,
    max_concurrent: usize,
    language: String,
}

/// Inventory with custom prices applied
fn load_collection(paths: &AppPaths, csv: Option<PathBuf>) -> Result<Collection> {
    let csv = csv.unwrap_or_else(|| paths.collection_csv());
    if !csv.exists() {
        return Err(CatalogError::NotFound(format!(
            "CSV file {}",
            csv.display()
        )));
    }
    let mut collection = read_collection(&csv)?;
    let applied = PriceOverrides::load(&paths.prices_file()).apply(&mut collection);
    log::debug!("Applied {} custom prices", applied);
    Ok(collection)
}

async fn generate_catalog(
    paths: &AppPaths,
    config: &StoreConfig,
    args: GenerateArgs,
    options: RenderOptions,
) -> Result<()> {
    println!("{} - Catalog Generator", config.store_name);

    let collection = load_collection(paths, args.csv)?;
    let mut saleable = collection.cards_by_min_quantity(args.min_qty);
    sort_saleable(&mut saleable, args.sort);

    if saleable.is_empty() {
        println!("No cards with quantity >= {} found.", args.min_qty);
        return Ok(());
    }

    let summary = if args.enrich {
        let client = TcgdexClient::new(&args.language)?;
        let sets = SetMappingCache::new(client.clone());
        let enricher = Enricher::new(&client, &sets, args.max_concurrent);
        Some(
            enricher
                .enrich_many(saleable.iter_mut().map(|sc| &mut sc.card))
                .await,
        )
    } else {
        None
    };

    let output = args.output.unwrap_or_else(|| {
        let timestamp = file_timestamp(Local::now().naive_local());
        paths.catalog_dir().join(format!("catalog_{timestamp}.pdf"))
    });
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let cache = ImageCache::with_default_client(&paths.cache_dir())?;
    let renderer = CatalogRenderer::new(config, Some(&cache)).with_logo(config.logo_file(paths));
    let warnings = renderer
        .render(&collection, &saleable, &options, &output)
        .await?;

    for warning in &warnings {
        println!("Warning: {warning}");
    }

    println!(
        "\nOK Loaded {} unique cards ({} total)",
        collection.total_unique_cards(),
        collection.total_cards()
    );
    if args.min_qty <= 1 {
        println!("OK Included {} cards (ALL)", saleable.len());
    } else {
        println!(
            "OK Found {} saleable cards (qty >= {})",
            saleable.len(),
            args.min_qty
        );
    }

    if let Some(summary) = summary {
        println!(
            "OK Enriched: {} found, {} not found",
            summary.found, summary.not_found
        );
        if let Some(report) = write_not_found_report(&paths.logs_dir(), &summary)? {
            let report_name = report
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default();
            print!("{}", format_not_found_preview(&summary, &report_name));
        }
    }

    println!("\nSuccess! Catalog: {}", output.display());
    println!(
        "Total collection value: {}",
        format_cents(collection.total_value_cents())
    );
    Ok(())
}

fn list_cards(
    paths: &AppPaths,
    csv: Option<PathBuf>,
    saleable_only: bool,
    set_filter: Option<String>,
) -> Result<()> {
    let collection = load_collection(paths, csv)?;

    let mut cards: Vec<&CardRecord> = if saleable_only {
        collection.cards.iter().filter(|c| c.is_saleable()).collect()
    } else {
        collection.cards.iter().collect()
    };
    let mut title = if saleable_only {
        format!("Saleable Cards ({})", cards.len())
    } else {
        format!("All Cards ({})", cards.len())
    };

    if let Some(filter) = set_filter {
        let needle = filter.to_lowercase();
        cards.retain(|c| c.set_name.to_lowercase().contains(&needle));
        title.push_str(&format!(" - Set: {filter}"));
    }

    print!("{}", format_card_table(&title, &cards));
    Ok(())
}

fn set_price(
    paths: &AppPaths,
    csv: Option<PathBuf>,
    name: &str,
    price: f64,
    index: Option<usize>,
) -> Result<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::Config(format!("invalid price {price}")));
    }

    let collection = load_collection(paths, csv)?;
    let needle = name.to_lowercase();
    let matches: Vec<&CardRecord> = collection
        .cards
        .iter()
        .filter(|c| c.product_name.to_lowercase().contains(&needle))
        .collect();

    let selected = match (matches.as_slice(), index) {
        ([], _) => {
            return Err(CatalogError::NotFound(format!(
                "no cards matching '{name}'"
            )))
        }
        ([only], None) => *only,
        (_, Some(i)) if (1..=matches.len()).contains(&i) => matches[i - 1],
        (_, Some(i)) => {
            return Err(CatalogError::Config(format!(
                "index {} out of range (1-{})",
                i,
                matches.len()
            )))
        }
        (_, None) => {
            println!("Found {} matching cards:", matches.len());
            for (i, card) in matches.iter().enumerate() {
                println!("  {}. {} ({})", i + 1, card.product_name, card.set_name);
            }
            return Err(CatalogError::Config(
                "several cards match, choose one with --index".to_string(),
            ));
        }
    };

    let mut overrides = PriceOverrides::load(&paths.prices_file());
    overrides.set(&selected.id, price);
    overrides.save()?;

    println!(
        "OK Updated price for {}: ${:.2}",
        selected.product_name, price
    );
    Ok(())
}

fn edit_config(paths: &AppPaths, key: Option<String>, value: Option<String>) -> Result<()> {
    let config_path = paths.config_file();
    let mut config = StoreConfig::load(&config_path);

    match (key, value) {
        (None, _) => {
            print!("{}", format_config(&config, &config_path));
            println!("\nUse 'tcg_catalog config <key> <value>' to update a setting");
            println!("For social networks, edit {} directly", config_path.display());
        }
        (Some(key), None) if key == "social_networks" => {
            println!("{key}:");
            print!("{}", format_social_networks(&config));
        }
        (Some(key), None) => match config.get(&key) {
            Some(value) => println!("{key} = {value}"),
            None => {
                return Err(CatalogError::Config(format!(
                    "unknown key '{}' (available: {}, social_networks)",
                    key,
                    StoreConfig::EDITABLE_KEYS.join(", ")
                )))
            }
        },
        (Some(key), Some(value)) => {
            let old = config.set(&key, &value)?;
            config.save(&config_path)?;
            println!("OK Updated {key}");
            println!("  Old: {old}");
            println!("  New: {value}");
        }
    }
    Ok(())
}
