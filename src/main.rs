use anyhow::{Context, Result};
use clap::Parser;
use glyphmine::cli::{Cli, Command, OutputFormat};
use glyphmine::config::GlyphmineConfig;
use glyphmine::pipeline::{self, AnalysisSummary, ImageInput};
use glyphmine::report::{PatternListing, Report};
use glyphmine::repository::{JsonFileRepository, PatternRepository};
use glyphmine::symbols::{NoMetadata, SymbolCatalog, SymbolMetadata};
use serde::Serialize;
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn load_config(path: Option<&Path>) -> Result<GlyphmineConfig> {
    match path {
        Some(path) => GlyphmineConfig::from_toml(path),
        None => Ok(GlyphmineConfig::default()),
    }
}

fn load_metadata(path: Option<&Path>) -> Result<Box<dyn SymbolMetadata>> {
    match path {
        Some(path) => {
            let catalog = SymbolCatalog::from_toml(path)
                .with_context(|| format!("Failed to load symbol catalog: {}", path.display()))?;
            Ok(Box::new(catalog))
        }
        None => Ok(Box::new(NoMetadata)),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_summary(summary: &AnalysisSummary) {
    println!(
        "image {}: {} glyphs, {} in sequence, {} columns",
        summary.image_id, summary.glyphs, summary.sequence_len, summary.columns
    );
    println!(
        "{} patterns, {} occurrences, {} boxes ({}; replaced {})",
        summary.patterns,
        summary.occurrences,
        summary.bounding_boxes,
        summary.strategy,
        summary.replaced_patterns
    );
}

fn print_report(report: &Report) {
    println!("image {}: {} items", report.image_id, report.items.len());
    for item in &report.items {
        let row = &item.row;
        let label = if item.label.is_empty() {
            format!("{:?}", row.seq)
        } else {
            item.label.clone()
        };
        match &row.metrics {
            Some(metrics) => println!(
                "{:<24} len={} count={} score={:.3} share={:.1}%",
                label, row.length, row.count, metrics.stability_score, item.share_percent
            ),
            None => println!(
                "{:<24} len={} count={} share={:.1}%",
                label, row.length, row.count, item.share_percent
            ),
        }
    }
}

fn print_listing(listing: &PatternListing) {
    println!("image {}: {} patterns", listing.image_id, listing.items.len());
    for item in &listing.items {
        println!(
            "#{:<6} {:?} len={} count={}",
            item.id, item.seq, item.length, item.count
        );
        for occurrence in &item.occurrences {
            println!(
                "    glyphs {:?} ({} boxes)",
                occurrence.glyph_ids,
                occurrence.bboxes.len()
            );
        }
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let mut config = load_config(args.config.as_deref())?;
    let format = args.format;

    match args.command {
        Command::Linearize { input, layout } => {
            layout.apply(&mut config);
            let image = ImageInput::from_json_file(&input.input)?;
            let placed = image.layout(&config.linearizer)?;

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "image_id": image.image_id,
                    "columns": placed.columns(),
                    "fingerprint": placed.linear.fingerprint(),
                    "tokens": placed.linear.tokens(),
                }))?,
                OutputFormat::Text => {
                    let symbols: Vec<String> = placed
                        .linear
                        .symbols()
                        .iter()
                        .map(|s| s.to_string())
                        .collect();
                    println!(
                        "image {}: {} columns, {} tokens",
                        image.image_id,
                        placed.columns(),
                        placed.linear.len()
                    );
                    println!("{}", symbols.join(" "));
                }
            }
        }

        Command::Analyze {
            input,
            layout,
            store,
            strategy,
            ngram_max_length,
            min_length,
        } => {
            layout.apply(&mut config);
            if let Some(strategy) = strategy {
                config.mining.strategy = strategy;
            }
            if ngram_max_length.is_some() {
                config.mining.ngram_max_length = ngram_max_length;
            }
            if let Some(min_length) = min_length {
                config.mining.min_length = min_length;
            }

            let image = ImageInput::from_json_file(&input.input)?;
            let mut repo = JsonFileRepository::open(&store.store)
                .with_context(|| format!("Failed to open store: {}", store.store.display()))?;
            let summary = pipeline::analyze_image(&image, &config, &mut repo)?;

            match format {
                OutputFormat::Json => print_json(&summary)?,
                OutputFormat::Text => print_summary(&summary),
            }
        }

        Command::Search {
            input,
            layout,
            pattern,
            finder,
        } => {
            layout.apply(&mut config);
            let kind = finder.unwrap_or(config.mining.search_finder);
            let image = ImageInput::from_json_file(&input.input)?;
            let count = pipeline::search_pattern(&image, &config, &pattern, kind)?;

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "image_id": image.image_id,
                    "pattern": pattern,
                    "finder": kind.to_string(),
                    "count": count,
                }))?,
                OutputFormat::Text => println!("{}", count),
            }
        }

        Command::Report {
            input,
            layout,
            store,
            kind,
            symbols,
        } => {
            layout.apply(&mut config);
            let image = ImageInput::from_json_file(&input.input)?;
            let repo = JsonFileRepository::open(&store.store)
                .with_context(|| format!("Failed to open store: {}", store.store.display()))?;
            let metadata = load_metadata(symbols.as_deref())?;
            let report =
                pipeline::stability_report(kind, &image, &config, &repo, metadata.as_ref())?;

            match format {
                OutputFormat::Json => print_json(&report)?,
                OutputFormat::Text => print_report(&report),
            }
        }

        Command::Patterns {
            image_id,
            store,
            symbols,
        } => {
            let repo = JsonFileRepository::open(&store.store)
                .with_context(|| format!("Failed to open store: {}", store.store.display()))?;
            let metadata = load_metadata(symbols.as_deref())?;
            let listing = pipeline::list_patterns(image_id, &repo, metadata.as_ref())?;

            match format {
                OutputFormat::Json => print_json(&listing)?,
                OutputFormat::Text => print_listing(&listing),
            }
        }

        Command::Clear { image_id, store } => {
            let mut repo = JsonFileRepository::open(&store.store)
                .with_context(|| format!("Failed to open store: {}", store.store.display()))?;
            let removed = repo.clear_image(image_id)?;

            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "image_id": image_id,
                    "removed_patterns": removed,
                }))?,
                OutputFormat::Text => println!("removed {} patterns of image {}", removed, image_id),
            }
        }
    }

    Ok(())
}
