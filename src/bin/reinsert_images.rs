//! Reinsert extracted images into Markdown converted from a PDF
//!
//! Usage:
//!   cargo run --release --bin reinsert_images -- --text doc.md --images manifest.json
//!   cargo run --release --bin reinsert_images -- --text doc.md --images manifest.json \
//!       --pages 12 --config placement.json --output doc_with_images.md --alt figure --verbose
//!
//! The manifest is either a JSON array of images or an object with
//! `total_pages` and `images`. `--pages` overrides the manifest's page count.

use figure_oxide::config::PlacementConfig;
use figure_oxide::document::{DocumentKind, ImageReinserter};
use figure_oxide::insertion::MarkdownImageMarker;
use figure_oxide::manifest::ImageManifest;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

const USAGE: &str = "Usage: reinsert_images --text <file.md> --images <manifest.json> \
[--pages N] [--config <placement.json>] [--output <out.md>] [--alt TEXT] [--verbose]";

struct ReinsertConfig {
    text_path: PathBuf,
    manifest_path: PathBuf,
    total_pages: Option<u32>,
    config_path: Option<PathBuf>,
    output_path: Option<PathBuf>,
    alt: String,
    verbose: bool,
}

impl ReinsertConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut text_path = None;
        let mut manifest_path = None;
        let mut total_pages = None;
        let mut config_path = None;
        let mut output_path = None;
        let mut alt = "image".to_string();
        let mut verbose = false;

        let mut i = 1;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--text" | "--images" | "--pages" | "--config" | "--output" | "-o" | "--alt" => {
                    i += 1;
                    let value = args
                        .get(i)
                        .ok_or_else(|| format!("missing value for {}", flag))?;
                    match flag {
                        "--text" => text_path = Some(PathBuf::from(value)),
                        "--images" => manifest_path = Some(PathBuf::from(value)),
                        "--pages" => {
                            let pages = value
                                .parse::<u32>()
                                .map_err(|e| format!("invalid --pages '{}': {}", value, e))?;
                            total_pages = Some(pages);
                        },
                        "--config" => config_path = Some(PathBuf::from(value)),
                        "--alt" => alt = value.clone(),
                        _ => output_path = Some(PathBuf::from(value)),
                    }
                },
                "--verbose" | "-v" => {
                    verbose = true;
                },
                "--help" | "-h" => return Err(String::new()),
                other => return Err(format!("unknown argument '{}'", other)),
            }
            i += 1;
        }

        Ok(Self {
            text_path: text_path.ok_or("--text is required")?,
            manifest_path: manifest_path.ok_or("--images is required")?,
            total_pages,
            config_path,
            output_path,
            alt,
            verbose,
        })
    }
}

fn run(config: &ReinsertConfig) -> figure_oxide::Result<()> {
    let start = Instant::now();

    let placement = match &config.config_path {
        Some(path) => PlacementConfig::from_json(&fs::read_to_string(path)?)?,
        None => PlacementConfig::default(),
    };
    let reinserter = ImageReinserter::new(placement)?;

    let text = fs::read_to_string(&config.text_path)?;
    let manifest = ImageManifest::load(&config.manifest_path)?.with_total_pages(config.total_pages);

    let title = config
        .text_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();

    let report = reinserter.process(
        DocumentKind::NeedsHeuristicReinsertion,
        &title,
        &text,
        &manifest.images,
        manifest.total_pages,
        &MarkdownImageMarker::fixed(config.alt.as_str()),
    )?;

    match &config.output_path {
        Some(path) => {
            fs::write(path, &report.text)?;
            log::info!("Wrote {}", path.display());
        },
        None => println!("{}", report.text),
    }

    let stats = &report.stats;
    log::info!(
        "{} images placed in {:.2?}: strict {}, keyword {}, generic {}, page ratio {}, end of document {}, page groups {}",
        stats.total_placed(),
        start.elapsed(),
        stats.strict,
        stats.keyword,
        stats.generic,
        stats.page_ratio,
        stats.end_of_document,
        stats.page_group
    );

    Ok(())
}

fn main() {
    let config = match ReinsertConfig::from_args() {
        Ok(config) => config,
        Err(message) => {
            if !message.is_empty() {
                eprintln!("{}", message);
            }
            eprintln!("{}", USAGE);
            std::process::exit(2);
        },
    };

    let default_level = if config.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
