use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use tilemap_json::config::{
    DEFAULT_HEIGHT, DEFAULT_INPUT, DEFAULT_MAP_ID, DEFAULT_WIDTH, MapConfig,
};
use tilemap_json::map_export;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Excel file path
    #[arg(default_value = DEFAULT_INPUT)]
    input: PathBuf,

    /// Map id written into the document
    #[arg(default_value_t = DEFAULT_MAP_ID, allow_negative_numbers = true)]
    map_id: i32,

    /// Map width in tiles, used to derive x/y from each position
    #[arg(default_value_t = DEFAULT_WIDTH, allow_negative_numbers = true)]
    width: i32,

    /// Map height in tiles
    #[arg(default_value_t = DEFAULT_HEIGHT, allow_negative_numbers = true)]
    height: i32,

    /// Print the JSON document to stdout instead of writing output/<name>.json
    #[arg(long, short = 'j')]
    json_export: bool,
}

impl Cli {
    fn config(&self) -> MapConfig {
        MapConfig::new(self.input.clone(), self.map_id, self.width, self.height)
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // stderr keeps stdout free for --json-export
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.config();

    if cli.json_export {
        let document = map_export::load_document(&config)?;
        println!("{}", map_export::serialize_to_json(&document)?);
        return Ok(());
    }

    info!(
        input = %config.input().display(),
        map_id = config.map_id,
        width = config.width,
        height = config.height,
        output = %config.output_path().display(),
        "converting map workbook"
    );

    let summary = map_export::convert(&config)?;

    let written = std::fs::canonicalize(&summary.output_path)
        .unwrap_or_else(|_| summary.output_path.clone());
    info!(
        cells = summary.cell_count,
        events = summary.event_count,
        "JSON file written: {}",
        written.display()
    );

    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    if let Err(err) = run(&cli) {
        error!(error = ?err, "{:#}", err);
        std::process::exit(1);
    }
}
