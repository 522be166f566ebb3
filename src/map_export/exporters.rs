use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::MapConfig;
use crate::excel::{Sheet, open_sheet};
use crate::map_export::extractors::extract_cells;
use crate::map_export::layout::{ColumnLayout, EventColumns};
use crate::map_export::types::MapDocument;
use crate::utils::helpers::column_name;

/// What a finished conversion produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionSummary {
    pub output_path: PathBuf,
    pub cell_count: usize,
    pub event_count: usize,
}

pub fn serialize_to_json<T: Serialize>(data: &T) -> Result<String> {
    serde_json::to_string_pretty(data).context("Failed to serialize data to JSON")
}

/// Writes `data` as pretty JSON, creating missing parent directories first.
pub fn write_json_to_file<T: Serialize>(data: &T, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let json_string = serialize_to_json(data)?;

    let mut file =
        File::create(path).with_context(|| format!("Failed to create file: {}", path.display()))?;

    file.write_all(json_string.as_bytes())
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    Ok(())
}

/// Wraps the cells of `sheet` into a map document. Fails on a non-positive width.
pub fn build_document(
    sheet: &Sheet,
    layout: &ColumnLayout,
    config: &MapConfig,
) -> Result<MapDocument> {
    config.validate()?;

    let cells = extract_cells(sheet, layout, config.width);
    Ok(MapDocument::new(
        config.map_id,
        config.width,
        config.height,
        cells,
    ))
}

/// Validates the config, checks the input exists and reads it into a document.
pub fn load_document(config: &MapConfig) -> Result<MapDocument> {
    config.validate()?;

    if !config.input().exists() {
        anyhow::bail!(
            "Excel file not found: {} (check the path or place the workbook there)",
            config.input().display()
        );
    }

    info!(input = %config.input().display(), "parsing workbook");
    let sheet = open_sheet(config.input())?;

    let layout = ColumnLayout::default();
    let slots: Vec<String> = layout.events.iter().map(EventColumns::describe).collect();
    debug!(
        pos = %column_name(layout.pos),
        ?slots,
        first_row = layout.data_start_row + 1,
        "column layout"
    );

    let document = build_document(&sheet, &layout, config)?;
    info!(
        sheet = %sheet.name,
        cells = document.cells.len(),
        events = document.event_count(),
        "parsed map cells"
    );

    Ok(document)
}

/// Runs a full conversion, writing `output/<input stem>.json`.
pub fn convert(config: &MapConfig) -> Result<ConversionSummary> {
    let document = load_document(config)?;
    let output_path = config.output_path();

    info!(output = %output_path.display(), "writing JSON");
    write_json_to_file(&document, &output_path)?;

    Ok(ConversionSummary {
        output_path,
        cell_count: document.cells.len(),
        event_count: document.event_count(),
    })
}
