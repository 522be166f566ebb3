use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::utils::helpers::json_output_path;

pub const DEFAULT_INPUT: &str = "data/map1001.xlsx";
pub const DEFAULT_MAP_ID: i32 = 1001;
pub const DEFAULT_WIDTH: i32 = 20;
pub const DEFAULT_HEIGHT: i32 = 20;

/// Parameters of one conversion run.
#[derive(Debug, Clone, PartialEq)]
pub struct MapConfig {
    pub input: PathBuf,
    pub map_id: i32,
    pub width: i32,
    pub height: i32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            map_id: DEFAULT_MAP_ID,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
        }
    }
}

impl MapConfig {
    pub fn new(input: impl Into<PathBuf>, map_id: i32, width: i32, height: i32) -> Self {
        Self {
            input: input.into(),
            map_id,
            width,
            height,
        }
    }

    /// Width feeds the coordinate division, so it must be positive.
    pub fn validate(&self) -> Result<()> {
        if self.width <= 0 {
            anyhow::bail!("Invalid map width: {} (must be greater than 0)", self.width);
        }
        Ok(())
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn output_path(&self) -> PathBuf {
        json_output_path(&self.input)
    }
}
