//! Converts a tile-map event spreadsheet into a JSON map document.
//!
//! Each data row carries a 1-based tile position followed by up to three
//! (event, percent, id) slots; rows that place at least one event become
//! cells of the [`map_export::MapDocument`].

pub mod config;
pub mod excel;
pub mod map_export;
pub mod utils;
