mod converters;
mod exporters;
mod extractors;
mod layout;
mod types;

pub use converters::resolve_int;
pub use exporters::{
    ConversionSummary, build_document, convert, load_document, serialize_to_json,
    write_json_to_file,
};
pub use extractors::{build_cell, extract_cells, read_event, tile_coords};
pub use layout::{ColumnLayout, DATA_START_ROW, EventColumns};
pub use types::{Cell, Event, MapDocument};
