use tracing::debug;

use crate::excel::{Sheet, SheetRow};
use crate::map_export::converters::resolve_int;
use crate::map_export::layout::{ColumnLayout, EventColumns};
use crate::map_export::types::{Cell, Event};
use crate::utils::helpers::cell_reference;

/// `(x, y)` of a 1-based position on a grid `width` tiles wide.
///
/// Uses truncating division, so positions below 1 give non-positive coordinates.
///
/// # Panics
///
/// Panics if `width` is zero.
pub fn tile_coords(pos: i32, width: i32) -> (i32, i32) {
    let offset = pos.wrapping_sub(1);
    (offset % width, offset / width)
}

/// Reads one event slot. Returns `None` when all three columns resolve to 0.
pub fn read_event(row: &SheetRow, columns: &EventColumns) -> Option<Event> {
    let event_type = resolve_int(row.cell(columns.event));
    let weight = resolve_int(row.cell(columns.percent));
    let id = resolve_int(row.cell(columns.id));

    let event = Event::new(event_type, id, weight);
    (!event.is_blank()).then_some(event)
}

/// Builds the map cell for one data row.
///
/// Rows whose position resolves to 0, or that carry no event, produce nothing.
/// Panics if `width` is zero and the position is not.
pub fn build_cell(row: &SheetRow, layout: &ColumnLayout, width: i32) -> Option<Cell> {
    let pos = resolve_int(row.cell(layout.pos));
    if pos == 0 {
        return None;
    }

    let (x, y) = tile_coords(pos, width);
    let mut cell = Cell::new(pos, x, y);

    cell.events
        .extend(layout.events.iter().filter_map(|slot| read_event(row, slot)));

    if cell.events.is_empty() {
        return None;
    }

    Some(cell)
}

/// Collects every event-bearing cell of the sheet, in row order.
///
/// # Panics
///
/// Panics if `width` is zero; [`build_document`](crate::map_export::build_document)
/// validates the width before calling this.
pub fn extract_cells(sheet: &Sheet, layout: &ColumnLayout, width: i32) -> Vec<Cell> {
    let mut cells = Vec::new();

    for row_idx in layout.data_start_row..sheet.row_count() {
        let Some(row) = sheet.row(row_idx) else {
            continue;
        };

        match build_cell(row, layout, width) {
            Some(cell) => cells.push(cell),
            None => debug!(
                row = %cell_reference(row_idx, layout.pos),
                "skipping row without position or events"
            ),
        }
    }

    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::excel::CellValue;

    fn row(values: &[i64]) -> SheetRow {
        SheetRow::new(values.iter().map(|v| CellValue::Int(*v)).collect())
    }

    #[test]
    fn coordinates_wrap_on_width() {
        assert_eq!(tile_coords(1, 20), (0, 0));
        assert_eq!(tile_coords(20, 20), (19, 0));
        assert_eq!(tile_coords(21, 20), (0, 1));
        assert_eq!(tile_coords(400, 20), (19, 19));
        assert_eq!(tile_coords(-5, 20), (-6, 0));
    }

    #[test]
    fn zero_position_drops_row_even_with_events() {
        let layout = ColumnLayout::default();
        assert!(build_cell(&row(&[0, 5, 3, 7]), &layout, 20).is_none());
        assert!(build_cell(&SheetRow::default(), &layout, 20).is_none());
    }

    #[test]
    fn position_without_events_is_dropped() {
        let layout = ColumnLayout::default();
        assert!(build_cell(&row(&[12, 0, 0, 0, 0, 0, 0, 0, 0, 0]), &layout, 20).is_none());
        assert!(build_cell(&row(&[12]), &layout, 20).is_none());
    }

    #[test]
    fn weight_comes_from_percent_column() {
        let layout = ColumnLayout::default();
        let cell = build_cell(&row(&[21, 2, 50, 9]), &layout, 20).unwrap();

        assert_eq!((cell.pos, cell.x, cell.y, cell.tile_id), (21, 0, 1, 0));
        assert_eq!(cell.events, vec![Event::new(2, 9, 50)]);
    }

    #[test]
    fn events_keep_slot_order_and_skip_blank_slots() {
        let layout = ColumnLayout::default();
        let cell = build_cell(&row(&[3, 1, 10, 100, 0, 0, 0, 0, 0, 300]), &layout, 20).unwrap();

        assert_eq!(
            cell.events,
            vec![Event::new(1, 100, 10), Event::new(0, 300, 0)]
        );
    }

    #[test]
    fn mixed_value_kinds_resolve_per_cell() {
        let layout = ColumnLayout::default();
        let row = SheetRow::new(vec![
            CellValue::Text(" 5 ".to_string()),
            CellValue::Number(4.8),
            CellValue::Bool(true),
            CellValue::Text("oops".to_string()),
        ]);

        let cell = build_cell(&row, &layout, 4).unwrap();
        assert_eq!((cell.pos, cell.x, cell.y), (5, 0, 1));
        assert_eq!(cell.events, vec![Event::new(4, 0, 1)]);
    }

    #[test]
    fn extract_skips_headers_and_missing_rows() {
        let mut sheet = Sheet::new("Sheet1");
        // header rows carry values that would otherwise qualify
        for header_row in 0..3 {
            sheet.set_cell(header_row, 0, CellValue::Int(1));
            sheet.set_cell(header_row, 1, CellValue::Int(1));
        }
        sheet.set_cell(3, 0, CellValue::Int(2));
        sheet.set_cell(3, 1, CellValue::Int(6));
        // row 4 missing entirely
        sheet.set_cell(5, 0, CellValue::Int(2));
        sheet.set_cell(5, 3, CellValue::Int(8));
        sheet.set_cell(6, 0, CellValue::Int(0));
        sheet.set_cell(6, 1, CellValue::Int(5));

        let cells = extract_cells(&sheet, &ColumnLayout::default(), 20);

        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].events, vec![Event::new(6, 0, 0)]);
        // duplicate positions pass through
        assert_eq!(cells[1].pos, 2);
        assert_eq!(cells[1].events, vec![Event::new(0, 8, 0)]);
    }

    #[test]
    fn shifted_layout() {
        let layout = ColumnLayout::starting_at(2);
        let cell = build_cell(&row(&[99, 99, 7, 1, 2, 3]), &layout, 5).unwrap();
        assert_eq!((cell.pos, cell.x, cell.y), (7, 1, 1));
        assert_eq!(cell.events, vec![Event::new(1, 3, 2)]);
    }
}
