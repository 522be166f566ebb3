use std::collections::BTreeMap;

use crate::excel::CellValue;

static EMPTY: CellValue = CellValue::Empty;

/// The first worksheet of a workbook, addressed by absolute 0-based coordinates.
///
/// `rows[3]` is always spreadsheet row 4, even when the used range starts further down.
/// A `None` row had no cells at all in the used range.
///
/// `formulas` holds the source of every formula cell (without the leading `=`),
/// keyed by `(row, col)`; the matching entry in `rows` is the value cached in the file
/// until the formulas are evaluated.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Option<SheetRow>>,
    pub formulas: BTreeMap<(usize, usize), String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetRow {
    pub cells: Vec<CellValue>,
}

impl SheetRow {
    pub fn new(cells: Vec<CellValue>) -> Self {
        Self { cells }
    }

    /// Cells past the end of the row read as empty.
    pub fn cell(&self, col: usize) -> &CellValue {
        self.cells.get(col).unwrap_or(&EMPTY)
    }
}

impl Sheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
            formulas: BTreeMap::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn row(&self, row: usize) -> Option<&SheetRow> {
        self.rows.get(row).and_then(Option::as_ref)
    }

    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.row(row).map_or(&EMPTY, |r| r.cell(col))
    }

    pub fn formula(&self, row: usize, col: usize) -> Option<&str> {
        self.formulas.get(&(row, col)).map(String::as_str)
    }

    pub fn set_formula(&mut self, row: usize, col: usize, formula: &str) {
        let source = formula.trim().trim_start_matches('=');
        self.formulas.insert((row, col), source.to_string());
    }

    /// Stores `value` at `(row, col)`, growing the grid as needed.
    pub fn set_cell(&mut self, row: usize, col: usize, value: CellValue) {
        if row >= self.rows.len() {
            self.rows.resize_with(row + 1, || None);
        }

        let sheet_row = self.rows[row].get_or_insert_with(SheetRow::default);
        if col >= sheet_row.cells.len() {
            sheet_row.cells.resize_with(col + 1, CellValue::default);
        }
        sheet_row.cells[col] = value;
    }
}
