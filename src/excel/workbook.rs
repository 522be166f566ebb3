use anyhow::{Context, Result};
use calamine::{Data, Range, Reader, open_workbook_auto};
use std::path::Path;
use tracing::{debug, warn};

use crate::excel::{CellValue, Sheet, evaluate_formulas};

/// Opens a workbook and loads its first worksheet.
///
/// Formula cells are evaluated against the sheet; the result cached in the file is
/// only kept for formulas the evaluator cannot handle.
pub fn open_sheet<P: AsRef<Path>>(path: P) -> Result<Sheet> {
    let path_ref = path.as_ref();

    let mut workbook = open_workbook_auto(path_ref)
        .with_context(|| format!("Unable to parse Excel file: {}", path_ref.display()))?;

    let name = workbook
        .sheet_names()
        .first()
        .cloned()
        .context("No worksheets found in file")?;

    let range = workbook
        .worksheet_range_at(0)
        .context("No worksheets found in file")?
        .with_context(|| format!("Unable to read worksheet: {}", name))?;

    let mut sheet = create_sheet_from_range(&name, &range);

    match workbook.worksheet_formula(&name) {
        Ok(formulas) => add_formulas(&mut sheet, &formulas),
        Err(err) => warn!(
            sheet = %name,
            "Unable to read formulas, using cached results: {}",
            err
        ),
    }
    evaluate_formulas(&mut sheet);

    debug!(
        sheet = %sheet.name,
        rows = sheet.row_count(),
        formulas = sheet.formulas.len(),
        "loaded worksheet"
    );

    Ok(sheet)
}

fn create_sheet_from_range(name: &str, range: &Range<Data>) -> Sheet {
    let mut sheet = Sheet::new(name);

    // used_cells() is relative to the range start; the sheet keeps absolute coordinates
    let (start_row, start_col) = range
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    for (row_idx, col_idx, cell) in range.used_cells() {
        sheet.set_cell(start_row + row_idx, start_col + col_idx, CellValue::from(cell));
    }

    sheet
}

fn add_formulas(sheet: &mut Sheet, formulas: &Range<String>) {
    let (start_row, start_col) = formulas
        .start()
        .map(|(row, col)| (row as usize, col as usize))
        .unwrap_or((0, 0));

    for (row_idx, col_idx, formula) in formulas.used_cells() {
        if !formula.trim().is_empty() {
            sheet.set_formula(start_row + row_idx, start_col + col_idx, formula);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_absolute_coordinates_for_offset_ranges() {
        let mut range: Range<Data> = Range::new((3, 1), (4, 2));
        range.set_value((3, 1), Data::Int(5));
        range.set_value((4, 2), Data::String("x".to_string()));

        let sheet = create_sheet_from_range("Map", &range);

        assert_eq!(sheet.name, "Map");
        assert_eq!(sheet.row_count(), 5);
        assert!(sheet.row(0).is_none());
        assert_eq!(sheet.row(3).unwrap().cell(1), &CellValue::Int(5));
        assert_eq!(
            sheet.row(4).unwrap().cell(2),
            &CellValue::Text("x".to_string())
        );
    }

    #[test]
    fn formulas_keep_absolute_coordinates() {
        let mut sheet = Sheet::new("Map");
        let mut formulas: Range<String> = Range::new((3, 0), (3, 1));
        formulas.set_value((3, 1), "40+2".to_string());

        add_formulas(&mut sheet, &formulas);

        assert_eq!(sheet.formula(3, 1), Some("40+2"));
        assert_eq!(sheet.formulas.len(), 1);
    }

    #[test]
    fn missing_file_is_an_error() {
        let err = open_sheet("does/not/exist.xlsx").unwrap_err();
        assert!(format!("{:#}", err).contains("Unable to parse Excel file"));
    }
}
