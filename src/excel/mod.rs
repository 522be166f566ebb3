mod cell;
mod formula;
mod sheet;
mod workbook;

pub use cell::CellValue;
pub use formula::{FormulaEvaluator, evaluate_formulas};
pub use sheet::{Sheet, SheetRow};
pub use workbook::open_sheet;
