use calamine::Data;

/// A single spreadsheet value, already evaluated.
///
/// Formula cells arrive here as the result the spreadsheet engine cached for them,
/// so a formula yielding 42 is indistinguishable from a literal 42.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Number(f64),
    Int(i64),
    Text(String),
    Bool(bool),
    #[default]
    Empty,
    /// Errors, dates and durations. None of them carry a map value.
    Other,
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.clone()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Int(*i),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::Error(_)
            | Data::DateTime(_)
            | Data::DateTimeIso(_)
            | Data::DurationIso(_) => CellValue::Other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use calamine::CellErrorType;

    #[test]
    fn converts_calamine_values() {
        assert_eq!(CellValue::from(&Data::Float(2.5)), CellValue::Number(2.5));
        assert_eq!(CellValue::from(&Data::Int(7)), CellValue::Int(7));
        assert_eq!(
            CellValue::from(&Data::String(" 12 ".to_string())),
            CellValue::Text(" 12 ".to_string())
        );
        assert_eq!(CellValue::from(&Data::Bool(true)), CellValue::Bool(true));
        assert!(CellValue::from(&Data::Empty).is_empty());
    }

    #[test]
    fn errors_and_dates_become_other() {
        assert_eq!(
            CellValue::from(&Data::Error(CellErrorType::Div0)),
            CellValue::Other
        );
        assert_eq!(
            CellValue::from(&Data::DateTimeIso("2024-01-01".to_string())),
            CellValue::Other
        );
    }
}
