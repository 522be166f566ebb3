use crate::excel::CellValue;

/// Resolves a spreadsheet value to the integer the map format stores.
///
/// Numbers truncate toward zero (saturating at the `i32` bounds), text is parsed
/// after trimming, booleans become 1/0. Anything unparseable resolves to 0.
pub fn resolve_int(value: &CellValue) -> i32 {
    match value {
        CellValue::Number(f) => *f as i32,
        CellValue::Int(i) => (*i).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32,
        CellValue::Text(s) => s.trim().parse::<i32>().unwrap_or(0),
        CellValue::Bool(b) => i32::from(*b),
        CellValue::Empty | CellValue::Other => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_truncate_toward_zero() {
        assert_eq!(resolve_int(&CellValue::Number(42.0)), 42);
        assert_eq!(resolve_int(&CellValue::Number(3.9)), 3);
        assert_eq!(resolve_int(&CellValue::Number(-3.9)), -3);
        assert_eq!(resolve_int(&CellValue::Number(f64::NAN)), 0);
        assert_eq!(resolve_int(&CellValue::Number(1e12)), i32::MAX);
        assert_eq!(resolve_int(&CellValue::Int(-5)), -5);
        assert_eq!(resolve_int(&CellValue::Int(i64::MIN)), i32::MIN);
    }

    #[test]
    fn text_is_trimmed_and_parsed() {
        assert_eq!(resolve_int(&CellValue::Text("  17 ".to_string())), 17);
        assert_eq!(resolve_int(&CellValue::Text("-4".to_string())), -4);
        assert_eq!(resolve_int(&CellValue::Text("12abc".to_string())), 0);
        assert_eq!(resolve_int(&CellValue::Text("1.5".to_string())), 0);
        assert_eq!(resolve_int(&CellValue::Text(String::new())), 0);
    }

    #[test]
    fn booleans_blanks_and_others() {
        assert_eq!(resolve_int(&CellValue::Bool(true)), 1);
        assert_eq!(resolve_int(&CellValue::Bool(false)), 0);
        assert_eq!(resolve_int(&CellValue::Empty), 0);
        assert_eq!(resolve_int(&CellValue::Other), 0);
    }
}
