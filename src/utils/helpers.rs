use std::path::{Path, PathBuf};

pub const OUTPUT_DIR: &str = "output";

/// Spreadsheet column letter for a 0-based column index (0 -> A, 26 -> AA).
#[must_use]
pub fn column_name(index: usize) -> String {
    let mut col_name = String::new();
    let mut n = index + 1;

    while n > 0 {
        let remainder = (n - 1) % 26;
        col_name.insert(0, (b'A' + remainder as u8) as char);
        n = (n - 1) / 26;
    }

    col_name
}

/// 0-based column index for spreadsheet letters (A -> 0, AA -> 26), case-insensitive.
#[must_use]
pub fn column_index(name: &str) -> Option<usize> {
    if name.is_empty() {
        return None;
    }

    let mut result: usize = 0;

    for c in name.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }

        let val = (c.to_ascii_uppercase() as u8 - b'A' + 1) as usize;
        result = result.checked_mul(26)?.checked_add(val)?;
    }

    Some(result - 1)
}

// Format cell reference (e.g., A4) from 0-based row and column
#[must_use]
pub fn cell_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_name(col), row + 1)
}

/// `data/town.xlsx` -> `output/town.json`, whatever directory the input lives in.
#[must_use]
pub fn json_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "map".to_string());

    Path::new(OUTPUT_DIR).join(format!("{}.json", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(9), "J");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(cell_reference(3, 0), "A4");
        assert_eq!(column_index("A"), Some(0));
        assert_eq!(column_index("j"), Some(9));
        assert_eq!(column_index("AA"), Some(26));
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn output_path_ignores_input_directory() {
        assert_eq!(
            json_output_path(Path::new("data/town.xlsx")),
            Path::new("output").join("town.json")
        );
        assert_eq!(
            json_output_path(Path::new("/abs/dir/map.v2.xlsx")),
            Path::new("output").join("map.v2.json")
        );
        assert_eq!(
            json_output_path(Path::new("plain")),
            Path::new("output").join("plain.json")
        );
    }
}
