//! RFC-4180 CSV export over the fixed schema column order.
//!
//! Fields with embedded line breaks (ingredients, directions) are legal CSV
//! when quoted, so they are preserved verbatim rather than flattened.

use std::fs;
use std::path::Path;

use super::ExportError;
use crate::schema::{RecipeField, RecipeRecord};

/// Write all records to one CSV file: a header row of display names in
/// schema order, then one row per record.
pub fn write_csv(path: &Path, records: &[RecipeRecord]) -> Result<(), ExportError> {
    let mut out = String::new();
    out.push_str(&header_row());
    out.push_str("\r\n");
    for record in records {
        out.push_str(&record_row(record));
        out.push_str("\r\n");
    }
    fs::write(path, out).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(path = %path.display(), rows = records.len(), "CSV export written");
    Ok(())
}

fn header_row() -> String {
    RecipeField::ALL
        .iter()
        .map(|f| escape_field(f.display_name()))
        .collect::<Vec<_>>()
        .join(",")
}

fn record_row(record: &RecipeRecord) -> String {
    record
        .iter()
        .map(|(_, value)| escape_field(value))
        .collect::<Vec<_>>()
        .join(",")
}

/// RFC-4180 quoting: wrap in double quotes when the value contains a comma,
/// quote, CR or LF; double any inner quotes.
fn escape_field(value: &str) -> String {
    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_with(title: &str, ingredients: &str) -> RecipeRecord {
        let mut record = RecipeRecord::new();
        record.set(RecipeField::Title, title);
        record.set(RecipeField::Ingredients, ingredients);
        record
    }

    #[test]
    fn header_lists_display_names_in_schema_order() {
        let header = header_row();
        assert!(header.starts_with("Title,Course,Cuisine,Main Ingredient"));
        assert!(header.ends_with("Nutrition Score,Cost"));
        assert_eq!(header.split(',').count(), RecipeField::COUNT);
    }

    #[test]
    fn plain_fields_are_unquoted() {
        assert_eq!(escape_field("Chicken Soup"), "Chicken Soup");
    }

    #[test]
    fn commas_and_quotes_are_escaped() {
        assert_eq!(escape_field("salt, pepper"), "\"salt, pepper\"");
        assert_eq!(escape_field("the \"best\""), "\"the \"\"best\"\"\"");
    }

    #[test]
    fn line_breaks_are_quoted_and_preserved() {
        assert_eq!(escape_field("flour\neggs"), "\"flour\neggs\"");
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.csv");
        let records = vec![
            record_with("Pancakes", "flour\neggs\nmilk"),
            record_with("Toast, Deluxe", "bread"),
        ];

        write_csv(&path, &records).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let mut lines = content.split("\r\n");

        assert!(lines.next().unwrap().starts_with("Title,"));
        let row1 = lines.next().unwrap();
        assert!(row1.starts_with("Pancakes,"));
        // The multi-line ingredients field spans physical lines inside quotes.
        assert!(content.contains("\"flour\neggs\nmilk\""));
        assert!(content.contains("\"Toast, Deluxe\""));
    }

    #[test]
    fn empty_run_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.csv");
        write_csv(&path, &[]).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.matches("\r\n").count(), 1);
    }

    #[test]
    fn unwritable_path_is_reported() {
        let err = write_csv(Path::new("/nonexistent/dir/out.csv"), &[]).unwrap_err();
        assert!(matches!(err, ExportError::Write { .. }));
    }
}
