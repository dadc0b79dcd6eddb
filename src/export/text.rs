//! Optional plain-text export: one file per successful recipe.

use std::fs;
use std::path::{Path, PathBuf};

use super::ExportError;
use crate::sanitize::clean_filename;
use crate::schema::{RecipeField, RecipeRecord};

/// Write one `.txt` file per record into `dir`, creating it if needed.
/// Filenames come from the sanitized title; collisions get `-2`, `-3`, …
/// suffixes. Returns the written paths.
pub fn write_text_files(dir: &Path, records: &[RecipeRecord]) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::with_capacity(records.len());
    for record in records {
        let stem = clean_filename(record.get(RecipeField::Title));
        let path = unique_path(dir, &stem);
        fs::write(&path, render_record(record)).map_err(|source| ExportError::Write {
            path: path.clone(),
            source,
        })?;
        written.push(path);
    }
    tracing::info!(dir = %dir.display(), files = written.len(), "text export written");
    Ok(written)
}

fn unique_path(dir: &Path, stem: &str) -> PathBuf {
    let first = dir.join(format!("{stem}.txt"));
    if !first.exists() {
        return first;
    }
    let mut n = 2;
    loop {
        let candidate = dir.join(format!("{stem}-{n}.txt"));
        if !candidate.exists() {
            return candidate;
        }
        n += 1;
    }
}

/// Title, blank line, then each non-empty field as `Display Name: value`,
/// with multi-line values indented under their label.
fn render_record(record: &RecipeRecord) -> String {
    let mut out = String::new();
    out.push_str(record.get(RecipeField::Title));
    out.push_str("\n\n");
    for (field, value) in record.iter() {
        if field == RecipeField::Title || value.is_empty() {
            continue;
        }
        if value.contains('\n') {
            out.push_str(&format!("{}:\n", field.display_name()));
            for line in value.lines() {
                out.push_str(&format!("  {line}\n"));
            }
        } else {
            out.push_str(&format!("{}: {value}\n", field.display_name()));
        }
    }
    out
}
