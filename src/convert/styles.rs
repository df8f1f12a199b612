//! Stylesheet inspection inside EPUB archives.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::debug;

use super::error::TransformError;

/// CSS properties that override the reader's own typography settings.
pub const FILTERED_STYLE_PROPERTIES: [&str; 3] = ["font-family", "font-size", "line-height"];

/// Returns the filtered properties that appear in any stylesheet of the archive.
///
/// Every entry whose name ends in `.css` (any case) is read; the scan is
/// case-insensitive. The result lists each property at most once, in the
/// order of [`FILTERED_STYLE_PROPERTIES`].
///
/// # Errors
///
/// Returns [`TransformError`] if the file cannot be opened or is not a zip
/// archive.
pub fn find_hardcoded_styles(path: &Path) -> Result<Vec<&'static str>, TransformError> {
    let file = File::open(path).map_err(|e| TransformError::io(path, e))?;
    let mut archive =
        zip::ZipArchive::new(BufReader::new(file)).map_err(|e| TransformError::archive(path, e))?;

    let mut found = Vec::new();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| TransformError::archive(path, e))?;
        if !entry.name().to_ascii_lowercase().ends_with(".css") {
            continue;
        }

        let mut raw = Vec::new();
        entry
            .read_to_end(&mut raw)
            .map_err(|e| TransformError::io(path, e))?;
        let css = String::from_utf8_lossy(&raw).to_ascii_lowercase();

        for property in FILTERED_STYLE_PROPERTIES {
            if !found.contains(&property) && css.contains(property) {
                debug!(stylesheet = %entry.name(), property, "found hardcoded style");
                found.push(property);
            }
        }
    }

    found.sort_by_key(|p| FILTERED_STYLE_PROPERTIES.iter().position(|q| q == p));
    Ok(found)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Write;

    use zip::write::SimpleFileOptions;

    use super::*;

    fn write_epub(path: &Path, entries: &[(&str, &str)]) {
        let file = File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_no_stylesheets_means_nothing_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.epub");
        write_epub(&path, &[("OEBPS/ch1.xhtml", "<p style=\"font-size:2em\">x</p>")]);
        assert!(find_hardcoded_styles(&path).unwrap().is_empty());
    }

    #[test]
    fn test_clean_stylesheet_means_nothing_found() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.epub");
        write_epub(&path, &[("OEBPS/style.css", "p { margin: 0; color: black; }")]);
        assert!(find_hardcoded_styles(&path).unwrap().is_empty());
    }

    #[test]
    fn test_detects_properties_case_insensitively() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.epub");
        write_epub(
            &path,
            &[
                ("OEBPS/Styles/MAIN.CSS", "body { LINE-HEIGHT: 1.4 }"),
                ("OEBPS/extra.css", "h1 { Font-Family: serif }"),
            ],
        );
        assert_eq!(
            find_hardcoded_styles(&path).unwrap(),
            vec!["font-family", "line-height"]
        );
    }

    #[test]
    fn test_not_a_zip_is_archive_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("a.epub");
        std::fs::write(&path, b"plain text").unwrap();
        assert!(matches!(
            find_hardcoded_styles(&path),
            Err(TransformError::Archive { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            find_hardcoded_styles(&dir.path().join("missing.epub")),
            Err(TransformError::Io { .. })
        ));
    }
}
