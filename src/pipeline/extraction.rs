//! Text-only pass over a folder of document images
//!
//! Runs field extraction without detection or classification. Each image's
//! recognized text is kept next to the report as `<file name>.txt`.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use crate::storage::outputs::list_images;
use crate::vision::{parse_fields, ExtractedFields, TextExtractor};

/// File name of the extraction report
pub const OCR_CSV_NAME: &str = "ocr_results.csv";

/// Report header, written even when no image yields a row
const OCR_CSV_HEADER: [&str; 4] = ["Filename", "Name", "DOB", "AadhaarNumber"];

/// One report line; the raw text goes to its own file
#[derive(Debug, Serialize)]
struct OcrRow<'a> {
    #[serde(rename = "Filename")]
    filename: &'a str,
    #[serde(rename = "Name")]
    name: &'a str,
    #[serde(rename = "DOB")]
    dob: &'a str,
    #[serde(rename = "AadhaarNumber")]
    aadhaar_number: &'a str,
}

impl<'a> From<&'a ExtractedFields> for OcrRow<'a> {
    fn from(fields: &'a ExtractedFields) -> Self {
        Self {
            filename: &fields.filename,
            name: &fields.name,
            dob: &fields.dob,
            aadhaar_number: &fields.aadhaar_number,
        }
    }
}

/// Extract fields from every image in `input_dir`.
///
/// Writes `<output_dir>/<file name>.txt` per image and `ocr_results.csv`
/// over all of them. Images that fail to decode or recognize are skipped.
pub fn extract_directory(
    extractor: &mut dyn TextExtractor,
    input_dir: &Path,
    output_dir: &Path,
) -> Result<Vec<ExtractedFields>> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    let images = list_images(input_dir)
        .with_context(|| format!("Failed to read {}", input_dir.display()))?;

    let mut results = Vec::with_capacity(images.len());
    for path in &images {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        info!("Processing {}...", file_name);

        let image = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                warn!("Skipping {:?}: {}", path, e);
                continue;
            }
        };

        let text = match extractor.extract_text(&image) {
            Ok(text) => text,
            Err(e) => {
                warn!("Text extraction failed for {:?}: {}", path, e);
                continue;
            }
        };

        std::fs::write(output_dir.join(format!("{file_name}.txt")), &text)?;
        results.push(parse_fields(&file_name, &text));
    }

    let csv_path = output_dir.join(OCR_CSV_NAME);
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(&csv_path)
        .with_context(|| format!("Failed to create output file: {}", csv_path.display()))?;
    wtr.write_record(OCR_CSV_HEADER)?;
    for fields in &results {
        wtr.serialize(OcrRow::from(fields))?;
    }
    wtr.flush()?;

    info!("Extracted {} of {} images into {:?}", results.len(), images.len(), csv_path);
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::{write_image, FixedText};
    use crate::vision::NOT_FOUND;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[test]
    fn test_extract_directory_writes_report_and_text() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        write_image(&input, "a.png", 8, 8);
        write_image(&input, "b.jpg", 8, 8);
        std::fs::write(input.join("broken.png"), b"junk").unwrap();
        std::fs::write(input.join("notes.txt"), b"skip me").unwrap();

        let mut extractor = FixedText {
            text: "Meera Iyer\nDOB: 05-06-1985\n4321 8765 2109\n".to_string(),
            seen: Arc::default(),
        };

        let out = dir.path().join("out");
        let results = extract_directory(&mut extractor, &input, &out).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].filename, "a.png");
        assert_eq!(results[0].aadhaar_number, "4321 8765 2109");
        assert_eq!(results[1].dob, "05-06-1985");

        let raw = std::fs::read_to_string(out.join("a.png.txt")).unwrap();
        assert!(raw.starts_with("Meera Iyer"));
        assert!(!out.join("broken.png.txt").exists());

        let csv = std::fs::read_to_string(out.join(OCR_CSV_NAME)).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Filename,Name,DOB,AadhaarNumber"));
        assert_eq!(lines.next(), Some("a.png,Meera Iyer,05-06-1985,4321 8765 2109"));
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn test_extract_directory_reports_missing_fields() {
        let dir = tempdir().unwrap();
        write_image(dir.path(), "blank.png", 8, 8);

        let mut extractor = FixedText {
            text: String::new(),
            seen: Arc::default(),
        };

        let results = extract_directory(&mut extractor, dir.path(), &dir.path().join("out")).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, NOT_FOUND);
        assert_eq!(results[0].aadhaar_number, NOT_FOUND);
    }

    #[test]
    fn test_extract_directory_header_without_rows() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("broken.png"), b"junk").unwrap();

        let mut extractor = FixedText {
            text: String::new(),
            seen: Arc::default(),
        };

        let out = dir.path().join("out");
        let results = extract_directory(&mut extractor, &input, &out).unwrap();
        assert!(results.is_empty());

        let csv = std::fs::read_to_string(out.join(OCR_CSV_NAME)).unwrap();
        assert_eq!(csv.lines().collect::<Vec<_>>(), vec!["Filename,Name,DOB,AadhaarNumber"]);
    }

    #[test]
    fn test_extract_directory_missing_input() {
        let dir = tempdir().unwrap();
        let mut extractor = FixedText {
            text: String::new(),
            seen: Arc::default(),
        };
        assert!(extract_directory(&mut extractor, &dir.path().join("nope"), dir.path()).is_err());
    }
}
