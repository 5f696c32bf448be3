//! Batch results, summary metrics and CSV export

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use super::result::CombinedResult;

/// Default file name of a batch export
pub const BATCH_CSV_NAME: &str = "batch_results.csv";

/// Outcome of one input of a batch
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Display name (file name of the input)
    pub document: String,
    pub path: PathBuf,
    pub outcome: Result<CombinedResult, String>,
}

impl BatchItem {
    pub fn new(path: &Path, outcome: Result<CombinedResult, String>) -> Self {
        let document = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Self {
            document,
            path: path.to_path_buf(),
            outcome,
        }
    }

    /// Flatten into a table row
    pub fn to_row(&self, review_threshold: f32) -> BatchRow {
        match &self.outcome {
            Ok(result) => {
                let verdict = &result.fraud;
                let details = if verdict.needs_review(review_threshold) {
                    "Low confidence, review recommended".to_string()
                } else {
                    String::new()
                };

                BatchRow {
                    document: self.document.clone(),
                    status: if verdict.is_genuine() {
                        BatchStatus::Genuine
                    } else {
                        BatchStatus::Fraud
                    },
                    confidence: format!("{:.1}%", verdict.confidence * 100.0),
                    name: result.ocr.name.clone(),
                    dob: result.ocr.dob.clone(),
                    aadhaar_number: result.ocr.aadhaar_number.clone(),
                    details,
                }
            }
            Err(message) => BatchRow {
                document: self.document.clone(),
                status: BatchStatus::Error,
                confidence: "N/A".to_string(),
                name: String::new(),
                dob: String::new(),
                aadhaar_number: String::new(),
                details: message.clone(),
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    Genuine,
    Fraud,
    Error,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Genuine => "Genuine",
            BatchStatus::Fraud => "Fraud",
            BatchStatus::Error => "Error",
        }
    }
}

/// One line of the batch table / CSV
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRow {
    #[serde(rename = "Document")]
    pub document: String,
    #[serde(rename = "Status")]
    pub status: BatchStatus,
    #[serde(rename = "Confidence")]
    pub confidence: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "DOB")]
    pub dob: String,
    #[serde(rename = "AadhaarNumber")]
    pub aadhaar_number: String,
    #[serde(rename = "Details")]
    pub details: String,
}

/// Totals shown above the batch table
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub genuine: usize,
    pub fraud: usize,
    pub errors: usize,
}

impl BatchSummary {
    pub fn from_rows(rows: &[BatchRow]) -> Self {
        let mut summary = Self {
            total: rows.len(),
            ..Default::default()
        };
        for row in rows {
            match row.status {
                BatchStatus::Genuine => summary.genuine += 1,
                BatchStatus::Fraud => summary.fraud += 1,
                BatchStatus::Error => summary.errors += 1,
            }
        }
        summary
    }

    /// Fraud count over all rows, in percent
    pub fn fraud_rate(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.fraud as f32 / self.total as f32 * 100.0
        }
    }
}

/// Write rows as CSV with a header line
pub fn write_csv<W: Write>(writer: W, rows: &[BatchRow]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write rows to a CSV file
pub fn export_csv(path: &Path, rows: &[BatchRow]) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    write_csv(file, rows)
}
