//! Identity field extraction from recognized text

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Reported for any field the text does not contain
pub const NOT_FOUND: &str = "Not Found";

/// Twelve digits in three space-separated groups of four
static AADHAAR_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4}\s\d{4}\s\d{4}\b").expect("valid aadhaar regex"));

/// dd-mm-yyyy or dd/mm/yyyy
static DATE_OF_BIRTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{2}[-/]\d{2}[-/]\d{4}\b").expect("valid dob regex"));

/// Fields read off a document image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedFields {
    #[serde(rename = "Filename")]
    pub filename: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "DOB")]
    pub dob: String,
    #[serde(rename = "AadhaarNumber")]
    pub aadhaar_number: String,
    pub raw_text: String,
}

impl ExtractedFields {
    pub fn has_aadhaar_number(&self) -> bool {
        self.aadhaar_number != NOT_FOUND
    }
}

/// Parse identity fields out of OCR text.
///
/// The name is the first line longer than two characters once trimmed,
/// which on a card front is normally the holder's name.
pub fn parse_fields(filename: &str, text: &str) -> ExtractedFields {
    let aadhaar_number = AADHAAR_NUMBER
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string());

    let dob = DATE_OF_BIRTH
        .find(text)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string());

    let name = text
        .lines()
        .map(str::trim)
        .find(|line| line.chars().count() > 2)
        .unwrap_or(NOT_FOUND)
        .to_string();

    ExtractedFields {
        filename: filename.to_string(),
        name,
        dob,
        aadhaar_number,
        raw_text: text.to_string(),
    }
}
