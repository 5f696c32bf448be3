//! Verdicts and the combined per-image result

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::vision::{ClassScores, ExtractedFields, Region};

/// Classifier decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Label {
    Real,
    Fake,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Real => write!(f, "REAL"),
            Label::Fake => write!(f, "FAKE"),
        }
    }
}

/// Real/fake verdict with both raw scores
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FraudVerdict {
    pub label: Label,
    /// Score of the winning class
    pub confidence: f32,
    pub real_score: f32,
    pub fake_score: f32,
}

impl FraudVerdict {
    /// `REAL` only when the real score is strictly higher; ties are `FAKE`
    pub fn from_scores(scores: ClassScores) -> Self {
        let real = scores.real.clamp(0.0, 1.0);
        let fake = scores.fake.clamp(0.0, 1.0);

        let label = if real > fake { Label::Real } else { Label::Fake };

        Self {
            label,
            confidence: real.max(fake),
            real_score: real,
            fake_score: fake,
        }
    }

    pub fn is_genuine(&self) -> bool {
        self.label == Label::Real
    }

    /// Whether a human should double check this verdict
    pub fn needs_review(&self, threshold: f32) -> bool {
        self.confidence < threshold
    }
}

/// Everything produced for one document image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CombinedResult {
    pub image_path: PathBuf,
    /// Equals `image_path` when no region was cropped
    pub crop_path: PathBuf,
    pub fraud: FraudVerdict,
    pub ocr: ExtractedFields,
    /// Region the classifier looked at, if any
    pub region: Option<Region>,
    pub processing_time_ms: u64,
}

impl CombinedResult {
    pub fn was_cropped(&self) -> bool {
        self.crop_path != self.image_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_real_wins() {
        let verdict = FraudVerdict::from_scores(ClassScores {
            fake: 0.1,
            real: 0.9,
        });
        assert_eq!(verdict.label, Label::Real);
        assert!((verdict.confidence - 0.9).abs() < 1e-6);
        assert!(verdict.is_genuine());
    }

    #[test]
    fn test_verdict_fake_wins() {
        let verdict = FraudVerdict::from_scores(ClassScores {
            fake: 0.7,
            real: 0.3,
        });
        assert_eq!(verdict.label, Label::Fake);
        assert!((verdict.confidence - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_tie_is_fake() {
        let verdict = FraudVerdict::from_scores(ClassScores {
            fake: 0.5,
            real: 0.5,
        });
        assert_eq!(verdict.label, Label::Fake);
        assert!((verdict.confidence - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_is_bounded_max() {
        for (fake, real) in [(0.0, 0.0), (1.0, 0.0), (0.2, 0.6), (1.4, -0.2)] {
            let verdict = FraudVerdict::from_scores(ClassScores { fake, real });
            assert!((0.0..=1.0).contains(&verdict.confidence));
            assert_eq!(
                verdict.confidence,
                verdict.real_score.max(verdict.fake_score)
            );
        }
    }

    #[test]
    fn test_needs_review() {
        let verdict = FraudVerdict::from_scores(ClassScores {
            fake: 0.25,
            real: 0.75,
        });
        assert!(verdict.needs_review(0.8));
        assert!(!verdict.needs_review(0.75));
    }

    #[test]
    fn test_label_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Label::Real).unwrap(), "\"REAL\"");
        assert_eq!(Label::Fake.to_string(), "FAKE");
    }
}
