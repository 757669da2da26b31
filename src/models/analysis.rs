use serde::{Deserialize, Serialize};

use crate::error::{RawlineError, Result};

// ---------------------------------------------------------------------------
// AnalysisResult — Curator output for one request
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub era: String,
    pub style_notes: String,
    pub rework_suggestion: String,
    pub rawline_score: f64,
}

impl AnalysisResult {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=100.0).contains(&self.rawline_score) {
            return Err(RawlineError::AiResponse(format!(
                "rawlineScore {} outside 0-100",
                self.rawline_score
            )));
        }
        Ok(())
    }
}
