//! Typed analysis result and its validation
//!
//! A provider response is accepted only if it deserializes into
//! [`AnalysisResult`] and passes [`AnalysisResult::check`]. Any deviation is a
//! malformed response.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::fence::strip_code_fence;
use crate::error::{Result, ServiceError};

/// Classification of the narrated decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegretLabel {
    #[serde(rename = "Regret by Action")]
    RegretByAction,
    #[serde(rename = "Regret by Inaction")]
    RegretByInaction,
    #[serde(rename = "No Regret", alias = "Minimal Regret")]
    NoRegret,
}

impl RegretLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegretLabel::RegretByAction => "Regret by Action",
            RegretLabel::RegretByInaction => "Regret by Inaction",
            RegretLabel::NoRegret => "No Regret",
        }
    }
}

impl fmt::Display for RegretLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThreatLevel {
    #[serde(alias = "low")]
    Low,
    #[serde(alias = "medium")]
    Medium,
    #[serde(alias = "high")]
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThreatScore {
    pub level: ThreatLevel,
    /// 1 (lowest) to 5 (highest)
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreatAnalysis {
    pub stress: ThreatScore,
    pub anxiety: ThreatScore,
    pub motivation_loss: ThreatScore,
    pub health_risk: ThreatScore,
}

impl ThreatAnalysis {
    /// Named sub-scores in display order
    pub fn scores(&self) -> [(&'static str, &ThreatScore); 4] {
        [
            ("stress", &self.stress),
            ("anxiety", &self.anxiety),
            ("motivationLoss", &self.motivation_loss),
            ("healthRisk", &self.health_risk),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmotionalTone {
    pub primary: String,
    #[serde(default)]
    pub secondary: Vec<String>,
}

/// A validated regret analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub label: RegretLabel,
    /// 0 to 100
    pub confidence: f64,
    /// 0 to 10, fractional allowed
    pub intensity: f64,
    pub reflection: String,
    pub perspective: String,
    pub insights: Vec<String>,
    pub suggestions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emotional_tone: Option<EmotionalTone>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_impact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub future_projection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irreversible_limitation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_analysis: Option<ThreatAnalysis>,
}

impl AnalysisResult {
    /// Assert numeric ranges and non-empty content
    pub fn check(&self) -> Result<()> {
        check_range("confidence", self.confidence, 0.0, 100.0)?;
        check_range("intensity", self.intensity, 0.0, 10.0)?;
        check_text("reflection", &self.reflection)?;
        check_text("perspective", &self.perspective)?;
        check_list("insights", &self.insights)?;
        check_list("suggestions", &self.suggestions)?;

        if let Some(tone) = &self.emotional_tone {
            check_text("emotionalTone.primary", &tone.primary)?;
        }

        if let Some(threats) = &self.threat_analysis {
            for (name, threat) in threats.scores() {
                check_range(&format!("threatAnalysis.{}.score", name), threat.score, 1.0, 5.0)?;
            }
        }

        Ok(())
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<()> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ServiceError::malformed(format!(
            "{} must be between {} and {}, got {}",
            field, min, max, value
        )))
    }
}

fn check_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ServiceError::malformed(format!("{} must not be empty", field)));
    }
    Ok(())
}

fn check_list(field: &str, values: &[String]) -> Result<()> {
    if values.is_empty() {
        return Err(ServiceError::malformed(format!("{} must not be empty", field)));
    }
    if values.iter().any(|v| v.trim().is_empty()) {
        return Err(ServiceError::malformed(format!("{} contains an empty entry", field)));
    }
    Ok(())
}

/// Decode and check a JSON value against the result contract
pub fn validate(value: Value) -> Result<AnalysisResult> {
    if !value.is_object() {
        return Err(ServiceError::malformed("Analysis response is not a JSON object"));
    }

    let result: AnalysisResult = serde_json::from_value(value)
        .map_err(|e| ServiceError::malformed(format!("Analysis response violates contract: {}", e)))?;
    result.check()?;
    Ok(result)
}

/// Strip code fencing from raw model text, parse it and validate it
pub fn parse_analysis(raw: &str) -> Result<AnalysisResult> {
    let json = strip_code_fence(raw);
    let value: Value = serde_json::from_str(json).map_err(|e| {
        log::debug!("Unparseable model output: {}", crate::util::truncate_string(raw, 200));
        ServiceError::malformed(format!("Response is not valid JSON: {}", e))
    })?;
    validate(value)
}
