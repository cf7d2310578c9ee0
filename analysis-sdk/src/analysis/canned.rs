//! Canned result served when every model is exhausted and graceful
//! degradation is enabled

use super::contract::{AnalysisResult, EmotionalTone, RegretLabel};

pub fn fallback_result() -> AnalysisResult {
    AnalysisResult {
        label: RegretLabel::RegretByInaction,
        confidence: 50.0,
        intensity: 5.0,
        reflection: "Our analysis service is busy right now, so this is a general reflection rather than a personal one. \
            Looking back at a decision with fresh eyes is a sign of growth, not failure."
            .to_string(),
        perspective: "You made the best choice you could with what you knew at the time. \
            Hindsight adds information you did not have."
            .to_string(),
        insights: vec![
            "Regrets about missed chances tend to linger longer than regrets about actions taken.".to_string(),
            "The feeling often points at a value that still matters to you.".to_string(),
        ],
        suggestions: vec![
            "Write down what you would want from a similar opportunity today.".to_string(),
            "Pick one small step toward it this week.".to_string(),
            "Try the analysis again in a few minutes for a personal reading.".to_string(),
        ],
        affected_domain: None,
        emotional_tone: Some(EmotionalTone {
            primary: "reflective".to_string(),
            secondary: vec!["hopeful".to_string()],
        }),
        current_impact: None,
        future_projection: None,
        irreversible_limitation: None,
        threat_analysis: None,
    }
}
