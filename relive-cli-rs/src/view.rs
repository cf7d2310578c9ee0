//! Text rendering of the results view

use std::fmt::Write;

use analysis_sdk::{ResultsView, ServedBy};

pub fn render(view: &ResultsView) -> String {
    let result = &view.result;
    let mut out = String::new();

    let _ = writeln!(out, "{}", result.label);
    let _ = writeln!(
        out,
        "Confidence {:.0}%  Intensity {:.1}/10",
        result.confidence, result.intensity
    );
    if let Some(domain) = &result.affected_domain {
        let _ = writeln!(out, "Domain: {}", domain);
    }
    if let Some(tone) = &result.emotional_tone {
        if tone.secondary.is_empty() {
            let _ = writeln!(out, "Tone: {}", tone.primary);
        } else {
            let _ = writeln!(out, "Tone: {} ({})", tone.primary, tone.secondary.join(", "));
        }
    }

    section(&mut out, "Reflection", &result.reflection);
    section(&mut out, "Another perspective", &result.perspective);
    if let Some(text) = &result.current_impact {
        section(&mut out, "Current impact", text);
    }
    if let Some(text) = &result.future_projection {
        section(&mut out, "Looking ahead", text);
    }
    if let Some(text) = &result.irreversible_limitation {
        section(&mut out, "What can't be changed", text);
    }

    if let Some(threats) = &result.threat_analysis {
        let _ = writeln!(out, "\nWellbeing");
        for (name, threat) in threats.scores() {
            let _ = writeln!(out, "  {:<15} {:?} ({:.0}/5)", name, threat.level, threat.score);
        }
    }

    list(&mut out, "Insights", &result.insights);
    list(&mut out, "Suggestions", &result.suggestions);

    match &view.served_by {
        ServedBy::Model(model) => {
            let _ = writeln!(out, "\n(analyzed by {})", model);
        }
        ServedBy::Endpoint(url) => {
            let _ = writeln!(out, "\n(analyzed by {})", url);
        }
        ServedBy::Fallback => {
            let _ = writeln!(
                out,
                "\n(the AI service was unavailable; this is a general reflection, not a personal analysis)"
            );
        }
    }

    out
}

fn section(out: &mut String, title: &str, body: &str) {
    let _ = writeln!(out, "\n{}\n  {}", title, body);
}

fn list(out: &mut String, title: &str, items: &[String]) {
    let _ = writeln!(out, "\n{}", title);
    for item in items {
        let _ = writeln!(out, "  - {}", item);
    }
}
