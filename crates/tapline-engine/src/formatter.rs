use crate::runner::{ActionOutcome, ScriptReport};
use tapline_common::schema::ActionSpec;

pub fn format_report(report: &ScriptReport) -> String {
    let mut output = String::new();
    for outcome in &report.outcomes {
        output.push_str(&format_outcome(outcome, report.total));
        output.push('\n');
    }

    match &report.abort {
        None => output.push_str(&format!(
            "Script completed: {}/{} actions succeeded.",
            report.completed(),
            report.total
        )),
        Some(abort) => {
            let position = match (abort.index, &abort.kind) {
                (Some(index), Some(kind)) => format!(" at action {} ({})", index + 1, kind),
                _ => String::new(),
            };
            output.push_str(&format!(
                "Script aborted{}: [{}] {}\nHint: {}",
                position,
                abort.reason.code(),
                abort.reason,
                abort.reason.recovery_hint()
            ));
            let skipped = report.total.saturating_sub(report.outcomes.len());
            if skipped > 0 {
                output.push_str(&format!("\n{} action(s) not run.", skipped));
            }
        }
    }
    output
}

fn format_outcome(outcome: &ActionOutcome, total: usize) -> String {
    let status = if outcome.succeeded { "ok" } else { "FAILED" };
    let mut line = format!("[{}/{}] {} {}", outcome.index + 1, total, outcome.kind, status);
    if let Some(description) = &outcome.description {
        line.push_str(&format!(" - {}", description));
    }
    if let Some(target) = &outcome.matched_target {
        line.push_str(&format!("\n    target: {}", target));
    }
    if let Some(text) = &outcome.output {
        line.push_str(&format!("\n    output: {:?}", text));
    }
    if let Some(reason) = &outcome.failure {
        line.push_str(&format!("\n    reason: {}", reason));
    }
    line
}

/// One line per action kind with its parameter contract.
pub fn format_schema(specs: &[ActionSpec]) -> String {
    let mut output = String::new();
    for spec in specs {
        let params = &spec.params;
        let mut parts: Vec<String> = Vec::new();
        parts.extend(params.required.iter().map(|k| k.to_string()));
        parts.extend(params.required_allow_empty.iter().map(|k| k.to_string()));
        parts.extend(params.one_of.iter().map(|group| format!("one of {{{}}}", group.join(", "))));
        parts.extend(params.optional.iter().map(|k| format!("[{}]", k)));
        if parts.is_empty() {
            output.push_str(&format!("{}\n", spec.kind));
        } else {
            output.push_str(&format!("{:<30} {}\n", spec.kind.as_str(), parts.join(", ")));
        }
    }
    output
}
