use serde_json::Value;

use crate::truncation;

/// Condense a worker's raw result payload to something that fits a prompt
/// budget, before it's handed to the conversational worker.
///
/// A plain character truncation on `serde_json::to_string` is enough for
/// the over-budget cases that matter in practice (a TripAdvisor search
/// returning fifteen hits, a flight search returning both outbound and
/// return legs) — the conversational worker only needs an accurate gist,
/// not every field of every result.
pub fn summarize_for_prompt(payload: &Value, max_chars: usize) -> String {
    let rendered = render(payload);
    let (truncated, _) = truncation::truncate_per_file(&rendered, max_chars);
    truncated
}

pub(crate) fn render(payload: &Value) -> String {
    match payload {
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| format!("{}. {}", i + 1, render(item)))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| format!("{k}={}", compact(v)))
            .collect::<Vec<_>>()
            .join(", "),
        other => compact(other),
    }
}

fn compact(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
