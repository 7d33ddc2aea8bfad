use serde_json::Value;

use crate::domain::{self, WorkerDomain};
use crate::injection;
use crate::report::{ContextReport, SectionReport};
use crate::summarizer;
use crate::truncation::{self, Section};

/// Deterministic context pack builder.
///
/// Pure function: accepts pre-fetched memories, STM state, and trip-plan
/// state, and returns the assembled prompt text plus a machine-readable
/// report. Called once per worker invocation with that worker's
/// [`WorkerDomain`] so `relevant_memories` gets filtered the way §4.3
/// requires before it ever reaches the model.
#[derive(Clone)]
pub struct ContextBuilder {
    pub max_per_section: usize,
    pub total_max: usize,
}

impl ContextBuilder {
    pub fn new(max_per_section: usize, total_max: usize) -> Self {
        Self { max_per_section, total_max }
    }

    /// Build the context pack for one worker's prompt.
    ///
    /// - `domain`: which worker this pack is for (drives memory filtering)
    /// - `memories`: `relevant_memories` as returned by the LTM store
    /// - `stm_summary` / `recent_messages`: rolling summary + ring buffer from STM
    /// - `trip_plan_summary`: the planner's current trip-plan snapshot, if any
    /// - `collected_info`: result slots already populated earlier this turn
    pub fn build(
        &self,
        domain: WorkerDomain,
        memories: &[String],
        stm_summary: Option<&str>,
        recent_messages: &[String],
        trip_plan_summary: Option<&Value>,
        collected_info: Option<&Value>,
    ) -> (String, ContextReport) {
        let filtered_memories = domain::filter_memories_for_domain(memories, domain);
        let memories_text = filtered_memories.join("\n");

        let mut stm_text = String::new();
        if let Some(summary) = stm_summary {
            if !summary.is_empty() {
                stm_text.push_str(summary);
                stm_text.push('\n');
            }
        }
        stm_text.push_str(&recent_messages.join("\n"));

        let trip_plan_text = trip_plan_summary.map(summarizer::render).unwrap_or_default();
        let collected_info_text = collected_info.map(summarizer::render).unwrap_or_default();

        let raw_sections: Vec<(&str, String)> = vec![
            ("RELEVANT_MEMORIES", memories_text),
            ("RECENT_CONVERSATION", stm_text),
            ("TRIP_PLAN", trip_plan_text),
            ("COLLECTED_INFO", collected_info_text),
        ];

        let mut sections: Vec<Section> = Vec::new();
        for (name, raw_content) in &raw_sections {
            if raw_content.is_empty() {
                sections.push(Section {
                    name: name.to_string(),
                    content: String::new(),
                    raw_chars: 0,
                    truncated_per_file: false,
                    truncated_total_cap: false,
                    included: true,
                    missing: true,
                });
                continue;
            }
            let raw_chars = raw_content.len();
            let (truncated_content, was_truncated) = truncation::truncate_per_file(raw_content, self.max_per_section);
            sections.push(Section {
                name: name.to_string(),
                content: truncated_content,
                raw_chars,
                truncated_per_file: was_truncated,
                truncated_total_cap: false,
                included: true,
                missing: false,
            });
        }

        truncation::apply_total_cap(&mut sections, self.total_max);

        let mut assembled = String::new();
        let mut section_reports: Vec<SectionReport> = Vec::new();

        for section in &sections {
            section_reports.push(SectionReport {
                name: section.name.clone(),
                raw_chars: section.raw_chars,
                injected_chars: if section.included && !section.missing { section.content.len() } else { 0 },
                truncated_per_file: section.truncated_per_file,
                truncated_total_cap: section.truncated_total_cap,
                included: section.included,
                missing: section.missing,
            });

            if !section.included {
                continue;
            }
            if section.missing {
                continue;
            }
            if section.content.is_empty() {
                continue;
            }

            let formatted = match section.name.as_str() {
                "RELEVANT_MEMORIES" => injection::format_memories(
                    &section.content,
                    section.raw_chars,
                    section.truncated_per_file,
                    section.truncated_total_cap,
                ),
                "RECENT_CONVERSATION" => injection::format_stm(
                    &section.content,
                    section.raw_chars,
                    section.truncated_per_file,
                    section.truncated_total_cap,
                ),
                "TRIP_PLAN" => injection::format_trip_plan(
                    &section.content,
                    section.raw_chars,
                    section.truncated_per_file,
                    section.truncated_total_cap,
                ),
                _ => injection::format_collected_info(
                    &section.content,
                    section.raw_chars,
                    section.truncated_per_file,
                    section.truncated_total_cap,
                ),
            };
            assembled.push_str(&formatted);
            assembled.push('\n');
        }

        let total_injected_chars = assembled.len();
        let report = ContextReport { sections: section_reports, total_injected_chars };

        (assembled, report)
    }
}
