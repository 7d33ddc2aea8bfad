/// Format a relevant-memories section with machine-inspectable delimiters.
pub fn format_memories(content: &str, raw_chars: usize, truncated_per_file: bool, truncated_total_cap: bool) -> String {
    let injected_chars = content.len();
    format!(
        "\
=== RELEVANT_MEMORIES ===
RAW_CHARS: {raw_chars}
INJECTED_CHARS: {injected_chars}
TRUNCATED_PER_FILE: {truncated_per_file}
TRUNCATED_TOTAL_CAP: {truncated_total_cap}
--- BEGIN ---
{content}
--- END ---
"
    )
}

/// Format the short-term-memory summary + recent turns section.
pub fn format_stm(content: &str, raw_chars: usize, truncated_per_file: bool, truncated_total_cap: bool) -> String {
    let injected_chars = content.len();
    format!(
        "\
=== RECENT_CONVERSATION ===
RAW_CHARS: {raw_chars}
INJECTED_CHARS: {injected_chars}
TRUNCATED_PER_FILE: {truncated_per_file}
TRUNCATED_TOTAL_CAP: {truncated_total_cap}
--- BEGIN ---
{content}
--- END ---
"
    )
}

/// Format the trip-plan summary section.
pub fn format_trip_plan(content: &str, raw_chars: usize, truncated_per_file: bool, truncated_total_cap: bool) -> String {
    let injected_chars = content.len();
    format!(
        "\
=== TRIP_PLAN ===
RAW_CHARS: {raw_chars}
INJECTED_CHARS: {injected_chars}
TRUNCATED_PER_FILE: {truncated_per_file}
TRUNCATED_TOTAL_CAP: {truncated_total_cap}
--- BEGIN ---
{content}
--- END ---
"
    )
}

/// Format the collected-info section (results already gathered this turn).
pub fn format_collected_info(content: &str, raw_chars: usize, truncated_per_file: bool, truncated_total_cap: bool) -> String {
    let injected_chars = content.len();
    format!(
        "\
=== COLLECTED_INFO ===
RAW_CHARS: {raw_chars}
INJECTED_CHARS: {injected_chars}
TRUNCATED_PER_FILE: {truncated_per_file}
TRUNCATED_TOTAL_CAP: {truncated_total_cap}
--- BEGIN ---
{content}
--- END ---
"
    )
}

/// Format a missing-section marker (section expected but empty/absent).
pub fn format_missing_marker(name: &str) -> String {
    format!(
        "\
=== {name} ===
MISSING: true
--- BEGIN ---
[NONE]
--- END ---
"
    )
}
