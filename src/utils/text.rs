//! Text helpers for terminal output.

/// Collapse runs of whitespace to single spaces and cut to `max_chars`,
/// appending `...` when anything was dropped.
pub fn preview(content: &str, max_chars: usize) -> String {
    let flat = content.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let cut: String = flat.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
