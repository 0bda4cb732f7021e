pub const MAX_DISPLAY_NAME_LENGTH: usize = 20;

/// Collapses whitespace, drops control characters and caps the length.
pub fn sanitize_display_name(name: &str, fallback: &str) -> String {
    let cleaned = name
        .split_whitespace()
        .map(|word| word.chars().filter(|ch| !ch.is_control()).collect::<String>())
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    if cleaned.is_empty() {
        return fallback.to_string();
    }
    cleaned
        .chars()
        .take(MAX_DISPLAY_NAME_LENGTH)
        .collect::<String>()
        .trim_end()
        .to_string()
}
