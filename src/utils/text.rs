/// Shortens upstream response bodies before they end up in error messages
/// or the persisted `last_action_detail`.
#[must_use]
pub fn clip(s: &str, max_chars: usize) -> String {
    let s = s.trim();
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", s[..idx].trim_end()),
        None => s.to_string(),
    }
}
