//! Conversation titles
//!
//! New conversations get a numbered placeholder; the first user turn
//! replaces it with a short excerpt of the question.

const MAX_TITLE_CHARS: usize = 20;
const ELLIPSIS: &str = "...";

/// Title given to a conversation when it is created
pub fn placeholder_title(id: u64) -> String {
    format!("Cuộc hội thoại {id}")
}

/// Derive a title from the first user turn.
///
/// Keeps the first 20 characters (not bytes) and appends an ellipsis when
/// anything was cut. Content is used as typed, whitespace included.
pub fn derive_title(content: &str) -> String {
    let mut chars = content.chars();
    let head: String = chars.by_ref().take(MAX_TITLE_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}{ELLIPSIS}")
    } else {
        head
    }
}
