//! Conversation search
//!
//! Read-only projection of the collection by title. Recomputed from the
//! current snapshot on every query; never touches the store.

use crate::state_machine::Conversation;

/// Conversations whose title contains `term`, case-insensitively, in
/// collection order. An empty term matches everything.
pub fn filter_conversations<'a>(
    conversations: &'a [Conversation],
    term: &str,
) -> Vec<&'a Conversation> {
    let needle = term.to_lowercase();
    conversations
        .iter()
        .filter(|conv| needle.is_empty() || conv.title.to_lowercase().contains(&needle))
        .collect()
}
