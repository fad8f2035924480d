use serde::{Deserialize, Serialize};

use crate::id::new_id;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    pub done: bool,
}

impl ChecklistItem {
    /// Returns `None` for blank text.
    pub fn new(text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            id: new_id(),
            text: text.to_string(),
            done: false,
        })
    }
}

/// Done/total counts for a checklist.
pub fn checklist_stats(items: &[ChecklistItem]) -> (usize, usize) {
    let done = items.iter().filter(|item| item.done).count();
    (done, items.len())
}
