mod checklist;
mod note;
mod phase;
mod project;
mod state;
mod task;

pub use checklist::*;
pub use note::*;
pub use phase::*;
pub use project::*;
pub use state::*;
pub use task::*;

/// Entities that live in an id-addressed collection.
pub trait Keyed {
    fn id(&self) -> &str;
}

macro_rules! impl_keyed {
    ($($ty:ty),* $(,)?) => {
        $(impl Keyed for $ty {
            fn id(&self) -> &str {
                &self.id
            }
        })*
    };
}

impl_keyed!(
    Project,
    Phase,
    Task,
    Note,
    FileEntry,
    ChecklistItem,
    BomLine,
    LogEntry,
    Release,
    Issue,
);

/// Remove the entry with `id`; returns whether anything was removed.
pub fn remove_by_id<T: Keyed>(items: &mut Vec<T>, id: &str) -> bool {
    let before = items.len();
    items.retain(|item| item.id() != id);
    items.len() != before
}
